//! Port traits: the only I/O the worker depends on.
//!
//! The `tfc` crate implements both against the platform's REST API; tests use
//! in-memory fakes.

use async_trait::async_trait;

use crate::{CallbackTarget, RemoteError, TaskResult, WorkspaceId, WorkspaceVariable};

/// Lists the variables configured on a workspace.
#[async_trait]
pub trait VariableSource: Send + Sync {
    /// Returns the workspace's variables in the order the platform lists them.
    ///
    /// Authenticated with process-level credentials, not the per-run token.
    async fn list_variables(
        &self,
        workspace: &WorkspaceId,
    ) -> Result<Vec<WorkspaceVariable>, RemoteError>;
}

/// Delivers a verdict to the platform.
#[async_trait]
pub trait TaskResultSink: Send + Sync {
    /// Sends `result` to `target`. Delivered at most once; callers do not retry.
    async fn send_task_result(
        &self,
        target: &CallbackTarget,
        result: &TaskResult,
    ) -> Result<(), RemoteError>;
}
