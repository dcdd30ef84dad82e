//! [`TfcClient`]: the platform's REST API behind the worker's two ports.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Response, StatusCode};
use runtask::{
    AccessToken, CallbackTarget, RemoteError, TaskResult, TaskResultSink, VariableSource,
    WorkspaceId, WorkspaceVariable,
};
use tracing::debug;

use crate::wire::VariableList;

/// API address used when none is configured.
pub const DEFAULT_ADDRESS: &str = "https://app.terraform.io";

/// Per-request network timeout. No other deadline applies to a job.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const JSON_API: &str = "application/vnd.api+json";

/// Client for one platform address.
///
/// Variable lookups use the process-level token given at construction;
/// callbacks use the per-run token carried by each [`CallbackTarget`].
pub struct TfcClient {
    http: reqwest::Client,
    address: String,
    token: AccessToken,
}

impl TfcClient {
    /// Creates a client for `address` (e.g. [`DEFAULT_ADDRESS`]).
    pub fn new(address: impl Into<String>, token: AccessToken) -> Result<Self, RemoteError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("credguard/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RemoteError::InvalidRequest {
                message: format!("could not build HTTP client: {e}"),
            })?;

        Ok(Self {
            http,
            address: address.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Base address requests are sent to, without a trailing slash.
    pub fn address(&self) -> &str {
        &self.address
    }

    fn vars_url(&self, workspace: &WorkspaceId) -> String {
        format!("{}/api/v2/workspaces/{}/vars", self.address, workspace)
    }
}

#[async_trait]
impl VariableSource for TfcClient {
    async fn list_variables(
        &self,
        workspace: &WorkspaceId,
    ) -> Result<Vec<WorkspaceVariable>, RemoteError> {
        let url = self.vars_url(workspace);
        debug!(%url, "Listing workspace variables");

        let response = self
            .http
            .get(&url)
            .bearer_auth(self.token.expose())
            .header(CONTENT_TYPE, JSON_API)
            .send()
            .await
            .map_err(|e| request_error(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(unexpected_status(&url, response).await);
        }

        let body = response.bytes().await.map_err(|e| request_error(&url, e))?;
        let list: VariableList =
            serde_json::from_slice(&body).map_err(|e| RemoteError::Decode {
                url: url.clone(),
                message: e.to_string(),
            })?;

        let variables = list.into_variables();
        debug!(%url, count = variables.len(), "Listed workspace variables");
        Ok(variables)
    }
}

#[async_trait]
impl TaskResultSink for TfcClient {
    async fn send_task_result(
        &self,
        target: &CallbackTarget,
        result: &TaskResult,
    ) -> Result<(), RemoteError> {
        let body = serde_json::to_vec(&result.to_document()).map_err(|e| {
            RemoteError::InvalidRequest {
                message: format!("could not encode task result: {e}"),
            }
        })?;
        debug!(url = %target.url, status = %result.status, "Sending task result");

        let response = self
            .http
            .patch(&target.url)
            .bearer_auth(target.token.expose())
            .header(CONTENT_TYPE, JSON_API)
            .body(body)
            .send()
            .await
            .map_err(|e| request_error(&target.url, e))?;

        if response.status() != StatusCode::OK {
            return Err(unexpected_status(&target.url, response).await);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

fn request_error(url: &str, err: reqwest::Error) -> RemoteError {
    if err.is_builder() {
        RemoteError::InvalidRequest {
            message: format!("{url}: {err}"),
        }
    } else {
        RemoteError::Transport {
            url: url.to_string(),
            message: err.to_string(),
        }
    }
}

async fn unexpected_status(url: &str, response: Response) -> RemoteError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    RemoteError::UnexpectedStatus {
        url: url.to_string(),
        status,
        body,
    }
}
