//! credguard platform adapter.
//!
//! Implements the [`runtask::VariableSource`] and [`runtask::TaskResultSink`]
//! ports against the Terraform Cloud / Enterprise REST API with `reqwest`.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** URL construction, authentication headers, JSON:API
//! decoding, and status-code interpretation all live here. The worker sees only
//! the two port traits and [`runtask::RemoteError`].
//!
//! ## Endpoints
//!
//! | Operation | Request | Credential |
//! |-----------|---------|------------|
//! | List variables | `GET {address}/api/v2/workspaces/{id}/vars` | Process-level API token |
//! | Task-result callback | `PATCH {task_result_callback_url}` | Per-run access token |
//!
//! Both send `Content-Type: application/vnd.api+json`. A callback counts as
//! delivered only on `200 OK`; nothing is retried.

mod client;
mod wire;

pub use client::{TfcClient, DEFAULT_ADDRESS, REQUEST_TIMEOUT};
