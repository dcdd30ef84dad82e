//! Core domain for credguard, a run task that rejects workspaces carrying
//! static cloud credentials.
//!
//! This crate contains every domain concept, newtype identifier, wire type, and
//! policy rule used throughout the pipeline. Infrastructure crates implement
//! the traits defined here; they never add domain rules.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is needed; infrastructure crates define *how* to supply it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`RunId`, `WorkspaceId`, `JobId`, etc.) |
//! | [`types`] | Invocation payload, workspace variables, tokens, timestamps |
//! | [`result`] | Task result verdict and its callback document |
//! | [`policy`] | Restricted key set and verdict construction |
//! | [`ports`] | `VariableSource` and `TaskResultSink` traits |
//! | [`errors`] | Remote call errors |

pub mod errors;
pub mod identifiers;
pub mod policy;
pub mod ports;
pub mod result;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use errors::RemoteError;
pub use identifiers::{JobId, OrganizationName, RunId, TaskResultId, WorkspaceId};
pub use policy::{LookupFailurePolicy, RestrictedKeys};
pub use ports::{TaskResultSink, VariableSource};
pub use result::{TaskResult, TaskResultDocument, TaskResultStatus};
pub use types::{
    AccessToken, CallbackTarget, InvocationPayload, Timestamp, VariableCategory,
    WorkspaceVariable,
};
