//! Error types shared across the run task pipeline.
//!
//! [`RemoteError`] is what the platform-facing ports return. The worker never
//! propagates it further: every remote failure is logged and the job moves on.

use thiserror::Error;

/// Failure of one remote call to the orchestration platform.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The request never produced a response (DNS, TLS, connect, timeout, ...).
    #[error("Request to {url} failed: {message}")]
    Transport {
        /// Target URL of the request.
        url: String,
        /// Description of the underlying failure.
        message: String,
    },

    /// The platform answered with a status other than the one expected.
    #[error("Platform answered {status} for {url}: {body}")]
    UnexpectedStatus {
        /// Target URL of the request.
        url: String,
        /// HTTP status code returned.
        status: u16,
        /// Response body, kept for the log line.
        body: String,
    },

    /// The response body could not be decoded.
    #[error("Could not decode response from {url}: {message}")]
    Decode {
        /// Target URL of the request.
        url: String,
        /// Decoder error text.
        message: String,
    },

    /// The request could not be built (e.g. a malformed callback URL).
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Description of the problem.
        message: String,
    },
}

impl RemoteError {
    /// HTTP status of the response, if one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}
