//! Newtype domain identifiers.
//!
//! Every identity carried by a run task invocation is a distinct newtype
//! wrapping a primitive. This prevents accidentally interchanging, for example,
//! a [`RunId`] with a [`WorkspaceId`] even though both are strings on the wire.
//!
//! Wire-facing identifiers deserialise from any JSON string, including the
//! empty string: the platform's payload is not validated beyond JSON
//! well-formedness, and the worker checks emptiness where it matters.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), is_empty(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Returns `true` if the platform sent an empty value.
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Identifiers: platform-assigned strings
// ---------------------------------------------------------------------------

string_id! {
    /// Identifies the run that triggered the run task (e.g. `"run-abc123"`).
    RunId
}

string_id! {
    /// Identifies the workspace whose variables are inspected (e.g. `"ws-abc123"`).
    WorkspaceId
}

string_id! {
    /// Name of the organization that owns the workspace.
    OrganizationName
}

string_id! {
    /// Identifies the task result the platform expects to be updated.
    TaskResultId
}

// ---------------------------------------------------------------------------
// Identifiers: UUID-backed (internally generated)
// ---------------------------------------------------------------------------

/// Identifies one queued job, assigned when the invocation is enqueued.
///
/// Used only for log correlation between the ingestion endpoint and the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(Uuid);

impl JobId {
    /// Generates a new random job identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
