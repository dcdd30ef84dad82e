//! The verdict reported back to the platform and its JSON:API wire shape.

use serde::{Deserialize, Serialize};

/// The two verdicts a run task can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskResultStatus {
    Passed,
    Failed,
}

impl TaskResultStatus {
    /// Returns the wire value (`"passed"` / `"failed"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for TaskResultStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The verdict for one job: constructed once, serialised, then discarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskResult {
    pub status: TaskResultStatus,
    pub message: String,
    /// Deep link shown next to the result in the platform UI. Always empty here.
    pub url: String,
}

impl TaskResult {
    pub fn passed(message: impl Into<String>) -> Self {
        Self {
            status: TaskResultStatus::Passed,
            message: message.into(),
            url: String::new(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: TaskResultStatus::Failed,
            message: message.into(),
            url: String::new(),
        }
    }

    /// Wraps the result in the callback document.
    pub fn to_document(&self) -> TaskResultDocument {
        TaskResultDocument {
            data: TaskResultData {
                kind: TaskResultData::KIND.to_string(),
                attributes: self.clone(),
            },
        }
    }
}

/// Callback body: `{"data": {"type": "task-results", "attributes": {...}}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskResultDocument {
    pub data: TaskResultData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskResultData {
    #[serde(rename = "type")]
    pub kind: String,
    pub attributes: TaskResult,
}

impl TaskResultData {
    /// JSON:API resource type of a task result.
    pub const KIND: &'static str = "task-results";
}
