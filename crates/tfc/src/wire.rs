//! JSON:API response shapes returned by the platform.

use runtask::WorkspaceVariable;
use serde::Deserialize;

/// Body of `GET /api/v2/workspaces/{id}/vars`.
#[derive(Debug, Deserialize)]
pub(crate) struct VariableList {
    pub data: Vec<VariableResource>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VariableResource {
    pub attributes: WorkspaceVariable,
}

impl VariableList {
    /// Variables in the order the platform listed them.
    pub fn into_variables(self) -> Vec<WorkspaceVariable> {
        self.data.into_iter().map(|r| r.attributes).collect()
    }
}
