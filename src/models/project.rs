use serde_derive::{Deserialize, Serialize};

/// A node of the project forest. Unknown fields are dropped on read,
/// so only these four ever reach the store.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDefinition {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_project_id: Option<String>,
    #[serde(default)]
    pub description: String,
}

impl ProjectDefinition {
    pub fn parent(&self) -> Option<&str> {
        self.parent_project_id.as_deref().filter(|p| !p.is_empty())
    }
}
