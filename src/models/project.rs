use serde::{Deserialize, Serialize};

/// Project-level metadata stored at the top of the project file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectMeta {
    pub name: String,
    /// Node id the `graph` view starts from when no goal is given. Empty when unset.
    #[serde(default)]
    pub root_goal: String,
}

impl Default for ProjectMeta {
    fn default() -> Self {
        Self {
            name: "untitled".to_string(),
            root_goal: String::new(),
        }
    }
}

impl ProjectMeta {
    pub fn root_goal(&self) -> Option<&str> {
        let goal = self.root_goal.trim();
        (!goal.is_empty()).then_some(goal)
    }
}
