use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A unit of tracked work or artifact in the project graph.
///
/// Node ids are unique within a project. The `output` names the artifact the
/// node produces and is deliberately **not** unique: several nodes may claim
/// the same output as alternative producers.
///
/// `data` is an opaque payload. It is carried through the index and the
/// durable tree unexamined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub output: String,
    #[serde(default)]
    pub status: NodeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// The tactic that produced this node as one of its subtasks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_tactic: Option<String>,
    /// Set to `"premise"` when the node was created to satisfy a tactic premise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub introduced_as: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Node {
    pub fn is_complete(&self) -> bool {
        self.status == NodeStatus::Complete
    }
}

/// The stored status of a node.
///
/// This is what a user (or a tactic) set explicitly. The derived, live status
/// that also considers prerequisites is [`crate::engine::LiveStatus`].
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    #[default]
    Pending,
    Complete,
}

impl NodeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Complete => "complete",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "complete" => Some(Self::Complete),
            _ => None,
        }
    }
}

/// Input for inserting a node into the index.
///
/// Timestamps are optional so that live creation can default them to "now"
/// while loading from disk preserves what was recorded.
#[derive(Debug, Clone, Default)]
pub struct CreateNodeInput {
    pub id: String,
    pub node_type: String,
    pub output: String,
    /// Defaults to `Pending`.
    pub status: Option<NodeStatus>,
    pub created_by: Option<String>,
    pub parent_tactic: Option<String>,
    pub introduced_as: Option<String>,
    pub data: Option<Value>,
    /// Defaults to the insertion time.
    pub created_at: Option<DateTime<Utc>>,
    /// Defaults to the insertion time when a new node is inserted as complete.
    /// Taken as given whenever `created_at` is set.
    pub completed_at: Option<DateTime<Utc>>,
}

impl CreateNodeInput {
    pub fn new(
        id: impl Into<String>,
        node_type: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            node_type: node_type.into(),
            output: output.into(),
            ..Default::default()
        }
    }

    pub fn with_status(mut self, status: NodeStatus) -> Self {
        self.status = Some(status);
        self
    }
}

impl From<Node> for CreateNodeInput {
    fn from(node: Node) -> Self {
        Self {
            id: node.id,
            node_type: node.node_type,
            output: node.output,
            status: Some(node.status),
            created_by: node.created_by,
            parent_tactic: node.parent_tactic,
            introduced_as: node.introduced_as,
            data: node.data,
            created_at: Some(node.created_at),
            completed_at: node.completed_at,
        }
    }
}

/// A directed dependency from a prerequisite node to a dependent node.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Edge {
    /// The prerequisite.
    pub source: String,
    /// The dependent.
    pub target: String,
}

impl Edge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}
