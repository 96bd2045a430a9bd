use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An append-only audit record of something that happened to the project.
///
/// Entries are never mutated or deleted. The `action` is kept as a free string
/// so hand-edited or future kinds survive a load/save cycle; the kinds this
/// crate writes are listed in [`ActionKind`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionLogEntry {
    /// Index-local sequence number. Not persisted.
    #[serde(skip)]
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tactic_id: Option<String>,
}

/// The action kinds recorded by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    NodeCreated,
    NodeUpdated,
    NodeCompleted,
    NodeDeleted,
    EdgeAdded,
    TacticApplied,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NodeCreated => "node_created",
            Self::NodeUpdated => "node_updated",
            Self::NodeCompleted => "node_completed",
            Self::NodeDeleted => "node_deleted",
            Self::EdgeAdded => "edge_added",
            Self::TacticApplied => "tactic_applied",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "node_created" => Some(Self::NodeCreated),
            "node_updated" => Some(Self::NodeUpdated),
            "node_completed" => Some(Self::NodeCompleted),
            "node_deleted" => Some(Self::NodeDeleted),
            "edge_added" => Some(Self::EdgeAdded),
            "tactic_applied" => Some(Self::TacticApplied),
            _ => None,
        }
    }
}

/// Input for appending a log entry.
#[derive(Debug, Clone)]
pub struct LogActionInput {
    pub action: ActionKind,
    pub details: Option<String>,
    pub node_id: Option<String>,
    pub tactic_id: Option<String>,
}

impl LogActionInput {
    pub fn new(action: ActionKind, details: impl Into<String>) -> Self {
        Self {
            action,
            details: Some(details.into()),
            node_id: None,
            tactic_id: None,
        }
    }

    pub fn node(mut self, node_id: impl Into<String>) -> Self {
        self.node_id = Some(node_id.into());
        self
    }

    pub fn tactic(mut self, tactic_id: impl Into<String>) -> Self {
        self.tactic_id = Some(tactic_id.into());
        self
    }
}

/// Aggregate counts over (a window of) the action log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub total_actions: usize,
    pub nodes_created: usize,
    pub nodes_completed: usize,
    pub tactics_applied: usize,
    pub nodes_modified: usize,
    pub actions_by_type: BTreeMap<String, usize>,
}

impl SessionSummary {
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a ActionLogEntry>) -> Self {
        let mut summary = Self::default();
        for entry in entries {
            summary.total_actions += 1;
            *summary
                .actions_by_type
                .entry(entry.action.clone())
                .or_default() += 1;
            match ActionKind::from_str(&entry.action) {
                Some(ActionKind::NodeCreated) => summary.nodes_created += 1,
                Some(ActionKind::NodeCompleted) => summary.nodes_completed += 1,
                Some(ActionKind::TacticApplied) => summary.tactics_applied += 1,
                Some(ActionKind::NodeUpdated) => summary.nodes_modified += 1,
                _ => {}
            }
        }
        summary
    }
}
