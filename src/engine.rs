//! Live node status and tactic dependency classification.
//!
//! Readiness is local: a node is ready only when each of its *direct*
//! prerequisites is itself marked complete. Nothing here walks further up the
//! graph.

use std::collections::HashSet;

use serde::Serialize;

use crate::db::Database;
use crate::error::Result;
use crate::models::{Node, Tactic};

/// The derived status of a node, taking its prerequisites into account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LiveStatus {
    Complete,
    Ready,
    Blocked,
}

impl LiveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::Ready => "ready",
            Self::Blocked => "blocked",
        }
    }
}

impl std::fmt::Display for LiveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Live status of the node `id`. Fails with NotFound if it does not exist.
pub fn compute_node_status(db: &Database, id: &str) -> Result<LiveStatus> {
    let node = db.require_node(id)?;
    let prerequisites = db.get_dependencies(id)?;
    Ok(status_of(&node, &prerequisites))
}

/// Live status of `node` given its direct prerequisites.
pub fn status_of(node: &Node, prerequisites: &[Node]) -> LiveStatus {
    if node.is_complete() {
        LiveStatus::Complete
    } else if prerequisites.iter().all(Node::is_complete) {
        LiveStatus::Ready
    } else {
        LiveStatus::Blocked
    }
}

/// How a tactic's dependencies relate to the current graph.
///
/// Lists keep the tactic's declaration order (match first, then premises)
/// with duplicates removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DependencyStatus {
    /// Every match dependency is satisfied.
    pub ready: bool,
    /// Outputs produced by at least one complete node.
    pub satisfied: Vec<String>,
    /// Match outputs nobody has completed, and premise outputs whose nodes
    /// exist but are still incomplete.
    pub missing: Vec<String>,
    /// Premise outputs no node claims. Apply introduces these as new nodes.
    pub can_introduce: Vec<String>,
}

pub fn compute_tactic_dependency_status(tactic: &Tactic, nodes: &[Node]) -> DependencyStatus {
    let existing: HashSet<&str> = nodes.iter().map(|n| n.output.as_str()).collect();
    let complete: HashSet<&str> = nodes
        .iter()
        .filter(|n| n.is_complete())
        .map(|n| n.output.as_str())
        .collect();

    let mut status = DependencyStatus {
        ready: true,
        ..Default::default()
    };
    let mut seen = HashSet::new();

    for dep in &tactic.match_deps {
        if !seen.insert(dep.as_str()) {
            continue;
        }
        if complete.contains(dep.as_str()) {
            status.satisfied.push(dep.clone());
        } else {
            status.ready = false;
            status.missing.push(dep.clone());
        }
    }

    for dep in &tactic.premises {
        if !seen.insert(dep.as_str()) {
            continue;
        }
        if complete.contains(dep.as_str()) {
            status.satisfied.push(dep.clone());
        } else if existing.contains(dep.as_str()) {
            status.missing.push(dep.clone());
        } else {
            status.can_introduce.push(dep.clone());
        }
    }

    status
}
