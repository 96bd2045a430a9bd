//! Manual node operations. Each records what it did in the action log.
//!
//! Batch operations check every id before the first write, so a bad id in
//! the middle of a batch changes nothing.

use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::*;

pub fn add_node(db: &Database, input: CreateNodeInput) -> Result<Node> {
    if input.id.trim().is_empty() {
        return Err(Error::InvalidInput("node id must not be empty".to_string()));
    }
    db.transaction(|db| {
        let node = db.add_node(input)?;
        db.log_action(
            LogActionInput::new(ActionKind::NodeCreated, format!("Created node: {}", node.id))
                .node(node.id.as_str()),
        )?;
        Ok(node)
    })
}

pub fn edit_status(db: &Database, ids: &[String], status: NodeStatus) -> Result<Vec<Node>> {
    require_ids(ids)?;
    for id in ids {
        db.require_node(id)?;
    }

    let action = match status {
        NodeStatus::Complete => ActionKind::NodeCompleted,
        NodeStatus::Pending => ActionKind::NodeUpdated,
    };

    db.transaction(|db| {
        let mut updated = Vec::with_capacity(ids.len());
        for id in ids {
            updated.push(db.update_node_status(id, status)?);
            db.log_action(
                LogActionInput::new(action, format!("Updated {id} status to {}", status.as_str()))
                    .node(id.as_str()),
            )?;
        }
        Ok(updated)
    })
}

/// Deletes every node in `ids` along with its edges.
///
/// Without `force`, fails if any node still blocks a dependent, even one that
/// is part of the same batch.
pub fn delete_nodes(db: &Database, ids: &[String], force: bool) -> Result<Vec<String>> {
    require_ids(ids)?;

    for id in ids {
        db.require_node(id)?;
        if force {
            continue;
        }
        let dependents: Vec<String> = db
            .get_blocked_by(id)?
            .into_iter()
            .map(|n| n.id)
            .collect();
        if !dependents.is_empty() {
            return Err(Error::BlocksDependents {
                node_id: id.clone(),
                dependents,
            });
        }
    }

    db.transaction(|db| {
        let mut deleted = Vec::with_capacity(ids.len());
        for id in ids {
            if db.delete_node(id)? {
                db.log_action(
                    LogActionInput::new(ActionKind::NodeDeleted, format!("Deleted node: {id}"))
                        .node(id.as_str()),
                )?;
                deleted.push(id.clone());
            }
        }
        Ok(deleted)
    })
}

/// Fetches every node in `ids`, failing on the first unknown one.
pub fn show_nodes(db: &Database, ids: &[String]) -> Result<Vec<Node>> {
    require_ids(ids)?;
    ids.iter().map(|id| db.require_node(id)).collect()
}

/// Adds the edge `from -> to`. Returns `false` if it already existed.
pub fn link_nodes(db: &Database, from: &str, to: &str) -> Result<bool> {
    db.transaction(|db| {
        let added = db.add_edge(from, to)?;
        if added {
            db.log_action(
                LogActionInput::new(ActionKind::EdgeAdded, format!("Linked {from} -> {to}"))
                    .node(to),
            )?;
        }
        Ok(added)
    })
}

fn require_ids(ids: &[String]) -> Result<()> {
    if ids.is_empty() {
        return Err(Error::InvalidInput(
            "at least one node id is required".to_string(),
        ));
    }
    Ok(())
}
