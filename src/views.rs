//! Read-only projections of the graph used by the `graph` and `goals` commands.

use std::collections::HashSet;

use serde::Serialize;

use crate::db::Database;
use crate::engine::{status_of, LiveStatus};
use crate::error::{Entity, Error, Result};
use crate::models::Node;

/// A node with its live status and direct neighbours.
#[derive(Debug, Clone, Serialize)]
pub struct NodeView {
    #[serde(flatten)]
    pub node: Node,
    pub live_status: LiveStatus,
    /// Ids of direct prerequisites.
    pub dependencies: Vec<String>,
    /// Ids of direct dependents.
    pub blocks: Vec<String>,
}

pub fn node_view(db: &Database, node: Node) -> Result<NodeView> {
    let prerequisites = db.get_dependencies(&node.id)?;
    let live_status = status_of(&node, &prerequisites);
    let blocks = db
        .get_blocked_by(&node.id)?
        .into_iter()
        .map(|n| n.id)
        .collect();
    Ok(NodeView {
        live_status,
        dependencies: prerequisites.into_iter().map(|n| n.id).collect(),
        blocks,
        node,
    })
}

/// Every node, sorted by id.
pub fn all_views(db: &Database) -> Result<Vec<NodeView>> {
    db.get_all_nodes()?
        .into_iter()
        .map(|n| node_view(db, n))
        .collect()
}

/// Pending nodes, ready ones first, then by id.
pub fn goals(db: &Database) -> Result<Vec<NodeView>> {
    let mut views = db
        .get_all_nodes()?
        .into_iter()
        .filter(|n| !n.is_complete())
        .map(|n| node_view(db, n))
        .collect::<Result<Vec<_>>>()?;

    views.sort_by(|a, b| {
        let a_ready = a.live_status == LiveStatus::Ready;
        let b_ready = b.live_status == LiveStatus::Ready;
        b_ready.cmp(&a_ready).then_with(|| a.node.id.cmp(&b.node.id))
    });
    Ok(views)
}

/// A node in the dependency tree. Children are the node's dependents.
#[derive(Debug, Clone, Serialize)]
pub struct TreeNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub output: String,
    pub status: LiveStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeNode>,
}

/// Picks the node the dependency tree starts from: `goal` if given, else the
/// project's root goal, else the smallest id without prerequisites.
///
/// Returns `None` for an empty project.
pub fn resolve_root(db: &Database, goal: Option<&str>) -> Result<Option<String>> {
    if let Some(goal) = goal.map(str::trim).filter(|g| !g.is_empty()) {
        if !db.node_exists(goal)? {
            return Err(Error::NotFound {
                entity: Entity::Goal,
                id: goal.to_string(),
            });
        }
        return Ok(Some(goal.to_string()));
    }

    let meta = db.get_project_meta()?;
    if let Some(root) = meta.root_goal() {
        if db.node_exists(root)? {
            return Ok(Some(root.to_string()));
        }
        tracing::warn!(root_goal = root, "project root goal does not exist; picking a root");
    }

    let nodes = db.get_all_nodes()?;
    if nodes.is_empty() {
        return Ok(None);
    }

    let has_incoming: HashSet<String> = db.get_edges()?.into_iter().map(|e| e.target).collect();
    nodes
        .into_iter()
        .map(|n| n.id)
        .find(|id| !has_incoming.contains(id))
        .map(Some)
        .ok_or_else(|| {
            Error::InvalidInput(
                "no root node found (set a root goal with `init --root-goal` or pass a goal id)"
                    .to_string(),
            )
        })
}

/// Depth-first walk over dependents starting at `root`. Each node appears
/// once; a node reachable along several paths shows up under the first.
pub fn dependency_tree(db: &Database, root: &str) -> Result<TreeNode> {
    let mut visited = HashSet::new();
    let node = db.require_node(root)?;
    build_subtree(db, node, &mut visited)
}

fn build_subtree(db: &Database, node: Node, visited: &mut HashSet<String>) -> Result<TreeNode> {
    visited.insert(node.id.clone());
    let prerequisites = db.get_dependencies(&node.id)?;
    let status = status_of(&node, &prerequisites);

    let mut children = Vec::new();
    for child in db.get_blocked_by(&node.id)? {
        if visited.contains(&child.id) {
            continue;
        }
        children.push(build_subtree(db, child, visited)?);
    }

    Ok(TreeNode {
        id: node.id,
        node_type: node.node_type,
        output: node.output,
        status,
        children,
    })
}
