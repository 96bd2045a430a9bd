//! Tactic application: the all-or-nothing graph expansion.
//!
//! Everything that can fail on bad input (confirmation, tactic lookup,
//! dependency check, id collisions, dangling subtask references) is checked
//! before the first write. The writes themselves run in one index
//! transaction.

use std::collections::{BTreeSet, HashSet};

use serde::Serialize;

use crate::db::Database;
use crate::engine::{compute_tactic_dependency_status, DependencyStatus};
use crate::error::{Entity, Error, Result};
use crate::models::*;

#[derive(Debug, Clone, Copy, Default)]
pub struct ApplyOptions {
    /// The caller explicitly agreed to mutate the graph.
    pub confirmed: bool,
    /// Proceed even when dependencies are missing.
    pub force: bool,
}

/// What an apply did to the graph.
#[derive(Debug, Clone, Serialize)]
pub struct ApplyOutcome {
    pub tactic_id: String,
    pub created: Vec<Node>,
    pub edges: Vec<Edge>,
    pub dependencies: DependencyStatus,
}

impl ApplyOutcome {
    pub fn created_ids(&self) -> Vec<&str> {
        self.created.iter().map(|n| n.id.as_str()).collect()
    }
}

pub fn apply_tactic(db: &Database, tactic_id: &str, options: ApplyOptions) -> Result<ApplyOutcome> {
    if !options.confirmed {
        return Err(Error::NotConfirmed);
    }

    let tactic = db.require_tactic(tactic_id)?;
    let nodes = db.get_all_nodes()?;
    let dependencies = compute_tactic_dependency_status(&tactic, &nodes);

    if !dependencies.missing.is_empty() {
        if !options.force {
            return Err(Error::UnmetDependencies {
                tactic_id: tactic.id.clone(),
                missing: dependencies.missing.clone(),
            });
        }
        tracing::warn!(
            tactic = %tactic.id,
            missing = ?dependencies.missing,
            "forcing apply with missing dependencies"
        );
    }

    let plan = plan_nodes(&tactic, &dependencies);
    validate_plan(&tactic, &plan, &nodes)?;

    let mut wiring = Vec::new();

    for subtask in &tactic.subtasks {
        for dep in &subtask.depends_on {
            wiring.push(Edge::new(dep.as_str(), subtask.id.as_str()));
        }
    }

    for output in &tactic.match_deps {
        if let Some(producer) = producing_node(&nodes, output) {
            wiring.extend(plan.iter().map(|n| Edge::new(producer.id.as_str(), n.id.as_str())));
        }
    }

    for output in &tactic.premises {
        if tactic.matches(output) || dependencies.can_introduce.contains(output) {
            continue;
        }
        if let Some(producer) = producing_node(&nodes, output) {
            wiring.extend(plan.iter().map(|n| Edge::new(producer.id.as_str(), n.id.as_str())));
        }
    }

    // Introduced premises precede the nodes the tactic actually produces.
    let (introduced, produced): (Vec<_>, Vec<_>) = plan
        .iter()
        .partition(|n| n.introduced_as.as_deref() == Some(PREMISE));
    for premise in &introduced {
        wiring.extend(produced.iter().map(|n| Edge::new(premise.id.as_str(), n.id.as_str())));
    }

    let (created, edges) = db.transaction(|db| {
        let mut created = Vec::with_capacity(plan.len());
        for input in &plan {
            created.push(db.add_node(input.clone())?);
        }

        let mut edges = Vec::new();
        for edge in wiring {
            if db.add_edge(&edge.source, &edge.target)? {
                edges.push(edge);
            }
        }

        db.log_action(
            LogActionInput::new(ActionKind::TacticApplied, format!("Applied tactic: {}", tactic.id))
                .tactic(tactic.id.as_str()),
        )?;

        Ok((created, edges))
    })?;

    tracing::info!(
        tactic = %tactic.id,
        nodes = created.len(),
        edges = edges.len(),
        "applied tactic"
    );

    Ok(ApplyOutcome {
        tactic_id: tactic.id,
        created,
        edges,
        dependencies,
    })
}

const PREMISE: &str = "premise";

/// The nodes an apply would create, in creation order: introduced premises
/// first, then either every subtask or the single output node.
pub fn plan_nodes(tactic: &Tactic, dependencies: &DependencyStatus) -> Vec<CreateNodeInput> {
    let mut plan = Vec::new();

    for output in &dependencies.can_introduce {
        plan.push(CreateNodeInput {
            created_by: Some(tactic.id.clone()),
            introduced_as: Some(PREMISE.to_string()),
            ..CreateNodeInput::new(output.as_str(), "document", output.as_str())
        });
    }

    if tactic.subtasks.is_empty() {
        plan.push(CreateNodeInput {
            created_by: Some(tactic.id.clone()),
            data: tactic.data.clone(),
            ..CreateNodeInput::new(
                tactic.output.as_str(),
                tactic.tactic_type.as_str(),
                tactic.output.as_str(),
            )
        });
    } else {
        for subtask in &tactic.subtasks {
            plan.push(CreateNodeInput {
                created_by: Some(tactic.id.clone()),
                parent_tactic: Some(tactic.id.clone()),
                data: subtask.data.clone(),
                ..CreateNodeInput::new(
                    subtask.id.as_str(),
                    subtask.subtask_type.as_str(),
                    subtask.output.as_str(),
                )
            });
        }
    }

    plan
}

fn validate_plan(tactic: &Tactic, plan: &[CreateNodeInput], nodes: &[Node]) -> Result<()> {
    let existing: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();

    let mut planned = HashSet::new();
    let mut collisions = BTreeSet::new();
    for input in plan {
        if existing.contains(input.id.as_str()) || !planned.insert(input.id.as_str()) {
            collisions.insert(input.id.clone());
        }
    }
    if !collisions.is_empty() {
        return Err(Error::Conflict {
            entity: Entity::Node,
            ids: collisions.into_iter().collect(),
        });
    }

    for subtask in &tactic.subtasks {
        for dep in &subtask.depends_on {
            if !planned.contains(dep.as_str()) && !existing.contains(dep.as_str()) {
                return Err(Error::NotFound {
                    entity: Entity::Node,
                    id: dep.clone(),
                });
            }
        }
    }

    Ok(())
}

/// The node an edge for `output` should start from: a complete producer if
/// there is one, the smallest id among equals.
pub fn producing_node<'a>(nodes: &'a [Node], output: &str) -> Option<&'a Node> {
    nodes
        .iter()
        .filter(|n| n.output == output)
        .min_by(|a, b| {
            b.is_complete()
                .cmp(&a.is_complete())
                .then_with(|| a.id.cmp(&b.id))
        })
}
