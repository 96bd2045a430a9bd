//! Tactic search and ranking.

use serde::Serialize;

use crate::db::Database;
use crate::engine::{compute_tactic_dependency_status, DependencyStatus};
use crate::error::Result;
use crate::models::{Node, Tactic, TacticFilter};

pub const DEFAULT_LIMIT: usize = 20;

const READY_BONUS: i64 = 1000;
const NOT_READY_PENALTY: i64 = -500;
const CRITICAL_PATH_WEIGHT: i64 = 50;
const KEYWORD_WEIGHT: i64 = 10;
const GOAL_WEIGHT: i64 = 5;

#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    /// Free-text terms. Also used as the keyword pre-filter.
    pub keywords: Vec<String>,
    pub tactic_type: Option<String>,
    pub tags: Vec<String>,
    /// Node ids to align results with.
    pub goals: Vec<String>,
    pub ready_only: bool,
    /// Maximum number of results. Zero means [`DEFAULT_LIMIT`].
    pub limit: usize,
}

impl SearchQuery {
    /// Splits a free-text query on whitespace.
    pub fn with_text(mut self, text: &str) -> Self {
        self.keywords = text.split_whitespace().map(str::to_string).collect();
        self
    }

    fn filter(&self) -> TacticFilter {
        TacticFilter {
            tactic_type: self
                .tactic_type
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string),
            tags: self.tags.clone(),
            keywords: self.keywords.clone(),
        }
    }
}

/// Per-tactic scores. The sub-scores are unweighted; `total` is the weighted
/// sum used for ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScoreBreakdown {
    pub total: i64,
    pub readiness: i64,
    pub critical_path: i64,
    pub keyword: i64,
    pub goal: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RankedTactic {
    pub tactic: Tactic,
    pub dependencies: DependencyStatus,
    pub scores: ScoreBreakdown,
}

/// A node together with its direct prerequisites, loaded once per search.
struct Neighbourhood {
    node: Node,
    prerequisites: Vec<Node>,
}

pub fn search(db: &Database, query: &SearchQuery) -> Result<Vec<RankedTactic>> {
    let tactics = db.search_tactics(&query.filter())?;
    let nodes = db.get_all_nodes()?;

    let goals = query
        .goals
        .iter()
        .map(|id| {
            Ok(Neighbourhood {
                node: db.require_node(id)?,
                prerequisites: db.get_dependencies(id)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    // The incomplete prerequisites of every blocked pending node.
    let mut blocked = Vec::new();
    for node in nodes.iter().filter(|n| !n.is_complete()) {
        let blockers: Vec<Node> = db
            .get_dependencies(&node.id)?
            .into_iter()
            .filter(|d| !d.is_complete())
            .collect();
        if !blockers.is_empty() {
            blocked.push(blockers);
        }
    }

    let mut ranked: Vec<RankedTactic> = tactics
        .into_iter()
        .map(|tactic| {
            let dependencies = compute_tactic_dependency_status(&tactic, &nodes);
            let scores = score(&tactic, &dependencies, &blocked, &query.keywords, &goals);
            RankedTactic {
                tactic,
                dependencies,
                scores,
            }
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.scores
            .total
            .cmp(&a.scores.total)
            .then_with(|| a.tactic.id.cmp(&b.tactic.id))
    });

    if query.ready_only {
        ranked.retain(|r| r.dependencies.ready);
    }

    let limit = if query.limit == 0 {
        DEFAULT_LIMIT
    } else {
        query.limit
    };
    ranked.truncate(limit);

    tracing::debug!(results = ranked.len(), "ranked tactics");
    Ok(ranked)
}

fn score(
    tactic: &Tactic,
    dependencies: &DependencyStatus,
    blocked: &[Vec<Node>],
    keywords: &[String],
    goals: &[Neighbourhood],
) -> ScoreBreakdown {
    let readiness = if dependencies.ready {
        READY_BONUS
    } else {
        NOT_READY_PENALTY
    };
    let critical_path = critical_path_score(tactic, blocked);
    let keyword = keyword_score(tactic, keywords);
    let goal = goal_score(tactic, goals);

    ScoreBreakdown {
        total: readiness
            + critical_path * CRITICAL_PATH_WEIGHT
            + keyword * KEYWORD_WEIGHT
            + goal * GOAL_WEIGHT,
        readiness,
        critical_path,
        keyword,
        goal,
    }
}

/// +2 for every blocked node this tactic's output would fully unblock, +1 for
/// every blocked node it would only partially unblock.
fn critical_path_score(tactic: &Tactic, blocked: &[Vec<Node>]) -> i64 {
    blocked
        .iter()
        .filter(|blockers| blockers.iter().any(|b| b.output == tactic.output))
        .map(|blockers| if blockers.len() == 1 { 2 } else { 1 })
        .sum()
}

fn keyword_score(tactic: &Tactic, keywords: &[String]) -> i64 {
    let id = tactic.id.to_lowercase();
    let description = tactic.description.to_lowercase();
    let tags: Vec<String> = tactic.tags.iter().map(|t| t.to_lowercase()).collect();

    keywords
        .iter()
        .map(|kw| {
            let kw = kw.to_lowercase();
            let mut score = 0;
            if id.contains(&kw) {
                score += 10;
            }
            if tags.iter().any(|t| t.contains(&kw)) {
                score += 5;
            }
            if description.contains(&kw) {
                score += 2;
            }
            score
        })
        .sum()
}

fn goal_score(tactic: &Tactic, goals: &[Neighbourhood]) -> i64 {
    goals
        .iter()
        .map(|goal| {
            let mut score = 0;
            if goal.node.output == tactic.output {
                score += 20;
            }
            if goal
                .prerequisites
                .iter()
                .any(|p| p.output == tactic.output)
            {
                score += 10;
            }
            score
        })
        .sum()
}
