use std::path::Path;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{Commands, NodeCommands};
use crate::apply::{apply_tactic, ApplyOptions};
use crate::config::Config;
use crate::defaults::default_tactics;
use crate::models::{ActionLogEntry, CreateNodeInput, NodeStatus, SessionSummary};
use crate::nodes;
use crate::ranker::{self, RankedTactic, ScoreBreakdown, SearchQuery};
use crate::render::table::{render_fields, render_table};
use crate::render::{join_or_dash, mermaid, to_json, tree, OutputFormat};
use crate::since::parse_since;
use crate::store::{self, Session};
use crate::views::{self, NodeView};

pub(super) fn init(
    dir: &Path,
    name: Option<&str>,
    root_goal: Option<&str>,
    format: OutputFormat,
) -> Result<String> {
    let report = store::init(dir, name, root_goal, &default_tactics()?)?;

    if format == OutputFormat::Json {
        return Ok(to_json(&report)?);
    }

    let verb = if report.created {
        "Initialized"
    } else {
        "Updated"
    };
    let mut out = format!(
        "{verb} project {} at {}\n",
        report.project.name,
        report.dir.display()
    );
    if !report.seeded.is_empty() {
        out.push_str(&format!("Seeded {} default tactic(s)\n", report.seeded.len()));
    }
    Ok(out)
}

pub(super) fn dispatch(
    session: &mut Session,
    command: Commands,
    config: &Config,
    format: OutputFormat,
) -> Result<String> {
    match command {
        Commands::Init { .. } => anyhow::bail!("init cannot run against a loaded project"),
        Commands::Node(node) => node_command(session, node, config, format),
        Commands::Apply {
            tactic_id,
            yes,
            force,
        } => apply(session, &tactic_id, yes, force, format),
        Commands::Search {
            query,
            ready,
            tactic_type,
            tags,
            goals,
            limit,
            verbose,
        } => {
            let query = SearchQuery {
                tactic_type,
                tags: clean_list(tags),
                goals: clean_list(goals),
                ready_only: ready,
                limit: limit.unwrap_or(config.search_limit),
                ..Default::default()
            }
            .with_text(query.as_deref().unwrap_or(""));
            search(session, &query, verbose, format)
        }
        Commands::Graph { goal_id, mermaid } => graph(session, goal_id.as_deref(), mermaid, format),
        Commands::Goals { mermaid } => goals(session, mermaid, format),
        Commands::History {
            limit,
            since,
            summary,
        } => history(session, limit, since.as_deref(), summary, format),
    }
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

// ============================================================
// Node commands
// ============================================================

fn node_command(
    session: &mut Session,
    command: NodeCommands,
    config: &Config,
    format: OutputFormat,
) -> Result<String> {
    match command {
        NodeCommands::Add {
            id,
            output,
            node_type,
            status,
        } => {
            let node_type = node_type.unwrap_or_else(|| config.default_node_type.clone());
            let input = CreateNodeInput::new(id, node_type, output).with_status(status.into());
            let node = nodes::add_node(session.db(), input)?;
            session.mark_dirty();

            if format == OutputFormat::Json {
                return Ok(to_json(&node)?);
            }
            Ok(format!("Created node {}\n", node.id))
        }
        NodeCommands::Edit { ids, status } => {
            let status = NodeStatus::from(status);
            let updated = nodes::edit_status(session.db(), &ids, status)?;
            session.mark_dirty();

            if format == OutputFormat::Json {
                return Ok(to_json(&updated)?);
            }
            Ok(format!("Updated {} to {}\n", ids.join(", "), status.as_str()))
        }
        NodeCommands::Delete { ids, force } => {
            let deleted = nodes::delete_nodes(session.db(), &ids, force)?;
            session.mark_dirty();

            if format == OutputFormat::Json {
                return Ok(to_json(&serde_json::json!({ "deleted": deleted }))?);
            }
            Ok(format!("Deleted {}\n", deleted.join(", ")))
        }
        NodeCommands::Show { ids } => {
            let db = session.db();
            let shown = nodes::show_nodes(db, &ids)?
                .into_iter()
                .map(|n| views::node_view(db, n))
                .collect::<crate::Result<Vec<_>>>()?;

            if format == OutputFormat::Json {
                return Ok(to_json(&shown)?);
            }
            Ok(shown
                .iter()
                .map(render_node_details)
                .collect::<Vec<_>>()
                .join("\n"))
        }
        NodeCommands::Link { from, to } => {
            let added = nodes::link_nodes(session.db(), &from, &to)?;
            if added {
                session.mark_dirty();
            }

            if format == OutputFormat::Json {
                return Ok(to_json(&serde_json::json!({
                    "source": from,
                    "target": to,
                    "added": added,
                }))?);
            }
            if added {
                Ok(format!("Linked {from} -> {to}\n"))
            } else {
                Ok(format!("Edge {from} -> {to} already exists\n"))
            }
        }
    }
}

fn render_node_details(view: &NodeView) -> String {
    let node = &view.node;
    let opt = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());
    render_fields(&[
        ("id", node.id.clone()),
        ("type", node.node_type.clone()),
        ("output", node.output.clone()),
        ("status", view.live_status.to_string()),
        ("created_by", opt(&node.created_by)),
        ("parent_tactic", opt(&node.parent_tactic)),
        ("introduced_as", opt(&node.introduced_as)),
        ("created_at", format_time(&node.created_at)),
        (
            "completed_at",
            node.completed_at
                .as_ref()
                .map(format_time)
                .unwrap_or_else(|| "-".to_string()),
        ),
        ("dependencies", join_or_dash(&view.dependencies)),
        ("blocks", join_or_dash(&view.blocks)),
    ])
}

fn format_time(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

// ============================================================
// Apply / search
// ============================================================

fn apply(
    session: &mut Session,
    tactic_id: &str,
    yes: bool,
    force: bool,
    format: OutputFormat,
) -> Result<String> {
    let outcome = apply_tactic(
        session.db(),
        tactic_id,
        ApplyOptions {
            confirmed: yes,
            force,
        },
    )?;
    session.mark_dirty();

    if format == OutputFormat::Json {
        return Ok(to_json(&outcome)?);
    }

    let mut out = format!("Applied tactic {}\n", outcome.tactic_id);
    out.push_str(&format!("Created nodes: {}\n", outcome.created_ids().join(", ")));
    if !outcome.edges.is_empty() {
        let edges: Vec<String> = outcome
            .edges
            .iter()
            .map(|e| format!("{} -> {}", e.source, e.target))
            .collect();
        out.push_str(&format!("Edges: {}\n", edges.join(", ")));
    }
    Ok(out)
}

#[derive(Serialize)]
struct SearchRow<'a> {
    id: &'a str,
    #[serde(rename = "type")]
    tactic_type: &'a str,
    output: &'a str,
    ready: bool,
    satisfied: &'a [String],
    missing: &'a [String],
    can_introduce: &'a [String],
    tags: &'a [String],
    description: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    scores: Option<ScoreBreakdown>,
}

impl<'a> SearchRow<'a> {
    fn new(ranked: &'a RankedTactic, verbose: bool) -> Self {
        Self {
            id: &ranked.tactic.id,
            tactic_type: &ranked.tactic.tactic_type,
            output: &ranked.tactic.output,
            ready: ranked.dependencies.ready,
            satisfied: &ranked.dependencies.satisfied,
            missing: &ranked.dependencies.missing,
            can_introduce: &ranked.dependencies.can_introduce,
            tags: &ranked.tactic.tags,
            description: &ranked.tactic.description,
            scores: verbose.then_some(ranked.scores),
        }
    }
}

fn search(
    session: &Session,
    query: &SearchQuery,
    verbose: bool,
    format: OutputFormat,
) -> Result<String> {
    let ranked = ranker::search(session.db(), query)?;
    let rows: Vec<SearchRow<'_>> = ranked.iter().map(|r| SearchRow::new(r, verbose)).collect();

    if format == OutputFormat::Json {
        return Ok(to_json(&rows)?);
    }
    if rows.is_empty() {
        return Ok("No matching tactics.\n".to_string());
    }

    let mut headers = vec!["id", "type", "output", "ready", "missing", "can_introduce"];
    if verbose {
        headers.extend(["total", "readiness", "critical_path", "keyword", "goal"]);
    }
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            let mut cells = vec![
                row.id.to_string(),
                row.tactic_type.to_string(),
                row.output.to_string(),
                row.ready.to_string(),
                join_or_dash(row.missing),
                join_or_dash(row.can_introduce),
            ];
            if let Some(scores) = row.scores {
                cells.extend(
                    [
                        scores.total,
                        scores.readiness,
                        scores.critical_path,
                        scores.keyword,
                        scores.goal,
                    ]
                    .iter()
                    .map(i64::to_string),
                );
            }
            cells
        })
        .collect();
    Ok(render_table(&headers, &cells))
}

// ============================================================
// Views
// ============================================================

fn graph(
    session: &Session,
    goal_id: Option<&str>,
    as_mermaid: bool,
    format: OutputFormat,
) -> Result<String> {
    let db = session.db();
    let project = db.get_project_meta()?;

    if as_mermaid {
        let diagram = mermaid::render_graph(&views::all_views(db)?, &db.get_edges()?);
        if format == OutputFormat::Json {
            return Ok(to_json(&serde_json::json!({
                "project": project.name,
                "mermaid": diagram,
            }))?);
        }
        return Ok(diagram);
    }

    let Some(root) = views::resolve_root(db, goal_id)? else {
        if format == OutputFormat::Json {
            return Ok(to_json(&serde_json::json!({
                "project": project.name,
                "root": null,
            }))?);
        }
        return Ok("No nodes in project yet.\n".to_string());
    };
    let tree = views::dependency_tree(db, &root)?;

    if format == OutputFormat::Json {
        return Ok(to_json(&serde_json::json!({
            "project": project.name,
            "root": root,
            "tree": tree,
        }))?);
    }
    Ok(format!(
        "Project: {}\n{}",
        project.name,
        tree::render_tree(&tree)
    ))
}

fn goals(session: &Session, as_mermaid: bool, format: OutputFormat) -> Result<String> {
    let goals = views::goals(session.db())?;

    if as_mermaid {
        let diagram = mermaid::render_goals(&goals);
        if format == OutputFormat::Json {
            return Ok(to_json(&serde_json::json!({ "mermaid": diagram }))?);
        }
        return Ok(diagram);
    }

    if format == OutputFormat::Json {
        return Ok(to_json(&goals)?);
    }
    if goals.is_empty() {
        return Ok("All goals complete!\n".to_string());
    }

    let rows: Vec<Vec<String>> = goals
        .iter()
        .map(|g| {
            vec![
                g.node.id.clone(),
                g.node.output.clone(),
                g.live_status.to_string(),
                join_or_dash(&g.dependencies),
                join_or_dash(&g.blocks),
                g.node.parent_tactic.clone().unwrap_or_else(|| "-".to_string()),
            ]
        })
        .collect();
    Ok(render_table(
        &["id", "output", "status", "dependencies", "blocks", "parent_tactic"],
        &rows,
    ))
}

fn history(
    session: &Session,
    limit: Option<usize>,
    since: Option<&str>,
    summary: bool,
    format: OutputFormat,
) -> Result<String> {
    let since = since
        .filter(|s| !s.trim().is_empty())
        .map(|s| parse_since(s, Utc::now()))
        .transpose()?;
    let limit = limit.filter(|l| *l > 0);

    if summary {
        let summary = session.db().get_session_summary(since)?;
        if format == OutputFormat::Json {
            return Ok(to_json(&summary)?);
        }
        return Ok(render_summary(&summary));
    }

    let entries = session.db().get_action_log(limit, since)?;
    if format == OutputFormat::Json {
        return Ok(to_json(&entries)?);
    }
    if entries.is_empty() {
        return Ok("No actions recorded.\n".to_string());
    }
    Ok(render_log(&entries))
}

fn render_summary(summary: &SessionSummary) -> String {
    render_fields(&[
        ("total_actions", summary.total_actions.to_string()),
        ("nodes_created", summary.nodes_created.to_string()),
        ("nodes_completed", summary.nodes_completed.to_string()),
        ("tactics_applied", summary.tactics_applied.to_string()),
        ("nodes_modified", summary.nodes_modified.to_string()),
    ])
}

fn render_log(entries: &[ActionLogEntry]) -> String {
    let dash = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());
    let rows: Vec<Vec<String>> = entries
        .iter()
        .map(|e| {
            vec![
                format_time(&e.timestamp),
                e.action.clone(),
                dash(&e.details),
                dash(&e.node_id),
                dash(&e.tactic_id),
            ]
        })
        .collect();
    render_table(&["timestamp", "action", "details", "node", "tactic"], &rows)
}
