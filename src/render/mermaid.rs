//! Mermaid `graph TD` export.

use std::fmt::Write;
use std::sync::LazyLock;

use regex::Regex;

use crate::models::Edge;
use crate::views::NodeView;

static SANITIZE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9_]").unwrap());

/// A Mermaid-safe node identifier.
pub fn mermaid_id(id: &str) -> String {
    SANITIZE_RE.replace_all(id, "_").into_owned()
}

/// Label parts joined by `<br/>`: id, output when it differs, type and the
/// upper-cased status in brackets.
pub fn mermaid_label(id: &str, output: &str, node_type: &str, status: &str) -> String {
    let (id, output, node_type, status) = (id.trim(), output.trim(), node_type.trim(), status.trim());

    let mut parts = Vec::new();
    if !id.is_empty() {
        parts.push(id.to_string());
    }
    if !output.is_empty() && output != id {
        parts.push(output.to_string());
    }
    if !node_type.is_empty() {
        parts.push(node_type.to_string());
    }
    if !status.is_empty() {
        parts.push(format!("[{}]", status.to_uppercase()));
    }
    parts.join("<br/>")
}

fn write_node(out: &mut String, view: &NodeView) {
    let label = mermaid_label(
        &view.node.id,
        &view.node.output,
        &view.node.node_type,
        view.live_status.as_str(),
    );
    let _ = writeln!(
        out,
        "  {}[\"{}\"]",
        mermaid_id(&view.node.id),
        label.replace('"', "\\\"")
    );
}

fn write_edge(out: &mut String, source: &str, target: &str) {
    let _ = writeln!(out, "  {} --> {}", mermaid_id(source), mermaid_id(target));
}

/// The whole graph: every node, then every edge.
pub fn render_graph(views: &[NodeView], edges: &[Edge]) -> String {
    let mut out = String::from("graph TD\n");
    for view in views {
        write_node(&mut out, view);
    }
    for edge in edges {
        write_edge(&mut out, &edge.source, &edge.target);
    }
    out
}

/// Pending nodes and the edges into them.
pub fn render_goals(goals: &[NodeView]) -> String {
    let mut out = String::from("graph TD\n");
    if goals.is_empty() {
        out.push_str("  empty[\"All goals complete!\"]\n");
        return out;
    }
    for view in goals {
        write_node(&mut out, view);
    }
    for view in goals {
        for dep in &view.dependencies {
            write_edge(&mut out, dep, &view.node.id);
        }
    }
    out
}
