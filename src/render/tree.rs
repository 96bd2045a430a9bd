//! ASCII tree rendering for dependency trees.

use crate::engine::LiveStatus;
use crate::views::TreeNode;

const COMPLETE: char = '●';
const READY: char = '○';
const BLOCKED: char = '✗';

fn status_symbol(status: LiveStatus) -> char {
    match status {
        LiveStatus::Complete => COMPLETE,
        LiveStatus::Ready => READY,
        LiveStatus::Blocked => BLOCKED,
    }
}

/// Render a dependency tree as ASCII art with status symbols.
///
/// Example output:
/// ```text
/// ● requirements (requirements_document)
/// ├── ● spec (technical_specification)
/// │   ├── ○ design (architecture_design)
/// │   └── ○ data_model
/// └── ✗ plan (project_plan)
/// ```
pub fn render_tree(root: &TreeNode) -> String {
    let mut output = String::new();
    render_node(&mut output, root, "", true, true);
    output
}

fn label(node: &TreeNode) -> String {
    if node.output == node.id {
        node.id.clone()
    } else {
        format!("{} ({})", node.id, node.output)
    }
}

fn render_node(output: &mut String, node: &TreeNode, prefix: &str, is_last: bool, is_root: bool) {
    if !is_root {
        let branch = if is_last { "└── " } else { "├── " };
        output.push_str(prefix);
        output.push_str(branch);
    }
    output.push(status_symbol(node.status));
    output.push(' ');
    output.push_str(&label(node));
    output.push('\n');

    let child_prefix = if is_root {
        String::new()
    } else {
        let continuation = if is_last { "    " } else { "│   " };
        format!("{}{}", prefix, continuation)
    };

    for (i, child) in node.children.iter().enumerate() {
        let child_is_last = i == node.children.len() - 1;
        render_node(output, child, &child_prefix, child_is_last, false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_node(id: &str, status: LiveStatus, children: Vec<TreeNode>) -> TreeNode {
        TreeNode {
            id: id.to_string(),
            node_type: "task".to_string(),
            output: id.to_string(),
            status,
            children,
        }
    }

    #[test]
    fn test_single_root() {
        let output = render_tree(&make_node("spec", LiveStatus::Ready, vec![]));
        assert_eq!(output, "○ spec\n");
    }

    #[test]
    fn test_output_shown_when_different_from_id() {
        let mut node = make_node("spec", LiveStatus::Complete, vec![]);
        node.output = "spec.md".to_string();
        assert_eq!(render_tree(&node), "● spec (spec.md)\n");
    }

    #[test]
    fn test_nested_children() {
        let tree = make_node(
            "requirements",
            LiveStatus::Complete,
            vec![
                make_node(
                    "spec",
                    LiveStatus::Complete,
                    vec![
                        make_node("design", LiveStatus::Ready, vec![]),
                        make_node("data_model", LiveStatus::Ready, vec![]),
                    ],
                ),
                make_node("plan", LiveStatus::Blocked, vec![]),
            ],
        );
        let expected = "● requirements\n├── ● spec\n│   ├── ○ design\n│   └── ○ data_model\n└── ✗ plan\n";
        assert_eq!(render_tree(&tree), expected);
    }
}
