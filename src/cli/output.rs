//! Terminal output formatting with colors
//!
//! Respects NO_COLOR, CLICOLOR, CLICOLOR_FORCE automatically.

use colored::Colorize;
use itertools::Itertools;
use termtree::Tree;

use crate::domain::{NodeValue, TreeNode};

/// Print error (red bold "error:" prefix) to stderr
pub fn error(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "error".red().bold(), msg);
}

/// Print warning (yellow "Warning:" prefix) to stderr
pub fn warning(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "Warning".yellow(), msg);
}

/// Print completed action (green label)
pub fn action(label: &str, msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}: {}", label.green(), msg);
}

/// Print section header (cyan bold)
pub fn header(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg.to_string().cyan().bold());
}

/// Print indented detail (no color)
pub fn detail(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("  {}", msg);
}

/// Print plain output (no color, for data/export statements)
pub fn info(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg);
}

/// One-line label of a node: its key plus any leaf values.
pub fn node_label(node: &TreeNode) -> String {
    let label = match &node.value {
        NodeValue::Empty | NodeValue::Children(_) => node.key.clone(),
        NodeValue::Text(text) => format!("{}: {}", node.key, text),
        NodeValue::List(values) if values.is_empty() => node.key.clone(),
        NodeValue::List(values) => format!("{}: {}", node.key, values.iter().join(", ")),
    };

    let style = node.style.as_ref();
    let label = match style.and_then(|s| s.top) {
        Some(top) => format!("{label} [top {top}]"),
        None => label,
    };
    if style.and_then(|s| s.highlight) == Some(true) {
        label.yellow().bold().to_string()
    } else if !node.has_content() {
        label.dimmed().to_string()
    } else {
        label
    }
}

/// Build a displayable tree under `root`.
pub fn render_tree(root: &str, nodes: &[TreeNode]) -> Tree<String> {
    Tree::new(root.bold().to_string()).with_leaves(nodes.iter().map(render_node))
}

fn render_node(node: &TreeNode) -> Tree<String> {
    Tree::new(node_label(node)).with_leaves(node.children().iter().map(render_node))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_list_node_when_labelling_then_joins_values() {
        colored::control::set_override(false);
        let node = TreeNode::new(
            "Family History",
            NodeValue::List(vec!["Cancer: Yes".into(), "Diabetes: No".into()]),
        );
        assert_eq!(node_label(&node), "Family History: Cancer: Yes, Diabetes: No");
    }

    #[test]
    fn given_nested_nodes_when_rendering_then_prints_all_levels() {
        colored::control::set_override(false);
        let nodes = vec![TreeNode::branch(
            "BACKGROUND",
            vec![TreeNode::branch(
                "Patient Demographics",
                vec![TreeNode::text("Age", "36")],
            )],
        )];

        let rendered = render_tree("Patient A", &nodes).to_string();

        assert!(rendered.starts_with("Patient A"));
        assert!(rendered.contains("Patient Demographics"));
        assert!(rendered.contains("Age: 36"));
    }
}
