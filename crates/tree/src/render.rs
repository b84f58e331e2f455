use crate::types::TreeNode;
use std::fmt::Write;

const MAX_LISTED_LINES: usize = 8;

/// Plain-text outline of the tree, two spaces per level, directories marked
/// with a trailing slash and files followed by their known lines.
pub fn render_tree(root: &TreeNode) -> String {
    let mut out = String::new();
    for child in root.sorted_children() {
        render_node(child, 0, &mut out);
    }
    out
}

fn render_node(node: &TreeNode, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    match node {
        TreeNode::Directory { .. } => {
            let _ = writeln!(out, "{indent}{}/", node.name());
            for child in node.sorted_children() {
                render_node(child, depth + 1, out);
            }
        }
        TreeNode::File { lines, .. } => {
            let mut listed: Vec<String> = lines
                .iter()
                .take(MAX_LISTED_LINES)
                .map(u32::to_string)
                .collect();
            if lines.len() > MAX_LISTED_LINES {
                listed.push(format!("+{}", lines.len() - MAX_LISTED_LINES));
            }
            let _ = writeln!(out, "{indent}{}  [{}]", node.name(), listed.join(", "));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build_tree;
    use pretty_assertions::assert_eq;

    #[test]
    fn renders_outline() {
        let built = build_tree([
            ("README.md", (1u32..=10).collect::<Vec<_>>()),
            ("src/app.tsx", vec![4, 2]),
            ("src/ui/button.tsx", vec![9]),
        ]);
        assert_eq!(
            render_tree(&built.root),
            "src/\n  ui/\n    button.tsx  [9]\n  app.tsx  [2, 4]\nREADME.md  [1, 2, 3, 4, 5, 6, 7, 8, +2]\n"
        );
    }
}
