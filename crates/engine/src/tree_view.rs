use lens_tree::TreeNode;
use serde::Serialize;
use std::collections::BTreeSet;

/// One visible row of the flattened tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeRow {
    pub path: String,
    pub name: String,
    pub depth: usize,
    pub is_directory: bool,
    pub expanded: bool,
    pub hovered: bool,
    pub locked: bool,
}

/// Scroll offset that centers a node, clamped to the scrollable range.
pub fn center_scroll_top(offset: f64, node_height: f64, visible: f64, scroll_height: f64) -> f64 {
    let max = (scroll_height - visible).max(0.0);
    (offset - visible / 2.0 + node_height / 2.0).clamp(0.0, max)
}

/// Presentation state of the file tree: which directories are open, the
/// hover and lock markers, and the scroll position.
#[derive(Debug, Clone)]
pub struct TreeView {
    expanded: BTreeSet<String>,
    hover_marker: Option<String>,
    lock_marker: Option<String>,
    scroll_top: f64,
    row_height: f64,
    viewport_height: f64,
}

impl TreeView {
    pub fn new(row_height: f64, viewport_height: f64) -> Self {
        Self {
            expanded: BTreeSet::new(),
            hover_marker: None,
            lock_marker: None,
            scroll_top: 0.0,
            row_height,
            viewport_height,
        }
    }

    pub fn is_expanded(&self, path: &str) -> bool {
        self.expanded.contains(path)
    }

    pub fn toggle_directory(&mut self, tree: &TreeNode, path: &str) -> bool {
        if !tree.find(path).is_some_and(TreeNode::is_directory) {
            return false;
        }
        if !self.expanded.remove(path) {
            self.expanded.insert(path.to_string());
        }
        true
    }

    /// Keep expansion for directories that survived a rebuild.
    pub fn retain_existing(&mut self, tree: &TreeNode) {
        self.expanded
            .retain(|path| tree.find(path).is_some_and(TreeNode::is_directory));
        for marker in [&mut self.hover_marker, &mut self.lock_marker] {
            if marker.as_deref().is_some_and(|path| tree.find_file(path).is_none()) {
                *marker = None;
            }
        }
        self.scroll_top = self.scroll_top.min(self.max_scroll(tree));
    }

    pub fn reset(&mut self) {
        self.expanded.clear();
        self.clear_markers();
        self.scroll_top = 0.0;
    }

    pub fn clear_markers(&mut self) {
        self.hover_marker = None;
        self.lock_marker = None;
    }

    pub fn set_hover_marker(&mut self, path: &str) {
        self.hover_marker = Some(path.to_string());
    }

    pub fn set_lock_marker(&mut self, path: &str) {
        self.lock_marker = Some(path.to_string());
    }

    pub fn hover_marker(&self) -> Option<&str> {
        self.hover_marker.as_deref()
    }

    pub fn lock_marker(&self) -> Option<&str> {
        self.lock_marker.as_deref()
    }

    pub const fn scroll_top(&self) -> f64 {
        self.scroll_top
    }

    /// Visible rows in display order; children of collapsed directories are
    /// skipped.
    pub fn rows(&self, tree: &TreeNode) -> Vec<TreeRow> {
        let mut rows = Vec::new();
        for child in tree.sorted_children() {
            self.push_rows(child, 0, &mut rows);
        }
        rows
    }

    fn push_rows(&self, node: &TreeNode, depth: usize, rows: &mut Vec<TreeRow>) {
        let path = node.path();
        let expanded = node.is_directory() && self.is_expanded(path);
        rows.push(TreeRow {
            path: path.to_string(),
            name: node.name().to_string(),
            depth,
            is_directory: node.is_directory(),
            expanded,
            hovered: self.hover_marker.as_deref() == Some(path),
            locked: self.lock_marker.as_deref() == Some(path),
        });
        if expanded {
            for child in node.sorted_children() {
                self.push_rows(child, depth + 1, rows);
            }
        }
    }

    /// Expand every ancestor of `path`, then center its row. Returns the new
    /// scroll offset, or `None` when the node is not in the tree.
    pub fn reveal(&mut self, tree: &TreeNode, path: &str) -> Option<f64> {
        tree.find(path)?;
        for ancestor in tree.ancestors_of(path) {
            self.expanded.insert(ancestor);
        }

        let rows = self.rows(tree);
        let index = rows.iter().position(|row| row.path == path)?;
        #[allow(clippy::cast_precision_loss)]
        let offset = index as f64 * self.row_height;
        self.scroll_top = center_scroll_top(
            offset,
            self.row_height,
            self.viewport_height,
            self.scroll_height_for(rows.len()),
        );
        Some(self.scroll_top)
    }

    fn max_scroll(&self, tree: &TreeNode) -> f64 {
        (self.scroll_height_for(self.rows(tree).len()) - self.viewport_height).max(0.0)
    }

    #[allow(clippy::cast_precision_loss)]
    fn scroll_height_for(&self, rows: usize) -> f64 {
        rows as f64 * self.row_height
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lens_tree::build_tree;
    use pretty_assertions::assert_eq;

    fn tree() -> TreeNode {
        build_tree([
            ("src/app/main.rs", vec![1u32]),
            ("src/app/view.rs", vec![2]),
            ("src/lib.rs", vec![3]),
            ("README.md", vec![4]),
        ])
        .root
    }

    fn paths(rows: &[TreeRow]) -> Vec<&str> {
        rows.iter().map(|r| r.path.as_str()).collect()
    }

    #[test]
    fn centers_and_clamps() {
        assert_eq!(center_scroll_top(500.0, 20.0, 200.0, 1000.0), 410.0);
        assert_eq!(center_scroll_top(20.0, 20.0, 200.0, 1000.0), 0.0);
        assert_eq!(center_scroll_top(990.0, 20.0, 200.0, 1000.0), 800.0);
        // content shorter than the viewport never scrolls
        assert_eq!(center_scroll_top(60.0, 20.0, 200.0, 100.0), 0.0);
    }

    #[test]
    fn collapsed_directories_hide_children() {
        let tree = tree();
        let view = TreeView::new(20.0, 100.0);
        assert_eq!(paths(&view.rows(&tree)), vec!["src", "README.md"]);
    }

    #[test]
    fn reveal_expands_ancestors() {
        let tree = tree();
        let mut view = TreeView::new(20.0, 40.0);
        let top = view.reveal(&tree, "src/app/view.rs").unwrap();
        assert!(view.is_expanded("src"));
        assert!(view.is_expanded("src/app"));
        assert_eq!(
            paths(&view.rows(&tree)),
            vec!["src", "src/app", "src/app/main.rs", "src/app/view.rs", "src/lib.rs", "README.md"]
        );
        // row 3 at 60px, centered in a 40px viewport
        assert_eq!(top, 50.0);
        assert_eq!(view.reveal(&tree, "missing.rs"), None);
    }

    #[test]
    fn markers_show_on_rows() {
        let tree = tree();
        let mut view = TreeView::new(20.0, 100.0);
        view.set_hover_marker("README.md");
        view.set_lock_marker("README.md");
        let rows = view.rows(&tree);
        let readme = rows.iter().find(|r| r.path == "README.md").unwrap();
        assert!(readme.hovered && readme.locked);
        view.clear_markers();
        assert!(view.rows(&tree).iter().all(|r| !r.hovered && !r.locked));
    }

    #[test]
    fn rebuild_keeps_surviving_expansion() {
        let mut view = TreeView::new(20.0, 100.0);
        view.reveal(&tree(), "src/app/main.rs");
        view.set_lock_marker("src/app/main.rs");

        let smaller = build_tree([("src/lib.rs", vec![3u32])]).root;
        view.retain_existing(&smaller);
        assert!(view.is_expanded("src"));
        assert!(!view.is_expanded("src/app"));
        assert_eq!(view.lock_marker(), None);
    }

    #[test]
    fn toggling_only_applies_to_directories() {
        let tree = tree();
        let mut view = TreeView::new(20.0, 100.0);
        assert!(view.toggle_directory(&tree, "src"));
        assert!(view.is_expanded("src"));
        assert!(view.toggle_directory(&tree, "src"));
        assert!(!view.is_expanded("src"));
        assert!(!view.toggle_directory(&tree, "README.md"));
    }
}
