use lens_protocol::source_segments;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Node of the source tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeNode {
    Directory {
        /// Slash-joined path from the root ("" for the root itself)
        path: String,
        children: BTreeMap<String, TreeNode>,
    },
    File {
        path: String,
        /// Sorted, unique, 1-based
        lines: Vec<u32>,
    },
}

impl Default for TreeNode {
    fn default() -> Self {
        Self::empty_root()
    }
}

impl TreeNode {
    pub fn empty_root() -> Self {
        Self::directory(String::new())
    }

    pub(crate) fn directory(path: String) -> Self {
        Self::Directory {
            path,
            children: BTreeMap::new(),
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Self::Directory { path, .. } | Self::File { path, .. } => path,
        }
    }

    /// Last path segment ("" for the root).
    pub fn name(&self) -> &str {
        let path = self.path();
        path.rsplit('/').next().unwrap_or(path)
    }

    pub const fn is_directory(&self) -> bool {
        matches!(self, Self::Directory { .. })
    }

    pub fn lines(&self) -> &[u32] {
        match self {
            Self::File { lines, .. } => lines,
            Self::Directory { .. } => &[],
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Directory { children, .. } => children.is_empty(),
            Self::File { .. } => false,
        }
    }

    /// Children in display order: directories first, then files, each group
    /// sorted by name.
    pub fn sorted_children(&self) -> Vec<&TreeNode> {
        match self {
            Self::Directory { children, .. } => {
                let (mut dirs, files): (Vec<&TreeNode>, Vec<&TreeNode>) =
                    children.values().partition(|node| node.is_directory());
                dirs.extend(files);
                dirs
            }
            Self::File { .. } => Vec::new(),
        }
    }

    /// Find a node by its slash-separated path.
    pub fn find(&self, path: &str) -> Option<&TreeNode> {
        let mut node = self;
        for segment in source_segments(path) {
            match node {
                Self::Directory { children, .. } => node = children.get(segment)?,
                Self::File { .. } => return None,
            }
        }
        Some(node)
    }

    pub fn find_file(&self, path: &str) -> Option<&TreeNode> {
        self.find(path).filter(|node| !node.is_directory())
    }

    /// Smallest known line of a file node.
    pub fn first_line(&self, path: &str) -> Option<u32> {
        self.find_file(path)?.lines().first().copied()
    }

    /// Directory paths from the top level down to the parent of `path`.
    pub fn ancestors_of(&self, path: &str) -> Vec<String> {
        let segments: Vec<&str> = source_segments(path).collect();
        let mut out = Vec::new();
        let mut node = self;
        for segment in segments.iter().take(segments.len().saturating_sub(1)) {
            let Self::Directory { children, .. } = node else {
                break;
            };
            let Some(child) = children.get(*segment) else {
                break;
            };
            if !child.is_directory() {
                break;
            }
            out.push(child.path().to_string());
            node = child;
        }
        out
    }

    pub fn file_count(&self) -> usize {
        match self {
            Self::Directory { children, .. } => children.values().map(Self::file_count).sum(),
            Self::File { .. } => 1,
        }
    }

    /// Visit file nodes in display order.
    pub fn visit_files<'a>(&'a self, visit: &mut impl FnMut(&'a TreeNode)) {
        match self {
            Self::Directory { .. } => {
                for child in self.sorted_children() {
                    child.visit_files(visit);
                }
            }
            Self::File { .. } => visit(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build_tree;
    use pretty_assertions::assert_eq;

    fn sample() -> TreeNode {
        build_tree([
            ("src/main.rs", vec![3u32, 1]),
            ("src/ui/button.tsx", vec![9]),
            ("README.md", vec![1]),
            ("src/a.rs", vec![2]),
        ])
        .root
    }

    #[test]
    fn directories_come_first() {
        let tree = sample();
        let src = tree.find("src").unwrap();
        let names: Vec<&str> = src.sorted_children().iter().map(|n| n.name()).collect();
        assert_eq!(names, vec!["ui", "a.rs", "main.rs"]);

        let top: Vec<&str> = tree.sorted_children().iter().map(|n| n.name()).collect();
        assert_eq!(top, vec!["src", "README.md"]);
    }

    #[test]
    fn lookup_helpers() {
        let tree = sample();
        assert_eq!(tree.first_line("src/main.rs"), Some(1));
        assert_eq!(tree.find_file("src"), None);
        assert_eq!(tree.find("src/main.rs/x"), None);
        assert_eq!(
            tree.ancestors_of("src/ui/button.tsx"),
            vec!["src".to_string(), "src/ui".to_string()]
        );
        assert!(tree.ancestors_of("README.md").is_empty());
        assert_eq!(tree.file_count(), 4);
    }

    #[test]
    fn visit_files_in_display_order() {
        let tree = sample();
        let mut seen = Vec::new();
        tree.visit_files(&mut |node| seen.push(node.path().to_string()));
        assert_eq!(
            seen,
            vec!["src/ui/button.tsx", "src/a.rs", "src/main.rs", "README.md"]
        );
    }

    #[test]
    fn serializes_as_tagged_union() {
        let tree = build_tree([("a.rs", vec![1u32])]).root;
        let json = serde_json::to_value(&tree).unwrap();
        assert_eq!(json["kind"], "directory");
        assert_eq!(json["children"]["a.rs"]["kind"], "file");
        assert_eq!(json["children"]["a.rs"]["lines"][0], 1);
    }
}
