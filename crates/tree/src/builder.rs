use crate::types::TreeNode;
use lens_protocol::{normalize_source_path, source_segments};
use serde::Serialize;
use std::borrow::Borrow;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Non-fatal conflict encountered while building.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeWarning {
    /// A file node had to become a directory for a longer path.
    FileBecameDirectory { path: String },
    /// A directory node was replaced by a later file entry.
    DirectoryBecameFile { path: String, dropped_files: usize },
    /// The path had no usable segments.
    EmptyPath { raw: String },
}

impl fmt::Display for TreeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FileBecameDirectory { path } => {
                write!(f, "'{path}' was a file but is needed as a directory; converted")
            }
            Self::DirectoryBecameFile {
                path,
                dropped_files,
            } => write!(
                f,
                "'{path}' was a directory but a later entry names it as a file; \
                 converted and dropped {dropped_files} nested file(s)"
            ),
            Self::EmptyPath { raw } => write!(f, "ignoring empty source path {raw:?}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltTree {
    pub root: TreeNode,
    pub warnings: Vec<TreeWarning>,
}

/// Incremental tree construction. Entries are applied in call order, so on a
/// File/Directory collision the later entry wins.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    children: BTreeMap<String, TreeNode>,
    warnings: Vec<TreeWarning>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<L>(&mut self, raw_path: &str, lines: L)
    where
        L: IntoIterator,
        L::Item: Borrow<u32>,
    {
        let segments = segments(raw_path);
        let Some((leaf, dirs)) = segments.split_last() else {
            self.warn(TreeWarning::EmptyPath {
                raw: raw_path.to_string(),
            });
            return;
        };

        let lines: BTreeSet<u32> = lines.into_iter().map(|l| *l.borrow()).collect();
        let mut prefix = String::new();
        insert_at(
            &mut self.children,
            &mut prefix,
            dirs,
            leaf,
            lines,
            &mut self.warnings,
        );
    }

    pub fn finish(self) -> BuiltTree {
        BuiltTree {
            root: TreeNode::Directory {
                path: String::new(),
                children: self.children,
            },
            warnings: self.warnings,
        }
    }

    fn warn(&mut self, warning: TreeWarning) {
        log::warn!("{warning}");
        self.warnings.push(warning);
    }
}

/// Build a whole tree from a flat path → lines map.
///
/// Entries are merged by normalized path and applied in path order, so the
/// result does not depend on the caller's iteration order.
pub fn build_tree<I, P, L>(entries: I) -> BuiltTree
where
    I: IntoIterator<Item = (P, L)>,
    P: AsRef<str>,
    L: IntoIterator,
    L::Item: Borrow<u32>,
{
    let mut merged: BTreeMap<String, BTreeSet<u32>> = BTreeMap::new();
    let mut builder = TreeBuilder::new();
    for (path, lines) in entries {
        let key = normalize_source_path(path.as_ref());
        if key.is_empty() {
            builder.warn(TreeWarning::EmptyPath {
                raw: path.as_ref().to_string(),
            });
            continue;
        }
        merged
            .entry(key)
            .or_default()
            .extend(lines.into_iter().map(|l| *l.borrow()));
    }

    for (path, lines) in &merged {
        builder.insert(path, lines);
    }
    let built = builder.finish();
    log::debug!(
        "Built source tree: {} files, {} warnings",
        built.root.file_count(),
        built.warnings.len()
    );
    built
}

fn segments(raw: &str) -> Vec<&str> {
    source_segments(raw).collect()
}

fn insert_at(
    level: &mut BTreeMap<String, TreeNode>,
    prefix: &mut String,
    dirs: &[&str],
    leaf: &str,
    lines: BTreeSet<u32>,
    warnings: &mut Vec<TreeWarning>,
) {
    let Some((segment, rest)) = dirs.split_first() else {
        insert_leaf(level, prefix, leaf, lines, warnings);
        return;
    };

    push_segment(prefix, segment);
    let entry = level
        .entry((*segment).to_string())
        .or_insert_with(|| TreeNode::directory(prefix.clone()));
    if let TreeNode::File { path, .. } = entry {
        let path = std::mem::take(path);
        let warning = TreeWarning::FileBecameDirectory { path: path.clone() };
        log::warn!("{warning}");
        warnings.push(warning);
        *entry = TreeNode::directory(path);
    }
    if let TreeNode::Directory { children, .. } = entry {
        insert_at(children, prefix, rest, leaf, lines, warnings);
    }
}

fn insert_leaf(
    level: &mut BTreeMap<String, TreeNode>,
    prefix: &mut String,
    leaf: &str,
    lines: BTreeSet<u32>,
    warnings: &mut Vec<TreeWarning>,
) {
    push_segment(prefix, leaf);
    let path = std::mem::take(prefix);
    match level.get_mut(leaf) {
        None => {
            level.insert(
                leaf.to_string(),
                TreeNode::File {
                    path,
                    lines: lines.into_iter().collect(),
                },
            );
        }
        Some(node) => match node {
            TreeNode::File {
                lines: existing, ..
            } => {
                let merged: BTreeSet<u32> = existing.iter().copied().chain(lines).collect();
                *existing = merged.into_iter().collect();
            }
            TreeNode::Directory { .. } => {
                let warning = TreeWarning::DirectoryBecameFile {
                    path: node.path().to_string(),
                    dropped_files: node.file_count(),
                };
                log::warn!("{warning}");
                warnings.push(warning);
                *node = TreeNode::File {
                    path,
                    lines: lines.into_iter().collect(),
                };
            }
        },
    }
}

fn push_segment(prefix: &mut String, segment: &str) {
    if !prefix.is_empty() {
        prefix.push('/');
    }
    prefix.push_str(segment);
}
