//! # Lens Tree
//!
//! Turns the flat `path → lines` map produced by the scanner into a
//! hierarchical Directory/File tree.
//!
//! ## Architecture
//!
//! ```text
//! path → lines
//!     │
//!     ├──> TreeBuilder
//!     │      ├─ split on '/'
//!     │      ├─ walk/create Directory nodes
//!     │      ├─ attach File leaf (sorted unique lines)
//!     │      └─ resolve File/Directory collisions (warnings, never errors)
//!     │
//!     └──> TreeNode (root Directory)
//!            └─ children: directories first, then files, each by name
//! ```
//!
//! Trees are rebuilt whole on every accepted scan and never patched in place.

mod builder;
mod render;
mod types;

pub use builder::{build_tree, BuiltTree, TreeBuilder, TreeWarning};
pub use render::render_tree;
pub use types::TreeNode;
