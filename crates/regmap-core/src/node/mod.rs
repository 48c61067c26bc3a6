//! Elaborated register-tree model consumed read-only by the access layer.

/// Node variants, constructors, and path lookup.
pub mod tree;
/// Document-order traversal and per-node validation.
pub mod walk;

pub use tree::{Node, NodeBody, NodeCounts, NodeKind};
pub use walk::{validate_tree, MemoryRef, RegisterRef, Validation};

/// Separator between segments of a hierarchical node path.
pub const PATH_SEPARATOR: char = '.';

/// Joins a parent path and a child name.
#[must_use]
pub fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_owned()
    } else {
        format!("{parent}{PATH_SEPARATOR}{name}")
    }
}
