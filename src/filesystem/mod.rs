//! In-memory filesystem tree with access control.
//!
//! This module provides a tree of directories and files stored in a slot
//! arena, where directory attributes (access level, last-modified, size)
//! are derived from the children. Mutation goes through the
//! [`FileSystem`] facade, which enforces the two-level access model.

mod node;
mod path;
mod render;
mod search;
mod tree;

pub use node::{AccessLevel, NodeId, ParseAccessLevelError};
pub use tree::{FileSystem, FsError};
