use chrono::{DateTime, Utc};
use snafu::{OptionExt, Snafu, ensure, location};
use tracing::{debug, error, info, trace};

use super::node::{AccessLevel, Node, NodeId, NodeKind};

/// Name of the permanent top-level directory.
pub const ROOT_NAME: &str = "root";

/// Recoverable failures of the mutating and listing operations.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum FsError {
    #[snafu(display("Invalid path: '{path}'"))]
    InvalidPath { path: String },
    #[snafu(display("Access violation at '{path}': {reason}"))]
    AccessViolation { path: String, reason: String },
}

/// The in-memory tree and the single entry point for manipulating it.
///
/// Nodes live in a slot arena indexed by [`NodeId`]. The root directory
/// occupies slot 0 for the whole lifetime of the tree and cannot be removed.
/// Removal vacates slots and keeps them on a free list for reuse.
pub struct FileSystem {
    slots: Vec<Option<Node>>,
    free: Vec<usize>,
    root: NodeId,
}

impl Default for FileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystem {
    /// An empty tree holding only the root directory.
    pub fn new() -> Self {
        Self {
            slots: vec![Some(Node::directory(ROOT_NAME, Utc::now()))],
            free: Vec::new(),
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Child ids of `id` in insertion order, empty for files.
    ///
    /// Panics on a stale id.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.entry(id).children()
    }

    /// Number of live nodes, the root included.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// `true` while nothing but the root exists.
    pub fn is_empty(&self) -> bool {
        self.len() == 1
    }

    /// Borrows a node the caller knows is live.
    ///
    /// Panics on a stale or out-of-range id. Ids reached by traversal within
    /// the current borrow are always live.
    pub(crate) fn entry(&self, id: NodeId) -> &Node {
        self.slots[id.index()]
            .as_ref()
            .expect("node id references a vacated slot")
    }

    fn entry_mut(&mut self, id: NodeId) -> &mut Node {
        self.slots[id.index()]
            .as_mut()
            .expect("node id references a vacated slot")
    }

    /// Creates a directory under the directory at `path`.
    ///
    /// `requested` is accepted for symmetry with files but the stored level
    /// of a directory is always derived from its children, so a new, empty
    /// directory starts at `USER` regardless.
    pub fn add_directory(
        &mut self,
        path: impl AsRef<str>,
        name: impl Into<String>,
        requested: AccessLevel,
    ) -> Result<NodeId, FsError> {
        let path = path.as_ref();
        let parent = self.resolve_dir(path).context(InvalidPathSnafu { path })?;
        self.add_directory_in(parent, name, requested)
    }

    /// Creates a file with the given attributes under the directory at
    /// `path`.
    pub fn add_file(
        &mut self,
        path: impl AsRef<str>,
        name: impl Into<String>,
        extension: impl Into<String>,
        size: u64,
        access: AccessLevel,
        last_modified: DateTime<Utc>,
    ) -> Result<NodeId, FsError> {
        let path = path.as_ref();
        let parent = self.resolve_dir(path).context(InvalidPathSnafu { path })?;
        self.add_file_in(parent, name, extension, size, access, last_modified)
    }

    /// Removes the directory called `name` directly under `path`, with its
    /// whole subtree. Rejected when the directory itself or anything below
    /// it is `SYSTEM` protected.
    pub fn remove_directory(
        &mut self,
        path: impl AsRef<str>,
        name: impl AsRef<str>,
    ) -> Result<(), FsError> {
        let (path, name) = (path.as_ref(), name.as_ref());
        let parent = self.resolve_dir(path).context(InvalidPathSnafu { path })?;
        let target = self
            .child_directory_named(parent, name)
            .context(InvalidPathSnafu {
                path: joined(path, name),
            })?;
        ensure!(
            self.entry(target).access().is_user(),
            AccessViolationSnafu {
                path: self.full_path(target),
                reason: "directory access level is SYSTEM",
            }
        );
        ensure!(
            !self.subtree_contains_system(target),
            AccessViolationSnafu {
                path: self.full_path(target),
                reason: "subtree contains SYSTEM protected entries",
            }
        );
        self.detach(parent, target);
        self.recalculate_from(parent);
        info!("Removed directory '{name}' from '{path}'");
        Ok(())
    }

    /// Removes the first file called `name` (extension not counted)
    /// directly under `path`.
    pub fn remove_file(
        &mut self,
        path: impl AsRef<str>,
        name: impl AsRef<str>,
    ) -> Result<(), FsError> {
        let (path, name) = (path.as_ref(), name.as_ref());
        let parent = self.resolve_dir(path).context(InvalidPathSnafu { path })?;
        let target = self
            .child_file_named(parent, name)
            .context(InvalidPathSnafu {
                path: joined(path, name),
            })?;
        ensure!(
            self.entry(target).access().is_user(),
            AccessViolationSnafu {
                path: self.full_path(target),
                reason: "file access level is SYSTEM",
            }
        );
        self.detach(parent, target);
        self.recalculate_from(parent);
        info!("Removed file '{name}' from '{path}'");
        Ok(())
    }

    pub(crate) fn add_directory_in(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        requested: AccessLevel,
    ) -> Result<NodeId, FsError> {
        self.ensure_modifiable(parent)?;
        let name = name.into();
        if requested.is_system() {
            debug!("Directory '{name}' starts empty, its derived access level is USER");
        }
        let id = self.attach(parent, Node::directory(name.clone(), Utc::now()));
        self.recalculate_from(parent);
        info!("Added directory '{name}' under '{}'", self.full_path(parent));
        Ok(id)
    }

    pub(crate) fn add_file_in(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        extension: impl Into<String>,
        size: u64,
        access: AccessLevel,
        last_modified: DateTime<Utc>,
    ) -> Result<NodeId, FsError> {
        self.ensure_modifiable(parent)?;
        let node = Node::file(name, extension, size, access, last_modified);
        let display_name = node.display_name();
        let id = self.attach(parent, node);
        self.recalculate_from(parent);
        info!(
            "Added file '{display_name}' under '{}'",
            self.full_path(parent)
        );
        Ok(id)
    }

    /// Size in bytes. For a directory this walks the subtree and sums every
    /// file, so it always reflects the current contents.
    pub fn size_of(&self, id: NodeId) -> u64 {
        match self.entry(id).kind() {
            NodeKind::File { size, .. } => *size,
            NodeKind::Directory { children } => {
                children.iter().map(|&child| self.size_of(child)).sum()
            }
        }
    }

    /// Display names from the root down to `id`, joined with `/`.
    pub fn full_path(&self, id: NodeId) -> String {
        let mut segments = vec![self.entry(id).display_name()];
        let mut current = id;
        while let Some(parent) = self.entry(current).parent() {
            current = parent;
            segments.push(self.entry(current).display_name());
        }
        segments.reverse();
        segments.join("/")
    }

    /// First direct child directory with exactly this name.
    pub(crate) fn child_directory_named(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.entry(parent).children().iter().copied().find(|&id| {
            let node = self.entry(id);
            node.kind().is_directory() && node.name() == name
        })
    }

    /// First direct child file whose name (extension not counted) matches.
    pub(crate) fn child_file_named(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.entry(parent).children().iter().copied().find(|&id| {
            let node = self.entry(id);
            node.kind().is_file() && node.name() == name
        })
    }

    fn ensure_modifiable(&self, dir: NodeId) -> Result<(), FsError> {
        ensure!(
            self.entry(dir).access().is_user(),
            AccessViolationSnafu {
                path: self.full_path(dir),
                reason: "directory access level is SYSTEM",
            }
        );
        Ok(())
    }

    fn attach(&mut self, parent: NodeId, mut node: Node) -> NodeId {
        node.parent = Some(parent);
        let id = self.allocate(node);
        if let NodeKind::Directory { children } = &mut self.entry_mut(parent).kind {
            children.push(id);
        } else {
            error!(
                "Assumption that attach targets are directories failed {}",
                location!()
            );
        }
        id
    }

    fn detach(&mut self, parent: NodeId, child: NodeId) {
        if let NodeKind::Directory { children } = &mut self.entry_mut(parent).kind {
            children.retain(|&id| id != child);
        }
        self.entry_mut(child).parent = None;
        self.free_subtree(child);
    }

    fn allocate(&mut self, node: Node) -> NodeId {
        match self.free.pop() {
            Some(index) => {
                self.slots[index] = Some(node);
                NodeId(index)
            }
            None => {
                self.slots.push(Some(node));
                NodeId(self.slots.len() - 1)
            }
        }
    }

    fn free_subtree(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.slots[current.index()].take() {
                self.free.push(current.index());
                stack.extend(node.children().iter().copied());
            }
        }
    }

    /// Re-derives access level and last-modified of `start` and of every
    /// ancestor up to the root.
    fn recalculate_from(&mut self, start: NodeId) {
        let mut current = Some(start);
        while let Some(id) = current {
            self.recalculate(id);
            current = self.entry(id).parent();
        }
    }

    fn recalculate(&mut self, id: NodeId) {
        let children = self.entry(id).children().to_vec();
        let access = if !children.is_empty()
            && children
                .iter()
                .all(|&child| self.entry(child).access().is_system())
        {
            AccessLevel::System
        } else {
            AccessLevel::User
        };
        let last_modified = children
            .iter()
            .filter_map(|&child| self.entry(child).last_modified())
            .max();
        let node = self.entry_mut(id);
        node.access = access;
        node.last_modified = last_modified;
        trace!(
            "Recalculated '{}': {} children, access level {access}",
            node.name,
            children.len()
        );
    }

    fn subtree_contains_system(&self, id: NodeId) -> bool {
        let mut stack = self.entry(id).children().to_vec();
        while let Some(current) = stack.pop() {
            let node = self.entry(current);
            if node.access().is_system() {
                return true;
            }
            stack.extend(node.children().iter().copied());
        }
        false
    }
}

fn joined(path: &str, name: &str) -> String {
    format!("{}/{}", path.trim_end_matches('/'), name)
}
