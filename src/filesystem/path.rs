use tracing::debug;

use super::node::NodeId;
use super::tree::FileSystem;

impl FileSystem {
    /// Resolves a slash-delimited path to a directory id.
    ///
    /// Empty segments are skipped, so `/`, the empty string, `//` and a
    /// trailing slash all behave the same and the bare separators name the
    /// root. Segments match direct child directories by exact name; files
    /// never match. `None` when any segment fails to resolve.
    pub fn resolve_dir(&self, path: impl AsRef<str>) -> Option<NodeId> {
        let path = path.as_ref();
        let mut current = self.root();
        for segment in path.split('/').filter(|segment| !segment.is_empty()) {
            match self.child_directory_named(current, segment) {
                Some(next) => current = next,
                None => {
                    debug!("No directory named '{segment}' while resolving '{path}'");
                    return None;
                }
            }
        }
        Some(current)
    }
}
