use super::node::{NodeId, NodeKind};
use super::tree::FileSystem;

impl FileSystem {
    /// Walks the whole tree in pre-order, root first, children in
    /// insertion order.
    pub fn iter_preorder(&self) -> PreOrder<'_> {
        PreOrder {
            fs: self,
            stack: vec![self.root()],
        }
    }

    /// All nodes, files and directories alike, whose name (extension not
    /// counted) matches case-insensitively. Pre-order, so an ancestor always
    /// precedes its descendants in the result.
    pub fn search_by_name(&self, name: impl AsRef<str>) -> Vec<NodeId> {
        let needle = name.as_ref().to_lowercase();
        self.iter_preorder()
            .filter(|&id| self.entry(id).name().to_lowercase() == needle)
            .collect()
    }

    /// All files whose extension matches case-insensitively. Directories
    /// never match, whatever their name.
    pub fn search_by_extension(&self, extension: impl AsRef<str>) -> Vec<NodeId> {
        let needle = extension.as_ref().to_lowercase();
        self.iter_preorder()
            .filter(|&id| match self.entry(id).kind() {
                NodeKind::File { extension, .. } => extension.to_lowercase() == needle,
                NodeKind::Directory { .. } => false,
            })
            .collect()
    }
}

/// Depth-first pre-order traversal over the arena.
pub struct PreOrder<'a> {
    fs: &'a FileSystem,
    stack: Vec<NodeId>,
}

impl Iterator for PreOrder<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        // Reversed push keeps siblings in insertion order on a LIFO stack.
        self.stack
            .extend(self.fs.children(id).iter().rev().copied());
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filesystem::node::AccessLevel;
    use crate::filesystem::tree::ROOT_NAME;
    use chrono::{DateTime, TimeZone, Utc};

    fn date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
    }

    /// root { docs { readme.txt, Readme.md, media { readme.txt } }, txt { notes.txt } }
    fn sample() -> FileSystem {
        let mut fs = FileSystem::new();
        fs.add_directory("/", "docs", AccessLevel::User).unwrap();
        fs.add_file("/docs", "readme", "txt", 10, AccessLevel::User, date(2024, 5, 1))
            .unwrap();
        fs.add_file("/docs", "Readme", "md", 20, AccessLevel::User, date(2024, 5, 1))
            .unwrap();
        fs.add_directory("/docs", "media", AccessLevel::User)
            .unwrap();
        fs.add_file("/docs/media", "readme", "txt", 30, AccessLevel::User, date(2024, 5, 1))
            .unwrap();
        fs.add_directory("/", "txt", AccessLevel::User).unwrap();
        fs.add_file("/txt", "notes", "txt", 40, AccessLevel::User, date(2024, 5, 1))
            .unwrap();
        fs
    }

    #[test]
    fn preorder_visits_parents_before_children() {
        let fs = sample();
        let names: Vec<String> = fs
            .iter_preorder()
            .map(|id| fs.entry(id).display_name())
            .collect();
        assert_eq!(
            names,
            [
                "root",
                "docs",
                "readme.txt",
                "Readme.md",
                "media",
                "readme.txt",
                "txt",
                "notes.txt"
            ]
        );
    }

    #[test]
    fn search_by_name_ignores_case() {
        let fs = sample();
        let hits = fs.search_by_name("README");
        let paths: Vec<String> = hits.iter().map(|&id| fs.full_path(id)).collect();
        assert_eq!(
            paths,
            [
                "root/docs/readme.txt",
                "root/docs/Readme.md",
                "root/docs/media/readme.txt"
            ]
        );
    }

    #[test]
    fn search_by_name_matches_directories_too() {
        let fs = sample();
        let hits = fs.search_by_name("media");
        assert_eq!(hits.len(), 1);
        assert!(fs.entry(hits[0]).kind().is_directory());
    }

    #[test]
    fn search_by_name_can_match_the_root() {
        let fs = sample();
        let hits = fs.search_by_name(ROOT_NAME);
        assert_eq!(hits, [fs.root()]);
    }

    #[test]
    fn search_by_name_without_matches_is_empty() {
        let fs = sample();
        assert!(fs.search_by_name("ghost").is_empty());
    }

    #[test]
    fn search_by_extension_ignores_case_and_skips_directories() {
        let fs = sample();
        // The "txt" directory must not show up among .txt files.
        let hits = fs.search_by_extension("TXT");
        let paths: Vec<String> = hits.iter().map(|&id| fs.full_path(id)).collect();
        assert_eq!(
            paths,
            [
                "root/docs/readme.txt",
                "root/docs/media/readme.txt",
                "root/txt/notes.txt"
            ]
        );
        assert!(hits.iter().all(|&id| fs.entry(id).kind().is_file()));
    }

    #[test]
    fn search_by_extension_without_matches_is_empty() {
        let fs = sample();
        assert!(fs.search_by_extension("exe").is_empty());
    }
}
