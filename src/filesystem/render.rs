use snafu::{OptionExt, ensure};

use super::node::{NodeId, NodeKind};
use super::tree::{AccessViolationSnafu, FileSystem, FsError, InvalidPathSnafu};

impl FileSystem {
    /// One-line description of a single node. Directory sizes are summed
    /// from the subtree on the spot.
    pub fn details(&self, id: NodeId) -> String {
        let node = self.entry(id);
        let modified = node
            .last_modified()
            .map(|stamp| stamp.format("%d.%m.%Y %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        let label = match node.kind() {
            NodeKind::File { .. } => "File",
            NodeKind::Directory { .. } => "Directory",
        };
        format!(
            "{label}: {} | Size: {} bytes | Modified: {modified} | Access: {}",
            node.display_name(),
            self.size_of(id),
            node.access()
        )
    }

    /// Detail lines for the direct children of the directory at `path`, one
    /// level deep. Fails when the directory is `SYSTEM` protected.
    pub fn list_contents(&self, path: impl AsRef<str>) -> Result<Vec<String>, FsError> {
        let path = path.as_ref();
        let dir = self.resolve_dir(path).context(InvalidPathSnafu { path })?;
        ensure!(
            self.entry(dir).access().is_user(),
            AccessViolationSnafu {
                path: self.full_path(dir),
                reason: "directory access level is SYSTEM",
            }
        );
        Ok(self
            .children(dir)
            .iter()
            .map(|&child| self.details(child))
            .collect())
    }

    /// The whole tree as an indented listing, root first, two spaces per
    /// level. Meant as an administrative view, so it ignores access levels
    /// and shows `SYSTEM` subtrees as well.
    pub fn render_tree(&self) -> String {
        let mut out = String::new();
        self.render_subtree(self.root(), 0, &mut out);
        out
    }

    fn render_subtree(&self, id: NodeId, depth: usize, out: &mut String) {
        out.push_str(&"  ".repeat(depth));
        out.push_str(&self.details(id));
        out.push('\n');
        for &child in self.children(id) {
            self.render_subtree(child, depth + 1, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filesystem::node::AccessLevel;
    use chrono::{DateTime, TimeZone, Utc};

    fn date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
    }

    fn sample() -> FileSystem {
        let mut fs = FileSystem::new();
        let docs = fs.add_directory("/", "docs", AccessLevel::User).unwrap();
        fs.add_file_in(
            docs,
            "readme",
            "txt",
            120,
            AccessLevel::User,
            date(2024, 5, 1),
        )
        .unwrap();
        fs.add_file_in(docs, "notes", "md", 40, AccessLevel::System, date(2024, 3, 2))
            .unwrap();
        fs
    }

    #[test]
    fn file_details_carry_every_attribute() {
        let fs = sample();
        let docs = fs.resolve_dir("/docs").unwrap();
        let file = fs.child_file_named(docs, "readme").unwrap();
        assert_eq!(
            fs.details(file),
            "File: readme.txt | Size: 120 bytes | Modified: 01.05.2024 00:00 | Access: USER"
        );
    }

    #[test]
    fn directory_details_sum_the_subtree_size() {
        let fs = sample();
        let docs = fs.resolve_dir("/docs").unwrap();
        assert_eq!(
            fs.details(docs),
            "Directory: docs | Size: 160 bytes | Modified: 01.05.2024 00:00 | Access: USER"
        );
    }

    #[test]
    fn unmodified_directory_shows_a_dash() {
        let mut fs = FileSystem::new();
        let empty = fs.add_directory("/", "empty", AccessLevel::User).unwrap();
        fs.add_file("/empty", "gone", "txt", 1, AccessLevel::User, date(2024, 5, 1))
            .unwrap();
        fs.remove_file("/empty", "gone").unwrap();
        assert_eq!(
            fs.details(empty),
            "Directory: empty | Size: 0 bytes | Modified: - | Access: USER"
        );
    }

    #[test]
    fn list_contents_is_one_level_deep() {
        let mut fs = FileSystem::new();
        fs.add_directory("/", "docs", AccessLevel::User).unwrap();
        fs.add_directory("/docs", "sub", AccessLevel::User).unwrap();
        fs.add_file("/docs/sub", "deep", "txt", 5, AccessLevel::User, date(2024, 5, 1))
            .unwrap();
        fs.add_file("/docs", "top", "txt", 1, AccessLevel::User, date(2024, 5, 1))
            .unwrap();

        let lines = fs.list_contents("/docs").unwrap();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Directory: sub"));
        assert!(lines[1].starts_with("File: top.txt"));
    }

    #[test]
    fn listing_a_single_file_directory_yields_one_line() {
        let mut fs = FileSystem::new();
        fs.add_directory("/", "docs", AccessLevel::User).unwrap();
        fs.add_file("/docs", "readme", "txt", 120, AccessLevel::User, date(2024, 5, 1))
            .unwrap();

        let lines = fs.list_contents("/docs").unwrap();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("File: readme.txt | Size: 120 bytes"));
    }

    #[test]
    fn list_contents_of_a_system_directory_is_rejected() {
        let mut fs = FileSystem::new();
        fs.add_directory("/", "sys", AccessLevel::System).unwrap();
        fs.add_file("/sys", "core", "bin", 500, AccessLevel::System, date(2024, 5, 1))
            .unwrap();

        let err = fs.list_contents("/sys").unwrap_err();
        assert!(matches!(err, FsError::AccessViolation { .. }));
    }

    #[test]
    fn list_contents_of_a_missing_path_is_an_invalid_path() {
        let fs = FileSystem::new();
        let err = fs.list_contents("/ghost").unwrap_err();
        assert!(matches!(err, FsError::InvalidPath { path } if path == "/ghost"));
    }

    #[test]
    fn render_tree_indents_two_spaces_per_level() {
        let fs = sample();
        let rendered = fs.render_tree();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("Directory: root"));
        assert!(lines[1].starts_with("  Directory: docs"));
        assert!(lines[2].starts_with("    File: readme.txt"));
        assert!(lines[3].starts_with("    File: notes.md"));
    }

    #[test]
    fn render_tree_shows_system_subtrees() {
        let mut fs = FileSystem::new();
        fs.add_directory("/", "sys", AccessLevel::System).unwrap();
        fs.add_file("/sys", "core", "bin", 500, AccessLevel::System, date(2024, 5, 1))
            .unwrap();
        // Listing the same directory is refused, the full view is not.
        assert!(fs.list_contents("/sys").is_err());

        let rendered = fs.render_tree();
        assert!(rendered.contains("Directory: sys"));
        assert!(rendered.contains("File: core.bin"));
    }
}
