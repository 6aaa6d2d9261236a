use chrono::{DateTime, Utc};
use derive_more::{Display, IsVariant};
use snafu::Snafu;

/// Index of a node inside the [`FileSystem`](super::FileSystem) arena.
///
/// Plain slot index without a generation counter. Removing a subtree vacates
/// its slots and a later insertion may reuse them, so ids must not be held
/// across removals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Two-level protection flag carried by every node.
///
/// `User` entries may be modified and deleted, `System` entries may not.
/// Files keep whatever level they were created with; directories derive
/// theirs from their children on every recalculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IsVariant)]
pub enum AccessLevel {
    #[display("USER")]
    User,
    #[display("SYSTEM")]
    System,
}

impl std::str::FromStr for AccessLevel {
    type Err = ParseAccessLevelError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.eq_ignore_ascii_case("USER") {
            Ok(AccessLevel::User)
        } else if trimmed.eq_ignore_ascii_case("SYSTEM") {
            Ok(AccessLevel::System)
        } else {
            ParseAccessLevelSnafu { value: trimmed }.fail()
        }
    }
}

#[derive(Debug, Snafu)]
#[snafu(display("Access level must be USER or SYSTEM, got '{value}'"))]
pub struct ParseAccessLevelError {
    value: String,
}

/// Payload distinguishing the two node flavours.
#[derive(Debug, IsVariant)]
pub enum NodeKind {
    File {
        /// Extension without the leading dot, possibly empty.
        extension: String,
        size: u64,
    },
    Directory {
        /// Child ids in insertion order. Duplicate names are allowed.
        children: Vec<NodeId>,
    },
}

/// A single entry of the tree arena.
#[derive(Debug)]
pub struct Node {
    pub(crate) name: String,
    pub(crate) access: AccessLevel,
    pub(crate) last_modified: Option<DateTime<Utc>>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) kind: NodeKind,
}

impl Node {
    /// A fresh, empty directory. Starts at `User` because the derived level
    /// of a childless directory is always `User`.
    pub(crate) fn directory(name: impl Into<String>, stamp: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            access: AccessLevel::User,
            last_modified: Some(stamp),
            parent: None,
            kind: NodeKind::Directory {
                children: Vec::new(),
            },
        }
    }

    pub(crate) fn file(
        name: impl Into<String>,
        extension: impl Into<String>,
        size: u64,
        access: AccessLevel,
        last_modified: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.into(),
            access,
            last_modified: Some(last_modified),
            parent: None,
            kind: NodeKind::File {
                extension: extension.into(),
                size,
            },
        }
    }

    /// Name without the extension part.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn access(&self) -> AccessLevel {
        self.access
    }

    /// `None` on a directory whose subtree holds no files.
    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.last_modified
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// `name.extension` for files with an extension, the bare name otherwise.
    pub fn display_name(&self) -> String {
        match &self.kind {
            NodeKind::File { extension, .. } if !extension.is_empty() => {
                format!("{}.{}", self.name, extension)
            }
            _ => self.name.clone(),
        }
    }

    /// Child ids of a directory, empty for files.
    pub(crate) fn children(&self) -> &[NodeId] {
        match &self.kind {
            NodeKind::Directory { children } => children,
            NodeKind::File { .. } => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rstest::rstest;

    #[rstest]
    #[case("USER", AccessLevel::User)]
    #[case("user", AccessLevel::User)]
    #[case("  User  ", AccessLevel::User)]
    #[case("SYSTEM", AccessLevel::System)]
    #[case("system", AccessLevel::System)]
    #[case(" System", AccessLevel::System)]
    fn access_level_parses_case_insensitively(
        #[case] input: &str,
        #[case] expected: AccessLevel,
    ) {
        assert_eq!(input.parse::<AccessLevel>().unwrap(), expected);
    }

    #[rstest]
    #[case("ADMIN")]
    #[case("")]
    #[case("USERS")]
    #[case("SYS TEM")]
    fn access_level_rejects_unknown_values(#[case] input: &str) {
        assert!(input.parse::<AccessLevel>().is_err());
    }

    #[test]
    fn access_level_displays_wire_form() {
        assert_eq!(AccessLevel::User.to_string(), "USER");
        assert_eq!(AccessLevel::System.to_string(), "SYSTEM");
    }

    #[test]
    fn display_name_joins_stem_and_extension() {
        let file = Node::file("readme", "txt", 10, AccessLevel::User, Utc::now());
        assert_eq!(file.display_name(), "readme.txt");
    }

    #[test]
    fn display_name_skips_empty_extension() {
        let file = Node::file("Makefile", "", 10, AccessLevel::User, Utc::now());
        assert_eq!(file.display_name(), "Makefile");
    }

    #[test]
    fn display_name_of_directory_is_the_bare_name() {
        let dir = Node::directory("docs", Utc::now());
        assert_eq!(dir.display_name(), "docs");
    }

    #[test]
    fn fresh_directory_is_user_level_and_stamped() {
        let dir = Node::directory("docs", Utc::now());
        assert!(dir.access().is_user());
        assert!(dir.last_modified().is_some());
        assert!(dir.kind().is_directory());
        assert!(dir.children().is_empty());
    }
}
