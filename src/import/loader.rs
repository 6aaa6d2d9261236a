use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use compio::{fs::File, io::AsyncReadExt, io::BufReader};
use snafu::prelude::*;
use std::{io::Cursor, path::Path};
use tracing::debug;

use crate::ext::BestEffortPathExt;
use crate::filesystem::{AccessLevel, FileSystem, FsError, ParseAccessLevelError};

const FIELD_SEPARATOR: &str = "##";
const DATE_FORMAT: &str = "%d.%m.%Y";

/// Seeds a [`FileSystem`] from the line-oriented import format.
///
/// A line starting with `\` creates a directory under the root, a
/// `name##dd.MM.yyyy##size##LEVEL` line creates a file in the most recently
/// created directory (the root before the first one). Blank lines are
/// skipped. The first malformed or rejected line stops the import and
/// leaves everything replayed so far in place.
pub struct Importer;

impl Importer {
    pub async fn load(
        fs: &mut FileSystem,
        path: impl AsRef<Path>,
    ) -> Result<ImportSummary, ImportError> {
        let path = path.as_ref();
        debug!("Opening import file: {}", path.best_effort_path_display());
        let file = File::open(path).await.context(ReadSnafu {
            file_path: path.best_effort_path_display(),
        })?;

        debug!("Reading import file");
        let cursor = Cursor::new(file);
        let mut reader = BufReader::new(cursor);
        let res = reader.read_to_string(String::new()).await;
        match res.0 {
            Ok(n) => debug!("Successfully read import file: {n} bytes"),
            _ => {
                res.0.context(ReadSnafu {
                    file_path: path.best_effort_path_display(),
                })?;
            }
        }
        Self::replay(fs, &res.1)
    }

    pub(crate) fn replay(
        fs: &mut FileSystem,
        contents: &str,
    ) -> Result<ImportSummary, ImportError> {
        let mut summary = ImportSummary::default();
        let mut current = fs.root();
        for (index, raw) in contents.lines().enumerate() {
            let number = index + 1;
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            match parse_record(line, number)? {
                ImportRecord::Directory { name } => {
                    current = fs
                        .add_directory_in(fs.root(), name, AccessLevel::User)
                        .context(ReplaySnafu { line: number })?;
                    summary.directories += 1;
                }
                ImportRecord::File {
                    name,
                    extension,
                    size,
                    access,
                    last_modified,
                } => {
                    fs.add_file_in(current, name, extension, size, access, last_modified)
                        .context(ReplaySnafu { line: number })?;
                    summary.files += 1;
                }
            }
        }
        debug!(
            "Replayed import: {} directories, {} files",
            summary.directories, summary.files
        );
        Ok(summary)
    }
}

/// Counts of what an import created.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub directories: usize,
    pub files: usize,
}

#[derive(Debug)]
enum ImportRecord {
    Directory {
        name: String,
    },
    File {
        name: String,
        extension: String,
        size: u64,
        access: AccessLevel,
        last_modified: DateTime<Utc>,
    },
}

fn parse_record(line: &str, number: usize) -> Result<ImportRecord, ImportError> {
    if let Some(name) = line.strip_prefix('\\') {
        let name = name.trim();
        ensure!(!name.is_empty(), EmptyDirectoryNameSnafu { line: number });
        return Ok(ImportRecord::Directory {
            name: name.to_string(),
        });
    }

    let fields: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
    ensure!(
        fields.len() == 4,
        FieldCountSnafu {
            line: number,
            found: fields.len(),
        }
    );

    let (name, extension) = split_file_name(fields[0].trim());
    let date = NaiveDate::parse_from_str(fields[1].trim(), DATE_FORMAT)
        .context(DateSnafu { line: number })?;
    let size = fields[2]
        .trim()
        .parse::<u64>()
        .context(SizeSnafu { line: number })?;
    let access = fields[3]
        .trim()
        .parse::<AccessLevel>()
        .context(LevelSnafu { line: number })?;

    Ok(ImportRecord::File {
        name: name.to_string(),
        extension: extension.to_string(),
        size,
        access,
        last_modified: date.and_time(NaiveTime::MIN).and_utc(),
    })
}

/// Splits at the last dot, so `archive.tar.gz` keeps `archive.tar` as the
/// name. No dot means no extension.
fn split_file_name(value: &str) -> (&str, &str) {
    value.rsplit_once('.').unwrap_or((value, ""))
}

#[derive(Debug, Snafu)]
pub enum ImportError {
    #[snafu(display("Failed to read the import file: {}", file_path))]
    ReadError {
        file_path: String,
        source: std::io::Error,
    },
    #[snafu(display("Line {line}: expected name##dd.MM.yyyy##size##LEVEL, got {found} field(s)"))]
    FieldCount { line: usize, found: usize },
    #[snafu(display("Line {line}: directory marker without a name"))]
    EmptyDirectoryName { line: usize },
    #[snafu(display("Line {line}: malformed modification date"))]
    Date {
        line: usize,
        source: chrono::ParseError,
    },
    #[snafu(display("Line {line}: malformed file size"))]
    Size {
        line: usize,
        source: std::num::ParseIntError,
    },
    #[snafu(display("Line {line}: malformed access level"))]
    Level {
        line: usize,
        source: ParseAccessLevelError,
    },
    #[snafu(display("Line {line}: the tree rejected the entry"))]
    Replay { line: usize, source: FsError },
}
