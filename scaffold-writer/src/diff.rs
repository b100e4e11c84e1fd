//! Unified diff between a rendered tree and a destination on disk.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use similar::TextDiff;

use scaffold_renderer::{OutputContent, OutputTree};

use crate::error::{io_err, WriteError};

/// A single rendered file diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiff {
    /// Path relative to the destination.
    pub path: PathBuf,
    /// The file does not exist on disk yet.
    pub is_new: bool,
    pub unified_diff: String,
}

/// Compare `tree` with what is under `destination`.
///
/// No files are written. Missing files diff against `/dev/null`, so a new
/// empty file still gets its `---`/`+++` headers; differing binary files are
/// reported with a single line.
pub fn diff_tree(tree: &OutputTree, destination: &Path) -> Result<Vec<FileDiff>, WriteError> {
    let mut diffs = Vec::new();
    for (rel, file) in tree.iter() {
        let path = destination.join(rel);
        let existing = read_existing(&path)?;
        let is_new = existing.is_none();
        let existing = existing.unwrap_or_default();

        let old_header = if is_new {
            "/dev/null".to_string()
        } else {
            format!("a/{}", rel.display())
        };
        let new_header = format!("b/{}", rel.display());
        let unified_diff = match (&file.content, std::str::from_utf8(&existing)) {
            (OutputContent::Text(rendered), Ok(on_disk)) => {
                let on_disk = normalize_line_endings(on_disk);
                if on_disk == *rendered && !is_new {
                    continue;
                }
                let hunks = TextDiff::from_lines(on_disk.as_str(), rendered.as_str())
                    .unified_diff()
                    .header(&old_header, &new_header)
                    .context_radius(3)
                    .to_string();
                if hunks.is_empty() {
                    // New empty file: there are no hunks, keep the headers.
                    format!("--- {old_header}\n+++ {new_header}\n")
                } else {
                    hunks
                }
            }
            _ => {
                if existing == file.as_bytes() && !is_new {
                    continue;
                }
                format!("Binary files {old_header} and {new_header} differ\n")
            }
        };

        diffs.push(FileDiff {
            path: rel.clone(),
            is_new,
            unified_diff,
        });
    }
    Ok(diffs)
}

fn read_existing(path: &Path) -> Result<Option<Vec<u8>>, WriteError> {
    match std::fs::read(path) {
        Ok(content) => Ok(Some(content)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(io_err(path, err)),
    }
}

fn normalize_line_endings(content: &str) -> String {
    content.replace("\r\n", "\n")
}
