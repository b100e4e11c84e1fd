//! Template trees — the unrendered file set plus its manifest.

use std::path::Path;

use walkdir::WalkDir;

use scaffold_core::{manifest, TemplateManifest};

use crate::builtin;
use crate::error::{io_err, RenderError};

/// Content of one template entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryContent {
    Text(String),
    /// Copied byte-for-byte; never scanned or rendered.
    Binary(Vec<u8>),
}

/// One file of a template tree. `path` is `/`-separated and may contain tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateEntry {
    pub path: String,
    pub content: EntryContent,
    pub executable: bool,
}

impl TemplateEntry {
    pub fn text(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: EntryContent::Text(content.into()),
            executable: false,
        }
    }
}

/// Ordered set of template entries, sorted by template path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateTree {
    entries: Vec<TemplateEntry>,
}

impl TemplateTree {
    /// Sorts by path; a later entry with a duplicate path replaces the earlier one.
    pub fn new(entries: Vec<TemplateEntry>) -> Self {
        let mut entries = entries;
        entries.reverse();
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        entries.dedup_by(|a, b| a.path == b.path);
        Self { entries }
    }

    pub fn entries(&self) -> &[TemplateEntry] {
        &self.entries
    }

    pub fn get(&self, path: &str) -> Option<&TemplateEntry> {
        self.entries
            .binary_search_by(|e| e.path.as_str().cmp(path))
            .ok()
            .map(|i| &self.entries[i])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A manifest together with the tree it describes.
#[derive(Debug, Clone)]
pub struct Template {
    pub manifest: TemplateManifest,
    pub tree: TemplateTree,
}

impl Template {
    pub fn new(manifest: TemplateManifest, tree: TemplateTree) -> Self {
        Self { manifest, tree }
    }

    /// The template embedded in the binary.
    pub fn builtin() -> Result<Self, RenderError> {
        builtin::template()
    }

    /// Load a template from a directory holding `scaffold.yaml` and the tree.
    ///
    /// The manifest itself and any `.git` directory are not part of the tree.
    pub fn from_dir(dir: &Path) -> Result<Self, RenderError> {
        let manifest = manifest::load_manifest(dir)?;

        let mut entries = Vec::new();
        for entry in WalkDir::new(dir)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || e.file_name() != ".git")
        {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(dir).to_path_buf();
                io_err(path, e.into())
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let rel = path.strip_prefix(dir).unwrap_or(path);
            let name = normalize_template_name(rel);
            if name == manifest::MANIFEST_FILE {
                continue;
            }
            let meta = entry.metadata().map_err(|e| io_err(path, e.into()))?;
            let bytes = std::fs::read(path).map_err(|e| io_err(path, e))?;
            let content = if is_binary(&bytes) {
                EntryContent::Binary(bytes)
            } else {
                match String::from_utf8(bytes) {
                    Ok(text) => EntryContent::Text(text),
                    Err(e) => EntryContent::Binary(e.into_bytes()),
                }
            };
            entries.push(TemplateEntry {
                path: name,
                content,
                executable: is_executable(&meta),
            });
        }
        tracing::debug!("loaded {} entries from {}", entries.len(), dir.display());
        Ok(Self::new(manifest, TemplateTree::new(entries)))
    }
}

// ---------------------------------------------------------------------------
// Template loading helpers
// ---------------------------------------------------------------------------

fn normalize_template_name(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// NUL byte in the first 8 KiB.
fn is_binary(content: &[u8]) -> bool {
    let check_len = content.len().min(8192);
    content[..check_len].contains(&0)
}

#[cfg(unix)]
fn is_executable(meta: &std::fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_meta: &std::fs::Metadata) -> bool {
    false
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
