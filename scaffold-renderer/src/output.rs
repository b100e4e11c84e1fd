//! Rendered output tree.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputContent {
    Text(String),
    Binary(Vec<u8>),
}

/// One rendered file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    pub content: OutputContent,
    pub executable: bool,
    /// Template path the file was rendered from.
    pub source: String,
}

impl OutputFile {
    pub fn as_bytes(&self) -> &[u8] {
        match &self.content {
            OutputContent::Text(text) => text.as_bytes(),
            OutputContent::Binary(bytes) => bytes,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match &self.content {
            OutputContent::Text(text) => Some(text),
            OutputContent::Binary(_) => None,
        }
    }
}

/// Concrete files keyed by path relative to the destination directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputTree {
    files: BTreeMap<PathBuf, OutputFile>,
}

impl OutputTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the previous file at `path`, if any.
    pub(crate) fn insert(&mut self, path: PathBuf, file: OutputFile) -> Option<OutputFile> {
        self.files.insert(path, file)
    }

    pub fn get(&self, path: impl AsRef<Path>) -> Option<&OutputFile> {
        self.files.get(path.as_ref())
    }

    /// Files in ascending path order.
    pub fn iter(&self) -> impl Iterator<Item = (&PathBuf, &OutputFile)> {
        self.files.iter()
    }

    pub fn paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.files.keys()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl FromIterator<(PathBuf, OutputFile)> for OutputTree {
    fn from_iter<I: IntoIterator<Item = (PathBuf, OutputFile)>>(iter: I) -> Self {
        Self {
            files: iter.into_iter().collect(),
        }
    }
}
