//! Error types for scaffold-renderer.

use std::path::PathBuf;

use thiserror::Error;

use scaffold_core::ConfigError;

/// All errors that can arise from variable resolution and template rendering.
#[derive(Debug, Error)]
pub enum RenderError {
    /// A referenced variable has no bound value. `path` names where the
    /// first unresolved token was found.
    #[error("missing variable '{name}' referenced in {path}")]
    MissingVariable { name: String, path: String },

    /// Unbalanced delimiters, unsupported tags or expressions.
    #[error("malformed token in {path} at {line}:{column}: {message}")]
    MalformedToken {
        path: String,
        line: usize,
        column: usize,
        message: String,
    },

    /// A variable declared with `choices` resolved to something else.
    #[error("invalid value '{value}' for '{name}'; expected one of: {}", choices.join(", "))]
    InvalidChoice {
        name: String,
        value: String,
        choices: Vec<String>,
    },

    /// Two template entries render to the same output path.
    #[error("'{first}' and '{second}' both render to {}", path.display())]
    PathCollision {
        path: PathBuf,
        first: String,
        second: String,
    },

    /// A rendered path segment is empty, `.`/`..`, or contains a separator.
    #[error("template path '{path}' renders to an invalid path: {reason}")]
    InvalidOutputPath { path: String, reason: String },

    /// Tera template engine error.
    #[error("template engine error: {0}")]
    Tera(#[from] tera::Error),

    /// JSON serialization error (building tera context).
    #[error("context serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filesystem error while loading an on-disk template.
    #[error("template io error at {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },

    /// Manifest or config failure.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> RenderError {
    RenderError::Io {
        path: path.into(),
        source,
    }
}
