//! Error types for scaffold-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from manifest, user config and replay operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure (file not found, permission denied, etc.).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization error (write/save path).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// YAML parse error on load — includes file path and line context from serde_yaml.
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The template directory has no `scaffold.yaml`.
    #[error("template manifest not found at {path}")]
    ManifestNotFound { path: PathBuf },

    /// The manifest parsed but is inconsistent.
    #[error("invalid template manifest {path}: {reason}")]
    InvalidManifest { path: PathBuf, reason: String },

    /// `--replay` requested but no replay record exists.
    #[error("no replay recorded at {path}")]
    ReplayNotFound { path: PathBuf },

    /// `dirs::home_dir()` returned `None` — cannot locate `~/.scaffold/`.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,
}
