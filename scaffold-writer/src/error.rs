//! Error types for scaffold-writer.

use std::path::PathBuf;

use thiserror::Error;

use scaffold_core::ConfigError;
use scaffold_renderer::RenderError;

/// All errors that can arise while emitting a rendered tree.
#[derive(Debug, Error)]
pub enum WriteError {
    /// The destination exists and neither overwrite nor skip was requested.
    #[error("destination {} already exists (use --force or --skip-existing)", path.display())]
    DestinationExists { path: PathBuf },

    /// An error from variable resolution or rendering.
    #[error("render error: {0}")]
    Render(#[from] RenderError),

    /// User config, context file or replay failure.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience constructor for [`WriteError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> WriteError {
    WriteError::Io {
        path: path.into(),
        source,
    }
}
