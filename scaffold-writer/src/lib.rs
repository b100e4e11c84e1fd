//! # scaffold-writer
//!
//! Puts a rendered [`OutputTree`](scaffold_renderer::OutputTree) on disk.
//!
//! Call [`generate`] to resolve variables, render and write a template in
//! one go, [`write_tree`] to emit an already rendered tree, or [`diff_tree`]
//! to compare a rendered tree with an existing destination.

pub mod diff;
pub mod digest;
pub mod error;
pub mod pipeline;
pub mod writer;

pub use diff::{diff_tree, FileDiff};
pub use digest::{content_digest, tree_digest};
pub use error::WriteError;
pub use pipeline::{
    generate, generate_at, prepare_at, resolve_at, GenerateOutcome, GenerateRequest, Prepared,
    TemplateSource, VariableSources,
};
pub use writer::{atomic_write, write_tree, ExistingPolicy, WriteOptions, WriteReport, WriteResult};
