//! # scaffold-renderer
//!
//! Turns a template tree plus a variable mapping into a concrete output tree.
//! Rendering is pure: the writer crate puts the result on disk.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::collections::BTreeMap;
//! use scaffold_renderer::{resolve_variables, Renderer, Template};
//!
//! fn render_builtin() -> Result<(), scaffold_renderer::RenderError> {
//!     let template = Template::builtin()?;
//!     let overrides = BTreeMap::from([("author".to_string(), "Ada".to_string())]);
//!     let vars = resolve_variables(&template.manifest, &[overrides])?;
//!     let renderer = Renderer::new(template)?;
//!     for (path, file) in renderer.render(&vars)?.iter() {
//!         println!("{}: {} bytes", path.display(), file.as_bytes().len());
//!     }
//!     Ok(())
//! }
//! ```

pub mod builtin;
pub mod context;
pub mod engine;
pub mod error;
pub mod output;
pub mod token;
pub mod tree;

pub use scaffold_core::TemplateVariables;

pub use builtin::BUILTIN_NAME;
pub use context::{resolve_variables, to_tera_context};
pub use engine::{render_str, CheckReport, Renderer, TemplateEngine};
pub use error::RenderError;
pub use output::{OutputContent, OutputFile, OutputTree};
pub use tree::{EntryContent, Template, TemplateEntry, TemplateTree};
