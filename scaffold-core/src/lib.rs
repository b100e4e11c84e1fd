//! Scaffold core library — template domain types, manifest loading, user
//! config and replay persistence, errors.
//!
//! - [`types`] — newtypes and domain structs
//! - [`error`] — [`ConfigError`]
//! - [`manifest`] — `scaffold.yaml` load / validate
//! - [`config`] — user config, context files, replay records

pub mod config;
pub mod error;
pub mod manifest;
pub mod types;

pub use error::ConfigError;
pub use types::{
    PathCondition, Predicate, Replay, TemplateManifest, TemplateVariables, VariableName,
    VariableSpec,
};
