//! Generation pipeline shared by `scaffold new`, `scaffold diff` and `scaffold check`.
//!
//! ```text
//! user config ─┐
//! replay      ─┼─> resolve variables ─> render root ─> render tree ─> write ─> save replay
//! context file ┤
//! --var       ─┘
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::Utc;

use scaffold_core::config::{self, UserConfig};
use scaffold_core::{Replay, TemplateManifest, TemplateVariables};
use scaffold_renderer::{resolve_variables, OutputTree, Renderer, Template};

use crate::digest::tree_digest;
use crate::error::WriteError;
use crate::writer::{write_tree, WriteOptions, WriteReport};

/// Where the template comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    /// The template compiled into the binary.
    Builtin,
    /// A directory holding `scaffold.yaml`.
    Dir(PathBuf),
}

impl TemplateSource {
    pub fn load(&self) -> Result<Template, WriteError> {
        let template = match self {
            TemplateSource::Builtin => Template::builtin()?,
            TemplateSource::Dir(dir) => Template::from_dir(dir)?,
        };
        Ok(template)
    }
}

/// Inputs layered over the manifest defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableSources {
    /// `--var key=value`, highest precedence.
    pub overrides: BTreeMap<String, String>,
    pub context_file: Option<PathBuf>,
    /// Start from the replay record of the previous generation.
    pub use_replay: bool,
}

/// Resolve variables for `manifest`, reading user config, replay and context
/// file relative to `home`.
pub fn resolve_at(
    home: &Path,
    config: &UserConfig,
    manifest: &TemplateManifest,
    sources: &VariableSources,
) -> Result<TemplateVariables, WriteError> {
    let mut layers = vec![config.default_context.clone()];
    if sources.use_replay {
        let replay = config::load_replay_at(home, config, &manifest.name)?;
        tracing::info!(
            "replaying variables from {}",
            replay.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
        layers.push(replay.variables.to_string_map());
    }
    if let Some(path) = &sources.context_file {
        layers.push(config::load_context_file(path)?);
    }
    layers.push(sources.overrides.clone());
    Ok(resolve_variables(manifest, &layers)?)
}

/// A rendered tree together with where it is meant to go.
pub struct Prepared {
    pub renderer: Renderer,
    pub variables: TemplateVariables,
    pub destination: PathBuf,
    pub tree: OutputTree,
}

/// Resolve, render the root name and render the tree. Nothing is written.
pub fn prepare_at(
    home: &Path,
    template: Template,
    output_dir: &Path,
    sources: &VariableSources,
) -> Result<Prepared, WriteError> {
    let config = config::load_user_config_at(home)?;
    let variables = resolve_at(home, &config, &template.manifest, sources)?;
    let renderer = Renderer::new(template)?;
    let tree = renderer.render(&variables)?;
    let destination = output_dir.join(renderer.render_root(&variables)?);
    tracing::debug!(
        "rendered {} files for {}",
        tree.len(),
        destination.display()
    );
    Ok(Prepared {
        renderer,
        variables,
        destination,
        tree,
    })
}

/// Everything `scaffold new` needs.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub template: TemplateSource,
    /// Parent directory of the generated repository.
    pub output_dir: PathBuf,
    pub sources: VariableSources,
    pub options: WriteOptions,
}

/// Result of a successful generation.
#[derive(Debug, Clone)]
pub struct GenerateOutcome {
    pub template: String,
    pub destination: PathBuf,
    pub variables: TemplateVariables,
    pub report: WriteReport,
    /// [`tree_digest`] of the rendered tree.
    pub digest: String,
    /// `None` in dry-run mode.
    pub replay_path: Option<PathBuf>,
}

/// Render and write a repository, then record the variables for replay.
pub fn generate_at(home: &Path, request: &GenerateRequest) -> Result<GenerateOutcome, WriteError> {
    let template = request.template.load()?;
    let name = template.manifest.name.clone();
    let prepared = prepare_at(home, template, &request.output_dir, &request.sources)?;
    let report = write_tree(&prepared.tree, &prepared.destination, &request.options)?;

    let replay_path = if request.options.dry_run {
        None
    } else {
        let config = config::load_user_config_at(home)?;
        let replay = Replay {
            template: name.clone(),
            generated_at: Utc::now(),
            variables: prepared.variables.clone(),
        };
        Some(config::save_replay_at(home, &config, &replay)?)
    };

    Ok(GenerateOutcome {
        template: name,
        destination: prepared.destination,
        digest: tree_digest(&prepared.tree),
        variables: prepared.variables,
        report,
        replay_path,
    })
}

/// `generate_at` for the current user's home directory.
pub fn generate(request: &GenerateRequest) -> Result<GenerateOutcome, WriteError> {
    generate_at(&config::home_dir()?, request)
}
