//! Scaffold — generate bioinformatics analysis repositories from templates.
//!
//! # Usage
//!
//! ```text
//! scaffold new   [--template DIR] [-o DIR] [--var K=V]... [--context-file F] [--replay]
//!                [--force | --skip-existing] [--dry-run]
//! scaffold vars  [--template DIR] [--json]
//! scaffold check [--template DIR] [--var K=V]... [--context-file F] [--json]
//! scaffold diff  [--template DIR] [-o DIR] [--var K=V]... [--context-file F] [--replay]
//! ```
//!
//! Without `--template` the built-in `bioinformatics` template is used.

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use commands::{check::CheckArgs, diff::DiffArgs, new::NewArgs, vars::VarsArgs};
use scaffold_core::manifest::is_identifier;
use scaffold_writer::{TemplateSource, VariableSources};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "scaffold",
    version,
    about = "Generate analysis repositories from project templates",
    long_about = None,
)]
struct Cli {
    /// Log progress (`RUST_LOG` overrides).
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render a template into a new repository directory.
    New(NewArgs),

    /// List the variables a template declares.
    Vars(VarsArgs),

    /// Validate a template and confirm it renders with the given variables.
    Check(CheckArgs),

    /// Show unified diff between a fresh render and what is on disk.
    Diff(DiffArgs),
}

// ---------------------------------------------------------------------------
// Shared arguments
// ---------------------------------------------------------------------------

/// `--template DIR`
#[derive(Args, Debug, Clone, Default)]
pub struct TemplateArgs {
    /// Template directory holding scaffold.yaml (default: built-in bioinformatics).
    #[arg(long, short = 't', value_name = "DIR")]
    pub template: Option<PathBuf>,
}

impl TemplateArgs {
    pub fn source(&self) -> TemplateSource {
        match &self.template {
            Some(dir) => TemplateSource::Dir(dir.clone()),
            None => TemplateSource::Builtin,
        }
    }
}

/// `--var KEY=VALUE`… and `--context-file FILE`
#[derive(Args, Debug, Clone, Default)]
pub struct VarArgs {
    /// Set a template variable; repeatable.
    #[arg(long = "var", value_name = "KEY=VALUE", value_parser = parse_var)]
    pub vars: Vec<(String, String)>,

    /// YAML file mapping variable names to values.
    #[arg(long, value_name = "FILE")]
    pub context_file: Option<PathBuf>,
}

impl VarArgs {
    pub fn sources(&self, use_replay: bool) -> VariableSources {
        VariableSources {
            overrides: self.vars.iter().cloned().collect(),
            context_file: self.context_file.clone(),
            use_replay,
        }
    }
}

/// Parse `KEY=VALUE`; the value may itself contain `=`.
pub fn parse_var(s: &str) -> std::result::Result<(String, String), String> {
    let Some((key, value)) = s.split_once('=') else {
        return Err(format!("expected KEY=VALUE, got '{s}'"));
    };
    let key = key.trim();
    if !is_identifier(key) {
        return Err(format!("'{key}' is not a valid variable name"));
    }
    Ok((key.to_string(), value.to_string()))
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Commands::New(args) => args.run(),
        Commands::Vars(args) => args.run(),
        Commands::Check(args) => args.run(),
        Commands::Diff(args) => args.run(),
    }
}
