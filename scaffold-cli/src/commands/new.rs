//! `scaffold new` — render a template into a new repository.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use scaffold_writer::{
    generate, ExistingPolicy, GenerateOutcome, GenerateRequest, WriteOptions, WriteResult,
};

use crate::{TemplateArgs, VarArgs};

/// Arguments for `scaffold new`.
#[derive(Args, Debug)]
pub struct NewArgs {
    #[command(flatten)]
    pub template: TemplateArgs,

    /// Directory the repository is created in.
    #[arg(long, short = 'o', value_name = "DIR", default_value = ".")]
    pub output_dir: PathBuf,

    #[command(flatten)]
    pub vars: VarArgs,

    /// Start from the variables used the last time this template was generated.
    #[arg(long)]
    pub replay: bool,

    /// Overwrite files in an existing destination.
    #[arg(long, short = 'f', conflicts_with = "skip_existing")]
    pub force: bool,

    /// Only write files missing from an existing destination.
    #[arg(long)]
    pub skip_existing: bool,

    /// Show what would be written without writing anything.
    #[arg(long)]
    pub dry_run: bool,
}

impl NewArgs {
    fn policy(&self) -> ExistingPolicy {
        if self.force {
            ExistingPolicy::Overwrite
        } else if self.skip_existing {
            ExistingPolicy::SkipExisting
        } else {
            ExistingPolicy::Fail
        }
    }

    pub fn run(self) -> Result<()> {
        let request = GenerateRequest {
            template: self.template.source(),
            output_dir: self.output_dir.clone(),
            sources: self.vars.sources(self.replay),
            options: WriteOptions {
                policy: self.policy(),
                dry_run: self.dry_run,
            },
        };

        let outcome = generate(&request).context("generation failed")?;
        print_outcome(&outcome, self.dry_run);
        Ok(())
    }
}

fn print_outcome(outcome: &GenerateOutcome, dry_run: bool) {
    let prefix = if dry_run { "[dry-run] " } else { "" };
    let report = &outcome.report;
    println!(
        "{prefix}{} '{}' from template '{}' ({} written, {} unchanged, {} skipped)",
        "✓".green().bold(),
        outcome.destination.display(),
        outcome.template,
        report.written() + report.would_write(),
        report.unchanged(),
        report.skipped(),
    );

    for r in &report.results {
        let rel = r
            .path()
            .strip_prefix(&outcome.destination)
            .unwrap_or_else(|_| r.path());
        match r {
            WriteResult::Written { .. } => println!("  {}  {}", "✎".green(), rel.display()),
            WriteResult::WouldWrite { .. } => println!("  {}  {}", "~".yellow(), rel.display()),
            WriteResult::Unchanged { .. } => println!("  {}  {}", "·".bright_black(), rel.display()),
            WriteResult::Skipped { .. } => println!("  {}  {} (kept)", "-".bright_black(), rel.display()),
        }
    }

    if let Some(path) = &outcome.replay_path {
        tracing::info!("variables saved to {}", path.display());
    }
    tracing::info!("tree digest {}", outcome.digest);
}
