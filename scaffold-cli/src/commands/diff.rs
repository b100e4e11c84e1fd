//! `scaffold diff` — compare a fresh render with an existing repository.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use scaffold_core::config;
use scaffold_writer::{diff_tree, prepare_at};

use crate::{TemplateArgs, VarArgs};

/// Arguments for `scaffold diff`.
#[derive(Args, Debug)]
pub struct DiffArgs {
    #[command(flatten)]
    pub template: TemplateArgs,

    /// Directory the repository was generated in.
    #[arg(long, short = 'o', value_name = "DIR", default_value = ".")]
    pub output_dir: PathBuf,

    #[command(flatten)]
    pub vars: VarArgs,

    /// Use the variables of the last generation.
    #[arg(long)]
    pub replay: bool,
}

impl DiffArgs {
    pub fn run(self) -> Result<()> {
        let template = self
            .template
            .source()
            .load()
            .context("failed to load template")?;
        let home = config::home_dir()?;
        let prepared = prepare_at(&home, template, &self.output_dir, &self.vars.sources(self.replay))
            .context("failed to render template")?;
        let diffs = diff_tree(&prepared.tree, &prepared.destination).with_context(|| {
            format!("failed to compare with {}", prepared.destination.display())
        })?;

        if diffs.is_empty() {
            println!(
                "{} No differences in {}",
                "✓".green(),
                prepared.destination.display()
            );
            return Ok(());
        }

        for d in &diffs {
            if d.is_new {
                println!("{} {} (not on disk)", "new:".cyan().bold(), d.path.display());
            }
            print!("{}", d.unified_diff);
        }
        println!("{} file(s) differ", diffs.len());
        Ok(())
    }
}
