//! `scaffold check` — validate a template without writing anything.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use scaffold_core::config;
use scaffold_renderer::{CheckReport, Renderer};
use scaffold_writer::resolve_at;

use crate::{TemplateArgs, VarArgs};

/// Arguments for `scaffold check`.
#[derive(Args, Debug)]
pub struct CheckArgs {
    #[command(flatten)]
    pub template: TemplateArgs,

    #[command(flatten)]
    pub vars: VarArgs,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct CheckJson<'a> {
    template: &'a str,
    files: usize,
    report: ReportJson<'a>,
}

#[derive(Serialize)]
struct ReportJson<'a> {
    references: &'a std::collections::BTreeMap<String, std::collections::BTreeSet<String>>,
    undeclared: &'a std::collections::BTreeSet<String>,
    unused: &'a std::collections::BTreeSet<String>,
}

#[derive(Tabled)]
struct ReferenceRow {
    #[tabled(rename = "variable")]
    name: String,
    #[tabled(rename = "used in")]
    used_in: String,
}

impl CheckArgs {
    pub fn run(self) -> Result<()> {
        let template = self
            .template
            .source()
            .load()
            .context("failed to load template")?;
        let name = template.manifest.name.clone();
        let renderer = Renderer::new(template)
            .with_context(|| format!("template '{name}' does not parse"))?;
        let report = renderer.check().context("failed to scan template")?;
        // Static findings come first so they are shown even when rendering fails.
        if !self.json {
            print_report(&report);
        }

        let home = config::home_dir()?;
        let user_config = config::load_user_config_at(&home)?;
        let variables = resolve_at(
            &home,
            &user_config,
            &renderer.template().manifest,
            &self.vars.sources(false),
        )
        .with_context(|| format!("template '{name}' does not render"))?;
        let tree = renderer
            .render(&variables)
            .and_then(|tree| renderer.render_root(&variables).map(|_| tree))
            .with_context(|| format!("template '{name}' does not render"))?;

        if self.json {
            let payload = CheckJson {
                template: &name,
                files: tree.len(),
                report: ReportJson {
                    references: &report.references,
                    undeclared: &report.undeclared,
                    unused: &report.unused,
                },
            };
            println!(
                "{}",
                serde_json::to_string_pretty(&payload).context("failed to serialize report")?
            );
            return Ok(());
        }

        println!(
            "{} template '{}' renders {} files",
            "✓".green().bold(),
            name,
            tree.len()
        );
        Ok(())
    }
}

fn print_report(report: &CheckReport) {
    if !report.references.is_empty() {
        let rows: Vec<ReferenceRow> = report
            .references
            .iter()
            .map(|(name, paths)| ReferenceRow {
                name: name.clone(),
                used_in: paths.iter().cloned().collect::<Vec<_>>().join("\n"),
            })
            .collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
    }
    for name in &report.undeclared {
        println!(
            "{} '{}' is referenced but not declared in scaffold.yaml",
            "warning:".yellow().bold(),
            name
        );
    }
    for name in &report.unused {
        println!(
            "{} '{}' is declared but never used",
            "warning:".yellow().bold(),
            name
        );
    }
}
