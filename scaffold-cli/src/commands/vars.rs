//! `scaffold vars` — list template variables.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use scaffold_core::VariableSpec;

use crate::TemplateArgs;

/// Arguments for `scaffold vars`.
#[derive(Args, Debug)]
pub struct VarsArgs {
    #[command(flatten)]
    pub template: TemplateArgs,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct VariableJson<'a> {
    name: &'a str,
    description: Option<&'a str>,
    default: Option<&'a str>,
    choices: &'a [String],
}

#[derive(Tabled)]
struct VariableRow {
    #[tabled(rename = "variable")]
    name: String,
    #[tabled(rename = "default")]
    default: String,
    #[tabled(rename = "choices")]
    choices: String,
    #[tabled(rename = "description")]
    description: String,
}

impl VarsArgs {
    pub fn run(self) -> Result<()> {
        let template = self
            .template
            .source()
            .load()
            .context("failed to load template")?;
        let manifest = &template.manifest;

        if self.json {
            let payload: Vec<VariableJson<'_>> = manifest.variables.iter().map(to_json).collect();
            println!(
                "{}",
                serde_json::to_string_pretty(&payload).context("failed to serialize variables")?
            );
            return Ok(());
        }

        println!("{} | {} variables", manifest.name, manifest.variables.len());
        if !manifest.description.is_empty() {
            println!("{}", manifest.description);
        }
        if manifest.variables.is_empty() {
            return Ok(());
        }
        let rows: Vec<VariableRow> = manifest.variables.iter().map(to_row).collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
        Ok(())
    }
}

fn to_json(spec: &VariableSpec) -> VariableJson<'_> {
    VariableJson {
        name: spec.name.as_str(),
        description: spec.description.as_deref(),
        default: spec.effective_default(),
        choices: &spec.choices,
    }
}

fn to_row(spec: &VariableSpec) -> VariableRow {
    VariableRow {
        name: spec.name.to_string(),
        default: spec.effective_default().unwrap_or("(required)").to_string(),
        choices: spec.choices.join(" | "),
        description: spec.description.clone().unwrap_or_default(),
    }
}
