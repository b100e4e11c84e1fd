//! The `bioinformatics` template, embedded at compile time.
//!
//! Files live under `templates/bioinformatics/` with their unrendered paths,
//! so the same directory also loads through [`Template::from_dir`].

use std::path::Path;

use scaffold_core::manifest::parse_manifest;

use crate::error::RenderError;
use crate::tree::{Template, TemplateEntry, TemplateTree};

pub const BUILTIN_NAME: &str = "bioinformatics";

macro_rules! tpl {
    ($path:literal) => {
        (
            $path,
            include_str!(concat!("../templates/bioinformatics/", $path)),
        )
    };
}

const MANIFEST: &str = include_str!("../templates/bioinformatics/scaffold.yaml");

const TPLS: &[(&str, &str)] = &[
    tpl!(".gitignore"),
    tpl!("LICENSE"),
    tpl!("README.md"),
    tpl!("config/config.yaml"),
    tpl!("config/samples.tsv"),
    tpl!("data/raw/.gitkeep"),
    tpl!("docs/dependencies.md"),
    tpl!("docs/index.md"),
    tpl!("environment.yml"),
    tpl!("logs/.gitkeep"),
    tpl!("pyproject.toml"),
    tpl!("results/.gitkeep"),
    tpl!("schemas/config.schema.yaml"),
    tpl!("schemas/samples.schema.yaml"),
    tpl!("src/{{ package_name }}/__init__.py"),
    tpl!("src/{{ package_name }}/samples.py"),
    tpl!("tests/test_{{ package_name }}.py"),
    tpl!("workflow/Snakefile"),
    tpl!("workflow/envs/align.yaml"),
    tpl!("workflow/envs/qc.yaml"),
    tpl!("workflow/profiles/default/config.yaml"),
    tpl!("workflow/profiles/slurm/config.yaml"),
    tpl!("workflow/rules/align.smk"),
    tpl!("workflow/rules/common.smk"),
    tpl!("workflow/rules/coverage.smk"),
    tpl!("workflow/rules/qc.smk"),
    tpl!("workflow/scripts/mean_depth.py"),
    tpl!("workflow/scripts/summarize_flagstat.py"),
];

/// Build the embedded template.
pub fn template() -> Result<Template, RenderError> {
    let origin = Path::new(BUILTIN_NAME).join(scaffold_core::manifest::MANIFEST_FILE);
    let manifest = parse_manifest(MANIFEST, &origin)?;
    let entries = TPLS
        .iter()
        .map(|(path, content)| TemplateEntry::text(*path, *content))
        .collect();
    Ok(Template::new(manifest, TemplateTree::new(entries)))
}
