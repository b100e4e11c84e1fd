//! Tera rendering engine — [`TemplateEngine`] and [`Renderer`].
//!
//! # Rendering order
//!
//! | Step | What                                                        |
//! |------|-------------------------------------------------------------|
//! | 1    | scan `root` and every conditional-path predicate            |
//! | 2    | scan each entry in template-path order, path before content |
//! | 3    | drop entries whose conditional path evaluates to false      |
//! | 4    | render path segments, then content (verbatim if matched by `copy_without_render`) |
//!
//! Steps 1 and 2 are [`Renderer::validate`]; nothing is rendered until every
//! referenced variable is known to be bound.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use glob::Pattern;
use tera::Tera;

use scaffold_core::manifest::MANIFEST_FILE;
use scaffold_core::{ConfigError, TemplateVariables};

use crate::context::to_tera_context;
use crate::error::RenderError;
use crate::output::{OutputContent, OutputFile, OutputTree};
use crate::token::{self, has_tokens, TokenError};
use crate::tree::{EntryContent, Template, TemplateEntry};

// ---------------------------------------------------------------------------
// String rendering
// ---------------------------------------------------------------------------

fn malformed(origin: &str, err: TokenError) -> RenderError {
    RenderError::MalformedToken {
        path: origin.to_string(),
        line: err.line,
        column: err.column,
        message: err.to_string(),
    }
}

/// Fail on the first malformed token or unbound reference in `source`.
fn check_bound(source: &str, vars: &TemplateVariables, origin: &str) -> Result<(), RenderError> {
    let refs = token::references(source).map_err(|e| malformed(origin, e))?;
    match refs.into_iter().find(|r| !vars.contains(&r.name)) {
        Some(r) => Err(RenderError::MissingVariable {
            name: r.name,
            path: origin.to_string(),
        }),
        None => Ok(()),
    }
}

/// Render a standalone template string (path segments, defaults, `root`).
///
/// `origin` names the string in error messages.
pub fn render_str(
    source: &str,
    vars: &TemplateVariables,
    origin: &str,
) -> Result<String, RenderError> {
    check_bound(source, vars, origin)?;
    if !has_tokens(source) {
        return Ok(source.to_string());
    }
    let ctx = to_tera_context(vars)?;
    Ok(Tera::one_off(source, &ctx, false)?)
}

fn check_segment(template_path: &str, segment: &str) -> Result<(), RenderError> {
    let reason = if segment.is_empty() {
        "empty path segment"
    } else if segment == "." || segment == ".." {
        "relative path segment"
    } else if segment.contains('/') || segment.contains('\\') {
        "path separator inside a variable value"
    } else {
        return Ok(());
    };
    Err(RenderError::InvalidOutputPath {
        path: template_path.to_string(),
        reason: format!("{reason} ({segment:?})"),
    })
}

// ---------------------------------------------------------------------------
// TemplateEngine
// ---------------------------------------------------------------------------

/// Tera instance holding every text entry that needs rendering, keyed by
/// template path.
pub struct TemplateEngine {
    tera: Tera,
}

impl TemplateEngine {
    /// Register `entries` with tera. Autoescaping is off: output is source
    /// code and config, not HTML.
    pub fn new<'a>(entries: impl IntoIterator<Item = &'a TemplateEntry>) -> Result<Self, RenderError> {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);
        let mut items: Vec<(String, String)> = Vec::new();
        for entry in entries {
            if let EntryContent::Text(text) = &entry.content {
                if has_tokens(text) {
                    // Report syntax errors with our own positions before tera sees them.
                    token::references(text).map_err(|e| malformed(&entry.path, e))?;
                    items.push((entry.path.clone(), text.clone()));
                }
            }
        }
        tera.add_raw_templates(items)?;
        Ok(TemplateEngine { tera })
    }

    /// Render the registered entry `name`. Sources without tokens come back as-is.
    pub fn render(&self, name: &str, source: &str, ctx: &tera::Context) -> Result<String, RenderError> {
        if !has_tokens(source) {
            return Ok(source.to_string());
        }
        Ok(self.tera.render(name, ctx)?)
    }
}

// ---------------------------------------------------------------------------
// CheckReport
// ---------------------------------------------------------------------------

/// Static summary of the variables a template references.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckReport {
    /// Variable → template paths (or `scaffold.yaml`) referencing it.
    pub references: BTreeMap<String, BTreeSet<String>>,
    /// Referenced but not declared in the manifest.
    pub undeclared: BTreeSet<String>,
    /// Declared but never referenced.
    pub unused: BTreeSet<String>,
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

/// Renders one [`Template`]. Create once with [`Renderer::new`] and reuse for
/// any number of variable mappings.
pub struct Renderer {
    template: Template,
    engine: TemplateEngine,
    verbatim: Vec<Pattern>,
}

impl Renderer {
    pub fn new(template: Template) -> Result<Self, RenderError> {
        let verbatim = template
            .manifest
            .copy_without_render
            .iter()
            .map(|p| {
                Pattern::new(p).map_err(|e| {
                    RenderError::Config(ConfigError::InvalidManifest {
                        path: PathBuf::from(MANIFEST_FILE),
                        reason: format!("bad copy_without_render pattern '{p}': {e}"),
                    })
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let engine = TemplateEngine::new(
            template
                .tree
                .entries()
                .iter()
                .filter(|e| !verbatim.iter().any(|p| p.matches(&e.path))),
        )?;
        Ok(Renderer {
            template,
            engine,
            verbatim,
        })
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    fn is_verbatim(&self, entry: &TemplateEntry) -> bool {
        matches!(entry.content, EntryContent::Binary(_))
            || self.verbatim.iter().any(|p| p.matches(&entry.path))
    }

    /// Scan the whole tree for malformed tokens and unbound references.
    ///
    /// Entries excluded by a conditional path are checked too, so the error
    /// does not depend on the values of unrelated variables.
    pub fn validate(&self, vars: &TemplateVariables) -> Result<(), RenderError> {
        let manifest = &self.template.manifest;
        check_bound(&manifest.root, vars, MANIFEST_FILE)?;
        for cond in &manifest.conditional_paths {
            let name = cond.when.variable.as_str();
            if !vars.contains(name) {
                return Err(RenderError::MissingVariable {
                    name: name.to_string(),
                    path: format!("{MANIFEST_FILE} (condition on '{}')", cond.path),
                });
            }
        }
        for entry in self.template.tree.entries() {
            check_bound(&entry.path, vars, &entry.path)?;
            if let EntryContent::Text(text) = &entry.content {
                if !self.is_verbatim(entry) {
                    check_bound(text, vars, &entry.path)?;
                }
            }
        }
        Ok(())
    }

    /// Whether `entry` survives the manifest's conditional paths.
    fn included(&self, entry: &TemplateEntry, vars: &TemplateVariables) -> bool {
        self.template
            .manifest
            .conditional_paths
            .iter()
            .filter(|cond| cond.applies_to(&entry.path))
            .all(|cond| cond.when.evaluate(vars).unwrap_or(false))
    }

    fn render_path(&self, entry: &TemplateEntry, vars: &TemplateVariables) -> Result<PathBuf, RenderError> {
        let mut out = PathBuf::new();
        for segment in entry.path.split('/') {
            let rendered = render_str(segment, vars, &entry.path)?;
            check_segment(&entry.path, &rendered)?;
            out.push(rendered);
        }
        Ok(out)
    }

    /// Name of the directory the tree is generated into.
    pub fn render_root(&self, vars: &TemplateVariables) -> Result<String, RenderError> {
        let root = render_str(&self.template.manifest.root, vars, MANIFEST_FILE)?;
        check_segment(&self.template.manifest.root, &root)?;
        Ok(root)
    }

    /// Render the whole tree. Pure: nothing touches the filesystem.
    pub fn render(&self, vars: &TemplateVariables) -> Result<OutputTree, RenderError> {
        self.validate(vars)?;
        let ctx = to_tera_context(vars)?;
        let mut tree = OutputTree::new();

        for entry in self.template.tree.entries() {
            if !self.included(entry, vars) {
                tracing::debug!("skipping {} (condition is false)", entry.path);
                continue;
            }
            let path = self.render_path(entry, vars)?;
            let content = match &entry.content {
                EntryContent::Binary(bytes) => OutputContent::Binary(bytes.clone()),
                EntryContent::Text(text) if self.is_verbatim(entry) => {
                    OutputContent::Text(text.replace("\r\n", "\n"))
                }
                EntryContent::Text(text) => OutputContent::Text(
                    self.engine
                        .render(&entry.path, text, &ctx)?
                        .replace("\r\n", "\n"),
                ),
            };

            if let Some(existing) = tree.get(&path) {
                return Err(RenderError::PathCollision {
                    path,
                    first: existing.source.clone(),
                    second: entry.path.clone(),
                });
            }
            tracing::debug!("rendered {} -> {}", entry.path, path.display());
            tree.insert(
                path,
                OutputFile {
                    content,
                    executable: entry.executable,
                    source: entry.path.clone(),
                },
            );
        }
        Ok(tree)
    }

    /// Scan every string of the template without rendering.
    pub fn check(&self) -> Result<CheckReport, RenderError> {
        let manifest = &self.template.manifest;
        let mut report = CheckReport::default();
        let mut record = |source: &str, origin: &str| -> Result<(), RenderError> {
            for r in token::references(source).map_err(|e| malformed(origin, e))? {
                report
                    .references
                    .entry(r.name)
                    .or_default()
                    .insert(origin.to_string());
            }
            Ok(())
        };

        record(&manifest.root, MANIFEST_FILE)?;
        for spec in &manifest.variables {
            if let Some(default) = &spec.default {
                record(default, MANIFEST_FILE)?;
            }
        }
        for entry in self.template.tree.entries() {
            record(&entry.path, &entry.path)?;
            if let EntryContent::Text(text) = &entry.content {
                if !self.is_verbatim(entry) {
                    record(text, &entry.path)?;
                }
            }
        }
        for cond in &manifest.conditional_paths {
            report
                .references
                .entry(cond.when.variable.to_string())
                .or_default()
                .insert(MANIFEST_FILE.to_string());
        }

        let declared: BTreeSet<String> = manifest
            .variables
            .iter()
            .map(|v| v.name.to_string())
            .collect();
        report.undeclared = report
            .references
            .keys()
            .filter(|name| !declared.contains(*name))
            .cloned()
            .collect();
        report.unused = declared
            .into_iter()
            .filter(|name| !report.references.contains_key(name))
            .collect();
        Ok(report)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
