//! Variable resolution and the tera rendering context.
//!
//! A template's final variable mapping is built from layers, lowest
//! precedence first:
//!
//! 1. manifest defaults, rendered in declaration order against the values
//!    resolved so far (so `package_name` can default to a slug of
//!    `project_name`);
//! 2. every map in `layers`, in order: user `default_context`, replay record,
//!    context file, `--var` overrides.
//!
//! A value supplied by any layer replaces the default outright; defaults of
//! later variables then see it.

use std::collections::BTreeMap;

use scaffold_core::{TemplateManifest, TemplateVariables};

use crate::engine::render_str;
use crate::error::RenderError;

/// Resolve the variable mapping for `manifest`.
///
/// Undeclared keys from `layers` are kept. A declared variable without a
/// default that no layer supplies stays unbound; rendering then fails with
/// [`RenderError::MissingVariable`].
pub fn resolve_variables(
    manifest: &TemplateManifest,
    layers: &[BTreeMap<String, String>],
) -> Result<TemplateVariables, RenderError> {
    let mut supplied: BTreeMap<String, String> = BTreeMap::new();
    for layer in layers {
        supplied.extend(layer.iter().map(|(k, v)| (k.clone(), v.clone())));
    }

    let mut resolved: BTreeMap<String, String> = supplied
        .iter()
        .filter(|(name, _)| manifest.variable(name).is_none())
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    for spec in &manifest.variables {
        let name = spec.name.as_str();
        let value = match supplied.get(name) {
            Some(value) => value.clone(),
            None => match spec.effective_default() {
                Some(default) => {
                    let so_far: TemplateVariables = resolved.clone().into_iter().collect();
                    render_str(default, &so_far, &format!("default of '{name}'"))?
                }
                None => {
                    tracing::debug!("variable '{name}' has no value");
                    continue;
                }
            },
        };

        if !spec.choices.is_empty() && !spec.choices.contains(&value) {
            return Err(RenderError::InvalidChoice {
                name: name.to_string(),
                value,
                choices: spec.choices.clone(),
            });
        }
        resolved.insert(name.to_string(), value);
    }

    Ok(resolved.into_iter().collect())
}

/// Tera context exposing every variable as a top-level string.
pub fn to_tera_context(vars: &TemplateVariables) -> Result<tera::Context, RenderError> {
    let value = serde_json::to_value(vars)?;
    Ok(tera::Context::from_value(value)?)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
