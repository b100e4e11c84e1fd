//! Template manifest (`scaffold.yaml`) loading and validation.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::types::TemplateManifest;

/// File name of the manifest at a template root.
pub const MANIFEST_FILE: &str = "scaffold.yaml";

/// `<template_dir>/scaffold.yaml` — pure, no I/O.
pub fn manifest_path(template_dir: &Path) -> PathBuf {
    template_dir.join(MANIFEST_FILE)
}

/// Load and validate the manifest of the template rooted at `template_dir`.
///
/// Returns `ConfigError::ManifestNotFound` if absent,
/// `ConfigError::Parse` (with path + line context) if malformed YAML and
/// `ConfigError::InvalidManifest` if the content is inconsistent.
pub fn load_manifest(template_dir: &Path) -> Result<TemplateManifest, ConfigError> {
    let path = manifest_path(template_dir);
    if !path.exists() {
        return Err(ConfigError::ManifestNotFound { path });
    }
    let contents = std::fs::read_to_string(&path)?;
    parse_manifest(&contents, &path)
}

/// Parse and validate manifest YAML. `origin` is only used in error messages.
pub fn parse_manifest(contents: &str, origin: &Path) -> Result<TemplateManifest, ConfigError> {
    let manifest: TemplateManifest =
        serde_yaml::from_str(contents).map_err(|e| ConfigError::Parse {
            path: origin.to_path_buf(),
            source: e,
        })?;
    validate(&manifest).map_err(|reason| ConfigError::InvalidManifest {
        path: origin.to_path_buf(),
        reason,
    })?;
    Ok(manifest)
}

fn validate(manifest: &TemplateManifest) -> Result<(), String> {
    if manifest.name.trim().is_empty() {
        return Err("`name` must not be empty".to_string());
    }

    let mut seen = BTreeSet::new();
    for var in &manifest.variables {
        if !is_identifier(var.name.as_str()) {
            return Err(format!("variable name '{}' is not an identifier", var.name));
        }
        if !seen.insert(var.name.as_str()) {
            return Err(format!("variable '{}' declared twice", var.name));
        }
        if let Some(default) = &var.default {
            if !var.choices.is_empty() && !var.choices.contains(default) {
                return Err(format!(
                    "default '{default}' of '{}' is not one of its choices",
                    var.name
                ));
            }
        }
    }

    for cond in &manifest.conditional_paths {
        let pred = &cond.when;
        match (&pred.equals, &pred.not_equals) {
            (Some(_), None) | (None, Some(_)) => {}
            _ => {
                return Err(format!(
                    "condition on '{}' needs exactly one of `equals` / `not_equals`",
                    cond.path
                ))
            }
        }
        if !seen.contains(pred.variable.as_str()) {
            return Err(format!(
                "condition on '{}' tests undeclared variable '{}'",
                cond.path, pred.variable
            ));
        }
    }

    for pattern in &manifest.copy_without_render {
        if pattern.trim().is_empty() {
            return Err("empty `copy_without_render` pattern".to_string());
        }
    }
    Ok(())
}

/// `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
