//! Domain types for templates and their variables.
//!
//! All path fields use `PathBuf`; template paths (which may still contain
//! placeholder tokens) are kept as `/`-separated `String`s.
//! All types are serializable/deserializable via serde + serde_yaml.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed template variable name (`project_name`, `license`, ...).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VariableName(pub String);

impl VariableName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VariableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for VariableName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for VariableName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Variable mapping
// ---------------------------------------------------------------------------

/// Flat mapping of variable name to bound value.
///
/// Built once per generation and never mutated afterwards; there are no
/// setters, only constructors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateVariables {
    values: BTreeMap<VariableName, String>,
}

impl TemplateVariables {
    pub fn new(values: BTreeMap<VariableName, String>) -> Self {
        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .get(&VariableName::from(name))
            .map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(&VariableName::from(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&VariableName, &String)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Plain `String -> String` view, used to build rendering contexts.
    pub fn to_string_map(&self) -> BTreeMap<String, String> {
        self.values
            .iter()
            .map(|(k, v)| (k.0.clone(), v.clone()))
            .collect()
    }
}

impl<K, V> FromIterator<(K, V)> for TemplateVariables
where
    K: Into<VariableName>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Manifest structs
// ---------------------------------------------------------------------------

/// One variable declared by a template manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableSpec {
    pub name: VariableName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// May itself contain tokens referring to earlier variables.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<String>,
}

impl VariableSpec {
    /// The declared default, falling back to the first choice.
    pub fn effective_default(&self) -> Option<&str> {
        self.default
            .as_deref()
            .or_else(|| self.choices.first().map(String::as_str))
    }
}

/// Equality test of one variable against a literal.
///
/// Exactly one of `equals` / `not_equals` must be set; the manifest loader
/// rejects anything else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Predicate {
    pub variable: VariableName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equals: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_equals: Option<String>,
}

impl Predicate {
    pub fn equals(variable: &str, value: &str) -> Self {
        Self {
            variable: VariableName::from(variable),
            equals: Some(value.to_owned()),
            not_equals: None,
        }
    }

    pub fn not_equals(variable: &str, value: &str) -> Self {
        Self {
            variable: VariableName::from(variable),
            equals: None,
            not_equals: Some(value.to_owned()),
        }
    }

    /// Evaluate against `vars`. `None` when the variable is unbound.
    pub fn evaluate(&self, vars: &TemplateVariables) -> Option<bool> {
        let value = vars.get(self.variable.as_str())?;
        match (&self.equals, &self.not_equals) {
            (Some(expected), None) => Some(value == expected),
            (None, Some(rejected)) => Some(value != rejected),
            _ => None,
        }
    }
}

/// A template path (or directory prefix) that is only emitted when `when` holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathCondition {
    pub path: String,
    pub when: Predicate,
}

impl PathCondition {
    /// Whether this condition governs the template path `template_path`.
    pub fn applies_to(&self, template_path: &str) -> bool {
        let prefix = self.path.trim_end_matches('/');
        template_path == prefix
            || template_path
                .strip_prefix(prefix)
                .is_some_and(|rest| rest.starts_with('/'))
    }
}

fn default_root() -> String {
    "{{ package_name }}".to_string()
}

/// Root of a template's `scaffold.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateManifest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Template string for the generated directory name.
    #[serde(default = "default_root")]
    pub root: String,
    #[serde(default)]
    pub variables: Vec<VariableSpec>,
    #[serde(default)]
    pub conditional_paths: Vec<PathCondition>,
    #[serde(default)]
    pub copy_without_render: Vec<String>,
}

impl TemplateManifest {
    pub fn variable(&self, name: &str) -> Option<&VariableSpec> {
        self.variables.iter().find(|v| v.name.as_str() == name)
    }
}

/// Record of the variables used for a previous generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replay {
    pub template: String,
    pub generated_at: DateTime<Utc>,
    pub variables: TemplateVariables,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
