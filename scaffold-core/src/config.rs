//! User configuration, context files and replay records.
//!
//! # Storage layout
//!
//! ```text
//! ~/.scaffold/
//!   config.yaml               (optional user config)
//!   replay/
//!     <template_name>.yaml    (last variables used per template — mode 0600)
//! ```
//!
//! # API pattern
//!
//! Every function touching `~/.scaffold` has two forms:
//! - `fn_at(home: &Path, …)` — explicit home; used in tests with `TempDir`
//! - `fn(…)` — derives home from `dirs::home_dir()`, delegates to `_at`

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::Replay;

/// Contents of `~/.scaffold/config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserConfig {
    /// Values applied over every template's manifest defaults.
    #[serde(default)]
    pub default_context: BTreeMap<String, String>,
    /// Overrides `~/.scaffold/replay/`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replay_dir: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// 1. Path helpers
// ---------------------------------------------------------------------------

/// `<home>/.scaffold/` — pure, no I/O.
pub fn scaffold_dir_at(home: &Path) -> PathBuf {
    home.join(".scaffold")
}

/// `<home>/.scaffold/config.yaml` — pure, no I/O.
pub fn user_config_path_at(home: &Path) -> PathBuf {
    scaffold_dir_at(home).join("config.yaml")
}

/// Directory holding replay records, honouring `replay_dir` from the user config.
pub fn replay_dir_at(home: &Path, config: &UserConfig) -> PathBuf {
    config
        .replay_dir
        .clone()
        .unwrap_or_else(|| scaffold_dir_at(home).join("replay"))
}

/// `<replay_dir>/<template>.yaml` — pure, no I/O.
pub fn replay_path_at(home: &Path, config: &UserConfig, template: &str) -> PathBuf {
    replay_dir_at(home, config).join(format!("{template}.yaml"))
}

// ---------------------------------------------------------------------------
// 2. User config
// ---------------------------------------------------------------------------

/// Load `<home>/.scaffold/config.yaml`; a missing file yields the default config.
pub fn load_user_config_at(home: &Path) -> Result<UserConfig, ConfigError> {
    let path = user_config_path_at(home);
    if !path.exists() {
        return Ok(UserConfig::default());
    }
    let contents = std::fs::read_to_string(&path)?;
    serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse { path, source: e })
}

/// `load_user_config_at` convenience wrapper.
pub fn load_user_config() -> Result<UserConfig, ConfigError> {
    load_user_config_at(&home_dir()?)
}

// ---------------------------------------------------------------------------
// 3. Context file
// ---------------------------------------------------------------------------

/// Load a YAML mapping of variable name to value (`--context-file`).
///
/// Scalar values (numbers, booleans) are accepted and stringified.
pub fn load_context_file(path: &Path) -> Result<BTreeMap<String, String>, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    let raw: BTreeMap<String, serde_yaml::Value> =
        serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;

    let mut out = BTreeMap::new();
    for (key, value) in raw {
        let value = match value {
            serde_yaml::Value::String(s) => s,
            serde_yaml::Value::Bool(b) => b.to_string(),
            serde_yaml::Value::Number(n) => n.to_string(),
            serde_yaml::Value::Null => String::new(),
            _ => {
                return Err(ConfigError::InvalidManifest {
                    path: path.to_path_buf(),
                    reason: format!("value of '{key}' must be a scalar"),
                })
            }
        };
        out.insert(key, value);
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// 4. Replay (atomic save)
// ---------------------------------------------------------------------------

/// Load the replay record for `template`.
pub fn load_replay_at(
    home: &Path,
    config: &UserConfig,
    template: &str,
) -> Result<Replay, ConfigError> {
    let path = replay_path_at(home, config, template);
    if !path.exists() {
        return Err(ConfigError::ReplayNotFound { path });
    }
    let contents = std::fs::read_to_string(&path)?;
    serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse { path, source: e })
}

/// Atomically save a replay record.
///
/// Write flow: serialize → `.yaml.tmp` sibling → `chmod 0600` → `rename`.
pub fn save_replay_at(
    home: &Path,
    config: &UserConfig,
    replay: &Replay,
) -> Result<PathBuf, ConfigError> {
    let dir = replay_dir_at(home, config);
    if !dir.exists() {
        std::fs::create_dir_all(&dir)?;
        set_dir_permissions(&dir)?;
    }
    let path = replay_path_at(home, config, &replay.template);
    let tmp_path = path.with_file_name(format!("{}.yaml.tmp", replay.template));

    let yaml = serde_yaml::to_string(replay)?;
    std::fs::write(&tmp_path, yaml)?;
    set_file_permissions(&tmp_path)?;
    if let Err(e) = std::fs::rename(&tmp_path, &path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(e.into());
    }
    Ok(path)
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

/// The user's home directory; every `_at` function takes this as `home`.
pub fn home_dir() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::HomeNotFound)
}

#[cfg(unix)]
fn set_dir_permissions(path: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_dir_permissions(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TemplateVariables;
    use chrono::Utc;
    use tempfile::TempDir;

    fn make_home() -> TempDir {
        TempDir::new().expect("tempdir")
    }

    fn replay() -> Replay {
        Replay {
            template: "bioinformatics".to_string(),
            generated_at: Utc::now(),
            variables: [("project_name", "RNA-seq QC"), ("license", "MIT")]
                .into_iter()
                .collect::<TemplateVariables>(),
        }
    }

    #[test]
    fn missing_user_config_is_default() {
        let home = make_home();
        let cfg = load_user_config_at(home.path()).expect("load");
        assert_eq!(cfg, UserConfig::default());
    }

    #[test]
    fn user_config_default_context_is_read() {
        let home = make_home();
        let path = user_config_path_at(home.path());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "default_context:\n  author: Ada Lovelace\n").unwrap();
        let cfg = load_user_config_at(home.path()).expect("load");
        assert_eq!(cfg.default_context["author"], "Ada Lovelace");
    }

    #[test]
    fn replay_save_then_load() {
        let home = make_home();
        let cfg = UserConfig::default();
        let saved = replay();
        let path = save_replay_at(home.path(), &cfg, &saved).expect("save");
        assert!(path.ends_with("replay/bioinformatics.yaml"));
        let loaded = load_replay_at(home.path(), &cfg, "bioinformatics").expect("load");
        assert_eq!(loaded.variables, saved.variables);
    }

    #[test]
    fn replay_save_cleans_up_tmp() {
        let home = make_home();
        let cfg = UserConfig::default();
        let path = save_replay_at(home.path(), &cfg, &replay()).expect("save");
        let tmp = path.with_file_name("bioinformatics.yaml.tmp");
        assert!(!tmp.exists(), ".tmp must be gone after successful save");
    }

    #[test]
    fn missing_replay_is_reported() {
        let home = make_home();
        let err = load_replay_at(home.path(), &UserConfig::default(), "nope").unwrap_err();
        assert!(matches!(err, ConfigError::ReplayNotFound { .. }));
    }

    #[test]
    fn replay_dir_override_is_honoured() {
        let home = make_home();
        let custom = home.path().join("elsewhere");
        let cfg = UserConfig {
            replay_dir: Some(custom.clone()),
            ..UserConfig::default()
        };
        let path = save_replay_at(home.path(), &cfg, &replay()).expect("save");
        assert!(path.starts_with(&custom));
    }

    #[test]
    fn context_file_stringifies_scalars() {
        let dir = make_home();
        let path = dir.path().join("ctx.yaml");
        std::fs::write(&path, "project_name: Demo\nthreads: 8\npaired: true\n").unwrap();
        let ctx = load_context_file(&path).expect("load");
        assert_eq!(ctx["threads"], "8");
        assert_eq!(ctx["paired"], "true");
    }

    #[test]
    fn context_file_rejects_nested_values() {
        let dir = make_home();
        let path = dir.path().join("ctx.yaml");
        std::fs::write(&path, "samples:\n  - a\n  - b\n").unwrap();
        assert!(load_context_file(&path).is_err());
    }
}
