//! TOML-based configuration.
//!
//! Stores the generator policy and where the roster and history live:
//! - Target and maximum group size
//! - Similarity threshold, history window and attempt budget
//! - Leader balancing
//! - Paths of the include/exclude lists and the history directory
//!
//! Configuration is stored as `randoffee.toml` next to the roster, so each
//! coffee scheme folder carries its own policy.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::generator::{GeneratorConfig, GroupSizing};

/// File name looked up inside the working directory.
pub const CONFIG_FILE: &str = "randoffee.toml";

/// Generator policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorSection {
    #[serde(default = "default_group_size")]
    pub group_size: usize,
    #[serde(default = "default_max_group_size")]
    pub max_group_size: usize,
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,
    /// Number of most recent rounds compared against; 0 compares all.
    #[serde(default = "default_history_window")]
    pub history_window: usize,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
    #[serde(default = "default_true")]
    pub balance_leaders: bool,
}

/// Locations, relative to the working directory unless absolute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_include")]
    pub include: String,
    #[serde(default = "default_exclude")]
    pub exclude: String,
    #[serde(default = "default_previous")]
    pub previous: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<dir>/randoffee.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub generator: GeneratorSection,
    #[serde(default)]
    pub paths: PathsConfig,
}

// Default functions
fn default_group_size() -> usize {
    4
}
fn default_max_group_size() -> usize {
    5
}
fn default_similarity_threshold() -> f64 {
    0.1
}
fn default_history_window() -> usize {
    3
}
fn default_max_attempts() -> usize {
    10_000
}
fn default_true() -> bool {
    true
}
fn default_include() -> String {
    "include".into()
}
fn default_exclude() -> String {
    "exclude".into()
}
fn default_previous() -> String {
    "previous".into()
}

impl Default for GeneratorSection {
    fn default() -> Self {
        Self {
            group_size: default_group_size(),
            max_group_size: default_max_group_size(),
            similarity_threshold: default_similarity_threshold(),
            history_window: default_history_window(),
            max_attempts: default_max_attempts(),
            balance_leaders: true,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            include: default_include(),
            exclude: default_exclude(),
            previous: default_previous(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() || key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_some() {
                current = current.get_mut(part).ok_or_else(unknown)?;
                continue;
            }

            let obj = current.as_object_mut().ok_or_else(unknown)?;
            let existing = obj.get(part).ok_or_else(unknown)?;

            let new_value = match existing {
                serde_json::Value::Bool(_) => serde_json::Value::Bool(
                    value
                        .parse::<bool>()
                        .map_err(|_| invalid(format!("cannot parse '{value}' as bool")))?,
                ),
                serde_json::Value::Number(_) => {
                    if let Ok(n) = value.parse::<u64>() {
                        serde_json::Value::Number(n.into())
                    } else if let Ok(n) = value.parse::<f64>() {
                        serde_json::Number::from_f64(n)
                            .map(serde_json::Value::Number)
                            .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                    } else {
                        return Err(invalid(format!("cannot parse '{value}' as number")));
                    }
                }
                serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                    return Err(unknown());
                }
                _ => serde_json::Value::String(value.into()),
            };

            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        Err(unknown())
    }

    pub fn path(dir: &Path) -> PathBuf {
        dir.join(CONFIG_FILE)
    }

    /// Load `<dir>/randoffee.toml`, or defaults if there is none.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(dir: &Path) -> Result<Self, ConfigError> {
        let path = Self::path(dir);
        if !path.exists() {
            tracing::debug!("no {} in {}, using defaults", CONFIG_FILE, dir.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::LoadFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
            path,
            message: e.to_string(),
        })
    }

    /// Persist to `<dir>/randoffee.toml`.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written.
    pub fn save(&self, dir: &Path) -> Result<(), ConfigError> {
        let path = Self::path(dir);
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.clone(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(&path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Object(_) => None,
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key, keeping the value's type.
    ///
    /// Only updates memory; call [`save`](Self::save) to persist.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed
    /// as the key's type.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Generator settings described by this config (unseeded).
    pub fn generator_config(&self) -> GeneratorConfig {
        let g = &self.generator;
        GeneratorConfig {
            sizing: GroupSizing::new(g.group_size, g.max_group_size),
            similarity_threshold: g.similarity_threshold,
            history_window: (g.history_window > 0).then_some(g.history_window),
            max_attempts: g.max_attempts,
            seed: None,
            balance_leaders: g.balance_leaders,
        }
    }

    /// Resolve a configured path against the working directory.
    pub fn resolve(dir: &Path, configured: &str) -> PathBuf {
        let path = Path::new(configured);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            dir.join(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.generator.group_size, 4);
        assert_eq!(parsed.paths.previous, "previous");
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let parsed: Config = toml::from_str("[generator]\ngroup_size = 3\n").unwrap();
        assert_eq!(parsed.generator.group_size, 3);
        assert_eq!(parsed.generator.max_group_size, 5);
        assert_eq!(parsed.generator.max_attempts, 10_000);
        assert_eq!(parsed.paths.include, "include");
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("generator.group_size").as_deref(), Some("4"));
        assert_eq!(cfg.get("generator.balance_leaders").as_deref(), Some("true"));
        assert_eq!(cfg.get("paths.include").as_deref(), Some("include"));
        assert!(cfg.get("generator.missing_key").is_none());
        assert!(cfg.get("generator").is_none());
    }

    #[test]
    fn set_updates_typed_values() {
        let mut cfg = Config::default();
        cfg.set("generator.group_size", "3").unwrap();
        cfg.set("generator.similarity_threshold", "0.25").unwrap();
        cfg.set("generator.balance_leaders", "false").unwrap();
        cfg.set("paths.previous", "rounds").unwrap();

        assert_eq!(cfg.generator.group_size, 3);
        assert!((cfg.generator.similarity_threshold - 0.25).abs() < 1e-12);
        assert!(!cfg.generator.balance_leaders);
        assert_eq!(cfg.paths.previous, "rounds");
    }

    #[test]
    fn set_accepts_integer_for_float_field() {
        let mut cfg = Config::default();
        cfg.set("generator.similarity_threshold", "0").unwrap();
        assert_eq!(cfg.generator.similarity_threshold, 0.0);
    }

    #[test]
    fn set_rejects_unknown_key() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("generator.nonexistent", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(cfg.set("generator", "1"), Err(ConfigError::UnknownKey(_))));
        assert!(matches!(cfg.set("", "1"), Err(ConfigError::UnknownKey(_))));
    }

    #[test]
    fn set_rejects_invalid_type() {
        let mut cfg = Config::default();
        assert!(cfg.set("generator.balance_leaders", "not_a_bool").is_err());
        assert!(cfg.set("generator.group_size", "four").is_err());
        assert!(cfg.set("generator.group_size", "2.5").is_err());
        assert_eq!(cfg.generator.group_size, 4);
    }

    #[test]
    fn generator_config_maps_zero_window_to_all() {
        let mut cfg = Config::default();
        assert_eq!(cfg.generator_config().history_window, Some(3));
        cfg.generator.history_window = 0;
        let generator = cfg.generator_config();
        assert_eq!(generator.history_window, None);
        assert_eq!(generator.sizing, GroupSizing::new(4, 5));
        assert_eq!(generator.seed, None);
    }

    #[test]
    fn load_and_save_in_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = Config::load(dir.path()).unwrap();
        assert_eq!(missing.generator.group_size, 4);

        let mut cfg = Config::default();
        cfg.generator.max_attempts = 42;
        cfg.save(dir.path()).unwrap();
        assert!(dir.path().join(CONFIG_FILE).exists());

        let loaded = Config::load(dir.path()).unwrap();
        assert_eq!(loaded.generator.max_attempts, 42);
    }

    #[test]
    fn load_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "[generator\n").unwrap();
        assert!(matches!(
            Config::load(dir.path()),
            Err(ConfigError::LoadFailed { .. })
        ));
    }

    #[test]
    fn resolve_keeps_absolute_paths() {
        let dir = Path::new("/tmp/coffee");
        assert_eq!(Config::resolve(dir, "include"), PathBuf::from("/tmp/coffee/include"));
        assert_eq!(Config::resolve(dir, "/etc/people"), PathBuf::from("/etc/people"));
    }
}
