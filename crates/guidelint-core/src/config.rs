//! Configuration types for guidelint (`guidelint.toml`).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::types::Severity;

/// Default number of days before expiry that a used waiver is flagged.
pub const DEFAULT_EXPIRY_LOOKAHEAD_DAYS: i64 = 14;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Preset to start from (`recommended`, `strict`, `minimal`).
    #[serde(default)]
    pub preset: Option<String>,

    /// Engine settings.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Per-rule configuration keyed by rule id (e.g. `SG-080`).
    #[serde(default)]
    pub rules: HashMap<String, RuleConfig>,
}

impl Config {
    /// Creates a default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid or a value is out of range.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.workers == Some(0) {
            return Err(ConfigError::Invalid {
                key: "engine.workers".into(),
                message: "must be at least 1".into(),
            });
        }
        if self.engine.expiry_lookahead_days < 0 {
            return Err(ConfigError::Invalid {
                key: "engine.expiry_lookahead_days".into(),
                message: "must not be negative".into(),
            });
        }
        Ok(())
    }

    /// Checks if a rule is enabled (rules are enabled unless configured off).
    #[must_use]
    pub fn is_rule_enabled(&self, rule_id: &str) -> bool {
        self.rules
            .get(rule_id)
            .map_or(true, |c| c.enabled.unwrap_or(true))
    }

    /// Gets the severity override for a rule.
    #[must_use]
    pub fn rule_severity(&self, rule_id: &str) -> Option<Severity> {
        self.rules.get(rule_id).and_then(|c| c.severity)
    }

    /// Gets the configuration of a rule, if any.
    #[must_use]
    pub fn rule(&self, rule_id: &str) -> Option<&RuleConfig> {
        self.rules.get(rule_id)
    }
}

/// Engine-level configuration (`[engine]`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Worker threads (default: available parallelism).
    #[serde(default)]
    pub workers: Option<usize>,

    /// Cache file; no persistent cache when unset.
    #[serde(default)]
    pub cache: Option<PathBuf>,

    /// Waiver file (default: `guidelint-waivers.toml` if it exists).
    #[serde(default)]
    pub waivers: Option<PathBuf>,

    /// Flag used waivers expiring within this many days.
    #[serde(default = "default_lookahead")]
    pub expiry_lookahead_days: i64,

    /// Cancel the run after this many seconds.
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Glob patterns of files never analyzed.
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workers: None,
            cache: None,
            waivers: None,
            expiry_lookahead_days: DEFAULT_EXPIRY_LOOKAHEAD_DAYS,
            timeout_secs: None,
            exclude: default_exclude(),
        }
    }
}

fn default_lookahead() -> i64 {
    DEFAULT_EXPIRY_LOOKAHEAD_DAYS
}

fn default_exclude() -> Vec<String> {
    vec![
        "**/node_modules/**".to_string(),
        "**/.svelte-kit/**".to_string(),
        "**/build/**".to_string(),
    ]
}

/// Per-rule configuration (`[rules.SG-xxx]`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Whether this rule is enabled.
    #[serde(default)]
    pub enabled: Option<bool>,

    /// Severity override.
    #[serde(default)]
    pub severity: Option<Severity>,

    /// Rule-specific options as key-value pairs.
    #[serde(flatten)]
    pub options: HashMap<String, toml::Value>,
}

impl RuleConfig {
    /// Gets a boolean option with a default value.
    #[must_use]
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.options
            .get(key)
            .and_then(toml::Value::as_bool)
            .unwrap_or(default)
    }

    /// Gets an integer option, `None` when absent or not an integer.
    #[must_use]
    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.options.get(key).and_then(toml::Value::as_integer)
    }

    /// Gets a string array option.
    #[must_use]
    pub fn get_str_array(&self, key: &str) -> Vec<String> {
        self.options
            .get(key)
            .and_then(|v| v.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Returns true if the option is set, whatever its type.
    #[must_use]
    pub fn has_option(&self, key: &str) -> bool {
        self.options.contains_key(key)
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error reading the config file.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// TOML syntax or shape error.
    #[error("failed to parse config: {message}")]
    Parse {
        /// Parse error message.
        message: String,
    },

    /// A value is out of range.
    #[error("invalid config value `{key}`: {message}")]
    Invalid {
        /// Offending key.
        key: String,
        /// Why it was rejected.
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.engine.expiry_lookahead_days, 14);
        assert!(config.engine.exclude.iter().any(|p| p.contains("node_modules")));
        assert!(config.rules.is_empty());
        assert!(config.is_rule_enabled("SG-021"));
    }

    #[test]
    fn parse_config() {
        let toml = r#"
preset = "strict"

[engine]
workers = 4
cache = ".guidelint/cache.json"
expiry_lookahead_days = 30

[rules.SG-080]
severity = "should"
max = 12

[rules.SG-013]
enabled = false
"#;
        let config = Config::parse(toml).expect("Failed to parse");
        assert_eq!(config.preset.as_deref(), Some("strict"));
        assert_eq!(config.engine.workers, Some(4));
        assert_eq!(config.engine.expiry_lookahead_days, 30);
        assert_eq!(config.rule_severity("SG-080"), Some(Severity::Should));
        assert!(!config.is_rule_enabled("SG-013"));

        let rule = config.rule("SG-080").unwrap();
        assert_eq!(rule.get_int("max"), Some(12));
        assert!(!rule.has_option("min"));
    }

    #[test]
    fn zero_workers_is_rejected() {
        let err = Config::parse("[engine]\nworkers = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn unknown_engine_key_is_rejected() {
        let err = Config::parse("[engine]\nthreads = 2\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
