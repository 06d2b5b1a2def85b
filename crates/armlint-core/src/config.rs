//! Configuration types for armlint.

use crate::rule::OpenApiType;
use crate::types::Severity;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Top-level configuration for armlint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Preset to use (e.g., "arm", "dataplane", "all").
    #[serde(default)]
    pub preset: Option<String>,

    /// Linter configuration.
    #[serde(default)]
    pub linter: LinterConfig,

    /// Per-rule configurations, keyed by rule name or rule id.
    #[serde(default)]
    pub rules: HashMap<String, RuleConfig>,
}

impl Config {
    /// Creates a new default configuration.
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
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })
    }

    /// Per-rule configuration, looked up by name first, then by id.
    #[must_use]
    pub fn rule(&self, name: &str, code: &str) -> Option<&RuleConfig> {
        self.rules.get(name).or_else(|| self.rules.get(code))
    }

    /// Checks if a rule is enabled.
    #[must_use]
    pub fn is_rule_enabled(&self, name: &str, code: &str) -> bool {
        self.rule(name, code)
            .map_or(true, |c| c.enabled.unwrap_or(true))
    }

    /// Gets the severity override for a rule.
    #[must_use]
    pub fn rule_severity(&self, name: &str, code: &str) -> Option<Severity> {
        self.rule(name, code).and_then(|c| c.severity)
    }
}

/// Linter-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinterConfig {
    /// Kind of API being linted; selects applicable rules.
    #[serde(default)]
    pub openapi_type: OpenApiType,

    /// Glob patterns excluded from file discovery.
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,

    /// Run rules in parallel.
    #[serde(default = "default_true")]
    pub parallel: bool,

    /// Lowest severity that fails the run.
    #[serde(default = "default_fail_on")]
    pub fail_on: Severity,
}

impl Default for LinterConfig {
    fn default() -> Self {
        Self {
            openapi_type: OpenApiType::default(),
            exclude: default_exclude(),
            parallel: true,
            fail_on: default_fail_on(),
        }
    }
}

fn default_exclude() -> Vec<String> {
    vec!["**/examples/**".to_string(), "**/node_modules/**".to_string()]
}

fn default_true() -> bool {
    true
}

fn default_fail_on() -> Severity {
    Severity::Error
}

/// Per-rule configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Whether this rule is enabled.
    #[serde(default)]
    pub enabled: Option<bool>,

    /// Severity override for this rule.
    #[serde(default)]
    pub severity: Option<Severity>,

    /// Rule-specific options as key-value pairs.
    #[serde(flatten)]
    pub options: HashMap<String, toml::Value>,
}

impl RuleConfig {
    fn option(&self, key: &str) -> Option<&toml::Value> {
        self.options.get(key)
    }

    /// Boolean option, `default` when unset or not a boolean.
    #[must_use]
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.option(key)
            .and_then(toml::Value::as_bool)
            .unwrap_or(default)
    }

    /// Integer option, `default` when unset or not an integer.
    #[must_use]
    pub fn get_int(&self, key: &str, default: i64) -> i64 {
        self.option(key)
            .and_then(toml::Value::as_integer)
            .unwrap_or(default)
    }

    /// String option, `default` when unset or not a string.
    #[must_use]
    pub fn get_str<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.option(key)
            .and_then(toml::Value::as_str)
            .unwrap_or(default)
    }

    /// String-array option. Non-string items are dropped; empty when unset.
    #[must_use]
    pub fn get_str_array(&self, key: &str) -> Vec<String> {
        let Some(items) = self.option(key).and_then(toml::Value::as_array) else {
            return Vec::new();
        };
        items
            .iter()
            .filter_map(toml::Value::as_str)
            .map(String::from)
            .collect()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error reading config file.
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// Parse error in config file.
    #[error("Failed to parse config: {message}")]
    Parse {
        /// Parse error message.
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.linter.parallel);
        assert_eq!(config.linter.openapi_type, OpenApiType::Default);
        assert_eq!(config.linter.fail_on, Severity::Error);
        assert!(config.rules.is_empty());
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[linter]
openapi_type = "arm"
exclude = ["**/generated/**"]
parallel = false
fail_on = "warning"

[rules.tracked-resource-delete-operation]
enabled = true
severity = "warning"

[rules.R1001]
enabled = false
allowed_verbs = ["Get", "List"]
"#;

        let config = Config::parse(toml).expect("Failed to parse");
        assert_eq!(config.linter.openapi_type, OpenApiType::Arm);
        assert_eq!(config.linter.exclude, vec!["**/generated/**"]);
        assert!(!config.linter.parallel);
        assert_eq!(config.linter.fail_on, Severity::Warning);

        assert!(config.is_rule_enabled("tracked-resource-delete-operation", "R4001"));
        assert_eq!(
            config.rule_severity("tracked-resource-delete-operation", "R4001"),
            Some(Severity::Warning)
        );
        assert!(!config.is_rule_enabled("operation-id-noun-verb", "R1001"));

        let rule_config = config.rule("operation-id-noun-verb", "R1001").unwrap();
        assert_eq!(rule_config.get_str_array("allowed_verbs"), vec!["Get", "List"]);
    }

    #[test]
    fn test_rule_option_getters_fall_back_on_type_mismatch() {
        let config = Config::parse(
            r#"
[rules.collection-next-link]
next_link_name = "@odata.nextLink"
max_depth = 2
strict = "yes"
names = ["a", 1, "b"]
"#,
        )
        .unwrap();
        let rule = config.rule("collection-next-link", "R4004").unwrap();

        assert_eq!(rule.get_str("next_link_name", "nextLink"), "@odata.nextLink");
        assert_eq!(rule.get_str("max_depth", "none"), "none");
        assert_eq!(rule.get_int("max_depth", 0), 2);
        assert_eq!(rule.get_int("missing", 7), 7);
        assert!(rule.get_bool("strict", true));
        assert_eq!(rule.get_str_array("names"), vec!["a", "b"]);
    }

    #[test]
    fn test_parse_error() {
        let err = Config::parse("[linter\nparallel = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
