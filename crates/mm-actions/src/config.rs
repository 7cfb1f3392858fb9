//! Model management configuration
//!
//! ```toml
//! default_language = "en"
//! journal_limit = 100
//!
//! [validation_policy]
//! validate_after_create = true
//! validate_after_restore = true
//! validate_after_remove = false
//! ```

use crate::error::ConfigError;
use mm_rules::RULE_COMMAND_EXTENSION_POINT;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// When the executor re-validates the model an action touched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationPolicy {
    /// After create field / property
    pub validate_after_create: bool,
    /// After restore-inherited actions and after undoing any action
    pub validate_after_restore: bool,
    /// After remove control
    pub validate_after_remove: bool,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            validate_after_create: true,
            validate_after_restore: true,
            validate_after_remove: true,
        }
    }
}

/// Configuration of an editing session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelManagementConfig {
    /// Re-validation policy
    pub validation_policy: ValidationPolicy,
    /// Language used for labels and descriptions
    pub default_language: String,
    /// Extension point the rule commands are read from
    pub rule_extension_point: String,
    /// Executed actions kept for undo; 0 keeps none
    pub journal_limit: usize,
}

impl ModelManagementConfig {
    /// Create default config
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set validation policy
    #[inline]
    #[must_use]
    pub fn with_validation_policy(mut self, policy: ValidationPolicy) -> Self {
        self.validation_policy = policy;
        self
    }

    /// Set default language
    #[inline]
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.default_language = language.into();
        self
    }

    /// Set rule extension point
    #[inline]
    #[must_use]
    pub fn with_rule_extension_point(mut self, extension_point: impl Into<String>) -> Self {
        self.rule_extension_point = extension_point.into();
        self
    }

    /// Set journal limit
    #[inline]
    #[must_use]
    pub fn with_journal_limit(mut self, limit: usize) -> Self {
        self.journal_limit = limit;
        self
    }

    /// Parse from TOML; missing keys take their defaults
    ///
    /// # Errors
    /// `ConfigError::Parse` on malformed TOML, `ConfigError::Invalid` for an
    /// empty language or extension point
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file
    ///
    /// # Errors
    /// `ConfigError::Io` if the file cannot be read, otherwise as
    /// [`ModelManagementConfig::from_toml_str`]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&source)?;
        tracing::debug!(path = %path.display(), "loaded model management config");
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.default_language.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "default_language",
                reason: "must not be empty".to_string(),
            });
        }
        if self.rule_extension_point.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "rule_extension_point",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for ModelManagementConfig {
    fn default() -> Self {
        Self {
            validation_policy: ValidationPolicy::default(),
            default_language: "en".to_string(),
            rule_extension_point: RULE_COMMAND_EXTENSION_POINT.to_string(),
            journal_limit: 100,
        }
    }
}
