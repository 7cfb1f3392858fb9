//! Error types for model actions
//!
//! Provides error handling for:
//! - Actions missing their target model, context or metadata
//! - Restores with nothing inherited to restore
//! - Tree and rule failures raised while processing
//! - Configuration loading

use mm_model::ModelError;
use mm_rules::RuleError;
use std::path::PathBuf;

/// Action processing error
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    /// Action has no target model
    #[error("{action}: no model to act on")]
    MissingModel {
        /// Action name
        action: &'static str,
    },

    /// Action has no context model
    #[error("{action}: no context model")]
    MissingContext {
        /// Action name
        action: &'static str,
    },

    /// Create action has no metadata to build the model from
    #[error("{action}: no metadata to build the model from")]
    MissingMetaData {
        /// Action name
        action: &'static str,
    },

    /// Restore requested for a model with no inherited counterpart
    #[error("model '{id}' has no inherited model to restore")]
    NoInheritedModel {
        /// Id of the local model
        id: String,
    },

    /// Action was already executed, or was never executed before a restore
    #[error("{action}: {reason}")]
    InvalidState {
        /// Action name
        action: &'static str,
        /// What was out of order
        reason: &'static str,
    },

    /// Tree operation failed
    #[error("model error: {0}")]
    Model(#[from] ModelError),

    /// Rule evaluation failed
    #[error("rule error: {0}")]
    Rule(#[from] RuleError),
}

impl ActionError {
    /// Create missing model error
    #[inline]
    #[must_use]
    pub fn missing_model(action: &'static str) -> Self {
        Self::MissingModel { action }
    }

    /// Create missing context error
    #[inline]
    #[must_use]
    pub fn missing_context(action: &'static str) -> Self {
        Self::MissingContext { action }
    }

    /// Create invalid state error
    #[inline]
    #[must_use]
    pub fn invalid_state(action: &'static str, reason: &'static str) -> Self {
        Self::InvalidState { action, reason }
    }

    /// Check if the action itself was incomplete
    #[inline]
    #[must_use]
    pub fn is_incomplete_action(&self) -> bool {
        matches!(
            self,
            Self::MissingModel { .. } | Self::MissingContext { .. } | Self::MissingMetaData { .. }
        )
    }
}

/// Configuration loading error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("cannot read config '{path}': {source}")]
    Io {
        /// Config file path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// File is not valid TOML for the config schema
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Value outside its allowed range
    #[error("invalid config value for '{key}': {reason}")]
    Invalid {
        /// Config key
        key: &'static str,
        /// Why it was rejected
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incomplete_action_predicate() {
        assert!(ActionError::missing_model("validate").is_incomplete_action());
        assert!(ActionError::missing_context("validate").is_incomplete_action());
        assert!(!ActionError::NoInheritedModel { id: "x".into() }.is_incomplete_action());
    }

    #[test]
    fn wraps_lower_layers() {
        let err: ActionError = ModelError::immutable("metadata 'label'").into();
        assert!(matches!(err, ActionError::Model(_)));
        assert_eq!(err.to_string(), "model error: object is sealed: metadata 'label'");
    }
}
