//! Error types for rule evaluation
//!
//! Every failure here is synchronous and propagates to the caller unchanged.
//! There is no retry and no fallback value.

/// Errors raised by the command chain, the rule commands and the plugin registry
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    /// No command in the chain accepted the data
    #[error("no handler found for: {data}")]
    HandlerNotFound {
        /// Debug rendering of the unhandled input
        data: String,
    },

    /// A `not_match` pattern failed to compile
    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        /// Pattern as written in the rule
        pattern: String,
        /// Compiler error
        #[source]
        source: regex::Error,
    },

    /// Expected values have the wrong shape for the operation
    #[error("invalid values for '{operation}': {reason}")]
    InvalidValues {
        /// Rule operation
        operation: String,
        /// What is wrong with the values
        reason: String,
    },

    /// A value cannot take part in a primitive comparison
    #[error("value is not comparable: {0}")]
    NonComparableValue(serde_json::Value),

    /// A plugin with the same name is already registered
    #[error("plugin '{name}' already registered under '{extension_point}'")]
    DuplicatePlugin {
        /// Extension point registered under
        extension_point: String,
        /// Plugin name
        name: String,
    },
}

impl RuleError {
    /// Create handler-not-found error from any debuggable input
    #[inline]
    pub fn handler_not_found(data: &impl std::fmt::Debug) -> Self {
        Self::HandlerNotFound {
            data: format!("{data:?}"),
        }
    }

    /// Create invalid values error
    #[inline]
    pub fn invalid_values(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValues {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Check if the chain had no handler for the input
    #[inline]
    #[must_use]
    pub fn is_handler_not_found(&self) -> bool {
        matches!(self, Self::HandlerNotFound { .. })
    }
}
