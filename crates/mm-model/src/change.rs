//! Change sets produced by executed actions
//!
//! Provides [`ModelChangeSet`], the record of one structural or value change
//! that becomes part of the persistence payload.

use crate::path::ModelPath;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::{self, Display, Formatter};

/// Selector used when a whole node (not one attribute) was changed
pub const MODEL_SELECTOR: &str = "model";

/// Kind of change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeOperation {
    /// Node was created
    Create,
    /// Value was modified
    Modify,
    /// Inherited node or value was restored
    Restore,
    /// Node was removed
    Remove,
}

impl Display for ChangeOperation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Create => "create",
            Self::Modify => "modify",
            Self::Restore => "restore",
            Self::Remove => "remove",
        };
        f.write_str(name)
    }
}

/// One recorded change
///
/// # Invariants
/// - `model` addresses the node owning the change
/// - `selector` is [`MODEL_SELECTOR`] for node level changes, otherwise the
///   attribute id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelChangeSet {
    /// Changed node
    pub model: ModelPath,
    /// Changed part of the node
    pub selector: String,
    /// Kind of change
    pub operation: ChangeOperation,
    /// Value before the change
    #[serde(default)]
    pub old_value: Value,
    /// Value after the change
    #[serde(default)]
    pub new_value: Value,
}

impl ModelChangeSet {
    /// Create change set
    #[inline]
    #[must_use]
    pub fn new(
        model: ModelPath,
        selector: impl Into<String>,
        operation: ChangeOperation,
        old_value: Value,
        new_value: Value,
    ) -> Self {
        Self {
            model,
            selector: selector.into(),
            operation,
            old_value,
            new_value,
        }
    }

    /// Node level change without values
    #[inline]
    #[must_use]
    pub fn for_model(model: ModelPath, operation: ChangeOperation) -> Self {
        Self::new(model, MODEL_SELECTOR, operation, Value::Null, Value::Null)
    }

    /// Attribute value change
    #[inline]
    #[must_use]
    pub fn for_attribute(
        model: ModelPath,
        attribute: impl Into<String>,
        operation: ChangeOperation,
        old_value: Value,
        new_value: Value,
    ) -> Self {
        Self::new(model, attribute, operation, old_value, new_value)
    }

    /// Check if the change targets the whole node
    #[inline]
    #[must_use]
    pub fn is_model_change(&self) -> bool {
        self.selector == MODEL_SELECTOR
    }
}

impl Display for ModelChangeSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}#{}", self.operation, self.model, self.selector)
    }
}
