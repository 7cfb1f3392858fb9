//! Error types for the model tree
//!
//! Covers the failures of tree construction and mutation:
//! - Duplicate identifiers inside a container
//! - Attribute values that do not fit their declared type
//! - Writes to sealed metadata and rules
//! - Stale keys and mismatched node kinds
//! - Malformed model or metadata JSON

use crate::node::ModelType;

/// Model tree error
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// A container already holds a model with this id
    #[error("duplicate model id: '{id}'")]
    DuplicateModelId {
        /// Rejected id
        id: String,
    },

    /// Attribute value does not match the attribute type
    #[error("attribute '{attribute}' expects {expected}, got {value}")]
    TypeMismatch {
        /// Attribute id
        attribute: String,
        /// Declared type
        expected: String,
        /// Offending value
        value: String,
    },

    /// Write attempted on a sealed object
    #[error("object is sealed: {object}")]
    Immutable {
        /// Sealed object
        object: String,
    },

    /// Key does not refer to a live node
    #[error("model not found: {0}")]
    ModelNotFound(String),

    /// Node has a different kind than the operation requires
    #[error("model '{id}' is a {actual}, expected {expected}")]
    WrongModelType {
        /// Node id
        id: String,
        /// Kind the operation needs
        expected: ModelType,
        /// Kind of the node
        actual: ModelType,
    },

    /// Container cannot own children of the given kind
    #[error("a {container} cannot contain a {child}")]
    UnsupportedContainment {
        /// Container kind
        container: ModelType,
        /// Child kind
        child: ModelType,
    },

    /// Child is not part of the container
    #[error("model '{id}' is not attached to '{container}'")]
    NotAttached {
        /// Child id
        id: String,
        /// Container id
        container: String,
    },

    /// Child is already listed under another container
    #[error("model '{id}' is already attached to '{container}'")]
    AlreadyAttached {
        /// Child id
        id: String,
        /// Current container id
        container: String,
    },

    /// Inheritance chain loops back on itself
    #[error("cyclic model hierarchy at '{0}'")]
    CyclicHierarchy(String),

    /// Model or metadata payload could not be loaded
    #[error("load failed: {0}")]
    Load(String),

    /// Malformed JSON
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ModelError {
    /// Create type mismatch error
    #[inline]
    pub fn type_mismatch(
        attribute: impl Into<String>,
        expected: impl std::fmt::Display,
        value: impl std::fmt::Display,
    ) -> Self {
        Self::TypeMismatch {
            attribute: attribute.into(),
            expected: expected.to_string(),
            value: value.to_string(),
        }
    }

    /// Create immutability error
    #[inline]
    pub fn immutable(object: impl Into<String>) -> Self {
        Self::Immutable {
            object: object.into(),
        }
    }

    /// Check if the error is a duplicate id rejection
    #[inline]
    #[must_use]
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::DuplicateModelId { .. })
    }

    /// Check if the error is a sealed-object write
    #[inline]
    #[must_use]
    pub fn is_immutable(&self) -> bool {
        matches!(self, Self::Immutable { .. })
    }
}
