//! Model paths for addressing nodes across the tree
//!
//! Provides [`ModelPath`], the root-to-node chain of `(kind, id)` segments
//! recorded in change sets.

use crate::node::ModelType;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// One step of a [`ModelPath`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathSegment {
    /// Node kind
    #[serde(rename = "type")]
    pub model_type: ModelType,
    /// Node id
    pub id: String,
}

impl PathSegment {
    /// Create segment
    #[inline]
    #[must_use]
    pub fn new(model_type: ModelType, id: impl Into<String>) -> Self {
        Self {
            model_type,
            id: id.into(),
        }
    }
}

impl Display for PathSegment {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.model_type, self.id)
    }
}

/// Path of a node from its outermost container
///
/// # Examples
/// - `definition:case/field:title`
/// - `definition:case/field:status/control:DEFAULT_VALUE_PATTERN`
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelPath(Vec<PathSegment>);

impl ModelPath {
    /// Create path from segments
    #[inline]
    #[must_use]
    pub fn new(segments: Vec<PathSegment>) -> Self {
        Self(segments)
    }

    /// Empty path
    #[inline]
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Append a segment, returning new path
    #[must_use]
    pub fn child(&self, model_type: ModelType, id: impl Into<String>) -> Self {
        let mut new = self.clone();
        new.0.push(PathSegment::new(model_type, id));
        new
    }

    /// Path segments
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    /// Number of segments
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if path is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Path without the last segment
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        self.0
            .split_last()
            .map(|(_, rest)| Self(rest.to_vec()))
    }

    /// Last segment
    #[inline]
    #[must_use]
    pub fn last(&self) -> Option<&PathSegment> {
        self.0.last()
    }

    /// Check if this path is a prefix of another
    #[must_use]
    pub fn is_prefix_of(&self, other: &Self) -> bool {
        self.0.len() <= other.0.len() && self.0 == other.0[..self.0.len()]
    }
}

impl Display for ModelPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for segment in &self.0 {
            if !first {
                f.write_str("/")?;
            }
            write!(f, "{segment}")?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_building_and_display() {
        let def = ModelPath::root().child(ModelType::Definition, "case");
        let field = def.child(ModelType::Field, "title");

        assert_eq!(field.to_string(), "definition:case/field:title");
        assert_eq!(field.len(), 2);
        assert_eq!(field.last().unwrap().id, "title");
        assert_eq!(field.parent(), Some(def.clone()));
        assert!(def.is_prefix_of(&field));
        assert!(!field.is_prefix_of(&def));
        assert!(ModelPath::root().parent().is_none());
    }

    #[test]
    fn path_serializes_as_segment_list() {
        let path = ModelPath::root()
            .child(ModelType::Definition, "case")
            .child(ModelType::Field, "title");
        let json = serde_json::to_value(&path).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {"type": "definition", "id": "case"},
                {"type": "field", "id": "title"}
            ])
        );
    }
}
