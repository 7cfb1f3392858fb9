//! Visibility filtering of definition fields and regions

use crate::node::{ModelKey, ModelNode, ModelType};
use crate::tree::ModelTree;
use std::collections::HashSet;

/// Display type of fields managed by the system
pub const DISPLAY_TYPE_SYSTEM: &str = "SYSTEM";

/// Display type of hidden fields
pub const DISPLAY_TYPE_HIDDEN: &str = "HIDDEN";

/// Criteria deciding which fields of a definition are shown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelFilter {
    /// Case-insensitive fragment of the field label; empty matches all
    pub term: String,
    /// Show fields with display type `SYSTEM`
    pub show_system: bool,
    /// Show fields with display type `HIDDEN`
    pub show_hidden: bool,
    /// Show fields owned by a super definition
    pub show_inherited: bool,
}

impl Default for ModelFilter {
    fn default() -> Self {
        Self {
            term: String::new(),
            show_system: false,
            show_hidden: false,
            show_inherited: true,
        }
    }
}

impl ModelFilter {
    /// Filter matching labels containing `term`
    #[inline]
    #[must_use]
    pub fn with_term(mut self, term: impl Into<String>) -> Self {
        self.term = term.into();
        self
    }

    /// Toggle system fields
    #[inline]
    #[must_use]
    pub fn with_system(mut self, show: bool) -> Self {
        self.show_system = show;
        self
    }

    /// Toggle hidden fields
    #[inline]
    #[must_use]
    pub fn with_hidden(mut self, show: bool) -> Self {
        self.show_hidden = show;
        self
    }

    /// Toggle inherited fields
    #[inline]
    #[must_use]
    pub fn with_inherited(mut self, show: bool) -> Self {
        self.show_inherited = show;
        self
    }

    /// Check a single field or property against the filter
    ///
    /// Display types only restrict fields of a definition; class properties
    /// are checked for term and inheritance alone.
    #[must_use]
    pub fn accepts(&self, tree: &ModelTree, model: ModelKey, context: ModelKey, language: &str) -> bool {
        let Some(node) = tree.get(model) else {
            return false;
        };
        let in_definition = tree
            .get(context)
            .is_some_and(|c| c.model_type() == ModelType::Definition);
        let visibility = match node.display_type() {
            Some(DISPLAY_TYPE_SYSTEM) if in_definition => self.show_system,
            Some(DISPLAY_TYPE_HIDDEN) if in_definition => self.show_hidden,
            _ => true,
        };
        let inherited = !tree.is_inherited(model, context) || self.show_inherited;
        visibility && inherited && self.matches_term(node, language)
    }

    /// Update the views of the effective fields and regions of `definition`
    ///
    /// A region is visible when at least one of its fields is. Returns the
    /// visible fields in effective order.
    pub fn apply(&self, tree: &mut ModelTree, definition: ModelKey, language: &str) -> Vec<ModelKey> {
        let fields = tree.effective_fields(definition);
        let mut visible = Vec::new();
        let mut visible_regions = HashSet::new();

        for field in fields {
            let accepted = self.accepts(tree, field, definition, language);
            if let Some(node) = tree.get_mut(field) {
                if let Some(view) = node.view_mut() {
                    view.visible = accepted;
                }
                if accepted {
                    if let Some(region) = node.as_field().and_then(|f| f.region_id.clone()) {
                        visible_regions.insert(region);
                    }
                    visible.push(field);
                }
            }
        }

        for region in tree.effective_children(definition, ModelType::Region) {
            if let Some(node) = tree.get_mut(region) {
                let shown = visible_regions.contains(node.id());
                if let Some(view) = node.view_mut() {
                    view.visible = shown;
                }
            }
        }

        tracing::debug!(visible = visible.len(), term = %self.term, "applied model filter");
        visible
    }

    fn matches_term(&self, node: &ModelNode, language: &str) -> bool {
        if self.term.is_empty() {
            return true;
        }
        node.description(language).map_or(true, |label| {
            label.to_uppercase().contains(&self.term.to_uppercase())
        })
    }
}
