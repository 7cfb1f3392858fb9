//! Plugin registry for extension points
//!
//! Provides [`PluginRegistryBuilder`] for the one-time registration phase and
//! [`PluginRegistry`], the read-only table handed to whatever assembles a
//! [`CommandChain`](crate::CommandChain).

use crate::error::RuleError;
use crate::rules::{InCommand, NotInCommand, NotMatchCommand, RuleCommand};
use indexmap::IndexMap;
use std::sync::Arc;

/// Extension point holding the rule command plugins
pub const RULE_COMMAND_EXTENSION_POINT: &str = "model-management-rule-command";

/// A named component registered under an extension point
#[derive(Debug)]
pub struct PluginDescriptor<T: ?Sized> {
    name: String,
    component: Arc<T>,
}

impl<T: ?Sized> PluginDescriptor<T> {
    /// Create descriptor
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, component: Arc<T>) -> Self {
        Self {
            name: name.into(),
            component,
        }
    }

    /// Plugin name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registered component
    #[inline]
    #[must_use]
    pub fn component(&self) -> &Arc<T> {
        &self.component
    }
}

impl<T: ?Sized> Clone for PluginDescriptor<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            component: Arc::clone(&self.component),
        }
    }
}

/// Registration phase of a [`PluginRegistry`]
///
/// Populated once during application initialization, then frozen with
/// [`PluginRegistryBuilder::build`].
#[derive(Debug)]
pub struct PluginRegistryBuilder<T: ?Sized> {
    extensions: IndexMap<String, Vec<PluginDescriptor<T>>>,
}

impl<T: ?Sized> PluginRegistryBuilder<T> {
    /// Create empty builder
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            extensions: IndexMap::new(),
        }
    }

    /// Register a plugin under an extension point
    ///
    /// # Errors
    /// `RuleError::DuplicatePlugin` if the name is taken within that extension point
    pub fn add(
        &mut self,
        extension_point: &str,
        descriptor: PluginDescriptor<T>,
    ) -> Result<&mut Self, RuleError> {
        let plugins = self
            .extensions
            .entry(extension_point.to_string())
            .or_default();
        if plugins.iter().any(|p| p.name == descriptor.name) {
            return Err(RuleError::DuplicatePlugin {
                extension_point: extension_point.to_string(),
                name: descriptor.name,
            });
        }
        tracing::debug!(extension_point, plugin = %descriptor.name, "registered plugin");
        plugins.push(descriptor);
        Ok(self)
    }

    /// Freeze the registry
    #[must_use]
    pub fn build(self) -> PluginRegistry<T> {
        PluginRegistry {
            extensions: self.extensions,
        }
    }
}

impl<T: ?Sized> Default for PluginRegistryBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only table of plugins grouped by extension point
///
/// Registration order is preserved within each extension point.
#[derive(Debug)]
pub struct PluginRegistry<T: ?Sized> {
    extensions: IndexMap<String, Vec<PluginDescriptor<T>>>,
}

impl<T: ?Sized> PluginRegistry<T> {
    /// Start a registration phase
    #[inline]
    #[must_use]
    pub fn builder() -> PluginRegistryBuilder<T> {
        PluginRegistryBuilder::new()
    }

    /// Plugins registered under `extension_point` (empty if unknown)
    #[must_use]
    pub fn get(&self, extension_point: &str) -> &[PluginDescriptor<T>] {
        self.extensions
            .get(extension_point)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Check if a plugin is registered
    #[must_use]
    pub fn contains(&self, extension_point: &str, name: &str) -> bool {
        self.get(extension_point).iter().any(|p| p.name == name)
    }

    /// Names of all known extension points
    #[must_use]
    pub fn extension_points(&self) -> Vec<&str> {
        self.extensions.keys().map(String::as_str).collect()
    }

    /// Total number of registered plugins
    #[must_use]
    pub fn len(&self) -> usize {
        self.extensions.values().map(Vec::len).sum()
    }

    /// Check if nothing is registered
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Registry with the built-in rule commands under
/// [`RULE_COMMAND_EXTENSION_POINT`]
#[must_use]
pub fn default_rule_registry() -> PluginRegistry<RuleCommand> {
    let plugins: [(&str, Arc<RuleCommand>); 3] = [
        ("NotMatchCommand", Arc::new(NotMatchCommand::new())),
        ("InCommand", Arc::new(InCommand)),
        ("NotInCommand", Arc::new(NotInCommand)),
    ];

    let mut builder = PluginRegistry::builder();
    for (name, component) in plugins {
        if let Err(e) = builder.add(
            RULE_COMMAND_EXTENSION_POINT,
            PluginDescriptor::new(name, component),
        ) {
            tracing::warn!(plugin = name, error = %e, "built-in rule command not registered");
        }
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandChain;
    use crate::rules::RuleData;
    use serde_json::json;

    #[test]
    fn registry_builder_empty() {
        let registry: PluginRegistry<str> = PluginRegistry::builder().build();
        assert!(registry.is_empty());
        assert!(registry.get("anything").is_empty());
    }

    #[test]
    fn registry_preserves_registration_order() {
        let mut builder = PluginRegistry::<str>::builder();
        builder
            .add("point", PluginDescriptor::new("b", Arc::from("second")))
            .unwrap()
            .add("point", PluginDescriptor::new("a", Arc::from("first")))
            .unwrap();
        let registry = builder.build();

        let names: Vec<_> = registry.get("point").iter().map(PluginDescriptor::name).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.extension_points(), vec!["point"]);
    }

    #[test]
    fn registry_rejects_duplicate_names() {
        let mut builder = PluginRegistry::<str>::builder();
        builder
            .add("point", PluginDescriptor::new("a", Arc::from("x")))
            .unwrap();
        let err = builder
            .add("point", PluginDescriptor::new("a", Arc::from("y")))
            .unwrap_err();
        assert!(matches!(err, RuleError::DuplicatePlugin { .. }));

        // same name under another extension point is fine
        assert!(builder
            .add("other", PluginDescriptor::new("a", Arc::from("z")))
            .is_ok());
    }

    #[test]
    fn default_rule_registry_contents() {
        let registry = default_rule_registry();
        assert_eq!(registry.len(), 3);
        assert!(registry.contains(RULE_COMMAND_EXTENSION_POINT, "InCommand"));
        assert!(registry.contains(RULE_COMMAND_EXTENSION_POINT, "NotInCommand"));
        assert!(registry.contains(RULE_COMMAND_EXTENSION_POINT, "NotMatchCommand"));
    }

    #[test]
    fn chain_assembled_from_registry() {
        let registry = default_rule_registry();
        let chain = CommandChain::from_registry(&registry, RULE_COMMAND_EXTENSION_POINT);
        assert_eq!(chain.names(), vec!["not_match", "in", "not_in"]);

        let data = RuleData::new("not_in", json!("a"), vec![json!("b")]);
        assert!(chain.execute(&data).unwrap());
    }

    #[test]
    fn chain_from_unknown_extension_point_is_empty() {
        let registry = default_rule_registry();
        let chain = CommandChain::from_registry(&registry, "missing");
        assert!(chain.is_empty());
    }
}
