//! Attribute metadata
//!
//! [`ModelMetaData`] describes one attribute: its type, default value,
//! labels, mandatory flag and validation rules. Metadata is loaded once,
//! sealed, then shared as `Arc<ModelMetaData>` across every attribute it
//! describes. [`ModelsMetaData`] groups the metadata sets by node kind.
//!
//! Sealing is shallow: the setters on [`ModelMetaData`] are guarded, the
//! nested [`ModelValidationRules`] carry their own seal.

use crate::attribute::{AttributeType, AttributeValue};
use crate::error::ModelError;
use crate::node::ModelType;
use crate::validation::ModelValidationRules;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Validation part of a metadata entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetaDataValidation {
    /// Attribute must carry a value
    #[serde(default)]
    pub mandatory: bool,
    /// Conditional rules
    #[serde(default)]
    pub rules: ModelValidationRules,
}

/// Description of one attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelMetaData {
    id: String,
    #[serde(default)]
    uri: Option<String>,
    #[serde(rename = "type")]
    attr_type: AttributeType,
    #[serde(default)]
    default_value: Value,
    #[serde(default)]
    validation_model: MetaDataValidation,
    #[serde(default)]
    labels: BTreeMap<String, String>,
    #[serde(skip)]
    sealed: bool,
}

impl ModelMetaData {
    /// Create unsealed metadata
    #[must_use]
    pub fn new(id: impl Into<String>, attr_type: AttributeType) -> Self {
        Self {
            id: id.into(),
            uri: None,
            attr_type,
            default_value: Value::Null,
            validation_model: MetaDataValidation::default(),
            labels: BTreeMap::new(),
            sealed: false,
        }
    }

    /// Attribute id
    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Semantic uri
    #[inline]
    #[must_use]
    pub fn uri(&self) -> Option<&str> {
        self.uri.as_deref()
    }

    /// Attribute type
    #[inline]
    #[must_use]
    pub fn attr_type(&self) -> AttributeType {
        self.attr_type
    }

    /// Raw default value
    #[inline]
    #[must_use]
    pub fn default_value(&self) -> &Value {
        &self.default_value
    }

    /// Default value converted to the attribute type
    ///
    /// # Errors
    /// `ModelError::TypeMismatch` if the default does not fit the type
    pub fn default_attribute_value(&self) -> Result<Option<AttributeValue>, ModelError> {
        AttributeValue::from_json(&self.id, self.attr_type, &self.default_value)
    }

    /// Mandatory flag from the validation model
    #[inline]
    #[must_use]
    pub fn is_mandatory(&self) -> bool {
        self.validation_model.mandatory
    }

    /// Conditional validation rules
    #[inline]
    #[must_use]
    pub fn rules(&self) -> &ModelValidationRules {
        &self.validation_model.rules
    }

    /// Mutable access to the rules, guarded by their own seal
    #[inline]
    pub fn rules_mut(&mut self) -> &mut ModelValidationRules {
        &mut self.validation_model.rules
    }

    /// Labels by language
    #[inline]
    #[must_use]
    pub fn labels(&self) -> &BTreeMap<String, String> {
        &self.labels
    }

    /// Label for `language`, falling back to any label
    #[must_use]
    pub fn label(&self, language: &str) -> Option<&str> {
        self.labels
            .get(language)
            .or_else(|| self.labels.values().next())
            .map(String::as_str)
    }

    /// Set semantic uri
    ///
    /// # Errors
    /// `ModelError::Immutable` once sealed
    pub fn set_uri(&mut self, uri: impl Into<String>) -> Result<(), ModelError> {
        self.guard()?;
        self.uri = Some(uri.into());
        Ok(())
    }

    /// Set default value
    ///
    /// # Errors
    /// `ModelError::Immutable` once sealed
    pub fn set_default_value(&mut self, value: Value) -> Result<(), ModelError> {
        self.guard()?;
        self.default_value = value;
        Ok(())
    }

    /// Set mandatory flag
    ///
    /// # Errors
    /// `ModelError::Immutable` once sealed
    pub fn set_mandatory(&mut self, mandatory: bool) -> Result<(), ModelError> {
        self.guard()?;
        self.validation_model.mandatory = mandatory;
        Ok(())
    }

    /// Set label for a language
    ///
    /// # Errors
    /// `ModelError::Immutable` once sealed
    pub fn set_label(
        &mut self,
        language: impl Into<String>,
        label: impl Into<String>,
    ) -> Result<(), ModelError> {
        self.guard()?;
        self.labels.insert(language.into(), label.into());
        Ok(())
    }

    /// Forbid further writes through the setters, and seal the rules
    pub fn seal(&mut self) {
        self.sealed = true;
        self.validation_model.rules.seal();
    }

    /// Check if sealed
    #[inline]
    #[must_use]
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    fn guard(&self) -> Result<(), ModelError> {
        if self.sealed {
            tracing::warn!(meta = %self.id, "write rejected on sealed metadata");
            return Err(ModelError::immutable(format!("metadata '{}'", self.id)));
        }
        Ok(())
    }
}

/// Metadata entries of one node kind, keyed by attribute id
#[derive(Debug, Clone, Default)]
pub struct MetaDataSet {
    entries: IndexMap<String, Arc<ModelMetaData>>,
}

impl MetaDataSet {
    /// Create empty set
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seal and add an entry, replacing one with the same id
    pub fn insert(&mut self, mut meta: ModelMetaData) {
        meta.seal();
        self.entries.insert(meta.id.clone(), Arc::new(meta));
    }

    /// Lookup by attribute id
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Arc<ModelMetaData>> {
        self.entries.get(id)
    }

    /// Iterate in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<ModelMetaData>> {
        self.entries.values()
    }

    /// Number of entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<ModelMetaData> for MetaDataSet {
    fn from_iter<I: IntoIterator<Item = ModelMetaData>>(iter: I) -> Self {
        let mut set = Self::new();
        for meta in iter {
            set.insert(meta);
        }
        set
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MetaDataDto {
    #[serde(default)]
    definitions: Vec<ModelMetaData>,
    #[serde(default)]
    semantics: Vec<ModelMetaData>,
    #[serde(default)]
    properties: Vec<ModelMetaData>,
    #[serde(default)]
    fields: Vec<ModelMetaData>,
    #[serde(default)]
    regions: Vec<ModelMetaData>,
    #[serde(default)]
    headers: Vec<ModelMetaData>,
    #[serde(default)]
    controls: Vec<ModelMetaData>,
    #[serde(default)]
    control_params: Vec<ModelMetaData>,
    #[serde(default)]
    action_groups: Vec<ModelMetaData>,
}

/// Metadata sets grouped by node kind
#[derive(Debug, Clone, Default)]
pub struct ModelsMetaData {
    /// Definition attributes
    pub definitions: MetaDataSet,
    /// Class attributes
    pub semantics: MetaDataSet,
    /// Property attributes
    pub properties: MetaDataSet,
    /// Field attributes
    pub fields: MetaDataSet,
    /// Region attributes
    pub regions: MetaDataSet,
    /// Header attributes
    pub headers: MetaDataSet,
    /// Control attributes
    pub controls: MetaDataSet,
    /// Control parameter attributes
    pub control_params: MetaDataSet,
    /// Action group attributes
    pub action_groups: MetaDataSet,
}

impl ModelsMetaData {
    /// Parse and seal every metadata set from the backend JSON shape
    ///
    /// # Errors
    /// `ModelError::Json` on malformed input
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        let dto: MetaDataDto = serde_json::from_str(json)?;
        let meta = Self {
            definitions: dto.definitions.into_iter().collect(),
            semantics: dto.semantics.into_iter().collect(),
            properties: dto.properties.into_iter().collect(),
            fields: dto.fields.into_iter().collect(),
            regions: dto.regions.into_iter().collect(),
            headers: dto.headers.into_iter().collect(),
            controls: dto.controls.into_iter().collect(),
            control_params: dto.control_params.into_iter().collect(),
            action_groups: dto.action_groups.into_iter().collect(),
        };
        tracing::debug!(
            definitions = meta.definitions.len(),
            fields = meta.fields.len(),
            properties = meta.properties.len(),
            "loaded models metadata"
        );
        Ok(meta)
    }

    /// Metadata set describing nodes of `model_type`
    #[must_use]
    pub fn for_type(&self, model_type: ModelType) -> &MetaDataSet {
        match model_type {
            ModelType::Definition => &self.definitions,
            ModelType::Class => &self.semantics,
            ModelType::Property => &self.properties,
            ModelType::Field => &self.fields,
            ModelType::Region => &self.regions,
            ModelType::Header => &self.headers,
            ModelType::Control => &self.controls,
            ModelType::ControlParam => &self.control_params,
            ModelType::ActionGroup => &self.action_groups,
        }
    }

    /// Lookup one entry for a node kind
    #[must_use]
    pub fn get(&self, model_type: ModelType, id: &str) -> Option<&Arc<ModelMetaData>> {
        self.for_type(model_type).get(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> &'static str {
        r#"{
            "fields": [
                {
                    "id": "name",
                    "type": "identifier",
                    "defaultValue": "",
                    "validationModel": {"mandatory": true},
                    "labels": {"en": "Name"}
                },
                {
                    "id": "label",
                    "type": "label",
                    "defaultValue": {"en": "New field"},
                    "validationModel": {
                        "mandatory": false,
                        "rules": [{
                            "expressions": [{"field": "displayType", "operation": "in", "values": ["EDITABLE"]}],
                            "outcome": {"mandatory": true}
                        }]
                    }
                }
            ],
            "semantics": [{"id": "title", "uri": "dcterms:title", "type": "label"}]
        }"#
    }

    #[test]
    fn loads_and_seals_sets() {
        let meta = ModelsMetaData::from_json(sample()).unwrap();
        assert_eq!(meta.fields.len(), 2);
        assert_eq!(meta.semantics.len(), 1);
        assert!(meta.regions.is_empty());

        let name = meta.get(ModelType::Field, "name").unwrap();
        assert!(name.is_sealed());
        assert!(name.is_mandatory());
        assert_eq!(name.label("de"), Some("Name"));

        let label = meta.fields.get("label").unwrap();
        assert!(label.rules().is_sealed());
        assert_eq!(label.rules().len(), 1);

        let title = meta.for_type(ModelType::Class).get("title").unwrap();
        assert_eq!(title.uri(), Some("dcterms:title"));
    }

    #[test]
    fn default_attribute_value_is_typed() {
        let meta = ModelsMetaData::from_json(sample()).unwrap();
        let label = meta.fields.get("label").unwrap();
        let value = label.default_attribute_value().unwrap().unwrap();
        assert_eq!(value.text("en"), Some("New field"));
    }

    #[test]
    fn sealed_metadata_keeps_values() {
        let mut meta = ModelMetaData::new("order", AttributeType::Integer);
        meta.set_default_value(json!(10)).unwrap();
        meta.seal();

        let err = meta.set_default_value(json!(20)).unwrap_err();
        assert!(err.is_immutable());
        assert!(meta.set_mandatory(true).is_err());
        assert!(meta.set_label("en", "Order").is_err());
        assert!(meta.set_uri("emf:order").is_err());

        assert_eq!(meta.default_value(), &json!(10));
        assert!(!meta.is_mandatory());
        assert!(meta.labels().is_empty());
        assert!(meta.uri().is_none());
    }

    #[test]
    fn malformed_json_fails() {
        let err = ModelsMetaData::from_json("{\"fields\": [{\"id\": 1}]}").unwrap_err();
        assert!(matches!(err, ModelError::Json(_)));
    }
}
