//! Loading model definitions and classes from the backend JSON shape
//!
//! ```json
//! {
//!   "classes": [{"id": "emf:Document", "parent": null, "attributes": [], "properties": []}],
//!   "definitions": [{
//!     "id": "case", "parent": "entity",
//!     "attributes": [{"name": "abstract", "type": "boolean", "value": false}],
//!     "fields": [{
//!       "id": "title", "regionId": "details", "attributes": [],
//!       "controls": [{"id": "RELATED_FIELDS", "attributes": [], "controlParams": []}]
//!     }],
//!     "regions": [{"id": "details", "attributes": []}],
//!     "headers": [{"id": "default_header", "attributes": []}]
//!   }]
//! }
//! ```

use crate::attribute::{AttributeType, AttributeValue, ModelAttribute, URI_ATTRIBUTE};
use crate::error::ModelError;
use crate::meta::ModelsMetaData;
use crate::node::{ModelKey, ModelNode, ModelType};
use crate::tree::ModelTree;
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Deserialize)]
struct AttributeDto {
    name: String,
    #[serde(rename = "type")]
    attr_type: AttributeType,
    #[serde(default)]
    value: Value,
}

#[derive(Debug, Deserialize)]
struct NodeDto {
    id: String,
    #[serde(default)]
    attributes: Vec<AttributeDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ControlDto {
    id: String,
    #[serde(default)]
    attributes: Vec<AttributeDto>,
    #[serde(default)]
    control_params: Vec<NodeDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FieldDto {
    id: String,
    #[serde(default)]
    region_id: Option<String>,
    #[serde(default)]
    attributes: Vec<AttributeDto>,
    #[serde(default)]
    controls: Vec<ControlDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DefinitionDto {
    id: String,
    #[serde(default)]
    parent: Option<String>,
    #[serde(default)]
    attributes: Vec<AttributeDto>,
    #[serde(default)]
    fields: Vec<FieldDto>,
    #[serde(default)]
    regions: Vec<NodeDto>,
    #[serde(default)]
    headers: Vec<NodeDto>,
    #[serde(default)]
    action_groups: Vec<NodeDto>,
}

#[derive(Debug, Deserialize)]
struct ClassDto {
    id: String,
    #[serde(default)]
    parent: Option<String>,
    #[serde(default)]
    attributes: Vec<AttributeDto>,
    #[serde(default)]
    properties: Vec<NodeDto>,
}

#[derive(Debug, Default, Deserialize)]
struct ModelsDto {
    #[serde(default)]
    classes: Vec<ClassDto>,
    #[serde(default)]
    definitions: Vec<DefinitionDto>,
}

/// Top level models created by [`ModelTree::load_json`]
#[derive(Debug, Clone, Default)]
pub struct LoadedModels {
    /// Definitions by id, in input order
    pub definitions: IndexMap<String, ModelKey>,
    /// Classes by id, in input order
    pub classes: IndexMap<String, ModelKey>,
}

impl LoadedModels {
    /// Definition by id
    #[must_use]
    pub fn definition(&self, id: &str) -> Option<ModelKey> {
        self.definitions.get(id).copied()
    }

    /// Class by id
    #[must_use]
    pub fn class(&self, id: &str) -> Option<ModelKey> {
        self.classes.get(id).copied()
    }
}

impl ModelTree {
    /// Build the models described by `json` into this tree
    ///
    /// Attributes that have an entry in `meta` for their node kind share that
    /// metadata. Super models are resolved once every model exists; fields are
    /// linked to the class property with the same uri.
    ///
    /// # Errors
    /// `ModelError::Json` on malformed input, `ModelError::Load` for unknown
    /// parents, `ModelError::TypeMismatch` for ill-typed attribute values,
    /// `ModelError::DuplicateModelId` and `ModelError::CyclicHierarchy`.
    /// On error the tree is left as it was.
    pub fn load_json(&mut self, json: &str, meta: &ModelsMetaData) -> Result<LoadedModels, ModelError> {
        let dto: ModelsDto = serde_json::from_str(json)?;
        unique_ids(dto.classes.iter().map(|c| c.id.as_str()))?;
        unique_ids(dto.definitions.iter().map(|d| d.id.as_str()))?;

        let existing: HashSet<ModelKey> = self.iter().map(|(key, _)| key).collect();
        let result = self.load_models(dto, meta);
        if let Err(e) = &result {
            let added: Vec<_> = self
                .iter()
                .map(|(key, _)| key)
                .filter(|key| !existing.contains(key))
                .collect();
            tracing::warn!(error = %e, discarded = added.len(), "model load failed");
            for key in added {
                self.discard(key);
            }
        }
        result
    }

    fn load_models(&mut self, dto: ModelsDto, meta: &ModelsMetaData) -> Result<LoadedModels, ModelError> {
        let mut loaded = LoadedModels::default();
        let mut supers = Vec::new();
        let mut properties_by_uri = HashMap::new();

        for class in dto.classes {
            let key = self.load_node(ModelType::Class, &class.id, &class.attributes, meta)?;
            for property in &class.properties {
                let p = self.load_node(ModelType::Property, &property.id, &property.attributes, meta)?;
                self.attach(key, p)?;
                let uri = self
                    .attribute(p, URI_ATTRIBUTE)
                    .and_then(ModelAttribute::value)
                    .and_then(AttributeValue::as_str)
                    .map_or_else(|| property.id.clone(), str::to_string);
                properties_by_uri.insert(uri, p);
            }
            loaded.classes.insert(class.id, key);
            supers.push((ModelType::Class, key, class.parent));
        }

        for def in dto.definitions {
            let key = self.load_definition(&def, meta)?;
            loaded.definitions.insert(def.id, key);
            supers.push((ModelType::Definition, key, def.parent));
        }

        for (kind, key, parent) in supers {
            let Some(parent) = parent else { continue };
            let resolved = match kind {
                ModelType::Class => loaded.class(&parent),
                _ => loaded.definition(&parent),
            };
            let parent_key = resolved.ok_or_else(|| {
                ModelError::Load(format!("unknown parent {kind} '{parent}'"))
            })?;
            self.set_super(key, parent_key)?;
        }

        if !properties_by_uri.is_empty() {
            self.link_fields(&loaded, &properties_by_uri)?;
        }

        tracing::info!(
            definitions = loaded.definitions.len(),
            classes = loaded.classes.len(),
            "loaded models"
        );
        Ok(loaded)
    }

    fn load_definition(&mut self, def: &DefinitionDto, meta: &ModelsMetaData) -> Result<ModelKey, ModelError> {
        let key = self.load_node(ModelType::Definition, &def.id, &def.attributes, meta)?;

        // regions first so that fields get listed in them on attach
        for region in &def.regions {
            let r = self.load_node(ModelType::Region, &region.id, &region.attributes, meta)?;
            self.attach(key, r)?;
        }
        for field in &def.fields {
            let f = self.load_node(ModelType::Field, &field.id, &field.attributes, meta)?;
            if let Some(data) = self.node_mut(f)?.as_field_mut() {
                data.region_id.clone_from(&field.region_id);
            }
            self.attach(key, f)?;
            for control in &field.controls {
                let c = self.load_node(ModelType::Control, &control.id, &control.attributes, meta)?;
                self.attach(f, c)?;
                for param in &control.control_params {
                    let p = self.load_node(ModelType::ControlParam, &param.id, &param.attributes, meta)?;
                    self.attach(c, p)?;
                }
            }
        }
        for header in &def.headers {
            let h = self.load_node(ModelType::Header, &header.id, &header.attributes, meta)?;
            self.attach(key, h)?;
        }
        for group in &def.action_groups {
            let g = self.load_node(ModelType::ActionGroup, &group.id, &group.attributes, meta)?;
            self.attach(key, g)?;
        }
        Ok(key)
    }

    fn load_node(
        &mut self,
        kind: ModelType,
        id: &str,
        attributes: &[AttributeDto],
        meta: &ModelsMetaData,
    ) -> Result<ModelKey, ModelError> {
        let mut node = ModelNode::new(id, kind);
        for dto in attributes {
            let value = AttributeValue::from_json(&dto.name, dto.attr_type, &dto.value)?;
            let mut attribute = ModelAttribute::new(&dto.name, dto.attr_type, value)?;
            if let Some(m) = meta.get(kind, &dto.name) {
                attribute = attribute.with_meta(m.clone());
            }
            node.base.attributes.insert(attribute);
        }
        Ok(self.insert(node))
    }

    fn link_fields(
        &mut self,
        loaded: &LoadedModels,
        properties_by_uri: &HashMap<String, ModelKey>,
    ) -> Result<(), ModelError> {
        for def in loaded.definitions.values() {
            for field in self.children(*def, ModelType::Field) {
                let property = self
                    .attribute(field, URI_ATTRIBUTE)
                    .and_then(ModelAttribute::value)
                    .and_then(AttributeValue::as_str)
                    .and_then(|uri| properties_by_uri.get(uri))
                    .copied();
                if let Some(property) = property {
                    self.link_property(field, property)?;
                }
            }
        }
        Ok(())
    }
}

fn unique_ids<'a>(ids: impl Iterator<Item = &'a str>) -> Result<(), ModelError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(ModelError::DuplicateModelId { id: id.to_string() });
        }
    }
    Ok(())
}
