//! Testing utilities for the model management workspace
//!
//! Shared fixtures: a metadata catalogue and an `entity` <- `media`
//! definition hierarchy in the backend JSON shape.

#![allow(missing_docs)]

use mm_model::{LoadedModels, ModelKey, ModelTree, ModelType, ModelsMetaData};

/// Metadata catalogue JSON
pub const METADATA_JSON: &str = include_str!("../fixtures/metadata.json");

/// Model definitions JSON
pub const MODELS_JSON: &str = include_str!("../fixtures/models.json");

/// Loaded fixture hierarchy
pub struct Fixture {
    pub tree: ModelTree,
    pub models: LoadedModels,
    pub meta: ModelsMetaData,
}

impl Fixture {
    pub fn entity(&self) -> ModelKey {
        self.models.definition("entity").unwrap()
    }

    pub fn media(&self) -> ModelKey {
        self.models.definition("media").unwrap()
    }

    /// Locally owned child of a definition or field
    pub fn child(&self, container: ModelKey, kind: ModelType, id: &str) -> ModelKey {
        self.tree
            .get(container)
            .and_then(|c| c.children(kind))
            .and_then(|list| list.get(id))
            .unwrap_or_else(|| panic!("fixture has no {kind} '{id}'"))
    }

    pub fn field(&self, definition: ModelKey, id: &str) -> ModelKey {
        self.child(definition, ModelType::Field, id)
    }

    pub fn region(&self, definition: ModelKey, id: &str) -> ModelKey {
        self.child(definition, ModelType::Region, id)
    }

    pub fn header(&self, definition: ModelKey, id: &str) -> ModelKey {
        self.child(definition, ModelType::Header, id)
    }

    pub fn control(&self, field: ModelKey, id: &str) -> ModelKey {
        self.child(field, ModelType::Control, id)
    }

    /// Ids of the given keys, in order
    pub fn ids(&self, keys: &[ModelKey]) -> Vec<String> {
        keys.iter()
            .map(|k| self.tree.get(*k).unwrap().id().to_string())
            .collect()
    }
}

pub fn load_metadata() -> ModelsMetaData {
    ModelsMetaData::from_json(METADATA_JSON).unwrap()
}

pub fn load_fixture() -> Fixture {
    let meta = load_metadata();
    let mut tree = ModelTree::new();
    let models = tree.load_json(MODELS_JSON, &meta).unwrap();
    Fixture { tree, models, meta }
}
