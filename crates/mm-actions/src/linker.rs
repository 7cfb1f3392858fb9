//! Linkers turning metadata into concrete model nodes

use crate::error::ActionError;
use mm_model::{MetaDataSet, ModelAttribute, ModelKey, ModelNode, ModelTree, ModelType};
use uuid::Uuid;

/// Builds new fields for create field actions
pub trait FieldLinker: Send + Sync {
    /// Create a detached field parented to `parent`, with one attribute per
    /// metadata entry
    ///
    /// # Errors
    /// Whatever prevents building the attributes
    fn create_model_field(
        &self,
        tree: &mut ModelTree,
        parent: ModelKey,
        meta: &MetaDataSet,
        id: Option<&str>,
    ) -> Result<ModelKey, ActionError>;
}

/// Builds new properties for create property actions
pub trait PropertyLinker: Send + Sync {
    /// Create a detached property parented to `parent`, with one attribute
    /// per metadata entry
    ///
    /// # Errors
    /// Whatever prevents building the attributes
    fn create_model_property(
        &self,
        tree: &mut ModelTree,
        parent: ModelKey,
        meta: &MetaDataSet,
        id: Option<&str>,
    ) -> Result<ModelKey, ActionError>;
}

/// Builds new controls for create control actions
pub trait ControlLinker: Send + Sync {
    /// Create a detached control parented to the field `parent`
    ///
    /// # Errors
    /// Whatever prevents building the attributes
    fn create_model_control(
        &self,
        tree: &mut ModelTree,
        parent: ModelKey,
        meta: &MetaDataSet,
        id: Option<&str>,
    ) -> Result<ModelKey, ActionError>;
}

/// Builds new control parameters for create control param actions
pub trait ControlParamLinker: Send + Sync {
    /// Create a detached parameter parented to the control `parent`
    ///
    /// # Errors
    /// Whatever prevents building the attributes
    fn create_model_control_param(
        &self,
        tree: &mut ModelTree,
        parent: ModelKey,
        meta: &MetaDataSet,
        id: Option<&str>,
    ) -> Result<ModelKey, ActionError>;
}

/// Linker filling attributes with the metadata default values
///
/// Nodes without an explicit id get a random UUID.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetaDataLinker;

impl MetaDataLinker {
    /// Create linker
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn create_model(
        tree: &mut ModelTree,
        kind: ModelType,
        parent: ModelKey,
        meta: &MetaDataSet,
        id: Option<&str>,
    ) -> Result<ModelKey, ActionError> {
        tree.node(parent)?;
        let id = id.map_or_else(|| Uuid::new_v4().to_string(), str::to_string);
        let mut node = ModelNode::new(id, kind);
        for entry in meta.iter() {
            node.base.attributes.insert(ModelAttribute::from_meta(entry)?);
        }
        node.base.parent = Some(parent);
        tracing::debug!(model = %node.id(), kind = %kind, attributes = node.attributes().len(), "linked model");
        Ok(tree.insert(node))
    }
}

impl FieldLinker for MetaDataLinker {
    fn create_model_field(
        &self,
        tree: &mut ModelTree,
        parent: ModelKey,
        meta: &MetaDataSet,
        id: Option<&str>,
    ) -> Result<ModelKey, ActionError> {
        Self::create_model(tree, ModelType::Field, parent, meta, id)
    }
}

impl PropertyLinker for MetaDataLinker {
    fn create_model_property(
        &self,
        tree: &mut ModelTree,
        parent: ModelKey,
        meta: &MetaDataSet,
        id: Option<&str>,
    ) -> Result<ModelKey, ActionError> {
        Self::create_model(tree, ModelType::Property, parent, meta, id)
    }
}

impl ControlLinker for MetaDataLinker {
    fn create_model_control(
        &self,
        tree: &mut ModelTree,
        parent: ModelKey,
        meta: &MetaDataSet,
        id: Option<&str>,
    ) -> Result<ModelKey, ActionError> {
        tree.expect(parent, ModelType::Field)?;
        Self::create_model(tree, ModelType::Control, parent, meta, id)
    }
}

impl ControlParamLinker for MetaDataLinker {
    fn create_model_control_param(
        &self,
        tree: &mut ModelTree,
        parent: ModelKey,
        meta: &MetaDataSet,
        id: Option<&str>,
    ) -> Result<ModelKey, ActionError> {
        tree.expect(parent, ModelType::Control)?;
        Self::create_model(tree, ModelType::ControlParam, parent, meta, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mm_model::{AttributeValue, ModelsMetaData};

    fn field_meta() -> MetaDataSet {
        ModelsMetaData::from_json(
            r#"{"fields": [
                {"id": "name", "type": "identifier", "defaultValue": ""},
                {"id": "displayType", "type": "displayType", "defaultValue": "EDITABLE"},
                {"id": "mandatory", "type": "boolean", "defaultValue": false, "validationModel": {"mandatory": true}}
            ]}"#,
        )
        .unwrap()
        .fields
    }

    #[test]
    fn field_gets_default_attributes() {
        let mut tree = ModelTree::new();
        let def = tree.create(ModelType::Definition, "case");
        let key = MetaDataLinker
            .create_model_field(&mut tree, def, &field_meta(), Some("title"))
            .unwrap();

        let node = tree.get(key).unwrap();
        assert_eq!(node.id(), "title");
        assert_eq!(node.model_type(), ModelType::Field);
        assert_eq!(node.parent(), Some(def));
        assert_eq!(node.attributes().len(), 3);
        assert_eq!(
            node.attribute("displayType").unwrap().value(),
            Some(&AttributeValue::String("EDITABLE".into()))
        );
        assert!(node.attribute("mandatory").unwrap().restrictions().mandatory);
        // linked but not listed yet
        assert!(tree.children(def, ModelType::Field).is_empty());
    }

    #[test]
    fn generated_ids_are_unique() {
        let mut tree = ModelTree::new();
        let class = tree.create(ModelType::Class, "emf:Document");
        let meta = MetaDataSet::new();
        let a = MetaDataLinker
            .create_model_property(&mut tree, class, &meta, None)
            .unwrap();
        let b = MetaDataLinker
            .create_model_property(&mut tree, class, &meta, None)
            .unwrap();

        assert_ne!(tree.get(a).unwrap().id(), tree.get(b).unwrap().id());
        assert!(Uuid::parse_str(tree.get(a).unwrap().id()).is_ok());
    }

    #[test]
    fn controls_hang_off_fields_and_params_off_controls() {
        let mut tree = ModelTree::new();
        let def = tree.create(ModelType::Definition, "case");
        let field = tree.create_child(def, ModelType::Field, "title").unwrap();
        let meta = MetaDataSet::new();

        let control = MetaDataLinker
            .create_model_control(&mut tree, field, &meta, Some("RELATED_FIELDS"))
            .unwrap();
        assert_eq!(tree.get(control).unwrap().model_type(), ModelType::Control);
        let param = MetaDataLinker
            .create_model_control_param(&mut tree, control, &meta, Some("filterSource"))
            .unwrap();
        assert_eq!(tree.get(param).unwrap().parent(), Some(control));

        let err = MetaDataLinker
            .create_model_control_param(&mut tree, field, &meta, None)
            .unwrap_err();
        assert!(matches!(
            err,
            ActionError::Model(mm_model::ModelError::WrongModelType { .. })
        ));
    }
}
