//! Model node kinds
//!
//! Every node shares a [`ModelBase`] (id, attributes, parent, validation).
//! Per-kind data lives in [`ModelKind`]. Nodes are stored in a
//! [`ModelTree`](crate::ModelTree) arena and refer to each other by
//! [`ModelKey`].

use crate::attribute::{
    AttributeValue, ModelAttribute, ModelAttributes, DISPLAY_ATTRIBUTE, LABEL_ATTRIBUTE,
    ORDER_ATTRIBUTE,
};
use crate::list::ModelList;
use crate::validation::ModelValidation;
use serde::{Deserialize, Serialize};
use slotmap::new_key_type;
use std::fmt::{self, Display, Formatter};

new_key_type! {
    /// Stable handle of a node inside a [`ModelTree`](crate::ModelTree).
    ///
    /// Keys stay valid while the node is detached and reattached; they become
    /// stale only when the node is removed from the arena.
    pub struct ModelKey;
}

/// Node kind discriminant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ModelType {
    /// Document definition
    Definition,
    /// Semantic class
    Class,
    /// Definition field
    Field,
    /// Group of fields
    Region,
    /// Definition header
    Header,
    /// Semantic property
    Property,
    /// Group of actions
    ActionGroup,
    /// Field control
    Control,
    /// Control parameter
    ControlParam,
}

impl ModelType {
    /// Lowercase name
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Definition => "definition",
            Self::Class => "class",
            Self::Field => "field",
            Self::Region => "region",
            Self::Header => "header",
            Self::Property => "property",
            Self::ActionGroup => "actionGroup",
            Self::Control => "control",
            Self::ControlParam => "controlParam",
        }
    }
}

impl Display for ModelType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Presentation flags of a field or region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelView {
    /// Shown in the current listing
    pub visible: bool,
    /// Show the inherited parent next to the node
    pub show_parent: bool,
}

impl Default for ModelView {
    fn default() -> Self {
        Self {
            visible: true,
            show_parent: false,
        }
    }
}

/// Owned child lists of a definition
#[derive(Debug, Clone, Default)]
pub struct DefinitionData {
    /// Fields
    pub fields: ModelList,
    /// Regions
    pub regions: ModelList,
    /// Headers
    pub headers: ModelList,
    /// Action groups
    pub action_groups: ModelList,
}

/// Owned child list of a class
#[derive(Debug, Clone, Default)]
pub struct ClassData {
    /// Properties
    pub properties: ModelList,
}

/// Field specific data
#[derive(Debug, Clone, Default)]
pub struct FieldData {
    /// Region the field is shown in
    pub region_id: Option<String>,
    /// Non-owning reference to the semantic property
    pub property: Option<ModelKey>,
    /// Controls
    pub controls: ModelList,
    /// Presentation flags
    pub view: ModelView,
}

/// Region specific data
///
/// `fields` references fields owned by the definition.
#[derive(Debug, Clone, Default)]
pub struct RegionData {
    /// Fields shown in the region
    pub fields: ModelList,
    /// Presentation flags
    pub view: ModelView,
}

/// Control specific data
#[derive(Debug, Clone, Default)]
pub struct ControlData {
    /// Control parameters
    pub params: ModelList,
}

/// Per-kind node data
#[derive(Debug, Clone)]
pub enum ModelKind {
    /// Definition
    Definition(DefinitionData),
    /// Class
    Class(ClassData),
    /// Field
    Field(FieldData),
    /// Region
    Region(RegionData),
    /// Header
    Header,
    /// Property
    Property,
    /// Action group
    ActionGroup,
    /// Control
    Control(ControlData),
    /// Control parameter
    ControlParam,
}

impl ModelKind {
    /// Empty data for a node kind
    #[must_use]
    pub fn empty(model_type: ModelType) -> Self {
        match model_type {
            ModelType::Definition => Self::Definition(DefinitionData::default()),
            ModelType::Class => Self::Class(ClassData::default()),
            ModelType::Field => Self::Field(FieldData::default()),
            ModelType::Region => Self::Region(RegionData::default()),
            ModelType::Header => Self::Header,
            ModelType::Property => Self::Property,
            ModelType::ActionGroup => Self::ActionGroup,
            ModelType::Control => Self::Control(ControlData::default()),
            ModelType::ControlParam => Self::ControlParam,
        }
    }

    /// Discriminant
    #[must_use]
    pub fn model_type(&self) -> ModelType {
        match self {
            Self::Definition(_) => ModelType::Definition,
            Self::Class(_) => ModelType::Class,
            Self::Field(_) => ModelType::Field,
            Self::Region(_) => ModelType::Region,
            Self::Header => ModelType::Header,
            Self::Property => ModelType::Property,
            Self::ActionGroup => ModelType::ActionGroup,
            Self::Control(_) => ModelType::Control,
            Self::ControlParam => ModelType::ControlParam,
        }
    }
}

/// Data shared by every node kind
#[derive(Debug, Clone)]
pub struct ModelBase {
    id: String,
    /// Attributes keyed by id
    pub attributes: ModelAttributes,
    /// Owner for child nodes, super model for definitions and classes
    pub parent: Option<ModelKey>,
    /// Node level validation state
    pub validation: ModelValidation,
}

impl ModelBase {
    /// Create base with no attributes
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attributes: ModelAttributes::new(),
            parent: None,
            validation: ModelValidation::new(),
        }
    }

    /// Node id, fixed at construction
    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

/// A node of the model tree
#[derive(Debug, Clone)]
pub struct ModelNode {
    /// Shared data
    pub base: ModelBase,
    /// Kind specific data
    pub kind: ModelKind,
}

impl ModelNode {
    /// Create node of `model_type` with empty data
    #[must_use]
    pub fn new(id: impl Into<String>, model_type: ModelType) -> Self {
        Self {
            base: ModelBase::new(id),
            kind: ModelKind::empty(model_type),
        }
    }

    /// Node id
    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        self.base.id()
    }

    /// Node kind
    #[inline]
    #[must_use]
    pub fn model_type(&self) -> ModelType {
        self.kind.model_type()
    }

    /// Owner or super model
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<ModelKey> {
        self.base.parent
    }

    /// Attribute by id
    #[inline]
    #[must_use]
    pub fn attribute(&self, id: &str) -> Option<&ModelAttribute> {
        self.base.attributes.get(id)
    }

    /// Mutable attribute by id
    #[inline]
    pub fn attribute_mut(&mut self, id: &str) -> Option<&mut ModelAttribute> {
        self.base.attributes.get_mut(id)
    }

    /// Attributes
    #[inline]
    #[must_use]
    pub fn attributes(&self) -> &ModelAttributes {
        &self.base.attributes
    }

    /// Node level validation
    #[inline]
    #[must_use]
    pub fn validation(&self) -> &ModelValidation {
        &self.base.validation
    }

    /// Check if the node and all of its attributes are valid
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.base.validation.is_valid()
            && self.base.attributes.iter().all(|a| a.validation().is_valid())
    }

    /// Label text in `language`
    #[must_use]
    pub fn description(&self, language: &str) -> Option<&str> {
        self.attribute(LABEL_ATTRIBUTE)
            .and_then(ModelAttribute::value)
            .and_then(|v| v.text(language))
    }

    /// Value of the `order` attribute, integer or double
    #[must_use]
    pub fn order(&self) -> Option<f64> {
        self.attribute(ORDER_ATTRIBUTE)
            .and_then(ModelAttribute::value)
            .and_then(AttributeValue::as_f64)
    }

    /// Value of the `displayType` attribute
    #[must_use]
    pub fn display_type(&self) -> Option<&str> {
        self.attribute(DISPLAY_ATTRIBUTE)
            .and_then(ModelAttribute::value)
            .and_then(AttributeValue::as_str)
    }

    /// Definition data if this is a definition
    #[must_use]
    pub fn as_definition(&self) -> Option<&DefinitionData> {
        match &self.kind {
            ModelKind::Definition(data) => Some(data),
            _ => None,
        }
    }

    /// Class data if this is a class
    #[must_use]
    pub fn as_class(&self) -> Option<&ClassData> {
        match &self.kind {
            ModelKind::Class(data) => Some(data),
            _ => None,
        }
    }

    /// Field data if this is a field
    #[must_use]
    pub fn as_field(&self) -> Option<&FieldData> {
        match &self.kind {
            ModelKind::Field(data) => Some(data),
            _ => None,
        }
    }

    /// Mutable field data
    pub fn as_field_mut(&mut self) -> Option<&mut FieldData> {
        match &mut self.kind {
            ModelKind::Field(data) => Some(data),
            _ => None,
        }
    }

    /// Region data if this is a region
    #[must_use]
    pub fn as_region(&self) -> Option<&RegionData> {
        match &self.kind {
            ModelKind::Region(data) => Some(data),
            _ => None,
        }
    }

    /// Mutable region data
    pub fn as_region_mut(&mut self) -> Option<&mut RegionData> {
        match &mut self.kind {
            ModelKind::Region(data) => Some(data),
            _ => None,
        }
    }

    /// Presentation flags of a field or region
    #[must_use]
    pub fn view(&self) -> Option<&ModelView> {
        match &self.kind {
            ModelKind::Field(data) => Some(&data.view),
            ModelKind::Region(data) => Some(&data.view),
            _ => None,
        }
    }

    /// Mutable presentation flags
    pub fn view_mut(&mut self) -> Option<&mut ModelView> {
        match &mut self.kind {
            ModelKind::Field(data) => Some(&mut data.view),
            ModelKind::Region(data) => Some(&mut data.view),
            _ => None,
        }
    }

    /// Child list of `child` kind owned by this node
    #[must_use]
    pub fn children(&self, child: ModelType) -> Option<&ModelList> {
        match (&self.kind, child) {
            (ModelKind::Definition(d), ModelType::Field) => Some(&d.fields),
            (ModelKind::Definition(d), ModelType::Region) => Some(&d.regions),
            (ModelKind::Definition(d), ModelType::Header) => Some(&d.headers),
            (ModelKind::Definition(d), ModelType::ActionGroup) => Some(&d.action_groups),
            (ModelKind::Class(c), ModelType::Property) => Some(&c.properties),
            (ModelKind::Field(f), ModelType::Control) => Some(&f.controls),
            (ModelKind::Control(c), ModelType::ControlParam) => Some(&c.params),
            (ModelKind::Region(r), ModelType::Field) => Some(&r.fields),
            _ => None,
        }
    }

    /// Mutable child list of `child` kind
    pub fn children_mut(&mut self, child: ModelType) -> Option<&mut ModelList> {
        match (&mut self.kind, child) {
            (ModelKind::Definition(d), ModelType::Field) => Some(&mut d.fields),
            (ModelKind::Definition(d), ModelType::Region) => Some(&mut d.regions),
            (ModelKind::Definition(d), ModelType::Header) => Some(&mut d.headers),
            (ModelKind::Definition(d), ModelType::ActionGroup) => Some(&mut d.action_groups),
            (ModelKind::Class(c), ModelType::Property) => Some(&mut c.properties),
            (ModelKind::Field(f), ModelType::Control) => Some(&mut f.controls),
            (ModelKind::Control(c), ModelType::ControlParam) => Some(&mut c.params),
            (ModelKind::Region(r), ModelType::Field) => Some(&mut r.fields),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::AttributeType;
    use std::collections::BTreeMap;

    #[test]
    fn kind_round_trips_type() {
        for t in [
            ModelType::Definition,
            ModelType::Class,
            ModelType::Field,
            ModelType::Region,
            ModelType::Header,
            ModelType::Property,
            ModelType::ActionGroup,
            ModelType::Control,
            ModelType::ControlParam,
        ] {
            assert_eq!(ModelNode::new("x", t).model_type(), t);
        }
    }

    #[test]
    fn children_table() {
        let def = ModelNode::new("d", ModelType::Definition);
        assert!(def.children(ModelType::Field).is_some());
        assert!(def.children(ModelType::Control).is_none());

        let field = ModelNode::new("f", ModelType::Field);
        assert!(field.children(ModelType::Control).is_some());
        assert!(field.view().unwrap().visible);

        let control = ModelNode::new("c", ModelType::Control);
        assert!(control.view().is_none());
        assert!(control.children(ModelType::ControlParam).is_some());
        assert!(ModelNode::new("p", ModelType::ControlParam)
            .children(ModelType::ControlParam)
            .is_none());
    }

    #[test]
    fn well_known_attributes() {
        let mut node = ModelNode::new("title", ModelType::Field);
        let mut label = BTreeMap::new();
        label.insert("en".to_string(), "Title".to_string());
        node.base.attributes.insert(
            ModelAttribute::new(
                LABEL_ATTRIBUTE,
                AttributeType::Label,
                Some(AttributeValue::MultiLang(label)),
            )
            .unwrap(),
        );
        node.base.attributes.insert(
            ModelAttribute::new(ORDER_ATTRIBUTE, AttributeType::Integer, Some(AttributeValue::Integer(5)))
                .unwrap(),
        );
        node.base.attributes.insert(
            ModelAttribute::new(
                DISPLAY_ATTRIBUTE,
                AttributeType::DisplayType,
                Some(AttributeValue::String("HIDDEN".into())),
            )
            .unwrap(),
        );

        assert_eq!(node.description("en"), Some("Title"));
        assert_eq!(node.order(), Some(5.0));
        assert_eq!(node.display_type(), Some("HIDDEN"));
        assert!(node.attribute("missing").is_none());
        assert!(node.is_valid());
    }

    #[test]
    fn model_type_display() {
        assert_eq!(ModelType::ActionGroup.to_string(), "actionGroup");
        assert_eq!(ModelType::Field.to_string(), "field");
        assert_eq!(ModelType::ControlParam.to_string(), "controlParam");
    }
}
