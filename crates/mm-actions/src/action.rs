//! Model actions
//!
//! An action is a transient value object describing one requested change:
//! it is built by a factory, consumed by its processor and discarded. Each
//! action names its target `model` and the `context` it applies under, plus
//! a payload specific to its kind.
//!
//! Create actions are type-state: [`ModelCreateFieldAction<Unresolved>`]
//! only carries the metadata; evaluating it through a linker yields a
//! [`ModelCreateFieldAction<Resolved>`] whose model is available. Property,
//! control and control param creation work the same way.

use crate::error::ActionError;
use crate::linker::{ControlLinker, ControlParamLinker, FieldLinker, PropertyLinker};
use mm_model::{AttributeValue, MetaDataSet, ModelKey, ModelTree, Placement};

/// Marker of a create action whose model has not been built yet
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Unresolved;

/// Marker of a create action whose model exists in the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved {
    model: ModelKey,
}

/// Attribute addressed by its owning node
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributeRef {
    /// Node holding the attribute
    pub owner: ModelKey,
    /// Attribute id
    pub attribute: String,
}

impl AttributeRef {
    /// Create reference
    #[inline]
    #[must_use]
    pub fn new(owner: ModelKey, attribute: impl Into<String>) -> Self {
        Self {
            owner,
            attribute: attribute.into(),
        }
    }
}

/// Node taken out of its container, with where it was
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetachedModel {
    /// Detached node
    pub model: ModelKey,
    /// Former container
    pub container: ModelKey,
    /// Former position
    pub placement: Placement,
}

macro_rules! create_action {
    (
        $(#[$doc:meta])*
        $name:ident {
            what: $what:literal,
            context: $context_doc:literal,
            linker: $linker:ident :: $create:ident,
        }
    ) => {
        $(#[$doc])*
        #[derive(Debug, Clone)]
        pub struct $name<S = Unresolved> {
            context: ModelKey,
            meta: Option<MetaDataSet>,
            id: Option<String>,
            state: S,
        }

        impl $name<Unresolved> {
            pub(crate) fn new(context: ModelKey, meta: Option<MetaDataSet>) -> Self {
                Self {
                    context,
                    meta,
                    id: None,
                    state: Unresolved,
                }
            }

            #[doc = concat!("Use `id` for the new ", $what, " instead of a generated one")]
            #[inline]
            #[must_use]
            pub fn with_id(mut self, id: impl Into<String>) -> Self {
                self.id = Some(id.into());
                self
            }

            #[doc = concat!("Build the ", $what, " through `linker`, parented to the context")]
            ///
            /// The new node is created detached; the processor attaches it.
            ///
            /// # Errors
            /// `ActionError::MissingMetaData` if the action carries no metadata
            pub fn evaluate(
                self,
                tree: &mut ModelTree,
                linker: &dyn $linker,
            ) -> Result<$name<Resolved>, ActionError> {
                let meta = self.meta.as_ref().ok_or(ActionError::MissingMetaData {
                    action: concat!("create ", $what),
                })?;
                let model = linker.$create(tree, self.context, meta, self.id.as_deref())?;
                Ok($name {
                    context: self.context,
                    meta: self.meta,
                    id: self.id,
                    state: Resolved { model },
                })
            }
        }

        impl<S> $name<S> {
            #[doc = $context_doc]
            #[inline]
            #[must_use]
            pub fn context(&self) -> ModelKey {
                self.context
            }

            #[doc = concat!("Metadata describing the ", $what, " attributes")]
            #[inline]
            #[must_use]
            pub fn meta(&self) -> Option<&MetaDataSet> {
                self.meta.as_ref()
            }
        }

        impl $name<Resolved> {
            #[doc = concat!("Created ", $what)]
            #[inline]
            #[must_use]
            pub fn model(&self) -> ModelKey {
                self.state.model
            }
        }
    };
}

create_action! {
    /// Create a new field in a definition
    ModelCreateFieldAction {
        what: "field",
        context: "Definition the field is created in",
        linker: FieldLinker::create_model_field,
    }
}

create_action! {
    /// Create a new property in a class
    ModelCreatePropertyAction {
        what: "property",
        context: "Class the property is created in",
        linker: PropertyLinker::create_model_property,
    }
}

create_action! {
    /// Create a new control in a field
    ModelCreateControlAction {
        what: "control",
        context: "Field the control is created in",
        linker: ControlLinker::create_model_control,
    }
}

create_action! {
    /// Create a new parameter of a control
    ModelCreateControlParamAction {
        what: "control param",
        context: "Control the parameter is created in",
        linker: ControlParamLinker::create_model_control_param,
    }
}

/// Remove a control from a field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelRemoveControlAction {
    /// Control to remove
    pub model: Option<ModelKey>,
    /// Field owning the control
    pub context: Option<ModelKey>,
    pub(crate) removed: Option<DetachedModel>,
}

impl ModelRemoveControlAction {
    /// Where the control was before removal, once executed
    #[inline]
    #[must_use]
    pub fn removed(&self) -> Option<&DetachedModel> {
        self.removed.as_ref()
    }
}

/// Drop a local field override so the inherited field shows through
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelRestoreInheritedFieldAction {
    /// Local field override
    pub model: Option<ModelKey>,
    /// Definition owning the override
    pub context: Option<ModelKey>,
    pub(crate) detached: Option<DetachedModel>,
}

/// Drop a local header override so the inherited header shows through
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelRestoreInheritedHeaderAction {
    /// Local header override
    pub model: Option<ModelKey>,
    /// Definition owning the override
    pub context: Option<ModelKey>,
    pub(crate) detached: Option<DetachedModel>,
}

/// Drop a local region override together with its overriding fields
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelRestoreInheritedRegionAction {
    /// Local region override
    pub model: Option<ModelKey>,
    /// Definition owning the override
    pub context: Option<ModelKey>,
    /// Local fields of the region that override inherited ones
    pub fields: Vec<ModelKey>,
    pub(crate) detached: Vec<DetachedModel>,
}

/// Drop local control overrides of a field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelRestoreInheritedControlAction {
    /// Field owning the controls
    pub context: Option<ModelKey>,
    /// Controls to restore
    pub controls_to_restore: Vec<ModelKey>,
    /// Controls that were detached, once executed
    pub overridden: Vec<DetachedModel>,
    pub(crate) executed: bool,
}

impl ModelRestoreInheritedControlAction {
    /// Controls to restore
    #[inline]
    #[must_use]
    pub fn controls_to_restore(&self) -> &[ModelKey] {
        &self.controls_to_restore
    }

    /// Check if the action has been executed and not undone
    #[inline]
    #[must_use]
    pub fn is_executed(&self) -> bool {
        self.executed
    }
}

/// Copy the inherited value of an attribute over the local one
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelRestoreInheritedAttributeAction {
    /// Attribute to restore
    pub model: Option<AttributeRef>,
    /// Definition the attribute is edited in
    pub context: Option<ModelKey>,
    pub(crate) previous: Option<Option<AttributeValue>>,
}

/// Re-evaluate the restrictions and errors of one attribute
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelValidateAttributeAction {
    /// Attribute to validate
    pub model: Option<AttributeRef>,
    /// Model whose attributes rule expressions may refer to
    pub context: Option<ModelKey>,
}

impl ModelValidateAttributeAction {
    /// Set target attribute
    #[inline]
    #[must_use]
    pub fn with_model(mut self, model: AttributeRef) -> Self {
        self.model = Some(model);
        self
    }

    /// Set context
    #[inline]
    #[must_use]
    pub fn with_context(mut self, context: ModelKey) -> Self {
        self.context = Some(context);
        self
    }
}

/// Re-evaluate every attribute of a model
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelValidateAttributesAction {
    /// Model to validate
    pub model: Option<ModelKey>,
    /// Model whose attributes rule expressions may refer to
    pub context: Option<ModelKey>,
}

impl ModelValidateAttributesAction {
    /// Set target model
    #[inline]
    #[must_use]
    pub fn with_model(mut self, model: ModelKey) -> Self {
        self.model = Some(model);
        self
    }

    /// Set context
    #[inline]
    #[must_use]
    pub fn with_context(mut self, context: ModelKey) -> Self {
        self.context = Some(context);
        self
    }
}

/// Any action the executor can dispatch
#[derive(Debug, Clone)]
pub enum ModelAction {
    /// Create field
    CreateField(ModelCreateFieldAction<Resolved>),
    /// Create property
    CreateProperty(ModelCreatePropertyAction<Resolved>),
    /// Create control
    CreateControl(ModelCreateControlAction<Resolved>),
    /// Create control parameter
    CreateControlParam(ModelCreateControlParamAction<Resolved>),
    /// Remove control
    RemoveControl(ModelRemoveControlAction),
    /// Restore inherited field
    RestoreInheritedField(ModelRestoreInheritedFieldAction),
    /// Restore inherited header
    RestoreInheritedHeader(ModelRestoreInheritedHeaderAction),
    /// Restore inherited region
    RestoreInheritedRegion(ModelRestoreInheritedRegionAction),
    /// Restore inherited controls
    RestoreInheritedControl(ModelRestoreInheritedControlAction),
    /// Restore inherited attribute value
    RestoreInheritedAttribute(ModelRestoreInheritedAttributeAction),
    /// Validate one attribute
    ValidateAttribute(ModelValidateAttributeAction),
    /// Validate all attributes of a model
    ValidateAttributes(ModelValidateAttributesAction),
}

impl ModelAction {
    /// Action name for logs and errors
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateField(_) => "create field",
            Self::CreateProperty(_) => "create property",
            Self::CreateControl(_) => "create control",
            Self::CreateControlParam(_) => "create control param",
            Self::RemoveControl(_) => "remove control",
            Self::RestoreInheritedField(_) => "restore inherited field",
            Self::RestoreInheritedHeader(_) => "restore inherited header",
            Self::RestoreInheritedRegion(_) => "restore inherited region",
            Self::RestoreInheritedControl(_) => "restore inherited control",
            Self::RestoreInheritedAttribute(_) => "restore inherited attribute",
            Self::ValidateAttribute(_) => "validate attribute",
            Self::ValidateAttributes(_) => "validate attributes",
        }
    }

    /// Check if the action only validates
    #[inline]
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::ValidateAttribute(_) | Self::ValidateAttributes(_))
    }
}

macro_rules! impl_from_action {
    ($($variant:ident => $action:ty),* $(,)?) => {
        $(
            impl From<$action> for ModelAction {
                fn from(action: $action) -> Self {
                    Self::$variant(action)
                }
            }
        )*
    };
}

impl_from_action! {
    CreateField => ModelCreateFieldAction<Resolved>,
    CreateProperty => ModelCreatePropertyAction<Resolved>,
    CreateControl => ModelCreateControlAction<Resolved>,
    CreateControlParam => ModelCreateControlParamAction<Resolved>,
    RemoveControl => ModelRemoveControlAction,
    RestoreInheritedField => ModelRestoreInheritedFieldAction,
    RestoreInheritedHeader => ModelRestoreInheritedHeaderAction,
    RestoreInheritedRegion => ModelRestoreInheritedRegionAction,
    RestoreInheritedControl => ModelRestoreInheritedControlAction,
    RestoreInheritedAttribute => ModelRestoreInheritedAttributeAction,
    ValidateAttribute => ModelValidateAttributeAction,
    ValidateAttributes => ModelValidateAttributesAction,
}
