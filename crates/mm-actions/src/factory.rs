//! Action factories
//!
//! One factory per action type. Factories never validate their input: an
//! action built from missing pieces is rejected by its processor.

use crate::action::{
    AttributeRef, ModelCreateControlAction, ModelCreateControlParamAction, ModelCreateFieldAction,
    ModelCreatePropertyAction, ModelRemoveControlAction,
    ModelRestoreInheritedAttributeAction, ModelRestoreInheritedControlAction,
    ModelRestoreInheritedFieldAction, ModelRestoreInheritedHeaderAction,
    ModelRestoreInheritedRegionAction, ModelValidateAttributeAction,
    ModelValidateAttributesAction, Resolved, Unresolved,
};
use crate::error::ActionError;
use crate::linker::{ControlLinker, ControlParamLinker, FieldLinker, PropertyLinker};
use mm_model::{MetaDataSet, ModelKey, ModelNode, ModelTree, ModelType};
use std::sync::Arc;

macro_rules! create_factory {
    (
        $(#[$doc:meta])*
        $name:ident => $action:ident, $linker:ident, $what:literal
    ) => {
        $(#[$doc])*
        #[derive(Clone)]
        pub struct $name {
            linker: Arc<dyn $linker>,
        }

        impl $name {
            /// Create factory using `linker` for evaluation
            #[inline]
            #[must_use]
            pub fn new(linker: Arc<dyn $linker>) -> Self {
                Self { linker }
            }

            #[doc = concat!("Action creating a ", $what, " in `context` from `meta`")]
            #[must_use]
            pub fn create(&self, context: ModelKey, meta: Option<MetaDataSet>) -> $action<Unresolved> {
                $action::new(context, meta)
            }

            #[doc = concat!("Build the ", $what, " of `action`")]
            ///
            /// # Errors
            /// `ActionError::MissingMetaData` if the action carries no metadata
            pub fn evaluate(
                &self,
                action: $action<Unresolved>,
                tree: &mut ModelTree,
            ) -> Result<$action<Resolved>, ActionError> {
                action.evaluate(tree, self.linker.as_ref())
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_struct(stringify!($name)).finish_non_exhaustive()
            }
        }
    };
}

create_factory! {
    /// Builds create field actions and resolves them through a [`FieldLinker`]
    ModelCreateFieldActionFactory => ModelCreateFieldAction, FieldLinker, "field"
}

create_factory! {
    /// Builds create property actions and resolves them through a
    /// [`PropertyLinker`]
    ModelCreatePropertyActionFactory => ModelCreatePropertyAction, PropertyLinker, "property"
}

create_factory! {
    /// Builds create control actions and resolves them through a
    /// [`ControlLinker`]
    ModelCreateControlActionFactory => ModelCreateControlAction, ControlLinker, "control"
}

create_factory! {
    /// Builds create control param actions and resolves them through a
    /// [`ControlParamLinker`]
    ModelCreateControlParamActionFactory => ModelCreateControlParamAction, ControlParamLinker, "control param"
}

/// Builds remove control actions
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelRemoveControlActionFactory;

impl ModelRemoveControlActionFactory {
    /// Action removing `control` from `field`
    #[must_use]
    pub fn create(&self, control: ModelKey, field: ModelKey) -> ModelRemoveControlAction {
        ModelRemoveControlAction {
            model: Some(control),
            context: Some(field),
            ..ModelRemoveControlAction::default()
        }
    }
}

/// Builds restore inherited field actions
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelRestoreInheritedFieldActionFactory;

impl ModelRestoreInheritedFieldActionFactory {
    /// Action dropping the local `field` of `definition`
    #[must_use]
    pub fn create(&self, field: ModelKey, definition: ModelKey) -> ModelRestoreInheritedFieldAction {
        ModelRestoreInheritedFieldAction {
            model: Some(field),
            context: Some(definition),
            ..ModelRestoreInheritedFieldAction::default()
        }
    }
}

/// Builds restore inherited header actions
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelRestoreInheritedHeaderActionFactory;

impl ModelRestoreInheritedHeaderActionFactory {
    /// Action dropping the local `header` of `definition`
    #[must_use]
    pub fn create(
        &self,
        header: ModelKey,
        definition: ModelKey,
    ) -> ModelRestoreInheritedHeaderAction {
        ModelRestoreInheritedHeaderAction {
            model: Some(header),
            context: Some(definition),
            ..ModelRestoreInheritedHeaderAction::default()
        }
    }
}

/// Builds restore inherited region actions
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelRestoreInheritedRegionActionFactory;

impl ModelRestoreInheritedRegionActionFactory {
    /// Action dropping the local `region` of `definition`
    ///
    /// Fields of `definition` placed in the region that override an inherited
    /// field are collected into the action's `fields`.
    #[must_use]
    pub fn create(
        &self,
        tree: &ModelTree,
        region: ModelKey,
        definition: ModelKey,
    ) -> ModelRestoreInheritedRegionAction {
        let fields = tree
            .get(region)
            .map(ModelNode::id)
            .map(|region_id| {
                tree.children(definition, ModelType::Field)
                    .into_iter()
                    .filter(|f| {
                        tree.get(*f)
                            .and_then(ModelNode::as_field)
                            .and_then(|data| data.region_id.as_deref())
                            == Some(region_id)
                    })
                    .filter(|f| tree.inherited_counterpart(*f).is_some())
                    .collect()
            })
            .unwrap_or_default();

        ModelRestoreInheritedRegionAction {
            model: Some(region),
            context: Some(definition),
            fields,
            ..ModelRestoreInheritedRegionAction::default()
        }
    }
}

/// Builds restore inherited control actions
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelRestoreInheritedControlActionFactory;

impl ModelRestoreInheritedControlActionFactory {
    /// Action restoring a single control
    ///
    /// The owning field becomes the context when the control is attached.
    #[must_use]
    pub fn create(&self, tree: &ModelTree, control: ModelKey) -> ModelRestoreInheritedControlAction {
        ModelRestoreInheritedControlAction {
            context: tree.get(control).and_then(ModelNode::parent),
            controls_to_restore: vec![control],
            ..ModelRestoreInheritedControlAction::default()
        }
    }
}

/// Builds restore inherited attribute actions
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelRestoreInheritedAttributeActionFactory;

impl ModelRestoreInheritedAttributeActionFactory {
    /// Action copying the inherited value of `attribute` of `owner`
    #[must_use]
    pub fn create(
        &self,
        owner: ModelKey,
        attribute: impl Into<String>,
        definition: ModelKey,
    ) -> ModelRestoreInheritedAttributeAction {
        ModelRestoreInheritedAttributeAction {
            model: Some(AttributeRef::new(owner, attribute)),
            context: Some(definition),
            ..ModelRestoreInheritedAttributeAction::default()
        }
    }
}

/// Builds validate attribute actions
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelValidateAttributeActionFactory;

impl ModelValidateAttributeActionFactory {
    /// Empty action; model and context are set by the caller
    #[inline]
    #[must_use]
    pub fn create(&self) -> ModelValidateAttributeAction {
        ModelValidateAttributeAction::default()
    }
}

/// Builds validate attributes actions
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelValidateAttributesActionFactory;

impl ModelValidateAttributesActionFactory {
    /// Empty action; model and context are set by the caller
    #[inline]
    #[must_use]
    pub fn create(&self) -> ModelValidateAttributesAction {
        ModelValidateAttributesAction::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linker::MetaDataLinker;
    use pretty_assertions::assert_eq;

    #[test]
    fn validate_factories_build_default_actions() {
        assert_eq!(
            ModelValidateAttributesActionFactory.create(),
            ModelValidateAttributesAction::default()
        );
        assert_eq!(
            ModelValidateAttributeActionFactory.create(),
            ModelValidateAttributeAction::default()
        );
    }

    #[test]
    fn restore_control_wraps_single_control() {
        let mut tree = ModelTree::new();
        let def = tree.create(ModelType::Definition, "case");
        let field = tree.create_child(def, ModelType::Field, "title").unwrap();
        let control = tree.create_child(field, ModelType::Control, "RICHTEXT").unwrap();

        let action = ModelRestoreInheritedControlActionFactory.create(&tree, control);
        assert_eq!(action.controls_to_restore(), &[control]);
        assert_eq!(action.context, Some(field));
        assert!(action.overridden.is_empty());
    }

    #[test]
    fn create_field_is_resolved_by_evaluation() {
        let mut tree = ModelTree::new();
        let def = tree.create(ModelType::Definition, "case");
        let factory = ModelCreateFieldActionFactory::new(Arc::new(MetaDataLinker));

        let action = factory.create(def, Some(MetaDataSet::new())).with_id("title");
        assert_eq!(action.context(), def);
        let resolved = factory.evaluate(action, &mut tree).unwrap();
        assert_eq!(tree.get(resolved.model()).unwrap().id(), "title");
    }

    #[test]
    fn create_without_meta_is_accepted_then_rejected_on_evaluate() {
        let mut tree = ModelTree::new();
        let class = tree.create(ModelType::Class, "emf:Document");
        let factory = ModelCreatePropertyActionFactory::new(Arc::new(MetaDataLinker));

        let action = factory.create(class, None);
        assert!(action.meta().is_none());
        let err = factory.evaluate(action, &mut tree).unwrap_err();
        assert!(matches!(err, ActionError::MissingMetaData { .. }));
    }

    #[test]
    fn control_and_param_are_resolved_in_turn() {
        let mut tree = ModelTree::new();
        let def = tree.create(ModelType::Definition, "case");
        let field = tree.create_child(def, ModelType::Field, "title").unwrap();
        let linker = Arc::new(MetaDataLinker);

        let controls = ModelCreateControlActionFactory::new(linker.clone());
        let control = controls
            .create(field, Some(MetaDataSet::new()))
            .with_id("RELATED_FIELDS");
        let control = controls.evaluate(control, &mut tree).unwrap();
        assert_eq!(control.context(), field);

        let params = ModelCreateControlParamActionFactory::new(linker);
        let param = params
            .create(control.model(), Some(MetaDataSet::new()))
            .with_id("filterSource");
        let param = params.evaluate(param, &mut tree).unwrap();
        assert_eq!(tree.get(param.model()).unwrap().parent(), Some(control.model()));

        let err = params
            .evaluate(params.create(control.model(), None), &mut tree)
            .unwrap_err();
        assert!(matches!(
            err,
            ActionError::MissingMetaData { action: "create control param" }
        ));
    }

    #[test]
    fn other_factories_fill_model_and_context() {
        let mut tree = ModelTree::new();
        let def = tree.create(ModelType::Definition, "case");
        let field = tree.create_child(def, ModelType::Field, "title").unwrap();
        let control = tree.create_child(field, ModelType::Control, "RICHTEXT").unwrap();

        let remove = ModelRemoveControlActionFactory.create(control, field);
        assert_eq!((remove.model, remove.context), (Some(control), Some(field)));
        assert!(remove.removed().is_none());

        let restore = ModelRestoreInheritedFieldActionFactory.create(field, def);
        assert_eq!((restore.model, restore.context), (Some(field), Some(def)));

        let attribute = ModelRestoreInheritedAttributeActionFactory.create(field, "label", def);
        assert_eq!(attribute.model, Some(AttributeRef::new(field, "label")));
        assert_eq!(attribute.context, Some(def));
    }
}
