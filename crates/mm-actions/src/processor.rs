//! Action processors
//!
//! Each processor applies one action kind to the tree (`execute`) and undoes
//! it (`restore`). Both directions return the change sets they produced.
//!
//! Restore-inherited processors are structural: the local override is
//! detached so the inherited node shows through, and reattached at its former
//! position on undo. Attribute restores copy the inherited value instead.

use crate::action::{
    AttributeRef, DetachedModel, ModelCreateControlAction, ModelCreateControlParamAction,
    ModelCreateFieldAction, ModelCreatePropertyAction,
    ModelRemoveControlAction, ModelRestoreInheritedAttributeAction,
    ModelRestoreInheritedControlAction, ModelRestoreInheritedFieldAction,
    ModelRestoreInheritedHeaderAction, ModelRestoreInheritedRegionAction,
    ModelValidateAttributeAction, ModelValidateAttributesAction, Resolved,
};
use crate::error::ActionError;
use crate::validation::ValidationService;
use mm_model::{ChangeOperation, ModelChangeSet, ModelKey, ModelNode, ModelTree, ModelType};
use std::collections::HashSet;
use std::sync::Arc;

/// Executes and undoes one kind of action
pub trait ActionProcessor {
    /// Action kind handled
    type Action;

    /// Apply the action
    ///
    /// # Errors
    /// Incomplete actions, tree failures and validation errors
    fn execute(
        &self,
        tree: &mut ModelTree,
        action: &mut Self::Action,
    ) -> Result<Vec<ModelChangeSet>, ActionError>;

    /// Undo the action
    ///
    /// # Errors
    /// As [`ActionProcessor::execute`], plus `ActionError::InvalidState` when
    /// the action was not executed
    fn restore(
        &self,
        tree: &mut ModelTree,
        action: &mut Self::Action,
    ) -> Result<Vec<ModelChangeSet>, ActionError>;
}

/// Re-validates a single attribute
///
/// `execute` and `restore` are the same operation.
#[derive(Clone)]
pub struct ModelValidateAttributeActionProcessor {
    service: Arc<dyn ValidationService>,
}

impl ModelValidateAttributeActionProcessor {
    /// Create processor delegating to `service`
    #[inline]
    #[must_use]
    pub fn new(service: Arc<dyn ValidationService>) -> Self {
        Self { service }
    }

    fn validate(
        &self,
        tree: &mut ModelTree,
        action: &ModelValidateAttributeAction,
    ) -> Result<Vec<ModelChangeSet>, ActionError> {
        const NAME: &str = "validate attribute";
        let attribute = action.model.as_ref().ok_or(ActionError::missing_model(NAME))?;
        let context = action.context.ok_or(ActionError::missing_context(NAME))?;
        self.service.validate_attribute(tree, attribute, context)?;
        Ok(Vec::new())
    }
}

impl ActionProcessor for ModelValidateAttributeActionProcessor {
    type Action = ModelValidateAttributeAction;

    fn execute(
        &self,
        tree: &mut ModelTree,
        action: &mut Self::Action,
    ) -> Result<Vec<ModelChangeSet>, ActionError> {
        self.validate(tree, action)
    }

    fn restore(
        &self,
        tree: &mut ModelTree,
        action: &mut Self::Action,
    ) -> Result<Vec<ModelChangeSet>, ActionError> {
        self.validate(tree, action)
    }
}

impl std::fmt::Debug for ModelValidateAttributeActionProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelValidateAttributeActionProcessor")
            .finish_non_exhaustive()
    }
}

/// Re-validates every attribute of a model
#[derive(Clone)]
pub struct ModelValidateAttributesActionProcessor {
    service: Arc<dyn ValidationService>,
}

impl ModelValidateAttributesActionProcessor {
    /// Create processor delegating to `service`
    #[inline]
    #[must_use]
    pub fn new(service: Arc<dyn ValidationService>) -> Self {
        Self { service }
    }

    fn validate(
        &self,
        tree: &mut ModelTree,
        action: &ModelValidateAttributesAction,
    ) -> Result<Vec<ModelChangeSet>, ActionError> {
        const NAME: &str = "validate attributes";
        let model = action.model.ok_or(ActionError::missing_model(NAME))?;
        let context = action.context.ok_or(ActionError::missing_context(NAME))?;
        let ids = tree.node(model)?.attributes().ids();
        for id in ids {
            self.service
                .validate_attribute(tree, &AttributeRef::new(model, id), context)?;
        }
        Ok(Vec::new())
    }
}

impl ActionProcessor for ModelValidateAttributesActionProcessor {
    type Action = ModelValidateAttributesAction;

    fn execute(
        &self,
        tree: &mut ModelTree,
        action: &mut Self::Action,
    ) -> Result<Vec<ModelChangeSet>, ActionError> {
        self.validate(tree, action)
    }

    fn restore(
        &self,
        tree: &mut ModelTree,
        action: &mut Self::Action,
    ) -> Result<Vec<ModelChangeSet>, ActionError> {
        self.validate(tree, action)
    }
}

impl std::fmt::Debug for ModelValidateAttributesActionProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelValidateAttributesActionProcessor")
            .finish_non_exhaustive()
    }
}

macro_rules! create_processor {
    ($(#[$doc:meta])* $name:ident => $action:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $name;

        impl ActionProcessor for $name {
            type Action = $action<Resolved>;

            fn execute(
                &self,
                tree: &mut ModelTree,
                action: &mut Self::Action,
            ) -> Result<Vec<ModelChangeSet>, ActionError> {
                attach_created(tree, action.context(), action.model())
            }

            fn restore(
                &self,
                tree: &mut ModelTree,
                action: &mut Self::Action,
            ) -> Result<Vec<ModelChangeSet>, ActionError> {
                detach_created(tree, action.context(), action.model())
            }
        }
    };
}

create_processor! {
    /// Attaches created fields to their definition
    ModelCreateFieldActionProcessor => ModelCreateFieldAction
}

create_processor! {
    /// Attaches created properties to their class
    ModelCreatePropertyActionProcessor => ModelCreatePropertyAction
}

create_processor! {
    /// Attaches created controls to their field
    ModelCreateControlActionProcessor => ModelCreateControlAction
}

create_processor! {
    /// Attaches created parameters to their control
    ModelCreateControlParamActionProcessor => ModelCreateControlParamAction
}

fn attach_created(
    tree: &mut ModelTree,
    context: ModelKey,
    model: ModelKey,
) -> Result<Vec<ModelChangeSet>, ActionError> {
    tree.attach(context, model)?;
    Ok(vec![ModelChangeSet::for_model(
        tree.path_of(model),
        ChangeOperation::Create,
    )])
}

fn detach_created(
    tree: &mut ModelTree,
    context: ModelKey,
    model: ModelKey,
) -> Result<Vec<ModelChangeSet>, ActionError> {
    let path = tree.path_of(model);
    tree.detach(context, model)?;
    Ok(vec![ModelChangeSet::for_model(path, ChangeOperation::Remove)])
}

/// Removes a control from its field
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelRemoveControlActionProcessor;

impl ActionProcessor for ModelRemoveControlActionProcessor {
    type Action = ModelRemoveControlAction;

    fn execute(
        &self,
        tree: &mut ModelTree,
        action: &mut Self::Action,
    ) -> Result<Vec<ModelChangeSet>, ActionError> {
        const NAME: &str = "remove control";
        let control = action.model.ok_or(ActionError::missing_model(NAME))?;
        let field = action.context.ok_or(ActionError::missing_context(NAME))?;
        if action.removed.is_some() {
            return Err(ActionError::invalid_state(NAME, "already executed"));
        }
        tree.expect(control, ModelType::Control)?;

        let (detached, change) = detach_model(tree, field, control, ChangeOperation::Remove)?;
        action.removed = Some(detached);
        Ok(vec![change])
    }

    fn restore(
        &self,
        tree: &mut ModelTree,
        action: &mut Self::Action,
    ) -> Result<Vec<ModelChangeSet>, ActionError> {
        let detached = action
            .removed
            .take()
            .ok_or(ActionError::invalid_state("remove control", "not executed"))?;
        Ok(vec![reattach_model(tree, detached, ChangeOperation::Restore)?])
    }
}

/// Drops a local field override
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelRestoreInheritedFieldActionProcessor;

impl ActionProcessor for ModelRestoreInheritedFieldActionProcessor {
    type Action = ModelRestoreInheritedFieldAction;

    fn execute(
        &self,
        tree: &mut ModelTree,
        action: &mut Self::Action,
    ) -> Result<Vec<ModelChangeSet>, ActionError> {
        const NAME: &str = "restore inherited field";
        let field = action.model.ok_or(ActionError::missing_model(NAME))?;
        let definition = action.context.ok_or(ActionError::missing_context(NAME))?;
        if action.detached.is_some() {
            return Err(ActionError::invalid_state(NAME, "already executed"));
        }
        tree.expect(field, ModelType::Field)?;

        let (detached, change) = drop_override(tree, definition, field)?;
        action.detached = Some(detached);
        Ok(vec![change])
    }

    fn restore(
        &self,
        tree: &mut ModelTree,
        action: &mut Self::Action,
    ) -> Result<Vec<ModelChangeSet>, ActionError> {
        let detached = action
            .detached
            .take()
            .ok_or(ActionError::invalid_state("restore inherited field", "not executed"))?;
        Ok(vec![reattach_model(tree, detached, ChangeOperation::Create)?])
    }
}

/// Drops a local header override
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelRestoreInheritedHeaderActionProcessor;

impl ActionProcessor for ModelRestoreInheritedHeaderActionProcessor {
    type Action = ModelRestoreInheritedHeaderAction;

    fn execute(
        &self,
        tree: &mut ModelTree,
        action: &mut Self::Action,
    ) -> Result<Vec<ModelChangeSet>, ActionError> {
        const NAME: &str = "restore inherited header";
        let header = action.model.ok_or(ActionError::missing_model(NAME))?;
        let definition = action.context.ok_or(ActionError::missing_context(NAME))?;
        if action.detached.is_some() {
            return Err(ActionError::invalid_state(NAME, "already executed"));
        }
        tree.expect(header, ModelType::Header)?;

        let (detached, change) = drop_override(tree, definition, header)?;
        action.detached = Some(detached);
        Ok(vec![change])
    }

    fn restore(
        &self,
        tree: &mut ModelTree,
        action: &mut Self::Action,
    ) -> Result<Vec<ModelChangeSet>, ActionError> {
        let detached = action
            .detached
            .take()
            .ok_or(ActionError::invalid_state("restore inherited header", "not executed"))?;
        Ok(vec![reattach_model(tree, detached, ChangeOperation::Create)?])
    }
}

/// Drops a local region override and the overriding fields listed with it
///
/// Fields are detached before the region and reattached after it, so every
/// field finds its region again on undo.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelRestoreInheritedRegionActionProcessor;

impl ActionProcessor for ModelRestoreInheritedRegionActionProcessor {
    type Action = ModelRestoreInheritedRegionAction;

    fn execute(
        &self,
        tree: &mut ModelTree,
        action: &mut Self::Action,
    ) -> Result<Vec<ModelChangeSet>, ActionError> {
        const NAME: &str = "restore inherited region";
        let region = action.model.ok_or(ActionError::missing_model(NAME))?;
        let definition = action.context.ok_or(ActionError::missing_context(NAME))?;
        if !action.detached.is_empty() {
            return Err(ActionError::invalid_state(NAME, "already executed"));
        }
        let region_node = tree.expect(region, ModelType::Region)?;
        if tree.inherited_counterpart(region).is_none() {
            return Err(ActionError::NoInheritedModel {
                id: region_node.id().to_string(),
            });
        }

        let mut detached = Vec::with_capacity(action.fields.len() + 1);
        let mut changes = Vec::with_capacity(action.fields.len() + 1);
        for field in action.fields.clone() {
            match drop_override(tree, definition, field) {
                Ok((model, change)) => {
                    detached.push(model);
                    changes.push(change);
                }
                Err(e) => {
                    undo_all(tree, &mut detached);
                    return Err(e);
                }
            }
        }
        match detach_model(tree, definition, region, ChangeOperation::Restore) {
            Ok((model, change)) => {
                detached.push(model);
                changes.push(change);
            }
            Err(e) => {
                undo_all(tree, &mut detached);
                return Err(e);
            }
        }

        action.detached = detached;
        Ok(changes)
    }

    fn restore(
        &self,
        tree: &mut ModelTree,
        action: &mut Self::Action,
    ) -> Result<Vec<ModelChangeSet>, ActionError> {
        if action.detached.is_empty() {
            return Err(ActionError::invalid_state(
                "restore inherited region",
                "not executed",
            ));
        }
        let changes = reattach_all(tree, &action.detached)?;
        action.detached.clear();
        Ok(changes)
    }
}

/// Drops local control overrides of a field
///
/// Controls without an inherited counterpart are left in place.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelRestoreInheritedControlActionProcessor;

impl ActionProcessor for ModelRestoreInheritedControlActionProcessor {
    type Action = ModelRestoreInheritedControlAction;

    fn execute(
        &self,
        tree: &mut ModelTree,
        action: &mut Self::Action,
    ) -> Result<Vec<ModelChangeSet>, ActionError> {
        const NAME: &str = "restore inherited control";
        if action.controls_to_restore.is_empty() {
            return Err(ActionError::missing_model(NAME));
        }
        let field = action.context.ok_or(ActionError::missing_context(NAME))?;
        if action.executed {
            return Err(ActionError::invalid_state(NAME, "already executed"));
        }

        let mut changes = Vec::new();
        for control in action.controls_to_restore.clone() {
            let node = tree.expect(control, ModelType::Control)?;
            if tree.inherited_counterpart(control).is_none() {
                tracing::debug!(control = %node.id(), "control has nothing inherited, kept");
                continue;
            }
            match detach_model(tree, field, control, ChangeOperation::Restore) {
                Ok((model, change)) => {
                    action.overridden.push(model);
                    changes.push(change);
                }
                Err(e) => {
                    undo_all(tree, &mut action.overridden);
                    return Err(e);
                }
            }
        }
        action.executed = true;
        Ok(changes)
    }

    fn restore(
        &self,
        tree: &mut ModelTree,
        action: &mut Self::Action,
    ) -> Result<Vec<ModelChangeSet>, ActionError> {
        if !action.executed {
            return Err(ActionError::invalid_state(
                "restore inherited control",
                "not executed",
            ));
        }
        let changes = reattach_all(tree, &action.overridden)?;
        action.overridden.clear();
        action.executed = false;
        Ok(changes)
    }
}

/// Copies inherited attribute values over local ones
///
/// The inherited value comes from the super model for definitions and
/// classes, and from the nearest inherited counterpart holding the attribute
/// for every other node.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelRestoreInheritedAttributeActionProcessor;

impl ModelRestoreInheritedAttributeActionProcessor {
    fn inherited_source(tree: &ModelTree, owner: ModelKey, attribute: &str) -> Option<ModelKey> {
        let next = |key: ModelKey| match tree.get(key)?.model_type() {
            ModelType::Definition | ModelType::Class => tree.get(key)?.parent(),
            _ => tree.inherited_counterpart(key),
        };
        let mut seen = HashSet::from([owner]);
        let mut current = next(owner);
        while let Some(key) = current {
            if !seen.insert(key) {
                return None;
            }
            if tree.attribute(key, attribute).is_some() {
                return Some(key);
            }
            current = next(key);
        }
        None
    }
}

impl ActionProcessor for ModelRestoreInheritedAttributeActionProcessor {
    type Action = ModelRestoreInheritedAttributeAction;

    fn execute(
        &self,
        tree: &mut ModelTree,
        action: &mut Self::Action,
    ) -> Result<Vec<ModelChangeSet>, ActionError> {
        const NAME: &str = "restore inherited attribute";
        let target = action.model.as_ref().ok_or(ActionError::missing_model(NAME))?;
        action.context.ok_or(ActionError::missing_context(NAME))?;
        if action.previous.is_some() {
            return Err(ActionError::invalid_state(NAME, "already executed"));
        }
        let old_json = tree
            .attribute(target.owner, &target.attribute)
            .map(mm_model::ModelAttribute::json_value)
            .ok_or(ActionError::missing_model(NAME))?;

        let source = Self::inherited_source(tree, target.owner, &target.attribute).ok_or_else(
            || ActionError::NoInheritedModel {
                id: tree
                    .get(target.owner)
                    .map_or_else(String::new, |n| n.id().to_string()),
            },
        )?;
        let inherited = tree
            .attribute(source, &target.attribute)
            .and_then(|a| a.value().cloned());
        let new_json = tree
            .attribute(source, &target.attribute)
            .map(mm_model::ModelAttribute::json_value)
            .unwrap_or_default();

        let previous = tree.set_attribute_value(target.owner, &target.attribute, inherited)?;
        action.previous = Some(previous);
        Ok(vec![ModelChangeSet::for_attribute(
            tree.path_of(target.owner),
            target.attribute.clone(),
            ChangeOperation::Restore,
            old_json,
            new_json,
        )])
    }

    fn restore(
        &self,
        tree: &mut ModelTree,
        action: &mut Self::Action,
    ) -> Result<Vec<ModelChangeSet>, ActionError> {
        const NAME: &str = "restore inherited attribute";
        let target = action.model.as_ref().ok_or(ActionError::missing_model(NAME))?;
        let previous = action
            .previous
            .take()
            .ok_or(ActionError::invalid_state(NAME, "not executed"))?;
        let old_json = tree
            .attribute(target.owner, &target.attribute)
            .map(mm_model::ModelAttribute::json_value)
            .unwrap_or_default();

        tree.set_attribute_value(target.owner, &target.attribute, previous)?;
        let new_json = tree
            .attribute(target.owner, &target.attribute)
            .map(mm_model::ModelAttribute::json_value)
            .unwrap_or_default();
        Ok(vec![ModelChangeSet::for_attribute(
            tree.path_of(target.owner),
            target.attribute.clone(),
            ChangeOperation::Modify,
            old_json,
            new_json,
        )])
    }
}

fn detach_model(
    tree: &mut ModelTree,
    container: ModelKey,
    model: ModelKey,
    operation: ChangeOperation,
) -> Result<(DetachedModel, ModelChangeSet), ActionError> {
    let path = tree.path_of(model);
    let placement = tree.detach(container, model)?;
    Ok((
        DetachedModel {
            model,
            container,
            placement,
        },
        ModelChangeSet::for_model(path, operation),
    ))
}

fn drop_override(
    tree: &mut ModelTree,
    definition: ModelKey,
    model: ModelKey,
) -> Result<(DetachedModel, ModelChangeSet), ActionError> {
    if tree.inherited_counterpart(model).is_none() {
        return Err(ActionError::NoInheritedModel {
            id: tree.node(model)?.id().to_string(),
        });
    }
    detach_model(tree, definition, model, ChangeOperation::Restore)
}

fn reattach_model(
    tree: &mut ModelTree,
    detached: DetachedModel,
    operation: ChangeOperation,
) -> Result<ModelChangeSet, ActionError> {
    tree.attach_at(detached.container, detached.model, detached.placement)?;
    Ok(ModelChangeSet::for_model(
        tree.path_of(detached.model),
        operation,
    ))
}

/// Reattach detached models, last detached first
///
/// Either every model is reattached or, on failure, the ones already
/// reattached are detached again and the tree is left as it was.
fn reattach_all(
    tree: &mut ModelTree,
    detached: &[DetachedModel],
) -> Result<Vec<ModelChangeSet>, ActionError> {
    let mut changes = Vec::with_capacity(detached.len());
    for (done, model) in detached.iter().rev().enumerate() {
        match reattach_model(tree, *model, ChangeOperation::Create) {
            Ok(change) => changes.push(change),
            Err(e) => {
                for undone in detached.iter().rev().take(done).rev() {
                    if let Err(err) = tree.detach(undone.container, undone.model) {
                        tracing::warn!(error = %err, "could not detach model again");
                    }
                }
                return Err(e);
            }
        }
    }
    Ok(changes)
}

/// Put back partially detached models after a failure
fn undo_all(tree: &mut ModelTree, detached: &mut Vec<DetachedModel>) {
    while let Some(model) = detached.pop() {
        if let Err(e) = tree.attach_at(model.container, model.model, model.placement) {
            tracing::warn!(error = %e, "could not reattach model");
        }
    }
}

/// Id of a node, empty for stale keys
pub(crate) fn model_id(tree: &ModelTree, key: ModelKey) -> &str {
    tree.get(key).map_or("", ModelNode::id)
}
