//! Action executor
//!
//! Dispatches actions to their processors, re-validates the touched model as
//! the [`ValidationPolicy`](crate::ValidationPolicy) asks and keeps a bounded
//! journal of executed actions so the latest ones can be undone.

use crate::action::{ModelAction, ModelValidateAttributesAction};
use crate::config::ModelManagementConfig;
use crate::error::ActionError;
use crate::processor::{
    model_id, ActionProcessor, ModelCreateControlActionProcessor,
    ModelCreateControlParamActionProcessor, ModelCreateFieldActionProcessor,
    ModelCreatePropertyActionProcessor, ModelRemoveControlActionProcessor,
    ModelRestoreInheritedAttributeActionProcessor, ModelRestoreInheritedControlActionProcessor,
    ModelRestoreInheritedFieldActionProcessor, ModelRestoreInheritedHeaderActionProcessor,
    ModelRestoreInheritedRegionActionProcessor, ModelValidateAttributeActionProcessor,
    ModelValidateAttributesActionProcessor,
};
use crate::validation::{RuleValidationService, ValidationService};
use mm_model::{ModelChangeSet, ModelKey, ModelNode, ModelTree};
use mm_rules::default_rule_registry;
use std::collections::VecDeque;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Execute,
    Restore,
}

/// Runs actions against a model tree
pub struct ActionExecutor {
    config: ModelManagementConfig,
    validate_attribute: ModelValidateAttributeActionProcessor,
    validate_attributes: ModelValidateAttributesActionProcessor,
    journal: VecDeque<ModelAction>,
}

impl ActionExecutor {
    /// Create executor validating through `service`
    #[must_use]
    pub fn new(config: ModelManagementConfig, service: Arc<dyn ValidationService>) -> Self {
        Self {
            config,
            validate_attribute: ModelValidateAttributeActionProcessor::new(Arc::clone(&service)),
            validate_attributes: ModelValidateAttributesActionProcessor::new(service),
            journal: VecDeque::new(),
        }
    }

    /// Create executor with the built-in rule commands
    ///
    /// Rules are read from the extension point named in `config`.
    #[must_use]
    pub fn with_rules(config: ModelManagementConfig) -> Self {
        let service = RuleValidationService::from_registry(
            &default_rule_registry(),
            &config.rule_extension_point,
        );
        Self::new(config, Arc::new(service))
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ModelManagementConfig {
        &self.config
    }

    /// Executed actions, oldest first
    #[inline]
    #[must_use]
    pub fn journal(&self) -> &VecDeque<ModelAction> {
        &self.journal
    }

    /// Forget every executed action
    pub fn clear_journal(&mut self) {
        self.journal.clear();
    }

    /// Execute an action and record it for undo
    ///
    /// Validation actions are not journaled. When the re-validation fails the
    /// action is undone again; should that undo fail too, the action is
    /// journaled so the caller can still restore it.
    ///
    /// # Errors
    /// Errors of the processor or of the re-validation
    pub fn execute(
        &mut self,
        tree: &mut ModelTree,
        action: impl Into<ModelAction>,
    ) -> Result<Vec<ModelChangeSet>, ActionError> {
        let mut action = action.into();
        let changes = self.dispatch(tree, &mut action, Direction::Execute)?;
        if let Err(e) = self.revalidate(tree, &action, Direction::Execute) {
            tracing::warn!(action = action.name(), error = %e, "re-validation failed, rolling back");
            if let Err(undo) = self.dispatch(tree, &mut action, Direction::Restore) {
                tracing::warn!(action = action.name(), error = %undo, "rollback failed");
                self.record(action);
            }
            return Err(e);
        }
        tracing::info!(action = action.name(), changes = changes.len(), "executed model action");

        if !action.is_validation() {
            self.record(action);
        }
        Ok(changes)
    }

    /// Undo the latest journaled action
    ///
    /// Returns `None` when the journal is empty. A failed undo leaves the
    /// action in the journal. When the re-validation fails the action is
    /// executed again and stays journaled.
    ///
    /// # Errors
    /// Errors of the processor or of the re-validation
    pub fn restore_last(
        &mut self,
        tree: &mut ModelTree,
    ) -> Result<Option<Vec<ModelChangeSet>>, ActionError> {
        let Some(mut action) = self.journal.pop_back() else {
            return Ok(None);
        };
        let changes = match self.dispatch(tree, &mut action, Direction::Restore) {
            Ok(changes) => changes,
            Err(e) => {
                tracing::warn!(action = action.name(), error = %e, "undo failed");
                self.journal.push_back(action);
                return Err(e);
            }
        };
        if let Err(e) = self.revalidate(tree, &action, Direction::Restore) {
            tracing::warn!(action = action.name(), error = %e, "re-validation failed, redoing");
            if let Err(redo) = self.dispatch(tree, &mut action, Direction::Execute) {
                tracing::warn!(action = action.name(), error = %redo, "redo failed");
            }
            self.journal.push_back(action);
            return Err(e);
        }
        tracing::info!(action = action.name(), changes = changes.len(), "restored model action");
        Ok(Some(changes))
    }

    fn record(&mut self, action: ModelAction) {
        if self.config.journal_limit == 0 {
            return;
        }
        self.journal.push_back(action);
        while self.journal.len() > self.config.journal_limit {
            self.journal.pop_front();
        }
    }

    fn dispatch(
        &self,
        tree: &mut ModelTree,
        action: &mut ModelAction,
        direction: Direction,
    ) -> Result<Vec<ModelChangeSet>, ActionError> {
        tracing::debug!(action = action.name(), ?direction, "dispatching model action");
        match action {
            ModelAction::CreateField(a) => run(&ModelCreateFieldActionProcessor, tree, a, direction),
            ModelAction::CreateProperty(a) => {
                run(&ModelCreatePropertyActionProcessor, tree, a, direction)
            }
            ModelAction::CreateControl(a) => {
                run(&ModelCreateControlActionProcessor, tree, a, direction)
            }
            ModelAction::CreateControlParam(a) => {
                run(&ModelCreateControlParamActionProcessor, tree, a, direction)
            }
            ModelAction::RemoveControl(a) => {
                run(&ModelRemoveControlActionProcessor, tree, a, direction)
            }
            ModelAction::RestoreInheritedField(a) => {
                run(&ModelRestoreInheritedFieldActionProcessor, tree, a, direction)
            }
            ModelAction::RestoreInheritedHeader(a) => {
                run(&ModelRestoreInheritedHeaderActionProcessor, tree, a, direction)
            }
            ModelAction::RestoreInheritedRegion(a) => {
                run(&ModelRestoreInheritedRegionActionProcessor, tree, a, direction)
            }
            ModelAction::RestoreInheritedControl(a) => {
                run(&ModelRestoreInheritedControlActionProcessor, tree, a, direction)
            }
            ModelAction::RestoreInheritedAttribute(a) => {
                run(&ModelRestoreInheritedAttributeActionProcessor, tree, a, direction)
            }
            ModelAction::ValidateAttribute(a) => run(&self.validate_attribute, tree, a, direction),
            ModelAction::ValidateAttributes(a) => {
                run(&self.validate_attributes, tree, a, direction)
            }
        }
    }

    /// Model touched by an action and the context it is validated under
    fn affected(tree: &ModelTree, action: &ModelAction) -> Option<(ModelKey, ModelKey)> {
        let owner_of = |key: ModelKey| tree.get(key).and_then(ModelNode::parent).unwrap_or(key);
        match action {
            ModelAction::CreateField(a) => Some((a.model(), a.context())),
            ModelAction::CreateProperty(a) => Some((a.model(), a.context())),
            ModelAction::CreateControl(a) => Some((a.model(), a.context())),
            ModelAction::CreateControlParam(a) => Some((a.model(), a.context())),
            ModelAction::RemoveControl(a) => a.context.map(|field| (field, owner_of(field))),
            ModelAction::RestoreInheritedControl(a) => {
                a.context.map(|field| (field, owner_of(field)))
            }
            ModelAction::RestoreInheritedField(a) => a.context.map(|def| (def, def)),
            ModelAction::RestoreInheritedHeader(a) => a.context.map(|def| (def, def)),
            ModelAction::RestoreInheritedRegion(a) => a.context.map(|def| (def, def)),
            ModelAction::RestoreInheritedAttribute(a) => {
                let owner = a.model.as_ref().map(|m| m.owner)?;
                a.context.map(|context| (owner, context))
            }
            ModelAction::ValidateAttribute(_) | ModelAction::ValidateAttributes(_) => None,
        }
    }

    fn policy_applies(&self, action: &ModelAction, direction: Direction) -> bool {
        let policy = self.config.validation_policy;
        if direction == Direction::Restore {
            return policy.validate_after_restore;
        }
        match action {
            ModelAction::CreateField(_)
            | ModelAction::CreateProperty(_)
            | ModelAction::CreateControl(_)
            | ModelAction::CreateControlParam(_) => policy.validate_after_create,
            ModelAction::RemoveControl(_) => policy.validate_after_remove,
            ModelAction::ValidateAttribute(_) | ModelAction::ValidateAttributes(_) => false,
            _ => policy.validate_after_restore,
        }
    }

    fn revalidate(
        &self,
        tree: &mut ModelTree,
        action: &ModelAction,
        direction: Direction,
    ) -> Result<(), ActionError> {
        if !self.policy_applies(action, direction) {
            return Ok(());
        }
        let Some((model, context)) = Self::affected(tree, action) else {
            return Ok(());
        };
        tracing::debug!(model = %model_id(tree, model), "re-validating model");
        let mut validate = ModelValidateAttributesAction::default()
            .with_model(model)
            .with_context(context);
        self.validate_attributes.execute(tree, &mut validate)?;
        Ok(())
    }
}

impl std::fmt::Debug for ActionExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionExecutor")
            .field("config", &self.config)
            .field("journal", &self.journal.len())
            .finish_non_exhaustive()
    }
}

fn run<P: ActionProcessor>(
    processor: &P,
    tree: &mut ModelTree,
    action: &mut P::Action,
    direction: Direction,
) -> Result<Vec<ModelChangeSet>, ActionError> {
    match direction {
        Direction::Execute => processor.execute(tree, action),
        Direction::Restore => processor.restore(tree, action),
    }
}
