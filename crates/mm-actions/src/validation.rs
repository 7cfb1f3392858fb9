//! Attribute validation service
//!
//! Provides the [`ValidationService`] trait processors delegate to and
//! [`RuleValidationService`], which evaluates the metadata rules of an
//! attribute through a [`RuleChain`].

use crate::action::AttributeRef;
use crate::error::ActionError;
use mm_model::{
    ModelAttribute, ModelKey, ModelRuleExpression, ModelTree, Restrictions, MANDATORY_ERROR,
};
use mm_rules::{default_rule_registry, PluginRegistry, RuleChain, RuleCommand, RuleData};
use serde_json::Value;

/// Computes restrictions and errors of attributes
pub trait ValidationService: Send + Sync {
    /// Re-evaluate one attribute under `context`
    ///
    /// Implementations clear the attribute errors first, so repeated calls on
    /// an unchanged tree give the same state.
    ///
    /// # Errors
    /// `ActionError::MissingModel` if the attribute does not exist, rule
    /// evaluation errors otherwise
    fn validate_attribute(
        &self,
        tree: &mut ModelTree,
        attribute: &AttributeRef,
        context: ModelKey,
    ) -> Result<(), ActionError>;
}

/// Validation driven by the rules of the attribute metadata
///
/// Restrictions start from the metadata mandatory flag. Every rule whose
/// expressions all hold applies its outcome, in declaration order. A
/// mandatory attribute without a value records [`MANDATORY_ERROR`].
///
/// Expression fields are looked up on the attribute owner first, then on the
/// context model; a missing field evaluates as `null`.
#[derive(Debug, Clone)]
pub struct RuleValidationService {
    chain: RuleChain,
}

impl RuleValidationService {
    /// Create service over an assembled chain
    #[inline]
    #[must_use]
    pub fn new(chain: RuleChain) -> Self {
        Self { chain }
    }

    /// Create service with the rule commands registered under `extension_point`
    #[must_use]
    pub fn from_registry(registry: &PluginRegistry<RuleCommand>, extension_point: &str) -> Self {
        Self::new(RuleChain::from_registry(registry, extension_point))
    }

    fn field_value(tree: &ModelTree, owner: ModelKey, context: ModelKey, field: &str) -> Value {
        tree.attribute(owner, field)
            .or_else(|| tree.attribute(context, field))
            .map_or(Value::Null, ModelAttribute::json_value)
    }

    fn expression_holds(
        &self,
        tree: &ModelTree,
        owner: ModelKey,
        context: ModelKey,
        expression: &ModelRuleExpression,
    ) -> Result<bool, ActionError> {
        let data = RuleData::new(
            expression.operation.clone(),
            Self::field_value(tree, owner, context, &expression.field),
            expression.values.clone(),
        );
        Ok(self.chain.execute(&data)?)
    }
}

impl Default for RuleValidationService {
    fn default() -> Self {
        Self::from_registry(
            &default_rule_registry(),
            mm_rules::RULE_COMMAND_EXTENSION_POINT,
        )
    }
}

impl ValidationService for RuleValidationService {
    fn validate_attribute(
        &self,
        tree: &mut ModelTree,
        attribute: &AttributeRef,
        context: ModelKey,
    ) -> Result<(), ActionError> {
        let target = tree
            .attribute(attribute.owner, &attribute.attribute)
            .ok_or_else(|| ActionError::missing_model("validate attribute"))?;

        let mut restrictions = Restrictions::default();
        if let Some(meta) = target.meta().cloned() {
            restrictions = Restrictions::with_mandatory(meta.is_mandatory());
            for rule in meta.rules().iter() {
                let mut matched = true;
                for expression in &rule.expressions {
                    if !self.expression_holds(tree, attribute.owner, context, expression)? {
                        matched = false;
                        break;
                    }
                }
                if let (true, Some(outcome)) = (matched, rule.outcome) {
                    outcome.apply(&mut restrictions);
                }
            }
        }

        let Some(target) = tree.attribute_mut(attribute.owner, &attribute.attribute) else {
            return Err(ActionError::missing_model("validate attribute"));
        };
        target.set_restrictions(restrictions);
        let empty = target.is_empty();
        let validation = target.validation_mut();
        validation.clear_errors();
        if restrictions.mandatory && empty {
            validation.add_error(MANDATORY_ERROR);
        }
        tracing::trace!(
            attribute = %attribute.attribute,
            valid = validation.is_valid(),
            "validated attribute"
        );
        Ok(())
    }
}
