//! Validation state and validation rules
//!
//! [`ModelValidation`] accumulates error identifiers for a node or attribute.
//! [`ModelValidationRules`] is the sealable list of rules a metadata entry
//! carries; each [`ModelValidationRule`] combines [`ModelRuleExpression`]s
//! with an optional [`ModelRuleOutcome`].

use crate::attribute::Restrictions;
use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error recorded when a mandatory attribute has no value
pub const MANDATORY_ERROR: &str = "mandatory";

/// Accumulated validation errors
///
/// Errors are identifiers; recording the same one twice keeps a single entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelValidation {
    errors: Vec<String>,
}

impl ModelValidation {
    /// Create empty validation
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error, ignoring duplicates
    pub fn add_error(&mut self, error: impl Into<String>) {
        let error = error.into();
        if !self.errors.contains(&error) {
            self.errors.push(error);
        }
    }

    /// Drop all recorded errors
    #[inline]
    pub fn clear_errors(&mut self) {
        self.errors.clear();
    }

    /// Check if an error is recorded
    #[must_use]
    pub fn has_error(&self, error: &str) -> bool {
        self.errors.iter().any(|e| e == error)
    }

    /// Recorded errors in recording order
    #[inline]
    #[must_use]
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Check if no error is recorded
    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Single condition of a rule: `field <operation> values`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRuleExpression {
    /// Attribute whose value is tested
    pub field: String,
    /// Rule command operation (`in`, `not_in`, `not_match`)
    pub operation: String,
    /// Expected values
    #[serde(default)]
    pub values: Vec<Value>,
}

impl ModelRuleExpression {
    /// Create expression
    #[must_use]
    pub fn new(field: impl Into<String>, operation: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            field: field.into(),
            operation: operation.into(),
            values,
        }
    }
}

/// Restriction flags a rule sets when it matches; `None` leaves a flag alone
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelRuleOutcome {
    /// Editable flag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updateable: Option<bool>,
    /// Mandatory flag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mandatory: Option<bool>,
    /// Visible flag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
}

impl ModelRuleOutcome {
    /// Overwrite the flags this outcome defines
    pub fn apply(&self, restrictions: &mut Restrictions) {
        if let Some(updateable) = self.updateable {
            restrictions.updateable = updateable;
        }
        if let Some(mandatory) = self.mandatory {
            restrictions.mandatory = mandatory;
        }
        if let Some(visible) = self.visible {
            restrictions.visible = visible;
        }
    }
}

/// Expressions AND-ed together plus the outcome applied on a match
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelValidationRule {
    /// Conditions, all of which must hold
    #[serde(default)]
    pub expressions: Vec<ModelRuleExpression>,
    /// Flags applied when every expression holds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<ModelRuleOutcome>,
}

impl ModelValidationRule {
    /// Create rule
    #[must_use]
    pub fn new(expressions: Vec<ModelRuleExpression>, outcome: Option<ModelRuleOutcome>) -> Self {
        Self {
            expressions,
            outcome,
        }
    }
}

/// Ordered, sealable list of validation rules
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelValidationRules {
    rules: Vec<ModelValidationRule>,
    #[serde(skip)]
    sealed: bool,
}

impl ModelValidationRules {
    /// Create empty, unsealed rule list
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule
    ///
    /// # Errors
    /// `ModelError::Immutable` once sealed; the list is left unchanged
    pub fn push_rule(&mut self, rule: ModelValidationRule) -> Result<(), ModelError> {
        if self.sealed {
            return Err(ModelError::immutable("validation rules"));
        }
        self.rules.push(rule);
        Ok(())
    }

    /// Replace all rules
    ///
    /// # Errors
    /// `ModelError::Immutable` once sealed; the list is left unchanged
    pub fn set_rules(&mut self, rules: Vec<ModelValidationRule>) -> Result<(), ModelError> {
        if self.sealed {
            return Err(ModelError::immutable("validation rules"));
        }
        self.rules = rules;
        Ok(())
    }

    /// Forbid further writes
    #[inline]
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    /// Check if sealed
    #[inline]
    #[must_use]
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Rules in declaration order
    #[inline]
    #[must_use]
    pub fn rules(&self) -> &[ModelValidationRule] {
        &self.rules
    }

    /// Iterate over rules
    pub fn iter(&self) -> impl Iterator<Item = &ModelValidationRule> {
        self.rules.iter()
    }

    /// Number of rules
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check if there are no rules
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn validation_deduplicates_errors() {
        let mut validation = ModelValidation::new();
        assert!(validation.is_valid());

        validation.add_error(MANDATORY_ERROR);
        validation.add_error(MANDATORY_ERROR);
        validation.add_error("pattern");

        assert_eq!(validation.errors(), ["mandatory", "pattern"]);
        assert!(validation.has_error("pattern"));
        assert!(!validation.is_valid());

        validation.clear_errors();
        assert!(validation.is_valid());
    }

    #[test]
    fn outcome_applies_defined_flags_only() {
        let outcome = ModelRuleOutcome {
            mandatory: Some(true),
            visible: Some(false),
            ..ModelRuleOutcome::default()
        };
        let mut restrictions = Restrictions {
            updateable: false,
            ..Restrictions::default()
        };
        outcome.apply(&mut restrictions);

        assert!(!restrictions.updateable);
        assert!(restrictions.mandatory);
        assert!(!restrictions.visible);
    }

    #[test]
    fn sealed_rules_reject_writes() {
        let mut rules = ModelValidationRules::new();
        rules.push_rule(ModelValidationRule::default()).unwrap();
        rules.seal();

        let err = rules.push_rule(ModelValidationRule::default()).unwrap_err();
        assert!(err.is_immutable());
        assert!(rules.set_rules(Vec::new()).is_err());
        assert_eq!(rules.len(), 1);
    }

    #[test]
    fn rules_deserialize_from_list() {
        let rules: ModelValidationRules = serde_json::from_value(json!([
            {
                "expressions": [{"field": "type", "operation": "in", "values": ["an..10"]}],
                "outcome": {"mandatory": true}
            }
        ]))
        .unwrap();

        assert_eq!(rules.len(), 1);
        assert!(!rules.is_sealed());
        let rule = &rules.rules()[0];
        assert_eq!(rule.expressions[0].field, "type");
        assert_eq!(rule.outcome.unwrap().mandatory, Some(true));
        assert_eq!(rule.outcome.unwrap().visible, None);
    }
}
