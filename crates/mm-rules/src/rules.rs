//! Rule commands for attribute validation expressions
//!
//! Three interchangeable [`Command`] implementations evaluate a single
//! [`RuleData`]:
//! - [`InCommand`] (`in`): the value is one of the expected values
//! - [`NotInCommand`] (`not_in`): the value is none of the expected values
//! - [`NotMatchCommand`] (`not_match`): the value does not match a pattern

use crate::command::{Command, CommandChain};
use crate::error::RuleError;
use parking_lot::Mutex;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Operation name handled by [`InCommand`]
pub const OPERATION_IN: &str = "in";

/// Operation name handled by [`NotInCommand`]
pub const OPERATION_NOT_IN: &str = "not_in";

/// Operation name handled by [`NotMatchCommand`]
pub const OPERATION_NOT_MATCH: &str = "not_match";

/// A single rule evaluation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleData {
    /// Operation selecting the command
    pub operation: String,

    /// Actual value under test
    #[serde(default)]
    pub value: Value,

    /// Expected values (or the pattern, for `not_match`)
    #[serde(default)]
    pub values: Vec<Value>,
}

impl RuleData {
    /// Create rule data
    #[inline]
    #[must_use]
    pub fn new(operation: impl Into<String>, value: Value, values: Vec<Value>) -> Self {
        Self {
            operation: operation.into(),
            value,
            values,
        }
    }
}

/// Type-erased rule command
pub type RuleCommand = dyn Command<Input = RuleData, Output = bool>;

/// Chain evaluating [`RuleData`] into a boolean
pub type RuleChain = CommandChain<RuleData, bool>;

/// Set membership: true when `value` is one of `values`
#[derive(Debug, Clone, Copy, Default)]
pub struct InCommand;

impl Command for InCommand {
    type Input = RuleData;
    type Output = bool;

    fn can_handle(&self, data: &RuleData) -> bool {
        data.operation == OPERATION_IN
    }

    fn handle(&self, data: &RuleData) -> Result<bool, RuleError> {
        contains(&data.values, &data.value)
    }

    fn name(&self) -> &'static str {
        OPERATION_IN
    }
}

/// Negated set membership: true when `value` is none of `values`
#[derive(Debug, Clone, Copy, Default)]
pub struct NotInCommand;

impl Command for NotInCommand {
    type Input = RuleData;
    type Output = bool;

    fn can_handle(&self, data: &RuleData) -> bool {
        data.operation == OPERATION_NOT_IN
    }

    fn handle(&self, data: &RuleData) -> Result<bool, RuleError> {
        contains(&data.values, &data.value).map(|found| !found)
    }

    fn name(&self) -> &'static str {
        OPERATION_NOT_IN
    }
}

/// Pattern rejection: true when `value` does not match `values[0]`
///
/// Compiled patterns are cached per instance.
#[derive(Debug, Default)]
pub struct NotMatchCommand {
    patterns: Mutex<HashMap<String, Regex>>,
}

impl NotMatchCommand {
    /// Create command with an empty pattern cache
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn pattern(&self, source: &str) -> Result<Regex, RuleError> {
        let mut cache = self.patterns.lock();
        if let Some(regex) = cache.get(source) {
            return Ok(regex.clone());
        }
        let regex = Regex::new(source).map_err(|e| RuleError::InvalidPattern {
            pattern: source.to_string(),
            source: e,
        })?;
        cache.insert(source.to_string(), regex.clone());
        Ok(regex)
    }
}

impl Command for NotMatchCommand {
    type Input = RuleData;
    type Output = bool;

    fn can_handle(&self, data: &RuleData) -> bool {
        data.operation == OPERATION_NOT_MATCH
    }

    fn handle(&self, data: &RuleData) -> Result<bool, RuleError> {
        let source = match data.values.as_slice() {
            [Value::String(source)] => source,
            [other] => {
                return Err(RuleError::invalid_values(
                    OPERATION_NOT_MATCH,
                    format!("pattern must be a string, got {other}"),
                ))
            }
            values => {
                return Err(RuleError::invalid_values(
                    OPERATION_NOT_MATCH,
                    format!("expected exactly one pattern, got {}", values.len()),
                ))
            }
        };
        let regex = self.pattern(source)?;
        let text = text_of(&data.value)?;
        Ok(!regex.is_match(&text))
    }

    fn name(&self) -> &'static str {
        OPERATION_NOT_MATCH
    }
}

/// Chain with the built-in rule commands, in registry order
#[must_use]
pub fn default_rule_chain() -> RuleChain {
    let mut chain = RuleChain::new();
    chain
        .add(NotMatchCommand::new())
        .add(InCommand)
        .add(NotInCommand);
    chain
}

fn contains(values: &[Value], value: &Value) -> Result<bool, RuleError> {
    ensure_comparable(value)?;
    for expected in values {
        ensure_comparable(expected)?;
        if primitive_eq(expected, value) {
            return Ok(true);
        }
    }
    Ok(false)
}

fn ensure_comparable(value: &Value) -> Result<(), RuleError> {
    match value {
        Value::Array(_) | Value::Object(_) => Err(RuleError::NonComparableValue(value.clone())),
        _ => Ok(()),
    }
}

#[allow(clippy::float_cmp)]
fn primitive_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x == y,
            _ => x.as_f64() == y.as_f64(),
        },
        _ => a == b,
    }
}

fn text_of(value: &Value) -> Result<String, RuleError> {
    match value {
        Value::Null => Ok(String::new()),
        Value::String(s) => Ok(s.clone()),
        Value::Bool(_) | Value::Number(_) => Ok(value.to_string()),
        Value::Array(_) | Value::Object(_) => Err(RuleError::NonComparableValue(value.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data(operation: &str, value: Value, values: Vec<Value>) -> RuleData {
        RuleData::new(operation, value, values)
    }

    #[test]
    fn in_command_membership() {
        let d = data("in", json!("x"), vec![json!("x"), json!("y")]);
        assert!(InCommand.can_handle(&d));
        assert!(InCommand.handle(&d).unwrap());

        let d = data("in", json!("z"), vec![json!("x"), json!("y")]);
        assert!(!InCommand.handle(&d).unwrap());
    }

    #[test]
    fn not_in_command_negates_membership() {
        let d = data("not_in", json!("x"), vec![json!("x"), json!("y")]);
        assert!(NotInCommand.can_handle(&d));
        assert!(!NotInCommand.handle(&d).unwrap());
        assert!(!InCommand.can_handle(&d));
    }

    #[test]
    fn numbers_compare_numerically() {
        let d = data("in", json!(1), vec![json!(1.0)]);
        assert!(InCommand.handle(&d).unwrap());
    }

    #[test]
    fn null_value_is_comparable() {
        let d = data("in", Value::Null, vec![Value::Null]);
        assert!(InCommand.handle(&d).unwrap());
    }

    #[test]
    fn structured_values_are_rejected() {
        let d = data("in", json!({"en": "x"}), vec![json!("x")]);
        assert!(matches!(
            InCommand.handle(&d),
            Err(RuleError::NonComparableValue(_))
        ));

        let d = data("not_in", json!("x"), vec![json!(["x"])]);
        assert!(matches!(
            NotInCommand.handle(&d),
            Err(RuleError::NonComparableValue(_))
        ));
    }

    #[test]
    fn not_match_pattern() {
        let cmd = NotMatchCommand::new();
        let d = data("not_match", json!("abc"), vec![json!("^a.*")]);
        assert!(cmd.can_handle(&d));
        assert!(!cmd.handle(&d).unwrap());

        let d = data("not_match", json!("xyz"), vec![json!("^a.*")]);
        assert!(cmd.handle(&d).unwrap());
    }

    #[test]
    fn not_match_invalid_pattern_propagates() {
        let cmd = NotMatchCommand::new();
        let d = data("not_match", json!("abc"), vec![json!("([")]);
        assert!(matches!(
            cmd.handle(&d),
            Err(RuleError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn not_match_requires_single_string_pattern() {
        let cmd = NotMatchCommand::new();

        let d = data("not_match", json!("abc"), vec![]);
        assert!(matches!(cmd.handle(&d), Err(RuleError::InvalidValues { .. })));

        let d = data("not_match", json!("abc"), vec![json!("a"), json!("b")]);
        assert!(matches!(cmd.handle(&d), Err(RuleError::InvalidValues { .. })));

        let d = data("not_match", json!("abc"), vec![json!(3)]);
        assert!(matches!(cmd.handle(&d), Err(RuleError::InvalidValues { .. })));
    }

    #[test]
    fn not_match_uses_textual_form() {
        let cmd = NotMatchCommand::new();
        let d = data("not_match", json!(42), vec![json!("^[0-9]+$")]);
        assert!(!cmd.handle(&d).unwrap());

        let d = data("not_match", Value::Null, vec![json!("^$")]);
        assert!(!cmd.handle(&d).unwrap());
    }

    #[test]
    fn not_match_caches_compiled_patterns() {
        let cmd = NotMatchCommand::new();
        let d = data("not_match", json!("abc"), vec![json!("^a")]);
        cmd.handle(&d).unwrap();
        cmd.handle(&d).unwrap();
        assert_eq!(cmd.patterns.lock().len(), 1);
    }

    #[test]
    fn default_chain_dispatches_by_operation() {
        let chain = default_rule_chain();
        assert_eq!(chain.names(), vec!["not_match", "in", "not_in"]);

        let d = data("in", json!("a"), vec![json!("a")]);
        assert!(chain.execute(&d).unwrap());

        let d = data("between", json!(1), vec![]);
        assert!(chain.execute(&d).unwrap_err().is_handler_not_found());
    }

    #[test]
    fn rule_data_deserializes_with_defaults() {
        let d: RuleData = serde_json::from_value(json!({"operation": "in"})).unwrap();
        assert_eq!(d.value, Value::Null);
        assert!(d.values.is_empty());
    }
}
