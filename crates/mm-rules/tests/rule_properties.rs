//! Property tests for the built-in rule commands and chain dispatch.

use mm_rules::{
    default_rule_registry, Command, InCommand, NotInCommand, NotMatchCommand, RuleChain,
    RuleData, RuleError, RULE_COMMAND_EXTENSION_POINT,
};
use proptest::prelude::*;
use serde_json::{json, Value};

fn primitive() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i32>().prop_map(|n| json!(n)),
        "[a-z]{0,4}".prop_map(Value::String),
    ]
}

#[test]
fn in_and_not_in_on_fixed_example() {
    let d = RuleData::new("in", json!("x"), vec![json!("x"), json!("y")]);
    assert!(InCommand.handle(&d).unwrap());
    assert!(!NotInCommand.handle(&d).unwrap());
}

#[test]
fn not_match_on_fixed_examples() {
    let cmd = NotMatchCommand::new();
    let matching = RuleData::new("not_match", json!("abc"), vec![json!("^a.*")]);
    let other = RuleData::new("not_match", json!("xyz"), vec![json!("^a.*")]);

    assert!(!cmd.handle(&matching).unwrap());
    assert!(cmd.handle(&other).unwrap());
}

#[test]
fn chain_without_matching_operation_fails() {
    let chain = RuleChain::from_registry(&default_rule_registry(), RULE_COMMAND_EXTENSION_POINT);
    let data = RuleData::new("match", json!("a"), vec![json!("a")]);
    assert!(matches!(
        chain.execute(&data),
        Err(RuleError::HandlerNotFound { .. })
    ));
}

proptest! {
    #[test]
    fn prop_in_is_complement_of_not_in(
        value in primitive(),
        values in prop::collection::vec(primitive(), 0..6),
    ) {
        let d = RuleData::new("in", value, values);
        let found = InCommand.handle(&d).unwrap();
        let missing = NotInCommand.handle(&d).unwrap();
        prop_assert_eq!(found, !missing);
    }

    #[test]
    fn prop_value_is_in_its_own_list(
        value in primitive(),
        mut values in prop::collection::vec(primitive(), 0..6),
        position in 0usize..6,
    ) {
        let at = position.min(values.len());
        values.insert(at, value.clone());
        let d = RuleData::new("in", value, values);
        prop_assert!(InCommand.handle(&d).unwrap());
    }

    #[test]
    fn prop_chain_routes_by_operation(
        value in primitive(),
        values in prop::collection::vec(primitive(), 0..6),
    ) {
        let chain = RuleChain::from_registry(&default_rule_registry(), RULE_COMMAND_EXTENSION_POINT);
        let as_in = RuleData::new("in", value.clone(), values.clone());
        let as_not_in = RuleData::new("not_in", value, values);
        prop_assert_eq!(
            chain.execute(&as_in).unwrap(),
            !chain.execute(&as_not_in).unwrap()
        );
    }

    #[test]
    fn prop_literal_prefix_never_not_matches(word in "[a-z]{1,8}", tail in "[a-z0-9]{0,8}") {
        let cmd = NotMatchCommand::new();
        let pattern = format!("^{word}");
        let d = RuleData::new("not_match", json!(format!("{word}{tail}")), vec![json!(pattern)]);
        prop_assert!(!cmd.handle(&d).unwrap());
    }
}
