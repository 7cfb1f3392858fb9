//! Executor re-validation driven by the validation policy

use mm_actions::{
    ActionError, ActionExecutor, AttributeRef, MetaDataLinker, ModelCreateFieldActionFactory,
    ModelManagementConfig, ModelRemoveControlActionFactory, ModelValidateAttributeActionFactory,
    ValidationPolicy, ValidationService,
};
use mm_model::{ModelKey, ModelTree, ModelType};
use mm_test_utils::load_fixture;
use mockall::mock;
use std::sync::Arc;

mock! {
    pub Validator {}

    impl ValidationService for Validator {
        fn validate_attribute(
            &self,
            tree: &mut ModelTree,
            attribute: &AttributeRef,
            context: ModelKey,
        ) -> Result<(), ActionError>;
    }
}

#[test]
fn created_field_attributes_are_validated_once_each() {
    let mut fixture = load_fixture();
    let media = fixture.media();
    let expected = fixture.meta.fields.len();

    let mut validator = MockValidator::new();
    validator
        .expect_validate_attribute()
        .withf(move |_, _, context| *context == media)
        .times(expected)
        .returning(|_, _, _| Ok(()));

    let factory = ModelCreateFieldActionFactory::new(Arc::new(MetaDataLinker));
    let action = factory
        .create(media, Some(fixture.meta.fields.clone()))
        .with_id("subtitle");
    let action = factory.evaluate(action, &mut fixture.tree).unwrap();

    let mut executor = ActionExecutor::new(ModelManagementConfig::default(), Arc::new(validator));
    executor.execute(&mut fixture.tree, action).unwrap();
}

#[test]
fn disabled_policy_skips_validation() {
    let mut fixture = load_fixture();
    let title = fixture.field(fixture.media(), "title");
    let pattern = fixture.control(title, "DEFAULT_VALUE_PATTERN");

    let mut validator = MockValidator::new();
    validator.expect_validate_attribute().never();

    let config = ModelManagementConfig::default().with_validation_policy(ValidationPolicy {
        validate_after_remove: false,
        validate_after_restore: false,
        ..ValidationPolicy::default()
    });
    let mut executor = ActionExecutor::new(config, Arc::new(validator));
    executor
        .execute(
            &mut fixture.tree,
            ModelRemoveControlActionFactory.create(pattern, title),
        )
        .unwrap();
    executor.restore_last(&mut fixture.tree).unwrap();
}

#[test]
fn validation_errors_propagate_unchanged() {
    let mut fixture = load_fixture();
    let media = fixture.media();
    let title = fixture.field(media, "title");

    let mut validator = MockValidator::new();
    validator
        .expect_validate_attribute()
        .withf(|_, attribute, _| attribute.attribute == "label")
        .times(1)
        .returning(|_, _, _| {
            Err(ActionError::NoInheritedModel {
                id: "label".into(),
            })
        });

    let mut executor = ActionExecutor::new(ModelManagementConfig::default(), Arc::new(validator));
    let action = ModelValidateAttributeActionFactory
        .create()
        .with_model(AttributeRef::new(title, "label"))
        .with_context(media);
    let err = executor.execute(&mut fixture.tree, action).unwrap_err();
    assert!(matches!(err, ActionError::NoInheritedModel { id } if id == "label"));
}

fn rejecting_validator() -> MockValidator {
    let mut validator = MockValidator::new();
    validator
        .expect_validate_attribute()
        .returning(|_, _, _| Err(ActionError::invalid_state("validate attribute", "rejected")));
    validator
}

#[test]
fn rejected_create_is_rolled_back() {
    let mut fixture = load_fixture();
    let media = fixture.media();
    let before = fixture.tree.children(media, ModelType::Field);

    let factory = ModelCreateFieldActionFactory::new(Arc::new(MetaDataLinker));
    let action = factory
        .create(media, Some(fixture.meta.fields.clone()))
        .with_id("subtitle");
    let action = factory.evaluate(action, &mut fixture.tree).unwrap();

    let mut executor =
        ActionExecutor::new(ModelManagementConfig::default(), Arc::new(rejecting_validator()));
    let err = executor.execute(&mut fixture.tree, action).unwrap_err();
    assert!(matches!(err, ActionError::InvalidState { reason: "rejected", .. }));
    assert_eq!(fixture.tree.children(media, ModelType::Field), before);
    assert!(executor.journal().is_empty());
}

#[test]
fn rejected_undo_is_redone_and_kept() {
    let mut fixture = load_fixture();
    let media = fixture.media();

    let factory = ModelCreateFieldActionFactory::new(Arc::new(MetaDataLinker));
    let action = factory
        .create(media, Some(fixture.meta.fields.clone()))
        .with_id("subtitle");
    let action = factory.evaluate(action, &mut fixture.tree).unwrap();
    let created = action.model();

    let config = ModelManagementConfig::default().with_validation_policy(ValidationPolicy {
        validate_after_create: false,
        validate_after_restore: true,
        ..ValidationPolicy::default()
    });
    let mut executor = ActionExecutor::new(config, Arc::new(rejecting_validator()));
    executor.execute(&mut fixture.tree, action).unwrap();
    assert_eq!(executor.journal().len(), 1);

    assert!(executor.restore_last(&mut fixture.tree).is_err());
    assert!(fixture.tree.children(media, ModelType::Field).contains(&created));
    assert_eq!(executor.journal().len(), 1);
}
