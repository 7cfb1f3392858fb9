//! Model Management Actions
//!
//! Edits to a [`ModelTree`](mm_model::ModelTree) expressed as actions.
//!
//! # Flow
//!
//! 1. A factory builds the action
//! 2. Create actions are evaluated through a linker, which builds the new node
//! 3. The [`ActionExecutor`] dispatches the action to its processor
//! 4. The processor mutates the tree and returns change sets
//! 5. The touched model is re-validated according to the [`ValidationPolicy`]
//!
//! # Example
//!
//! ```rust
//! use mm_actions::{
//!     ActionExecutor, MetaDataLinker, ModelCreateFieldActionFactory, ModelManagementConfig,
//! };
//! use mm_model::{MetaDataSet, ModelTree, ModelType};
//! use std::sync::Arc;
//!
//! let mut tree = ModelTree::new();
//! let definition = tree.create(ModelType::Definition, "case");
//!
//! let factory = ModelCreateFieldActionFactory::new(Arc::new(MetaDataLinker));
//! let action = factory.create(definition, Some(MetaDataSet::new())).with_id("title");
//! let action = factory.evaluate(action, &mut tree).unwrap();
//!
//! let mut executor = ActionExecutor::with_rules(ModelManagementConfig::default());
//! let changes = executor.execute(&mut tree, action).unwrap();
//! assert_eq!(changes[0].model.to_string(), "definition:case/field:title");
//!
//! executor.restore_last(&mut tree).unwrap();
//! assert!(tree.children(definition, ModelType::Field).is_empty());
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod action;
mod config;
mod error;
mod executor;
mod factory;
mod linker;
mod processor;
mod validation;

// Re-exports
pub use action::{
    AttributeRef, DetachedModel, ModelAction, ModelCreateControlAction,
    ModelCreateControlParamAction, ModelCreateFieldAction, ModelCreatePropertyAction,
    ModelRemoveControlAction, ModelRestoreInheritedAttributeAction,
    ModelRestoreInheritedControlAction, ModelRestoreInheritedFieldAction,
    ModelRestoreInheritedHeaderAction, ModelRestoreInheritedRegionAction,
    ModelValidateAttributeAction, ModelValidateAttributesAction, Resolved, Unresolved,
};
pub use config::{ModelManagementConfig, ValidationPolicy};
pub use error::{ActionError, ConfigError};
pub use executor::ActionExecutor;
pub use factory::{
    ModelCreateControlActionFactory, ModelCreateControlParamActionFactory,
    ModelCreateFieldActionFactory, ModelCreatePropertyActionFactory,
    ModelRemoveControlActionFactory, ModelRestoreInheritedAttributeActionFactory,
    ModelRestoreInheritedControlActionFactory, ModelRestoreInheritedFieldActionFactory,
    ModelRestoreInheritedHeaderActionFactory, ModelRestoreInheritedRegionActionFactory,
    ModelValidateAttributeActionFactory, ModelValidateAttributesActionFactory,
};
pub use linker::{ControlLinker, ControlParamLinker, FieldLinker, MetaDataLinker, PropertyLinker};
pub use processor::{
    ActionProcessor, ModelCreateControlActionProcessor, ModelCreateControlParamActionProcessor,
    ModelCreateFieldActionProcessor, ModelCreatePropertyActionProcessor,
    ModelRemoveControlActionProcessor, ModelRestoreInheritedAttributeActionProcessor,
    ModelRestoreInheritedControlActionProcessor, ModelRestoreInheritedFieldActionProcessor,
    ModelRestoreInheritedHeaderActionProcessor, ModelRestoreInheritedRegionActionProcessor,
    ModelValidateAttributeActionProcessor, ModelValidateAttributesActionProcessor,
};
pub use validation::{RuleValidationService, ValidationService};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
