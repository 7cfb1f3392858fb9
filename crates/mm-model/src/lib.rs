//! Model Management Model Tree
//!
//! In-memory tree of model definitions edited by the model management
//! actions.
//!
//! # Core Concepts
//!
//! - [`ModelTree`]: arena of [`ModelNode`]s addressed by [`ModelKey`]
//! - [`ModelAttribute`]: typed attribute value with computed [`Restrictions`]
//! - [`ModelMetaData`]: sealable attribute description shared via `Arc`
//! - [`ModelValidation`]: accumulated validation errors of a node or attribute
//! - [`ModelChangeSet`]: record of an applied change, addressed by [`ModelPath`]
//!
//! # Inheritance
//!
//! A definition's parent is its super definition. Fields, regions and headers
//! a definition does not own are inherited; a local node with the same id
//! overrides the inherited one (see [`ModelTree::effective_fields`]).
//!
//! # Example
//!
//! ```rust
//! use mm_model::{ModelTree, ModelType};
//!
//! let mut tree = ModelTree::new();
//! let entity = tree.create(ModelType::Definition, "entity");
//! let media = tree.create(ModelType::Definition, "media");
//! tree.set_super(media, entity).unwrap();
//!
//! tree.create_child(entity, ModelType::Field, "title").unwrap();
//! let local = tree.create_child(media, ModelType::Field, "title").unwrap();
//!
//! assert_eq!(tree.effective_fields(media), vec![local]);
//! assert!(tree.inherited_counterpart(local).is_some());
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod attribute;
mod change;
mod error;
mod filter;
mod list;
mod loader;
mod meta;
mod node;
mod path;
mod tree;
mod validation;

// Re-exports
pub use attribute::{
    AttributeType, AttributeValue, ModelAttribute, ModelAttributes, Restrictions,
    DISPLAY_ATTRIBUTE, FALLBACK_LANGUAGE, LABEL_ATTRIBUTE, ORDER_ATTRIBUTE, URI_ATTRIBUTE,
};
pub use change::{ChangeOperation, ModelChangeSet, MODEL_SELECTOR};
pub use error::ModelError;
pub use filter::{ModelFilter, DISPLAY_TYPE_HIDDEN, DISPLAY_TYPE_SYSTEM};
pub use list::ModelList;
pub use loader::LoadedModels;
pub use meta::{MetaDataSet, MetaDataValidation, ModelMetaData, ModelsMetaData};
pub use node::{
    ClassData, ControlData, DefinitionData, FieldData, ModelBase, ModelKey, ModelKind, ModelNode, ModelType,
    ModelView, RegionData,
};
pub use path::{ModelPath, PathSegment};
pub use tree::{ModelTree, Placement};
pub use validation::{
    ModelRuleExpression, ModelRuleOutcome, ModelValidation, ModelValidationRule,
    ModelValidationRules, MANDATORY_ERROR,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
