//! Model Management Rules
//!
//! Chain-of-responsibility evaluation of attribute validation expressions.
//!
//! # Core Concepts
//!
//! - [`Command`]: predicate/handler pair
//! - [`CommandChain`]: ordered commands, first match wins
//! - [`InCommand`], [`NotInCommand`], [`NotMatchCommand`]: built-in rules
//! - [`PluginRegistry`]: read-only extension point table, built once
//!
//! # Example
//!
//! ```rust
//! use mm_rules::{default_rule_registry, RuleChain, RuleData, RULE_COMMAND_EXTENSION_POINT};
//! use serde_json::json;
//!
//! let registry = default_rule_registry();
//! let chain = RuleChain::from_registry(&registry, RULE_COMMAND_EXTENSION_POINT);
//!
//! let data = RuleData::new("in", json!("x"), vec![json!("x"), json!("y")]);
//! assert!(chain.execute(&data).unwrap());
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod command;
mod error;
mod registry;
mod rules;

// Re-exports
pub use command::{Command, CommandChain, SharedCommand};
pub use error::RuleError;
pub use registry::{
    default_rule_registry, PluginDescriptor, PluginRegistry, PluginRegistryBuilder,
    RULE_COMMAND_EXTENSION_POINT,
};
pub use rules::{
    default_rule_chain, InCommand, NotInCommand, NotMatchCommand, RuleChain, RuleCommand,
    RuleData, OPERATION_IN, OPERATION_NOT_IN, OPERATION_NOT_MATCH,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
