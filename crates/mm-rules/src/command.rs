//! Command trait and the ordered command chain
//!
//! Provides [`Command`], a predicate/handler pair, and [`CommandChain`],
//! which hands a value to the first command willing to handle it.

use crate::error::RuleError;
use crate::registry::PluginRegistry;
use std::fmt::Debug;
use std::sync::Arc;

/// A predicate/handler pair evaluated by a [`CommandChain`]
///
/// Both methods are required; a command missing either does not compile.
pub trait Command: Send + Sync + Debug {
    /// Data the command inspects
    type Input: Debug + ?Sized;

    /// Result produced by [`Command::handle`]
    type Output;

    /// Whether this command is responsible for `data`
    fn can_handle(&self, data: &Self::Input) -> bool;

    /// Evaluate `data`
    ///
    /// # Errors
    /// Command-specific evaluation failures
    fn handle(&self, data: &Self::Input) -> Result<Self::Output, RuleError>;

    /// Command name (for registries and diagnostics)
    fn name(&self) -> &'static str;
}

/// Shared, type-erased command
pub type SharedCommand<I, O> = Arc<dyn Command<Input = I, Output = O>>;

/// Ordered list of commands; the first match wins
///
/// There is no priority reordering. The chain holds no state apart from
/// its command list.
pub struct CommandChain<I: Debug + ?Sized, O> {
    commands: Vec<SharedCommand<I, O>>,
}

impl<I: Debug + ?Sized, O> CommandChain<I, O> {
    /// Create empty chain
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    /// Assemble a chain from the components registered under `extension_point`
    ///
    /// Commands keep their registration order. An unknown extension point
    /// yields an empty chain.
    #[must_use]
    pub fn from_registry(
        registry: &PluginRegistry<dyn Command<Input = I, Output = O>>,
        extension_point: &str,
    ) -> Self {
        let commands: Vec<_> = registry
            .get(extension_point)
            .iter()
            .map(|descriptor| Arc::clone(descriptor.component()))
            .collect();
        tracing::debug!(
            extension_point,
            commands = commands.len(),
            "assembled command chain"
        );
        Self { commands }
    }

    /// Append a command
    pub fn add<C>(&mut self, command: C) -> &mut Self
    where
        C: Command<Input = I, Output = O> + 'static,
    {
        self.commands.push(Arc::new(command));
        self
    }

    /// Append an already shared command
    pub fn add_shared(&mut self, command: SharedCommand<I, O>) -> &mut Self {
        self.commands.push(command);
        self
    }

    /// Hand `data` to the first command whose `can_handle` returns true
    ///
    /// # Errors
    /// - `RuleError::HandlerNotFound` if no command accepts `data`
    /// - whatever the selected command's `handle` returns
    pub fn execute(&self, data: &I) -> Result<O, RuleError> {
        match self.commands.iter().find(|c| c.can_handle(data)) {
            Some(command) => {
                tracing::trace!(command = command.name(), "dispatching to command");
                command.handle(data)
            }
            None => Err(RuleError::handler_not_found(&data)),
        }
    }

    /// Names of the commands in chain order
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.commands.iter().map(|c| c.name()).collect()
    }

    /// Number of commands
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Check if chain has no commands
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl<I: Debug + ?Sized, O> Default for CommandChain<I, O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: Debug + ?Sized, O> Clone for CommandChain<I, O> {
    fn clone(&self) -> Self {
        Self {
            commands: self.commands.clone(),
        }
    }
}

impl<I: Debug + ?Sized, O> Debug for CommandChain<I, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandChain")
            .field("commands", &self.names())
            .finish()
    }
}
