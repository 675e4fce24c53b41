//! Command handler registry
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.0.0: Keyed by `CommandKind`
//! - 1.0.0: Initial implementation for handler dispatch

use std::collections::HashMap;
use std::sync::Arc;

use super::classifier::CommandKind;
use super::handler::TextCommandHandler;

/// Registry mapping command kinds to handlers
///
/// Several kinds can map to the same handler when they share logic.
#[derive(Clone)]
pub struct CommandRegistry {
    handlers: HashMap<CommandKind, Arc<dyn TextCommandHandler>>,
}

impl CommandRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a handler for its declared kinds
    pub fn register(&mut self, handler: Arc<dyn TextCommandHandler>) {
        for kind in handler.kinds() {
            self.handlers.insert(*kind, Arc::clone(&handler));
        }
    }

    /// Get handler for a command kind
    pub fn get(&self, kind: CommandKind) -> Option<Arc<dyn TextCommandHandler>> {
        self.handlers.get(&kind).cloned()
    }

    pub fn contains(&self, kind: CommandKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    /// Number of registered kinds
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}
