//! # Command System
//!
//! Text command handling: an ordered rule table classifies each inbound
//! message and a registry routes it to the handler for its kind.
//!
//! - **Version**: 3.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 3.0.0: Rule-table classifier and dispatcher for text commands
//! - 2.1.0: Add modular handler infrastructure (handler trait, context, registry)
//! - 1.0.0: Initial reorganization with modular command structure

pub mod classifier;
pub mod context;
pub mod dispatcher;
pub mod handler;
pub mod handlers;
pub mod registry;

// Re-export handler infrastructure
pub use classifier::{classify, Command, CommandKind, MemoryCommand, Rule, RuleInput, RULES};
pub use context::{CommandContext, CommandRequest};
pub use dispatcher::Dispatcher;
pub use handler::TextCommandHandler;
pub use registry::CommandRegistry;
