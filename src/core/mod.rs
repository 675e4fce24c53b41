//! # Core Module
//!
//! Configuration, message types and static texts shared by every layer.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Add help texts and the apology reply
//! - 1.0.0: Initial creation with config and message modules

pub mod config;
pub mod help;
pub mod message;

// Re-export commonly used items
pub use config::{Config, StorageBackend};
pub use message::{InboundMessage, Message, Sender, SenderContext};
