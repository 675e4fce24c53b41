//! # Features Layer
//!
//! Each feature is a self-contained module with its own version and changelog.

pub mod ai;
pub mod analytics;
pub mod export;
pub mod lifecycle;
pub mod memory;
pub mod modules;

// Re-export commonly used items
pub use ai::{AiClient, ChatMessage, FunctionCallingClient, FunctionRegistry, OpenAiBackend};
pub use analytics::{ExportKind, SessionAnalytics, UsageTracker};
pub use export::Exporter;
pub use lifecycle::{LifecycleAction, LifecycleManager, ModuleWindow, SessionStore};
pub use memory::ConversationLog;
pub use modules::{Capabilities, IntegrationModule, ModuleCatalog, ModuleExecutor, ModuleRegistry};
