// Core layer - shared types and configuration
pub mod core;

// Storage layer - blob stores for logs, analytics and exports
pub mod storage;

// Features layer - all feature modules
pub mod features;

// Application layer
pub mod bot;
pub mod commands;

pub use bot::Bot;
pub use core::{Config, InboundMessage, Message, Sender, SenderContext};

pub use features::{
    // AI
    AiClient, ChatMessage, FunctionCallingClient, FunctionRegistry, OpenAiBackend,
    // Analytics
    ExportKind, SessionAnalytics, UsageTracker,
    // Export
    Exporter,
    // Lifecycle
    LifecycleAction, LifecycleManager, ModuleWindow, SessionStore,
    // Memory
    ConversationLog,
    // Integration modules
    Capabilities, IntegrationModule, ModuleCatalog, ModuleExecutor, ModuleRegistry,
};
