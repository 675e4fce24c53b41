//! # Feature: Integration Modules
//!
//! Opaque plugins exposing an optional capability set
//! (init, close, status, restart, help, run, ask). Which capabilities a module
//! has is declared up front through [`Capabilities`]; callers check the flag
//! and never call an absent capability.
//!
//! Modules come from two places: instances registered by the embedding
//! application, and folders under the services directory described by a
//! `module.yaml` manifest whose commands run through [`ModuleExecutor`].
//!
//! - **Version**: 1.3.0
//! - **Since**: 0.2.0
//! - **Toggleable**: true
//!
//! ## Changelog
//! - 1.3.0: Added `ask` capability and not-understood sentinel detection
//! - 1.2.0: Folder-backed modules via manifest + executor
//! - 1.1.0: Missing-file warnings for incomplete module folders
//! - 1.0.0: Initial release with registry and capability flags

pub mod catalog;
pub mod executor;
pub mod manifest;
pub mod registry;
pub mod script;

pub use catalog::{normalize_module_name, FileCheck, ModuleCatalog, ModuleFolder};
pub use executor::{ExecutionResult, ModuleExecutor};
pub use manifest::{CapabilityCommand, ModuleManifest};
pub use registry::{ModuleRegistry, Resolution};
pub use script::ScriptModule;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::Value;

/// Presence flags for the optional module capabilities
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub init: bool,
    pub close: bool,
    pub status: bool,
    pub restart: bool,
    pub help: bool,
    pub run: bool,
    pub ask: bool,
}

impl Capabilities {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn all() -> Self {
        Self {
            init: true,
            close: true,
            status: true,
            restart: true,
            help: true,
            run: true,
            ask: true,
        }
    }
}

/// An integration module
///
/// Default method bodies return an error; they are only reached if a caller
/// ignores [`IntegrationModule::capabilities`].
#[async_trait]
pub trait IntegrationModule: Send + Sync {
    /// Display name, also the key windows are recorded under
    fn name(&self) -> &str;

    fn capabilities(&self) -> Capabilities;

    /// Keywords that route fallback questions to `run` while the module is active
    fn topics(&self) -> Vec<String> {
        Vec::new()
    }

    async fn init(&self) -> Result<()> {
        Err(unsupported(self.name(), "init"))
    }

    async fn close(&self) -> Result<()> {
        Err(unsupported(self.name(), "close"))
    }

    async fn status(&self) -> Result<String> {
        Err(unsupported(self.name(), "status"))
    }

    async fn restart(&self) -> Result<()> {
        Err(unsupported(self.name(), "restart"))
    }

    async fn help(&self) -> Result<String> {
        Err(unsupported(self.name(), "help"))
    }

    /// Fetch live data for a question. A payload carrying an `error` key is
    /// treated the same as an `Err`.
    async fn run(&self, query: &str) -> Result<Value> {
        let _ = query;
        Err(unsupported(self.name(), "run"))
    }

    /// Let the module answer a question directly
    async fn ask(&self, question: &str) -> Result<String> {
        let _ = question;
        Err(unsupported(self.name(), "ask"))
    }
}

fn unsupported(module: &str, capability: &str) -> anyhow::Error {
    anyhow!("Module '{module}' does not support '{capability}'")
}

/// Whether a `run` payload reports an error instead of data
pub fn is_error_payload(payload: &Value) -> bool {
    match payload {
        Value::Null => true,
        Value::Object(map) => map.get("error").is_some_and(|e| !e.is_null()),
        _ => false,
    }
}

/// Answers a module returns when it could not handle a question
const NOT_UNDERSTOOD_PREFIXES: &[&str] = &[
    "i don't understand",
    "i do not understand",
    "i didn't understand",
    "sorry, i don't understand",
    "sorry, i didn't understand",
];

/// Whether an `ask` answer is the module's "I don't understand" sentinel
pub fn is_not_understood(answer: &str) -> bool {
    let normalized = answer.trim().to_lowercase().replace('’', "'");
    normalized.is_empty()
        || NOT_UNDERSTOOD_PREFIXES
            .iter()
            .any(|prefix| normalized.starts_with(prefix))
}

/// Case-insensitive substring match of the message against declared topics
pub fn matches_topic(topics: &[String], text: &str) -> bool {
    let text = text.to_lowercase();
    topics
        .iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .any(|t| text.contains(&t))
}
