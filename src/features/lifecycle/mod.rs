//! # Feature: Module Lifecycle
//!
//! Session-scoped state machine for integration modules:
//! `Uninitialized → Initialized → Closed`, with `Closed → Initialized` via
//! re-init or restart. Each init opens a [`ModuleWindow`]; each close stamps
//! the most recent open window of that module.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.2.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.2.0: Initializing a second module closes the active one first
//! - 1.1.0: Restart uses the module's own restart capability when declared
//! - 1.0.0: Initial release with init, close, status, restart and help

pub mod state;

pub use state::{LifecycleState, ModuleWindow, SessionStore};

use crate::features::modules::{IntegrationModule, ModuleRegistry, Resolution};
use anyhow::{anyhow, Result};
use chrono::Utc;
use log::{info, warn};
use std::str::FromStr;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleAction {
    Init,
    Close,
    Status,
    Restart,
    Help,
}

impl LifecycleAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleAction::Init => "init",
            LifecycleAction::Close => "close",
            LifecycleAction::Status => "status",
            LifecycleAction::Restart => "restart",
            LifecycleAction::Help => "help",
        }
    }
}

impl FromStr for LifecycleAction {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "init" => Ok(LifecycleAction::Init),
            "close" => Ok(LifecycleAction::Close),
            "status" => Ok(LifecycleAction::Status),
            "restart" => Ok(LifecycleAction::Restart),
            "help" => Ok(LifecycleAction::Help),
            other => Err(anyhow!("Unknown lifecycle action: {other}")),
        }
    }
}

pub struct LifecycleManager {
    sessions: Arc<SessionStore>,
    registry: Arc<ModuleRegistry>,
}

impl LifecycleManager {
    pub fn new(sessions: Arc<SessionStore>, registry: Arc<ModuleRegistry>) -> Self {
        Self { sessions, registry }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    /// The session's active module, if it can still be resolved
    pub fn active_module(&self, session_id: &str) -> Result<Option<Arc<dyn IntegrationModule>>> {
        let Some(name) = self.sessions.active_module(session_id) else {
            return Ok(None);
        };
        match self.registry.resolve(&name)? {
            Resolution::Found(module) => Ok(Some(module)),
            _ => {
                warn!("Active module '{name}' of session {session_id} can no longer be resolved");
                Ok(None)
            }
        }
    }

    /// Run a lifecycle action and return the reply text
    pub async fn execute(&self, session_id: &str, action: LifecycleAction, name: &str) -> Result<String> {
        let module = match self.registry.resolve(name)? {
            Resolution::Found(module) => module,
            Resolution::Unavailable(warning) => return Ok(warning),
            Resolution::NotFound if action == LifecycleAction::Status => {
                return Ok(format!("Module '{name}' is not initialized."));
            }
            Resolution::NotFound => {
                return Ok(format!(
                    "❌ Integration module '{name}' not found. Use `!kazbot command services` to see what is installed."
                ));
            }
        };

        info!("Lifecycle {} '{}' for session {session_id}", action.as_str(), module.name());
        match action {
            LifecycleAction::Init => self.init(session_id, module).await,
            LifecycleAction::Close => self.close(session_id, module).await,
            LifecycleAction::Status => self.status(session_id, module).await,
            LifecycleAction::Restart => self.restart(session_id, module).await,
            LifecycleAction::Help => self.help(module).await,
        }
    }

    pub async fn init(&self, session_id: &str, module: Arc<dyn IntegrationModule>) -> Result<String> {
        let name = module.name().to_string();
        if self.sessions.active_module(session_id).as_deref() == Some(name.as_str()) {
            return Ok(format!("Module '{name}' is already initialized."));
        }

        if let Some(failure) = self.init_capability(module.as_ref()).await {
            return Ok(failure);
        }
        self.activate(session_id, &name).await?;
        Ok(format!("✅ Module '{name}' initialized."))
    }

    pub async fn close(&self, session_id: &str, module: Arc<dyn IntegrationModule>) -> Result<String> {
        let name = module.name().to_string();
        if let Some(failure) = self.close_capability(module.as_ref()).await {
            return Ok(failure);
        }

        if self.sessions.close_window(session_id, &name, Utc::now()) {
            Ok(format!("🔒 Module '{name}' closed."))
        } else {
            Ok(format!("Module '{name}' is not running."))
        }
    }

    pub async fn status(&self, session_id: &str, module: Arc<dyn IntegrationModule>) -> Result<String> {
        let name = module.name();
        match self.sessions.lifecycle_state(session_id, name) {
            None => Ok(format!("Module '{name}' is not initialized.")),
            Some(LifecycleState::Closed) => Ok(format!("Module '{name}' is closed.")),
            Some(LifecycleState::Initialized) if module.capabilities().status => {
                match module.status().await {
                    Ok(status) => Ok(status),
                    Err(e) => Ok(format!("Error getting status for module '{name}': {e}")),
                }
            }
            Some(LifecycleState::Initialized) => Ok(format!("Module '{name}' status: loaded.")),
        }
    }

    /// Close then init, as two separate transitions
    pub async fn restart(&self, session_id: &str, module: Arc<dyn IntegrationModule>) -> Result<String> {
        let name = module.name().to_string();

        let self_restart = module.capabilities().restart;

        if self_restart {
            if let Err(e) = module.restart().await {
                warn!("Module '{name}' failed to restart: {e:#}");
                return Ok(format!("Failed to restart module '{name}': {e}"));
            }
        } else if let Some(failure) = self.close_capability(module.as_ref()).await {
            return Ok(failure);
        }

        // Two transitions even when the module restarts itself in one call
        self.sessions.close_window(session_id, &name, Utc::now());
        if !self_restart {
            if let Some(failure) = self.init_capability(module.as_ref()).await {
                return Ok(failure);
            }
        }
        self.activate(session_id, &name).await?;
        Ok(format!("🔄 Module '{name}' restarted."))
    }

    pub async fn help(&self, module: Arc<dyn IntegrationModule>) -> Result<String> {
        let name = module.name();
        if !module.capabilities().help {
            return Ok(format!("No help available for module '{name}'."));
        }
        match module.help().await {
            Ok(help) => Ok(help),
            Err(e) => Ok(format!("Error getting help for module '{name}': {e}")),
        }
    }

    /// Failure reply when the module's init capability errors
    async fn init_capability(&self, module: &dyn IntegrationModule) -> Option<String> {
        if !module.capabilities().init {
            return None;
        }
        match module.init().await {
            Ok(()) => None,
            Err(e) => {
                warn!("Module '{}' failed to initialize: {e:#}", module.name());
                Some(format!("Failed to initialize module '{}': {e}", module.name()))
            }
        }
    }

    /// Failure reply when the module's close capability errors
    async fn close_capability(&self, module: &dyn IntegrationModule) -> Option<String> {
        if !module.capabilities().close {
            return None;
        }
        match module.close().await {
            Ok(()) => None,
            Err(e) => {
                warn!("Module '{}' failed to close: {e:#}", module.name());
                Some(format!("Error closing module '{}': {e}", module.name()))
            }
        }
    }

    /// Make `name` active, closing whatever other module was active
    async fn activate(&self, session_id: &str, name: &str) -> Result<()> {
        if let Some(previous) = self.sessions.active_module(session_id) {
            if previous != name {
                if let Resolution::Found(module) = self.registry.resolve(&previous)? {
                    // The switch goes ahead even if the old module fails to close
                    self.close_capability(module.as_ref()).await;
                }
                self.sessions.close_window(session_id, &previous, Utc::now());
                info!("Closed module '{previous}' for session {session_id}");
            }
        }
        self.sessions.open_window(session_id, name, Utc::now());
        Ok(())
    }
}
