//! Per-command handler implementations
//!
//! - **Version**: 3.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 3.0.0: Text command handlers for memory, export, lifecycle, analytics and fallback
//! - 2.0.0: Consolidated chat handlers into the fallback path
//! - 1.0.0: Initial extraction from the monolithic command handler

pub mod analytics;
pub mod export;
pub mod fallback;
pub mod help;
pub mod integrations;
pub mod lifecycle;
pub mod memory;

use std::sync::Arc;

use super::handler::TextCommandHandler;

/// Create all registered command handlers
///
/// Returns a vector of handlers ready to be registered with CommandRegistry.
pub fn create_all_handlers() -> Vec<Arc<dyn TextCommandHandler>> {
    vec![
        Arc::new(export::ExportHandler),
        Arc::new(help::HelpHandler),
        Arc::new(integrations::IntegrationsHandler),
        Arc::new(lifecycle::LifecycleHandler),
        Arc::new(analytics::AnalyticsHandler),
        Arc::new(memory::MemoryHandler),
        Arc::new(fallback::FallbackHandler),
    ]
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::commands::context::{CommandContext, CommandRequest};
    use crate::core::{Config, InboundMessage, SenderContext};
    use crate::features::ai::{AiClient, ChatMessage, ChatRole};
    use crate::features::modules::{ModuleCatalog, ModuleExecutor, ModuleRegistry};
    use crate::storage::MemoryBlobStore;
    use anyhow::{bail, Result};
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    /// Echoes the last user message as `ai: <text>` and records every call
    #[derive(Default)]
    pub struct ScriptedAi {
        calls: Mutex<Vec<Vec<ChatMessage>>>,
        failing: AtomicBool,
    }

    impl ScriptedAi {
        pub fn calls(&self) -> Vec<Vec<ChatMessage>> {
            self.calls.lock().unwrap().clone()
        }

        pub fn fail(&self) {
            self.failing.store(true, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl AiClient for ScriptedAi {
        async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
            self.calls.lock().unwrap().push(messages.to_vec());
            if self.failing.load(Ordering::SeqCst) {
                bail!("completion service unavailable");
            }
            let last_user = messages
                .iter()
                .rev()
                .find(|m| m.role == ChatRole::User)
                .and_then(|m| m.content.clone())
                .unwrap_or_default();
            Ok(format!("ai: {last_user}"))
        }
    }

    pub fn context() -> (Arc<CommandContext>, Arc<ScriptedAi>) {
        context_with_services(Path::new("./no-such-services-dir"))
    }

    pub fn context_with_services(services: &Path) -> (Arc<CommandContext>, Arc<ScriptedAi>) {
        let ai = Arc::new(ScriptedAi::default());
        let modules = Arc::new(ModuleRegistry::new(
            ModuleCatalog::new(services, "https://docs.example.com"),
            ModuleExecutor::new(Vec::new()),
        ));
        let ctx = CommandContext::new(
            Arc::new(Config::default()),
            Arc::new(MemoryBlobStore::new()),
            modules,
            Arc::clone(&ai) as Arc<dyn AiClient>,
        );
        (Arc::new(ctx), ai)
    }

    pub fn request(session_id: &str, text: &str) -> CommandRequest {
        let sender = SenderContext {
            user_id: Some("u1".to_string()),
            service_url: None,
            channel_id: Some("emulator".to_string()),
        };
        CommandRequest::new(InboundMessage::new(text, session_id, sender))
    }
}
