//! Shared context for command handlers
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.0.0: Conversation log, lifecycle, module registry and exporter replace chat-platform state
//! - 1.0.0: Initial implementation with core shared state

use crate::core::{Config, InboundMessage};
use crate::features::ai::{AiClient, ChatMessage};
use crate::features::analytics::UsageTracker;
use crate::features::export::Exporter;
use crate::features::lifecycle::{LifecycleManager, SessionStore};
use crate::features::memory::ConversationLog;
use crate::features::modules::ModuleRegistry;
use crate::storage::BlobStore;
use anyhow::Result;
use log::debug;
use std::sync::Arc;
use uuid::Uuid;

/// Services every handler can reach
#[derive(Clone)]
pub struct CommandContext {
    pub config: Arc<Config>,
    pub log: ConversationLog,
    pub usage: UsageTracker,
    pub lifecycle: Arc<LifecycleManager>,
    pub modules: Arc<ModuleRegistry>,
    pub exporter: Exporter,
    pub ai: Arc<dyn AiClient>,
}

impl CommandContext {
    /// Wire the services over one blob store
    pub fn new(
        config: Arc<Config>,
        store: Arc<dyn BlobStore>,
        modules: Arc<ModuleRegistry>,
        ai: Arc<dyn AiClient>,
    ) -> Self {
        let usage = UsageTracker::new(Arc::clone(&store));
        let exporter = Exporter::new(
            Arc::clone(&store),
            usage.clone(),
            config.base_url.clone(),
            config.port,
        );
        let lifecycle = Arc::new(LifecycleManager::new(
            Arc::new(SessionStore::new()),
            Arc::clone(&modules),
        ));

        Self {
            log: ConversationLog::new(store),
            usage,
            lifecycle,
            modules,
            exporter,
            ai,
            config,
        }
    }

    /// Ask the AI collaborator and log the size of the answer
    pub async fn complete(&self, request_id: Uuid, messages: &[ChatMessage]) -> Result<String> {
        debug!("[{request_id}] Sending {} messages to the AI", messages.len());
        let answer = self.ai.complete(messages).await?;
        debug!("[{request_id}] Got response: {} chars", answer.len());
        Ok(answer)
    }
}

/// One inbound message being handled
#[derive(Debug, Clone)]
pub struct CommandRequest {
    pub inbound: InboundMessage,
    /// Prefixed to every log line emitted for this message
    pub request_id: Uuid,
}

impl CommandRequest {
    pub fn new(inbound: InboundMessage) -> Self {
        Self {
            inbound,
            request_id: Uuid::new_v4(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.inbound.session_id
    }

    pub fn text(&self) -> &str {
        &self.inbound.text
    }
}
