//! # Message Pipeline
//!
//! Entry point for the transport: one inbound message in, one reply out.
//! Messages of the same session are processed one at a time; different
//! sessions run in parallel.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Idle session eviction
//! - 1.0.0: Initial release with per-session serialisation and welcome messages

use anyhow::Result;
use chrono::{Duration, Utc};
use dashmap::DashMap;
use log::{debug, error, info};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::commands::{CommandContext, CommandRequest, Dispatcher};
use crate::core::help::{APOLOGY_MESSAGE, FULL_HELP, WELCOME_MESSAGE};
use crate::core::{Config, InboundMessage, Message};
use crate::features::ai::AiClient;
use crate::features::modules::ModuleRegistry;
use crate::storage::BlobStore;

pub struct Bot {
    dispatcher: Dispatcher,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl Bot {
    pub fn new(
        config: Arc<Config>,
        store: Arc<dyn BlobStore>,
        modules: Arc<ModuleRegistry>,
        ai: Arc<dyn AiClient>,
    ) -> Self {
        let ctx = CommandContext::new(config, store, modules, ai);
        Self {
            dispatcher: Dispatcher::new(Arc::new(ctx)),
            locks: DashMap::new(),
        }
    }

    pub fn context(&self) -> &Arc<CommandContext> {
        self.dispatcher.context()
    }

    fn session_lock(&self, session_id: &str) -> Arc<Mutex<()>> {
        Arc::clone(
            self.locks
                .entry(session_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .value(),
        )
    }

    /// Handle one inbound message and return the reply
    ///
    /// Never fails: collaborator errors are logged and answered with the
    /// generic apology.
    pub async fn handle_message(&self, inbound: InboundMessage) -> String {
        let request = CommandRequest::new(inbound);
        let request_id = request.request_id;
        let session_id = request.session_id().to_string();

        let lock = self.session_lock(&session_id);
        let _guard = lock.lock().await;
        self.context().lifecycle.sessions().touch(&session_id, Utc::now());

        info!(
            "[{request_id}] 📥 Message for session {session_id} ({} chars)",
            request.text().len()
        );

        match self.process(&request).await {
            Ok(reply) => {
                info!("[{request_id}] ✅ Message processing completed");
                reply
            }
            Err(e) => {
                error!("[{request_id}] ❌ Failed to record message exchange: {e:#}");
                APOLOGY_MESSAGE.to_string()
            }
        }
    }

    async fn process(&self, request: &CommandRequest) -> Result<String> {
        let ctx = self.context();
        let request_id = request.request_id;
        let session_id = request.session_id();

        ctx.log.append(session_id, Message::user(request.text())).await?;

        let reply = match self.dispatcher.dispatch(request).await {
            Ok(reply) => reply,
            Err(e) => {
                error!("[{request_id}] ❌ Command failed: {e:#}");
                APOLOGY_MESSAGE.to_string()
            }
        };

        ctx.log.append(session_id, Message::bot(reply.as_str())).await?;
        ctx.usage.record_answer(session_id).await?;
        debug!("[{request_id}] 📤 Reply stored ({} chars)", reply.len());
        Ok(reply)
    }

    /// Greeting for a new conversation, stored as welcome messages
    pub async fn welcome(&self, session_id: &str) -> Result<Vec<String>> {
        let lock = self.session_lock(session_id);
        let _guard = lock.lock().await;
        self.context().lifecycle.sessions().touch(session_id, Utc::now());

        let texts = vec![WELCOME_MESSAGE.to_string(), FULL_HELP.to_string()];
        for text in &texts {
            self.context()
                .log
                .append(session_id, Message::welcome(text.as_str()))
                .await?;
        }
        info!("👋 Welcomed session {session_id}");
        Ok(texts)
    }

    /// Drop lifecycle state and locks of sessions idle past the configured limit
    pub fn evict_idle_sessions(&self) -> Vec<String> {
        let idle = Duration::minutes(self.context().config.session_idle_minutes as i64);
        let evicted = self
            .context()
            .lifecycle
            .sessions()
            .evict_idle(Utc::now() - idle);

        for session_id in &evicted {
            self.locks
                .remove_if(session_id, |_, lock| Arc::strong_count(lock) == 1);
        }
        if !evicted.is_empty() {
            info!("🧹 Evicted {} idle sessions", evicted.len());
        }
        evicted
    }
}
