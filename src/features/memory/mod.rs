//! # Feature: Conversation Memory
//!
//! Per-session message log persisted as one JSON array blob
//! (`session-<id>.json`). Every mutation is a read-modify-write of the whole
//! array, so callers must not process two messages of the same session at
//! once (see `Bot`, which serialises per session).
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Add overwrite for role-filtered clearing
//! - 1.0.0: Initial release with append, list, last_n, reset

use crate::core::Message;
use crate::storage::{read_json, session_log_key, write_json, BlobStore};
use anyhow::Result;
use log::debug;
use std::sync::Arc;

#[derive(Clone)]
pub struct ConversationLog {
    store: Arc<dyn BlobStore>,
}

impl ConversationLog {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self { store }
    }

    /// Full ordered log; a session without a log is empty
    pub async fn list(&self, session_id: &str) -> Result<Vec<Message>> {
        let key = session_log_key(session_id);
        Ok(read_json(self.store.as_ref(), &key).await?.unwrap_or_default())
    }

    pub async fn append(&self, session_id: &str, message: Message) -> Result<()> {
        let key = session_log_key(session_id);
        let mut messages = self.list(session_id).await?;
        messages.push(message);
        write_json(self.store.as_ref(), &key, &messages).await?;
        debug!("Session {session_id} log now holds {} messages", messages.len());
        Ok(())
    }

    /// Last `n` entries, welcome messages included
    pub async fn last_n(&self, session_id: &str, n: usize) -> Result<Vec<Message>> {
        let messages = self.list(session_id).await?;
        let start = messages.len().saturating_sub(n);
        Ok(messages[start..].to_vec())
    }

    /// Delete the whole log
    pub async fn reset(&self, session_id: &str) -> Result<()> {
        self.store.delete(&session_log_key(session_id)).await
    }

    /// Replace the log with `messages`
    pub async fn overwrite(&self, session_id: &str, messages: &[Message]) -> Result<()> {
        write_json(self.store.as_ref(), &session_log_key(session_id), &messages).await
    }
}
