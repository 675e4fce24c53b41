//! # Feature: Session Usage Tracking
//!
//! Persisted per-session counters (`session-<id>-analytics.json`): prompts,
//! answers, exports per kind and the list of exported files. Counters only
//! grow; clearing the message log leaves them untouched.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Added ExportKind categorization with file records
//! - 1.0.0: Initial release with prompt and answer counters

use crate::storage::{read_json, session_analytics_key, write_json, BlobStore};
use anyhow::Result;
use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Categorizes exports by what was exported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportKind {
    /// `export memory as json`
    Memory,
    /// `export prompts as json`
    Prompts,
    /// `export answers as markdown`
    Answers,
    /// `!kazbot export session memory`
    SessionMemory,
    /// `!kazbot export session prompts`
    SessionPrompts,
    /// `!kazbot export session answers`
    SessionAnswers,
}

impl ExportKind {
    /// Key used in the persisted `exports` map
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportKind::Memory => "memory",
            ExportKind::Prompts => "prompts",
            ExportKind::Answers => "answers",
            ExportKind::SessionMemory => "session-memory",
            ExportKind::SessionPrompts => "session-prompts",
            ExportKind::SessionAnswers => "session-answers",
        }
    }
}

/// An exported artifact recorded in the analytics file list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedFile {
    pub name: String,
    pub timestamp: DateTime<Utc>,
}

/// The persisted analytics record of one session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionAnalytics {
    #[serde(default)]
    pub prompts: u64,
    #[serde(default)]
    pub answers: u64,
    #[serde(default)]
    pub exports: BTreeMap<String, u64>,
    #[serde(default)]
    pub files: Vec<ExportedFile>,
}

/// Types of usage events recorded against a session
#[derive(Debug, Clone)]
pub enum UsageEvent {
    Prompt,
    Answer,
    Export { kind: ExportKind, file_name: Option<String> },
}

impl SessionAnalytics {
    fn apply(&mut self, event: &UsageEvent) {
        match event {
            UsageEvent::Prompt => self.prompts += 1,
            UsageEvent::Answer => self.answers += 1,
            UsageEvent::Export { kind, file_name } => {
                *self.exports.entry(kind.as_str().to_string()).or_insert(0) += 1;
                if let Some(name) = file_name {
                    self.files.push(ExportedFile {
                        name: name.clone(),
                        timestamp: Utc::now(),
                    });
                }
            }
        }
    }
}

/// Reads and increments the persisted analytics record
#[derive(Clone)]
pub struct UsageTracker {
    store: Arc<dyn BlobStore>,
}

impl UsageTracker {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self { store }
    }

    /// Current record; zeroed when nothing was stored yet
    pub async fn load(&self, session_id: &str) -> Result<SessionAnalytics> {
        let key = session_analytics_key(session_id);
        Ok(read_json(self.store.as_ref(), &key).await?.unwrap_or_default())
    }

    pub async fn record(&self, session_id: &str, event: UsageEvent) -> Result<SessionAnalytics> {
        let key = session_analytics_key(session_id);
        let mut analytics = self.load(session_id).await?;
        analytics.apply(&event);
        write_json(self.store.as_ref(), &key, &analytics).await?;
        debug!("Recorded {event:?} for session {session_id}");
        Ok(analytics)
    }

    pub async fn record_prompt(&self, session_id: &str) -> Result<SessionAnalytics> {
        self.record(session_id, UsageEvent::Prompt).await
    }

    pub async fn record_answer(&self, session_id: &str) -> Result<SessionAnalytics> {
        self.record(session_id, UsageEvent::Answer).await
    }

    pub async fn record_export(
        &self,
        session_id: &str,
        kind: ExportKind,
        file_name: &str,
    ) -> Result<SessionAnalytics> {
        self.record(
            session_id,
            UsageEvent::Export {
                kind,
                file_name: Some(file_name.to_string()),
            },
        )
        .await
    }
}
