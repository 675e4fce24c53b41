//! # Feature: Export
//!
//! Selects a role-filtered slice of the message log, either the whole
//! session or the union of module windows, and writes it as a downloadable
//! artifact through the blob store.
//!
//! Whole-session answers are flattened into one line (`- a - b`) while
//! window-scoped exports put one bullet per line. Both formats are relied on
//! by consumers of the files.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.2.0: Window-scoped session exports
//! - 1.1.0: Base URL derivation from the sender context
//! - 1.0.0: Initial release with memory, prompts and answers exports

use crate::core::{InboundMessage, Message, Sender, SenderContext};
use crate::features::analytics::{messages_in_any_window, ExportKind, UsageTracker};
use crate::features::lifecycle::ModuleWindow;
use crate::features::memory::ConversationLog;
use crate::storage::{export_key, BlobStore};
use anyhow::Result;
use chrono::{DateTime, Utc};
use log::info;
use std::sync::Arc;

/// Which senders an export keeps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleFilter {
    User,
    Bot,
    Any,
}

impl RoleFilter {
    pub fn matches(&self, message: &Message) -> bool {
        match self {
            RoleFilter::User => message.from == Sender::User,
            RoleFilter::Bot => message.from == Sender::Bot,
            RoleFilter::Any => true,
        }
    }
}

/// Which part of the log an export covers
#[derive(Debug, Clone, Copy)]
pub enum ExportScope<'a> {
    Session,
    Windows {
        windows: &'a [ModuleWindow],
        now: DateTime<Utc>,
    },
}

/// Ordered subset of `messages`; an empty result is valid
pub fn select(
    messages: &[Message],
    role: RoleFilter,
    scope: ExportScope<'_>,
    include_welcome: bool,
) -> Vec<Message> {
    let scoped: Vec<&Message> = match scope {
        ExportScope::Session => messages.iter().collect(),
        ExportScope::Windows { windows, now } => messages_in_any_window(messages, windows, now),
    };
    scoped
        .into_iter()
        .filter(|m| include_welcome || !m.is_welcome)
        .filter(|m| role.matches(m))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Pretty-printed JSON array of messages
    Json,
    /// `- text` bullets joined by a single space
    InlineBullets,
    /// `- text` bullets, one per line
    BulletLines,
    /// `- from: text` bullets, one per line
    SenderBulletLines,
}

/// How each export kind is produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportPlan {
    pub role: RoleFilter,
    pub window_scoped: bool,
    pub format: ExportFormat,
    pub suffix: &'static str,
    pub extension: &'static str,
}

impl ExportPlan {
    pub fn for_kind(kind: ExportKind) -> Self {
        let plan = |role, window_scoped, format, suffix, extension| ExportPlan {
            role,
            window_scoped,
            format,
            suffix,
            extension,
        };
        match kind {
            ExportKind::Memory => plan(RoleFilter::Any, false, ExportFormat::Json, "", "json"),
            ExportKind::Prompts => plan(RoleFilter::User, false, ExportFormat::Json, "-prompts", "json"),
            ExportKind::Answers => {
                plan(RoleFilter::Bot, false, ExportFormat::InlineBullets, "-answers", "md")
            }
            ExportKind::SessionMemory => plan(
                RoleFilter::Any,
                true,
                ExportFormat::SenderBulletLines,
                "-session-memory",
                "md",
            ),
            ExportKind::SessionPrompts => plan(
                RoleFilter::User,
                true,
                ExportFormat::BulletLines,
                "-session-prompts",
                "md",
            ),
            ExportKind::SessionAnswers => plan(
                RoleFilter::Bot,
                true,
                ExportFormat::BulletLines,
                "-session-answers",
                "md",
            ),
        }
    }
}

pub fn render(messages: &[Message], format: ExportFormat) -> Result<String> {
    let bullets = |line: fn(&Message) -> String| messages.iter().map(line).collect::<Vec<_>>();
    Ok(match format {
        ExportFormat::Json => serde_json::to_string_pretty(messages)?,
        ExportFormat::InlineBullets => bullets(|m| format!("- {}", m.text)).join(" "),
        ExportFormat::BulletLines => bullets(|m| format!("- {}", m.text)).join("\n"),
        ExportFormat::SenderBulletLines => {
            bullets(|m| format!("- {}: {}", m.from.as_str(), m.text)).join("\n")
        }
    })
}

fn sanitize(part: &str) -> String {
    part.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect()
}

/// `<user>_<session>_<yyyymmddTHHMMSS><suffix>.<ext>`
pub fn file_name(
    user_id: Option<&str>,
    session_id: &str,
    suffix: &str,
    extension: &str,
    now: DateTime<Utc>,
) -> String {
    format!(
        "{}_{}_{}{suffix}.{extension}",
        sanitize(user_id.unwrap_or("anonymous")),
        sanitize(session_id),
        now.format("%Y%m%dT%H%M%S")
    )
}

/// Base of download links
///
/// A configured base URL wins. Otherwise the scheme is https only when the
/// channel reported an https service URL, and emulator channels get a
/// loopback host.
pub fn base_url(configured: Option<&str>, sender: &SenderContext, port: u16) -> String {
    if let Some(base) = configured.filter(|b| !b.trim().is_empty()) {
        return base.trim().trim_end_matches('/').to_string();
    }

    let service_url = sender.service_url.as_deref().unwrap_or("");
    let scheme = if service_url.starts_with("https") { "https" } else { "http" };

    let reported_host = service_url
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_end_matches('/');
    let host = if sender.is_emulator() || reported_host.is_empty() {
        format!("localhost:{port}")
    } else {
        reported_host.to_string()
    };
    format!("{scheme}://{host}")
}

/// A bare generated file name: no separators, no leading dot
fn is_artifact_name(name: &str) -> bool {
    !name.is_empty() && !name.starts_with('.') && !name.contains(['/', '\\'])
}

/// Writes export artifacts and records them in the session analytics
#[derive(Clone)]
pub struct Exporter {
    store: Arc<dyn BlobStore>,
    log: ConversationLog,
    usage: UsageTracker,
    configured_base_url: Option<String>,
    port: u16,
}

impl Exporter {
    pub fn new(
        store: Arc<dyn BlobStore>,
        usage: UsageTracker,
        configured_base_url: Option<String>,
        port: u16,
    ) -> Self {
        Self {
            log: ConversationLog::new(Arc::clone(&store)),
            store,
            usage,
            configured_base_url,
            port,
        }
    }

    pub fn base_url(&self, sender: &SenderContext) -> String {
        base_url(self.configured_base_url.as_deref(), sender, self.port)
    }

    /// Export `kind` and return the reply with the download link
    pub async fn export(
        &self,
        inbound: &InboundMessage,
        kind: ExportKind,
        windows: &[ModuleWindow],
    ) -> Result<String> {
        let plan = ExportPlan::for_kind(kind);
        let now = Utc::now();

        if plan.window_scoped && windows.is_empty() {
            return Ok(
                "ℹ️ No integration module has been active in this session, so there is nothing to export."
                    .to_string(),
            );
        }

        let messages = self.log.list(&inbound.session_id).await?;
        let scope = if plan.window_scoped {
            ExportScope::Windows { windows, now }
        } else {
            ExportScope::Session
        };
        let selected = select(&messages, plan.role, scope, false);
        let body = render(&selected, plan.format)?;

        let name = file_name(
            inbound.sender.user_id.as_deref(),
            &inbound.session_id,
            plan.suffix,
            plan.extension,
            now,
        );
        self.store.put(&export_key(&name), body.into_bytes(), true).await?;
        self.usage.record_export(&inbound.session_id, kind, &name).await?;
        info!(
            "Exported {} ({} messages) as {name}",
            kind.as_str(),
            selected.len()
        );

        Ok(format!(
            "📎 Download link: {}/download/{name}",
            self.base_url(&inbound.sender)
        ))
    }

    /// Stored artifact, for the transport's download route
    ///
    /// Only export artifacts are reachable; any other name is not found.
    pub async fn download(&self, name: &str) -> Result<Option<Vec<u8>>> {
        if !is_artifact_name(name) {
            return Ok(None);
        }
        self.store.get(&export_key(name)).await
    }

    pub async fn artifact_size(&self, name: &str) -> Result<Option<usize>> {
        Ok(self.download(name).await?.map(|bytes| bytes.len()))
    }
}
