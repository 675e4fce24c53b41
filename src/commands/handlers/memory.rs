//! Memory, prompt and answer inspection handlers
//!
//! Handles: list memory, list memory full, show last N, reset memory, and
//! the prompts/answers variants including the clear commands
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Token-based `show last N` parsing
//! - 1.0.0: Initial release

use anyhow::{bail, Result};
use async_trait::async_trait;
use log::info;
use std::sync::Arc;

use crate::commands::classifier::{Command, CommandKind, MemoryCommand};
use crate::commands::context::{CommandContext, CommandRequest};
use crate::commands::handler::TextCommandHandler;
use crate::core::{Message, Sender};

const EMPTY_REPLY: &str = "📭 Nothing to show yet.";

/// Handler for memory inspection and clearing
pub struct MemoryHandler;

#[async_trait]
impl TextCommandHandler for MemoryHandler {
    fn kinds(&self) -> &'static [CommandKind] {
        &[CommandKind::Memory]
    }

    async fn handle(
        &self,
        ctx: Arc<CommandContext>,
        request: &CommandRequest,
        command: &Command,
    ) -> Result<String> {
        let Command::Memory(command) = command else {
            bail!("unexpected command {command:?}");
        };
        let session_id = request.session_id();

        match *command {
            MemoryCommand::ListMemory => {
                let history = without_welcome(ctx.log.list(session_id).await?);
                Ok(numbered(&history))
            }
            MemoryCommand::ListMemoryFull => {
                let history = without_welcome(ctx.log.list(session_id).await?);
                Ok(serde_json::to_string_pretty(&history)?)
            }
            MemoryCommand::ShowLast(n) => Ok(numbered(&ctx.log.last_n(session_id, n).await?)),
            MemoryCommand::ResetMemory => {
                ctx.log.reset(session_id).await?;
                info!("[{}] Memory reset for session {session_id}", request.request_id);
                Ok("✅ Memory has been cleared.".to_string())
            }
            MemoryCommand::ListPrompts => {
                Ok(numbered(&self.by_sender(&ctx, session_id, Sender::User).await?))
            }
            MemoryCommand::ShowLastPrompts(n) => {
                let prompts = self.by_sender(&ctx, session_id, Sender::User).await?;
                Ok(numbered(last(&prompts, n)))
            }
            MemoryCommand::ShowFullPrompts => {
                let prompts = self.by_sender(&ctx, session_id, Sender::User).await?;
                Ok(serde_json::to_string_pretty(&prompts)?)
            }
            MemoryCommand::ClearPrompts => {
                self.keep_only(&ctx, session_id, Sender::Bot).await?;
                info!("[{}] Prompts cleared for session {session_id}", request.request_id);
                Ok("🧹 All prompts have been cleared.".to_string())
            }
            MemoryCommand::ListAnswers => {
                Ok(numbered(&self.by_sender(&ctx, session_id, Sender::Bot).await?))
            }
            MemoryCommand::ShowLastAnswers(n) => {
                let answers = self.by_sender(&ctx, session_id, Sender::Bot).await?;
                Ok(numbered(last(&answers, n)))
            }
            MemoryCommand::ShowFullAnswers => {
                let answers = self.by_sender(&ctx, session_id, Sender::Bot).await?;
                Ok(serde_json::to_string_pretty(&answers)?)
            }
            MemoryCommand::ClearAnswers => {
                self.keep_only(&ctx, session_id, Sender::User).await?;
                info!("[{}] Answers cleared for session {session_id}", request.request_id);
                Ok("🧹 All answers have been cleared.".to_string())
            }
        }
    }
}

impl MemoryHandler {
    /// Non-welcome messages from `sender`, in log order
    async fn by_sender(&self, ctx: &CommandContext, session_id: &str, sender: Sender) -> Result<Vec<Message>> {
        Ok(ctx
            .log
            .list(session_id)
            .await?
            .into_iter()
            .filter(|m| m.from == sender && !m.is_welcome)
            .collect())
    }

    /// Rewrite the log with only the messages from `sender`
    async fn keep_only(&self, ctx: &CommandContext, session_id: &str, sender: Sender) -> Result<()> {
        let kept: Vec<Message> = ctx
            .log
            .list(session_id)
            .await?
            .into_iter()
            .filter(|m| m.from == sender)
            .collect();
        ctx.log.overwrite(session_id, &kept).await
    }
}

fn without_welcome(messages: Vec<Message>) -> Vec<Message> {
    messages.into_iter().filter(|m| !m.is_welcome).collect()
}

fn last(messages: &[Message], n: usize) -> &[Message] {
    &messages[messages.len().saturating_sub(n)..]
}

/// `1. text` lines; entries without text show as JSON
fn numbered(messages: &[Message]) -> String {
    if messages.is_empty() {
        return EMPTY_REPLY.to_string();
    }
    messages
        .iter()
        .enumerate()
        .map(|(i, m)| {
            let text = if m.text.is_empty() {
                serde_json::to_string(m).unwrap_or_default()
            } else {
                m.text.clone()
            };
            format!("{}. {text}", i + 1)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
