//! Command dispatcher
//!
//! Counts the prompt, classifies the text and hands it to the registered
//! handler for its kind.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use anyhow::{anyhow, Result};
use log::{debug, info, warn};
use std::sync::Arc;

use super::classifier::{classify, Command};
use super::context::{CommandContext, CommandRequest};
use super::handlers::create_all_handlers;
use super::registry::CommandRegistry;

pub struct Dispatcher {
    ctx: Arc<CommandContext>,
    registry: CommandRegistry,
}

impl Dispatcher {
    /// Dispatcher with every built-in handler registered
    pub fn new(ctx: Arc<CommandContext>) -> Self {
        let mut registry = CommandRegistry::new();
        for handler in create_all_handlers() {
            registry.register(handler);
        }
        Self { ctx, registry }
    }

    pub fn context(&self) -> &Arc<CommandContext> {
        &self.ctx
    }

    /// Classify with the currently installed integration names
    ///
    /// The services directory is only read for `!kazbot ` messages, and a
    /// failure to read it leaves no integrations known.
    pub fn classify(&self, request: &CommandRequest) -> Command {
        let text = request.text();
        if !mentions_bot(text) {
            return classify(text, &[]);
        }
        let known = self.ctx.modules.known_names().unwrap_or_else(|e| {
            warn!("[{}] ⚠️ Could not list integration modules: {e:#}", request.request_id);
            Vec::new()
        });
        classify(text, &known)
    }

    /// Handle one inbound message and produce the reply
    ///
    /// The prompt counter is incremented before classification, so every
    /// message counts once whichever branch handles it.
    pub async fn dispatch(&self, request: &CommandRequest) -> Result<String> {
        let request_id = request.request_id;
        self.ctx.usage.record_prompt(request.session_id()).await?;

        let command = self.classify(request);
        let kind = command.kind();
        match &command {
            Command::Fallback(_) => debug!("[{request_id}] 💬 No command matched, using fallback"),
            _ => info!("[{request_id}] 🎯 Processing command: {kind:?}"),
        }

        let handler = self
            .registry
            .get(kind)
            .ok_or_else(|| anyhow!("No handler registered for {kind:?}"))?;
        handler.handle(Arc::clone(&self.ctx), request, &command).await
    }
}

fn mentions_bot(text: &str) -> bool {
    const PREFIX: &str = "!kazbot ";
    text.trim_start()
        .get(..PREFIX.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(PREFIX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::handlers::test_support::{context, context_with_services, request};
    use crate::core::Message;

    #[tokio::test]
    async fn test_prompt_counted_for_every_branch() {
        let (ctx, _ai) = context();
        let dispatcher = Dispatcher::new(Arc::clone(&ctx));

        for text in ["list memory", "kazbot help!", "show last x", "what is rust?"] {
            dispatcher.dispatch(&request("s1", text)).await.unwrap();
        }
        let analytics = ctx.usage.load("s1").await.unwrap();
        assert_eq!(analytics.prompts, 4);
        assert_eq!(analytics.answers, 0);
    }

    #[tokio::test]
    async fn test_routes_to_handlers() {
        let (ctx, ai) = context();
        let dispatcher = Dispatcher::new(Arc::clone(&ctx));
        ctx.log.append("s1", Message::user("first")).await.unwrap();

        assert_eq!(dispatcher.dispatch(&request("s1", "show last 1")).await.unwrap(), "1. first");
        assert_eq!(
            dispatcher.dispatch(&request("s1", "hello there")).await.unwrap(),
            "ai: hello there"
        );
        assert_eq!(ai.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_reply_leaves_log_alone() {
        let (ctx, _ai) = context();
        let dispatcher = Dispatcher::new(Arc::clone(&ctx));
        ctx.log.append("s1", Message::user("keep")).await.unwrap();

        let reply = dispatcher.dispatch(&request("s1", "show last many")).await.unwrap();
        assert!(reply.starts_with("⚠️"));
        assert_eq!(ctx.log.list("s1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_ai_failure_propagates() {
        let (ctx, ai) = context();
        ai.fail();
        let dispatcher = Dispatcher::new(ctx);
        assert!(dispatcher.dispatch(&request("s1", "hi")).await.is_err());
    }

    #[tokio::test]
    async fn test_unreadable_services_dir_does_not_break_commands() {
        let dir = tempfile::tempdir().unwrap();
        let not_a_dir = dir.path().join("services");
        std::fs::write(&not_a_dir, "a file, not a directory").unwrap();

        let (ctx, ai) = context_with_services(&not_a_dir);
        let dispatcher = Dispatcher::new(Arc::clone(&ctx));
        ctx.log.append("s1", Message::user("first")).await.unwrap();

        assert_eq!(dispatcher.dispatch(&request("s1", "list memory")).await.unwrap(), "1. first");
        assert_eq!(
            dispatcher.dispatch(&request("s1", "!kazbot weather")).await.unwrap(),
            "ai: !kazbot weather"
        );
        assert_eq!(ai.calls().len(), 1);
    }

    #[test]
    fn test_mentions_bot() {
        assert!(mentions_bot("!kazbot weather"));
        assert!(mentions_bot("  !KazBot init x"));
        assert!(!mentions_bot("kazbot command services"));
        assert!(!mentions_bot("!kazbot"));
        assert!(!mentions_bot("list memory"));
    }
}
