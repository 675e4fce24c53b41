//! Fallback handler
//!
//! Anything the classifier did not recognise. Routed to the active
//! integration module when it can answer, otherwise to the AI.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.2.0: Try the module's `ask` capability before the plain AI
//! - 1.1.0: Topic-matched `run` payloads as AI context
//! - 1.0.0: Initial release

use anyhow::{bail, Result};
use async_trait::async_trait;
use log::{debug, info, warn};
use std::sync::Arc;

use crate::commands::classifier::{Command, CommandKind};
use crate::commands::context::{CommandContext, CommandRequest};
use crate::commands::handler::TextCommandHandler;
use crate::features::ai::{module_context_prompt, ChatMessage};
use crate::features::modules::{is_error_payload, is_not_understood, matches_topic, IntegrationModule};

pub struct FallbackHandler;

#[async_trait]
impl TextCommandHandler for FallbackHandler {
    fn kinds(&self) -> &'static [CommandKind] {
        &[CommandKind::Fallback]
    }

    async fn handle(
        &self,
        ctx: Arc<CommandContext>,
        request: &CommandRequest,
        command: &Command,
    ) -> Result<String> {
        let Command::Fallback(text) = command else {
            bail!("unexpected command {command:?}");
        };
        let request_id = request.request_id;

        if let Some(module) = ctx.lifecycle.active_module(request.session_id())? {
            if let Some(answer) = self.from_module(&ctx, request, module.as_ref(), text).await? {
                return Ok(answer);
            }
        }

        debug!("[{request_id}] Forwarding to AI unaugmented");
        ctx.complete(request_id, &[ChatMessage::user(text.as_str())]).await
    }
}

impl FallbackHandler {
    /// `None` when the module had nothing usable and the AI should answer alone
    async fn from_module(
        &self,
        ctx: &CommandContext,
        request: &CommandRequest,
        module: &dyn IntegrationModule,
        text: &str,
    ) -> Result<Option<String>> {
        let request_id = request.request_id;
        let caps = module.capabilities();

        if caps.run && matches_topic(&module.topics(), text) {
            info!("[{request_id}] 🔌 Topic match, running module '{}'", module.name());
            match module.run(text).await {
                Ok(payload) if !is_error_payload(&payload) => {
                    let messages = [
                        ChatMessage::system(module_context_prompt(module.name(), &payload)),
                        ChatMessage::user(text),
                    ];
                    return ctx.complete(request_id, &messages).await.map(Some);
                }
                Ok(payload) => {
                    warn!("[{request_id}] Module '{}' returned an error payload: {payload}", module.name())
                }
                Err(e) => warn!("[{request_id}] Module '{}' run failed: {e:#}", module.name()),
            }
        }

        if caps.ask {
            match module.ask(text).await {
                Ok(answer) if !is_not_understood(&answer) => return Ok(Some(answer)),
                Ok(_) => debug!("[{request_id}] Module '{}' did not understand", module.name()),
                Err(e) => warn!("[{request_id}] Module '{}' ask failed: {e:#}", module.name()),
            }
        }

        Ok(None)
    }
}
