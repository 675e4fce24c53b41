//! Export command handler
//!
//! Handles: export memory/prompts/answers and the `!kazbot export session` family

use anyhow::{bail, Result};
use async_trait::async_trait;
use log::info;
use std::sync::Arc;

use crate::commands::classifier::{Command, CommandKind};
use crate::commands::context::{CommandContext, CommandRequest};
use crate::commands::handler::TextCommandHandler;

pub struct ExportHandler;

#[async_trait]
impl TextCommandHandler for ExportHandler {
    fn kinds(&self) -> &'static [CommandKind] {
        &[CommandKind::Export]
    }

    async fn handle(
        &self,
        ctx: Arc<CommandContext>,
        request: &CommandRequest,
        command: &Command,
    ) -> Result<String> {
        let Command::Export(kind) = command else {
            bail!("unexpected command {command:?}");
        };
        info!("[{}] 📤 Export {} requested", request.request_id, kind.as_str());

        let windows = ctx.lifecycle.sessions().windows(request.session_id());
        ctx.exporter.export(&request.inbound, *kind, &windows).await
    }
}
