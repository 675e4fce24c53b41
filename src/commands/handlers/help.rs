//! Static help and malformed-input replies

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::sync::Arc;

use crate::commands::classifier::{Command, CommandKind};
use crate::commands::context::{CommandContext, CommandRequest};
use crate::commands::handler::TextCommandHandler;
use crate::core::help::COMMANDS_HELP;

pub struct HelpHandler;

#[async_trait]
impl TextCommandHandler for HelpHandler {
    fn kinds(&self) -> &'static [CommandKind] {
        &[CommandKind::StaticHelp, CommandKind::Malformed]
    }

    async fn handle(
        &self,
        _ctx: Arc<CommandContext>,
        _request: &CommandRequest,
        command: &Command,
    ) -> Result<String> {
        match command {
            Command::Malformed { reason } => Ok(format!("⚠️ {reason}")),
            Command::StaticHelp => Ok(COMMANDS_HELP.to_string()),
            other => bail!("unexpected command {other:?}"),
        }
    }
}
