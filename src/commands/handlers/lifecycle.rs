//! Integration module lifecycle handler
//!
//! Handles: `!kazbot init|close|status|restart|help <module>`

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::sync::Arc;

use crate::commands::classifier::{Command, CommandKind};
use crate::commands::context::{CommandContext, CommandRequest};
use crate::commands::handler::TextCommandHandler;

pub struct LifecycleHandler;

#[async_trait]
impl TextCommandHandler for LifecycleHandler {
    fn kinds(&self) -> &'static [CommandKind] {
        &[CommandKind::Lifecycle]
    }

    async fn handle(
        &self,
        ctx: Arc<CommandContext>,
        request: &CommandRequest,
        command: &Command,
    ) -> Result<String> {
        let Command::Lifecycle { action, module } = command else {
            bail!("unexpected command {command:?}");
        };
        ctx.lifecycle
            .execute(request.session_id(), *action, module)
            .await
    }
}
