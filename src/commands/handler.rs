//! Text command handler trait
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.0.0: Handlers return reply text and route on `CommandKind`
//! - 1.0.0: Initial implementation for modular command handling

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use super::classifier::{Command, CommandKind};
use super::context::{CommandContext, CommandRequest};

/// Trait for text command handlers
///
/// Each handler processes one or more command kinds and returns the reply
/// text. Handlers are registered with a `CommandRegistry` and dispatched on
/// [`Command::kind`].
///
/// # Example
///
/// ```ignore
/// pub struct HelpHandler;
///
/// #[async_trait]
/// impl TextCommandHandler for HelpHandler {
///     fn kinds(&self) -> &'static [CommandKind] {
///         &[CommandKind::StaticHelp]
///     }
///
///     async fn handle(
///         &self,
///         _ctx: Arc<CommandContext>,
///         _request: &CommandRequest,
///         _command: &Command,
///     ) -> Result<String> {
///         Ok(COMMANDS_HELP.to_string())
///     }
/// }
/// ```
#[async_trait]
pub trait TextCommandHandler: Send + Sync {
    /// Command kind(s) this handler processes
    fn kinds(&self) -> &'static [CommandKind];

    /// Handle the command and produce the reply
    ///
    /// Errors are collaborator failures; the pipeline logs them and replies
    /// with a generic apology.
    async fn handle(
        &self,
        ctx: Arc<CommandContext>,
        request: &CommandRequest,
        command: &Command,
    ) -> Result<String>;
}
