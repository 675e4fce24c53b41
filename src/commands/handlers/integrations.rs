//! Integration listing handlers
//!
//! Handles: `kazbot command services`, `!kazbot <integration>`
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.2.0
//!
//! ## Changelog
//! - 1.1.0: Missing-files warning for incomplete folders
//! - 1.0.0: Initial release

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::sync::Arc;

use crate::commands::classifier::{Command, CommandKind};
use crate::commands::context::{CommandContext, CommandRequest};
use crate::commands::handler::TextCommandHandler;

pub struct IntegrationsHandler;

#[async_trait]
impl TextCommandHandler for IntegrationsHandler {
    fn kinds(&self) -> &'static [CommandKind] {
        &[CommandKind::ListIntegrations, CommandKind::IntegrationLookup]
    }

    async fn handle(
        &self,
        ctx: Arc<CommandContext>,
        _request: &CommandRequest,
        command: &Command,
    ) -> Result<String> {
        match command {
            Command::ListIntegrations => {
                let listing = ctx.modules.list_integrations()?;
                if listing.is_empty() {
                    return Ok("ℹ️ No integration modules are installed.".to_string());
                }
                Ok(format!("🧩 Available integration modules:\n\n{}", listing.join("\n\n")))
            }
            Command::IntegrationLookup { name } => Ok(ctx
                .modules
                .describe(name)?
                .unwrap_or_else(|| format!("❌ Integration module '{name}' not found."))),
            other => bail!("unexpected command {other:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::handlers::test_support::{context_with_services, request};
    use std::fs;

    #[tokio::test]
    async fn test_list_and_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let entra = dir.path().join("Microsoft Entra");
        fs::create_dir_all(&entra).unwrap();
        fs::write(entra.join("module.yaml"), "topics: [users]\n").unwrap();
        fs::write(entra.join("info.md"), "Directory lookups").unwrap();
        fs::create_dir_all(dir.path().join("Broken")).unwrap();

        let (ctx, _ai) = context_with_services(dir.path());
        let listing = IntegrationsHandler
            .handle(Arc::clone(&ctx), &request("s1", "x"), &Command::ListIntegrations)
            .await
            .unwrap();
        assert!(listing.contains("### Microsoft Entra\nDirectory lookups"));
        assert!(listing.contains("### Broken"));

        let found = IntegrationsHandler
            .handle(
                Arc::clone(&ctx),
                &request("s1", "x"),
                &Command::IntegrationLookup {
                    name: "microsoftentra".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(found, "### Microsoft Entra\nDirectory lookups");

        let warning = IntegrationsHandler
            .handle(
                Arc::clone(&ctx),
                &request("s1", "x"),
                &Command::IntegrationLookup {
                    name: "broken".to_string(),
                },
            )
            .await
            .unwrap();
        assert!(warning.contains("- `module.yaml`"));
        assert!(warning.contains("- `info.md`"));
    }

    #[tokio::test]
    async fn test_empty_listing() {
        let dir = tempfile::tempdir().unwrap();
        let (ctx, _ai) = context_with_services(dir.path());
        let reply = IntegrationsHandler
            .handle(ctx, &request("s1", "x"), &Command::ListIntegrations)
            .await
            .unwrap();
        assert_eq!(reply, "ℹ️ No integration modules are installed.");
    }
}
