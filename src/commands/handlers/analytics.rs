//! Analytics handlers
//!
//! Handles: `show analytics`, `!kazbot show session analytics`

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;

use crate::commands::classifier::{Command, CommandKind};
use crate::commands::context::{CommandContext, CommandRequest};
use crate::commands::handler::TextCommandHandler;
use crate::features::analytics::{aggregate, format_session_analytics, format_usage};

pub struct AnalyticsHandler;

#[async_trait]
impl TextCommandHandler for AnalyticsHandler {
    fn kinds(&self) -> &'static [CommandKind] {
        &[CommandKind::ShowAnalytics, CommandKind::SessionAnalytics]
    }

    async fn handle(
        &self,
        ctx: Arc<CommandContext>,
        request: &CommandRequest,
        command: &Command,
    ) -> Result<String> {
        match command {
            Command::ShowAnalytics => self.show_usage(&ctx, request).await,
            Command::SessionAnalytics => self.show_windows(&ctx, request).await,
            other => bail!("unexpected command {other:?}"),
        }
    }
}

impl AnalyticsHandler {
    /// Persisted counters for the whole session
    async fn show_usage(&self, ctx: &CommandContext, request: &CommandRequest) -> Result<String> {
        let session_id = request.session_id();
        let analytics = ctx.usage.load(session_id).await?;

        let mut sizes = HashMap::new();
        for file in &analytics.files {
            if let Some(size) = ctx.exporter.artifact_size(&file.name).await? {
                sizes.insert(file.name.clone(), size);
            }
        }

        let windows = ctx.lifecycle.sessions().windows(session_id);
        let base_url = ctx.exporter.base_url(&request.inbound.sender);
        Ok(format_usage(&analytics, &sizes, &base_url, &windows))
    }

    /// Usage inside each module window, from the message log
    async fn show_windows(&self, ctx: &CommandContext, request: &CommandRequest) -> Result<String> {
        let session_id = request.session_id();
        let messages = ctx.log.list(session_id).await?;
        let windows = ctx.lifecycle.sessions().windows(session_id);
        let stats = aggregate(&messages, &windows, Utc::now());
        Ok(format_session_analytics(&stats))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::handlers::test_support::{context, request};
    use crate::core::Message;
    use chrono::Duration;

    #[tokio::test]
    async fn test_show_analytics_reads_counters() {
        let (ctx, _ai) = context();
        ctx.usage.record_prompt("s1").await.unwrap();
        ctx.usage.record_prompt("s1").await.unwrap();
        ctx.usage.record_answer("s1").await.unwrap();

        let reply = AnalyticsHandler
            .handle(Arc::clone(&ctx), &request("s1", "show analytics"), &Command::ShowAnalytics)
            .await
            .unwrap();
        assert!(reply.contains("- User prompts: 2"));
        assert!(reply.contains("- Bot answers: 1"));
    }

    #[tokio::test]
    async fn test_session_analytics_counts_window_messages() {
        let (ctx, _ai) = context();
        ctx.lifecycle
            .sessions()
            .open_window("s1", "Weather", Utc::now() - Duration::seconds(5));
        ctx.log.append("s1", Message::user("rain?")).await.unwrap();
        ctx.log.append("s1", Message::bot("yes")).await.unwrap();

        let reply = AnalyticsHandler
            .handle(
                Arc::clone(&ctx),
                &request("s1", "!kazbot show session analytics"),
                &Command::SessionAnalytics,
            )
            .await
            .unwrap();
        assert!(reply.contains("1. Weather"));
        assert!(reply.contains("   - User prompts: 1"));
        assert!(reply.contains("   - Bot answers: 1"));
    }
}
