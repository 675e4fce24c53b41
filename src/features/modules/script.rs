//! Folder-backed integration module driven by `module.yaml`

use super::catalog::ModuleFolder;
use super::executor::ModuleExecutor;
use super::manifest::{CapabilityCommand, ModuleManifest, HELP_FILE, MANIFEST_FILE};
use super::{Capabilities, IntegrationModule};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use log::debug;
use serde_json::Value;
use std::collections::HashMap;

pub struct ScriptModule {
    name: String,
    folder: ModuleFolder,
    manifest: ModuleManifest,
    executor: ModuleExecutor,
}

impl ScriptModule {
    pub fn load(folder: &ModuleFolder, executor: ModuleExecutor) -> Result<Self> {
        let manifest_path = folder.path.join(MANIFEST_FILE);
        let manifest = ModuleManifest::load(&manifest_path)
            .with_context(|| format!("Failed to load {}", manifest_path.display()))?;

        let name = manifest
            .name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| folder.name.clone());

        Ok(Self {
            name,
            folder: folder.clone(),
            manifest,
            executor,
        })
    }

    pub fn folder(&self) -> &ModuleFolder {
        &self.folder
    }

    fn has_help_file(&self) -> bool {
        self.folder.path.join(HELP_FILE).is_file()
    }

    fn command(&self, capability: &str) -> Result<&CapabilityCommand> {
        let c = &self.manifest.commands;
        let command = match capability {
            "init" => c.init.as_ref(),
            "close" => c.close.as_ref(),
            "status" => c.status.as_ref(),
            "restart" => c.restart.as_ref(),
            "help" => c.help.as_ref(),
            "run" => c.run.as_ref(),
            "ask" => c.ask.as_ref(),
            _ => None,
        };
        command.ok_or_else(|| anyhow!("Module '{}' does not support '{capability}'", self.name))
    }

    async fn invoke(&self, capability: &str, query: Option<&str>) -> Result<String> {
        let command = self.command(capability)?;
        let mut params = HashMap::new();
        if let Some(query) = query {
            params.insert("query".to_string(), query.to_string());
        }

        debug!("Module '{}' invoking {capability}", self.name);
        self.executor
            .execute(command, &self.folder.path, &params)
            .await?
            .into_output()
    }
}

#[async_trait]
impl IntegrationModule for ScriptModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> Capabilities {
        self.manifest.capabilities(self.has_help_file())
    }

    fn topics(&self) -> Vec<String> {
        self.manifest.topics.clone()
    }

    async fn init(&self) -> Result<()> {
        self.invoke("init", None).await.map(|_| ())
    }

    async fn close(&self) -> Result<()> {
        self.invoke("close", None).await.map(|_| ())
    }

    async fn status(&self) -> Result<String> {
        let output = self.invoke("status", None).await?;
        let output = output.trim();
        if output.is_empty() {
            Ok(format!("Module '{}' status: loaded.", self.name))
        } else {
            Ok(output.to_string())
        }
    }

    async fn restart(&self) -> Result<()> {
        self.invoke("restart", None).await.map(|_| ())
    }

    async fn help(&self) -> Result<String> {
        if self.manifest.commands.help.is_some() {
            return Ok(self.invoke("help", None).await?.trim().to_string());
        }
        let path = self.folder.path.join(HELP_FILE);
        tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))
    }

    async fn run(&self, query: &str) -> Result<Value> {
        let output = self.invoke("run", Some(query)).await?;
        let trimmed = output.trim();
        Ok(serde_json::from_str(trimmed).unwrap_or_else(|_| Value::String(trimmed.to_string())))
    }

    async fn ask(&self, question: &str) -> Result<String> {
        Ok(self.invoke("ask", Some(question)).await?.trim().to_string())
    }
}
