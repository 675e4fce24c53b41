//! Functions the model may call

use super::{FunctionDefinition, FunctionHandler};
use crate::features::modules::ModuleRegistry;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

/// `list_integrations`: installed integration modules with their descriptions
pub struct ListIntegrations {
    registry: Arc<ModuleRegistry>,
}

impl ListIntegrations {
    pub fn new(registry: Arc<ModuleRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl FunctionHandler for ListIntegrations {
    fn definition(&self) -> FunctionDefinition {
        FunctionDefinition {
            name: "list_integrations".to_string(),
            description: "List the integration modules installed in this bot with a short description of each"
                .to_string(),
            parameters: json!({ "type": "object", "properties": {} }),
        }
    }

    async fn call(&self, _arguments: Value) -> Result<Value> {
        let catalog = self.registry.catalog();
        let mut modules = Vec::new();
        for name in self.registry.known_names()? {
            let description = match catalog.find(&name)? {
                Some(folder) => catalog.info(&folder),
                None => "Built-in module.".to_string(),
            };
            modules.push(json!({ "name": name, "description": description }));
        }
        Ok(json!({ "integrations": modules }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::modules::{ModuleCatalog, ModuleExecutor};
    use std::fs;

    #[tokio::test]
    async fn test_lists_folders_with_info() {
        let dir = tempfile::tempdir().unwrap();
        let weather = dir.path().join("Weather");
        fs::create_dir_all(&weather).unwrap();
        fs::write(weather.join("info.md"), "Forecasts for any city").unwrap();

        let registry = Arc::new(ModuleRegistry::new(
            ModuleCatalog::new(dir.path(), "https://docs.example.com"),
            ModuleExecutor::new(Vec::new()),
        ));
        let result = ListIntegrations::new(registry).call(json!({})).await.unwrap();

        assert_eq!(result["integrations"][0]["name"], "Weather");
        assert_eq!(result["integrations"][0]["description"], "Forecasts for any city");
    }
}
