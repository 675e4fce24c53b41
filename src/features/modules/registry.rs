//! Name → module resolution
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.2.0
//!
//! ## Changelog
//! - 1.1.0: Folder modules are loaded once and shared across sessions
//! - 1.0.0: Initial implementation with registered modules only

use super::catalog::{normalize_module_name, ModuleCatalog};
use super::executor::ModuleExecutor;
use super::script::ScriptModule;
use super::IntegrationModule;
use anyhow::Result;
use dashmap::DashMap;
use log::{info, warn};
use std::sync::Arc;

/// Outcome of resolving a user-supplied module name
pub enum Resolution {
    Found(Arc<dyn IntegrationModule>),
    /// The folder exists but cannot be used; the text explains why
    Unavailable(String),
    NotFound,
}

/// Registry of integration modules
///
/// Registered modules take precedence over folders with the same
/// normalized name. Folder modules are loaded on first use and cached, so all
/// sessions share one instance per module.
pub struct ModuleRegistry {
    registered: DashMap<String, Arc<dyn IntegrationModule>>,
    loaded: DashMap<String, Arc<dyn IntegrationModule>>,
    catalog: ModuleCatalog,
    executor: ModuleExecutor,
}

impl ModuleRegistry {
    pub fn new(catalog: ModuleCatalog, executor: ModuleExecutor) -> Self {
        Self {
            registered: DashMap::new(),
            loaded: DashMap::new(),
            catalog,
            executor,
        }
    }

    pub fn catalog(&self) -> &ModuleCatalog {
        &self.catalog
    }

    /// Register a module implemented in code
    pub fn register(&self, module: Arc<dyn IntegrationModule>) {
        let key = normalize_module_name(module.name());
        info!("Registered integration module '{}'", module.name());
        self.registered.insert(key, module);
    }

    pub fn resolve(&self, name: &str) -> Result<Resolution> {
        let key = normalize_module_name(name);
        if key.is_empty() {
            return Ok(Resolution::NotFound);
        }

        if let Some(module) = self.registered.get(&key) {
            return Ok(Resolution::Found(Arc::clone(module.value())));
        }
        if let Some(module) = self.loaded.get(&key) {
            return Ok(Resolution::Found(Arc::clone(module.value())));
        }

        let Some(folder) = self.catalog.find(name)? else {
            return Ok(Resolution::NotFound);
        };

        let check = self.catalog.check_files(&folder)?;
        if !check.is_complete() {
            warn!("Module folder '{}' is missing {:?}", folder.name, check.missing);
            return Ok(Resolution::Unavailable(
                self.catalog.missing_files_warning(&folder, &check),
            ));
        }

        match ScriptModule::load(&folder, self.executor.clone()) {
            Ok(module) => {
                info!("Loaded integration module '{}' from {}", module.name(), folder.path.display());
                let module: Arc<dyn IntegrationModule> = Arc::new(module);
                let module = self.loaded.entry(key).or_insert(module).value().clone();
                // Windows and the active pointer carry the module's own name,
                // which may differ from its folder
                let own_key = normalize_module_name(module.name());
                self.loaded
                    .entry(own_key)
                    .or_insert_with(|| Arc::clone(&module));
                Ok(Resolution::Found(module))
            }
            Err(e) => {
                warn!("Failed to load module folder '{}': {e:#}", folder.name);
                Ok(Resolution::Unavailable(format!(
                    "⚠️ The integration module '{}' could not be loaded: {e}",
                    folder.name
                )))
            }
        }
    }

    /// Names that `!kazbot <name>` recognises: registered modules and folders
    pub fn known_names(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self
            .registered
            .iter()
            .map(|entry| entry.value().name().to_string())
            .collect();
        names.extend(self.catalog.folders()?.into_iter().map(|folder| folder.name));
        Ok(names)
    }

    /// Reply for `!kazbot <name>`: the module description, or the missing-files warning
    pub fn describe(&self, name: &str) -> Result<Option<String>> {
        if let Some(folder) = self.catalog.find(name)? {
            let check = self.catalog.check_files(&folder)?;
            if !check.is_complete() {
                return Ok(Some(self.catalog.missing_files_warning(&folder, &check)));
            }
            return Ok(Some(format!("### {}\n{}", folder.name, self.catalog.info(&folder))));
        }

        let key = normalize_module_name(name);
        Ok(self.registered.get(&key).map(|module| {
            format!("### {}\n_No description available._", module.value().name())
        }))
    }

    /// Reply for `kazbot command services`
    pub fn list_integrations(&self) -> Result<Vec<String>> {
        let mut listing: Vec<String> = self
            .registered
            .iter()
            .map(|entry| format!("### {}\n_Built-in module._", entry.value().name()))
            .collect();
        listing.sort();
        listing.extend(self.catalog.list_integrations()?);
        Ok(listing)
    }
}
