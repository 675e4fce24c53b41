//! # Module Manifest Schema
//!
//! `module.yaml`, the main entry point of a folder-backed integration module.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.2.0
//!
//! ## Changelog
//! - 1.1.0: Added `required_files`
//! - 1.0.0: Initial schema with per-capability commands and topics

use super::Capabilities;
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// File name of the manifest inside a module folder
pub const MANIFEST_FILE: &str = "module.yaml";

/// File name of the description shown by listings
pub const INFO_FILE: &str = "info.md";

/// Optional long-form help
pub const HELP_FILE: &str = "moduleHelp.md";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModuleManifest {
    /// Display name; defaults to the folder name
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// Keywords that route fallback questions to `run`
    #[serde(default)]
    pub topics: Vec<String>,

    /// Files that must exist in the module folder
    #[serde(default = "default_required_files")]
    pub required_files: Vec<String>,

    #[serde(default)]
    pub commands: ModuleCommands,
}

/// One optional command per capability
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ModuleCommands {
    pub init: Option<CapabilityCommand>,
    pub close: Option<CapabilityCommand>,
    pub status: Option<CapabilityCommand>,
    pub restart: Option<CapabilityCommand>,
    pub help: Option<CapabilityCommand>,
    pub run: Option<CapabilityCommand>,
    pub ask: Option<CapabilityCommand>,
}

/// CLI invocation backing a capability
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CapabilityCommand {
    /// Base command to execute (must be allow-listed)
    pub command: String,

    /// Arguments; `${query}` is replaced with the user's question
    #[serde(default)]
    pub args: Vec<String>,

    /// Maximum execution time in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Maximum output size in bytes
    #[serde(default = "default_max_output")]
    pub max_output_bytes: usize,

    /// Environment variables
    #[serde(default)]
    pub env: HashMap<String, String>,
}

impl ModuleManifest {
    /// Load and validate a manifest file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    pub fn parse(yaml: &str) -> Result<Self> {
        let manifest: ModuleManifest = serde_yaml::from_str(yaml)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Which capabilities the manifest provides. `help` is also available
    /// when the folder ships a help file.
    pub fn capabilities(&self, has_help_file: bool) -> Capabilities {
        let c = &self.commands;
        Capabilities {
            init: c.init.is_some(),
            close: c.close.is_some(),
            status: c.status.is_some(),
            restart: c.restart.is_some(),
            help: c.help.is_some() || has_help_file,
            run: c.run.is_some(),
            ask: c.ask.is_some(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        for file in &self.required_files {
            if file.trim().is_empty() || file.contains('/') || file.contains('\\') {
                return Err(anyhow!("Invalid required file name: '{file}'"));
            }
        }

        let c = &self.commands;
        let declared = [
            ("init", &c.init),
            ("close", &c.close),
            ("status", &c.status),
            ("restart", &c.restart),
            ("help", &c.help),
            ("run", &c.run),
            ("ask", &c.ask),
        ];
        for (capability, command) in declared {
            if let Some(command) = command {
                if command.command.trim().is_empty() {
                    return Err(anyhow!("Capability '{capability}' has no command"));
                }
                if command.timeout_seconds == 0 {
                    return Err(anyhow!("Capability '{capability}' has a zero timeout"));
                }
            }
        }
        Ok(())
    }
}

// Default value functions
fn default_required_files() -> Vec<String> {
    vec![MANIFEST_FILE.to_string(), INFO_FILE.to_string()]
}

fn default_timeout() -> u64 {
    30
}

fn default_max_output() -> usize {
    1_048_576 // 1MB
}
