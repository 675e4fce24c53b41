//! Environment-driven configuration
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.2.0: Add SESSION_IDLE_MINUTES and AI_MAX_FUNCTION_ROUNDS
//! - 1.1.0: Add storage backend selection (memory, fs, sqlite)
//! - 1.0.0: Initial creation

use anyhow::{anyhow, Result};
use std::env;
use std::str::FromStr;

/// Which blob store backs conversation logs, analytics and export artifacts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Fs,
    Sqlite,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "fs" | "file" | "filesystem" => Ok(StorageBackend::Fs),
            "sqlite" => Ok(StorageBackend::Sqlite),
            other => Err(anyhow!("Unknown STORAGE_BACKEND '{other}' (expected memory, fs or sqlite)")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: String,
    pub openai_model: String,
    pub storage_backend: StorageBackend,
    pub storage_path: String,
    pub database_path: String,
    pub services_dir: String,
    pub port: u16,
    /// Overrides transport-derived base URLs when set
    pub base_url: Option<String>,
    pub module_docs_url: String,
    pub module_allowed_commands: Vec<String>,
    pub session_idle_minutes: u64,
    pub ai_max_function_rounds: usize,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            openai_api_key: String::new(),
            openai_model: "gpt-4o-mini".to_string(),
            storage_backend: StorageBackend::Fs,
            storage_path: "./data".to_string(),
            database_path: "kazbot.db".to_string(),
            services_dir: "./services".to_string(),
            port: 3978,
            base_url: None,
            module_docs_url: "https://github.com/ProfKaz/MSTeams-Bots".to_string(),
            module_allowed_commands: vec!["sh".to_string(), "python3".to_string(), "node".to_string()],
            session_idle_minutes: 120,
            ai_max_function_rounds: 5,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Build the configuration from the process environment
    ///
    /// Call `dotenvy::dotenv()` first if a `.env` file should be honoured.
    pub fn from_env() -> Result<Self> {
        let defaults = Config::default();

        let openai_api_key = env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow!("OPENAI_API_KEY must be set"))?;

        let storage_backend = match env::var("STORAGE_BACKEND") {
            Ok(value) => value.parse()?,
            Err(_) => defaults.storage_backend,
        };

        let port = parse_var("PORT", defaults.port)?;
        let session_idle_minutes = parse_var("SESSION_IDLE_MINUTES", defaults.session_idle_minutes)?;
        let ai_max_function_rounds =
            parse_var("AI_MAX_FUNCTION_ROUNDS", defaults.ai_max_function_rounds)?;

        let module_allowed_commands = env::var("MODULE_ALLOWED_COMMANDS")
            .map(|value| parse_list(&value))
            .unwrap_or(defaults.module_allowed_commands);

        let base_url = env::var("BASE_URL")
            .ok()
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty());

        Ok(Config {
            openai_api_key,
            openai_model: env::var("OPENAI_MODEL").unwrap_or(defaults.openai_model),
            storage_backend,
            storage_path: env::var("STORAGE_PATH").unwrap_or(defaults.storage_path),
            database_path: env::var("DATABASE_PATH").unwrap_or(defaults.database_path),
            services_dir: env::var("SERVICES_DIR").unwrap_or(defaults.services_dir),
            port,
            base_url,
            module_docs_url: env::var("MODULE_DOCS_URL").unwrap_or(defaults.module_docs_url),
            module_allowed_commands,
            session_idle_minutes,
            ai_max_function_rounds,
            log_level: env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
        })
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("Invalid value for {name} ('{raw}'): {e}")),
        Err(_) => Ok(default),
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_backend_parse() {
        assert_eq!("memory".parse::<StorageBackend>().unwrap(), StorageBackend::Memory);
        assert_eq!(" FS ".parse::<StorageBackend>().unwrap(), StorageBackend::Fs);
        assert_eq!("sqlite".parse::<StorageBackend>().unwrap(), StorageBackend::Sqlite);
        assert!("redis".parse::<StorageBackend>().is_err());
    }

    #[test]
    fn test_parse_list_skips_blanks() {
        assert_eq!(parse_list("sh, python3,,node "), vec!["sh", "python3", "node"]);
        assert!(parse_list("").is_empty());
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.port, 3978);
        assert_eq!(config.storage_backend, StorageBackend::Fs);
        assert_eq!(config.ai_max_function_rounds, 5);
        assert!(config.base_url.is_none());
    }
}
