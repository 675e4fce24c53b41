//! # Module Command Executor
//!
//! Runs the CLI commands behind folder-backed module capabilities with an
//! allowlist, `${query}` substitution, metacharacter rejection, output
//! limiting and a timeout.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.2.0
//!
//! ## Changelog
//! - 1.1.0: Allow `&` inside URL queries
//! - 1.0.0: Initial release

use super::manifest::CapabilityCommand;
use anyhow::Result;
use log::{info, warn};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

/// Characters that could enable shell injection through user input
const DANGEROUS_CHARS: &[char] = &[
    '|', ';', '&', '$', '`', '(', ')', '{', '}', '<', '>', '\n', '\r', '\0',
];

/// Result of a capability command execution
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub success: bool,
    pub exit_code: Option<i32>,
    /// Standard output (may be truncated)
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
}

impl ExecutionResult {
    /// Stdout on success, otherwise an error built from stderr
    pub fn into_output(self) -> Result<String> {
        if self.success {
            Ok(self.stdout)
        } else if self.timed_out {
            Err(anyhow::anyhow!("{}", self.stderr))
        } else {
            let detail = self.stderr.trim();
            Err(anyhow::anyhow!(
                "Command exited with {:?}{}",
                self.exit_code,
                if detail.is_empty() { String::new() } else { format!(": {detail}") }
            ))
        }
    }
}

#[derive(Clone)]
pub struct ModuleExecutor {
    allowed_commands: HashSet<String>,
}

impl ModuleExecutor {
    pub fn new(allowed_commands: Vec<String>) -> Self {
        Self {
            allowed_commands: allowed_commands.into_iter().collect(),
        }
    }

    /// Execute a capability command inside the module folder
    pub async fn execute(
        &self,
        config: &CapabilityCommand,
        working_dir: &Path,
        params: &HashMap<String, String>,
    ) -> Result<ExecutionResult> {
        if !self.allowed_commands.contains(&config.command) {
            return Err(anyhow::anyhow!(
                "Command not in allowlist: {}. Allowed: {:?}",
                config.command,
                self.allowed_commands
            ));
        }

        let args = self.substitute_params(&config.args, params)?;

        info!(
            "Executing module command: {} {:?} in {} (timeout: {}s)",
            config.command,
            args,
            working_dir.display(),
            config.timeout_seconds
        );

        let mut cmd = Command::new(&config.command);
        cmd.args(&args)
            .current_dir(working_dir)
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .kill_on_drop(true);

        for (key, value) in &config.env {
            cmd.env(key, value);
        }

        let timeout_duration = Duration::from_secs(config.timeout_seconds);
        match timeout(timeout_duration, cmd.output()).await {
            Ok(Ok(output)) => {
                let stdout = String::from_utf8_lossy(&output.stdout);
                let stderr = String::from_utf8_lossy(&output.stderr);

                let stdout = if stdout.len() > config.max_output_bytes {
                    warn!(
                        "Output truncated from {} to {} bytes",
                        stdout.len(),
                        config.max_output_bytes
                    );
                    let mut end = config.max_output_bytes;
                    while !stdout.is_char_boundary(end) && end > 0 {
                        end -= 1;
                    }
                    stdout[..end].to_string()
                } else {
                    stdout.to_string()
                };

                let exit_code = output.status.code();
                let success = output.status.success();
                if !success {
                    warn!("Module command failed with exit code: {:?}", exit_code);
                }

                Ok(ExecutionResult {
                    success,
                    exit_code,
                    stdout,
                    stderr: stderr.to_string(),
                    timed_out: false,
                })
            }
            Ok(Err(e)) => {
                warn!("Module command execution failed: {}", e);
                Err(anyhow::anyhow!("Failed to execute command: {}", e))
            }
            Err(_) => {
                warn!("Module command timed out after {} seconds", config.timeout_seconds);
                Ok(ExecutionResult {
                    success: false,
                    exit_code: None,
                    stdout: String::new(),
                    stderr: format!("Command timed out after {} seconds", config.timeout_seconds),
                    timed_out: true,
                })
            }
        }
    }

    /// Substitute `${param}` placeholders, validating user values first
    fn substitute_params(
        &self,
        args: &[String],
        params: &HashMap<String, String>,
    ) -> Result<Vec<String>> {
        for (key, value) in params {
            self.validate_argument(value)
                .map_err(|e| anyhow::anyhow!("Invalid parameter '{}': {}", key, e))?;
        }

        args.iter()
            .map(|arg| {
                let mut result = arg.clone();
                for (key, value) in params {
                    result = result.replace(&format!("${{{}}}", key), value);
                }

                if let Some(start) = result.find("${") {
                    let placeholder = match result[start..].find('}') {
                        Some(end) => &result[start..start + end + 1],
                        None => &result[start..],
                    };
                    return Err(anyhow::anyhow!(
                        "Unsubstituted placeholder {}: parameter not provided",
                        placeholder
                    ));
                }
                Ok(result)
            })
            .collect()
    }

    /// Reject user input containing shell metacharacters
    fn validate_argument(&self, arg: &str) -> Result<()> {
        let is_url = arg.starts_with("http://") || arg.starts_with("https://");

        for &ch in DANGEROUS_CHARS {
            if ch == '&' && is_url {
                continue;
            }
            if arg.contains(ch) {
                let ch_display = match ch {
                    '\n' => "newline".to_string(),
                    '\r' => "carriage return".to_string(),
                    '\0' => "null byte".to_string(),
                    _ => format!("'{}'", ch),
                };
                return Err(anyhow::anyhow!(
                    "Argument contains forbidden character {}: {}",
                    ch_display,
                    arg.chars().take(50).collect::<String>()
                ));
            }
        }
        Ok(())
    }
}
