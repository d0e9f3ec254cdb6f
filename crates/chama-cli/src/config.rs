use std::env;
use std::fmt;
use std::path::PathBuf;

use clap::ValueEnum;

use crate::OutputFormat;

/// Runtime settings for the `chama` binary, read from the environment.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub log_filter: String,
    pub policy_path: Option<PathBuf>,
    pub output: OutputFormat,
}

impl CliConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let log_filter = env::var("CHAMA_LOG").unwrap_or_else(|_| "warn".to_string());

        let policy_path = env::var("CHAMA_POLICY")
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        let output = match env::var("CHAMA_OUTPUT") {
            Ok(value) => OutputFormat::from_str(value.trim(), true)
                .map_err(|_| ConfigError::InvalidOutput { value })?,
            Err(_) => OutputFormat::Json,
        };

        Ok(Self {
            log_filter,
            policy_path,
            output,
        })
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidOutput { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidOutput { value } => write!(
                f,
                "CHAMA_OUTPUT must be one of json, table, csv, minimal (got '{}')",
                value
            ),
        }
    }
}

impl std::error::Error for ConfigError {}
