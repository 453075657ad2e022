//! Application Configuration
//!
//! Defaults, an optional JSON config file, then `COIN_VAULT_*` environment
//! overrides, in that order.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const ENV_PREFIX: &str = "COIN_VAULT_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

/// Which collection store backs the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Embedded SQLite database
    #[default]
    Sqlite,
    /// Hosted REST/RPC backend
    Rest,
}

impl std::str::FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(Backend::Sqlite),
            "rest" => Ok(Backend::Rest),
            other => Err(format!("unknown backend '{}'", other)),
        }
    }
}

/// Hosted REST backend settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestConfig {
    pub base_url: String,
    /// Anonymous API key, sent as `apikey` and bearer token
    pub api_key: String,
    pub table: String,
    pub owner_column: String,
    pub rank_column: String,
    /// RPC function applying a batch of rank updates
    pub batch_function: String,
    pub timeout_ms: u64,
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:54321".to_string(),
            api_key: String::new(),
            table: "coins".to_string(),
            owner_column: "Owner Email".to_string(),
            rank_column: "Priority".to_string(),
            batch_function: "update_coin_priorities".to_string(),
            timeout_ms: 15_000,
        }
    }
}

impl RestConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Reorder engine settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReorderConfig {
    /// Upper bound on a batch update (and on the revert fetch) before it counts as failed
    pub commit_timeout_ms: u64,
    /// Gallery page size; collections are shown and reordered one page at a time
    pub page_size: u32,
}

impl Default for ReorderConfig {
    fn default() -> Self {
        Self {
            commit_timeout_ms: 10_000,
            page_size: 100,
        }
    }
}

impl ReorderConfig {
    pub fn commit_timeout(&self) -> Duration {
        Duration::from_millis(self.commit_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub log_dir: PathBuf,
    pub log_level: String,
    pub backend: Backend,
    pub rest: RestConfig,
    pub reorder: ReorderConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("coin_vault.db"),
            log_dir: PathBuf::from("logs"),
            log_level: "info".to_string(),
            backend: Backend::default(),
            rest: RestConfig::default(),
            reorder: ReorderConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration: defaults, then `path` (must exist when given),
    /// then the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        config.apply_overrides(std::env::vars())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Apply `COIN_VAULT_*` overrides; unrelated keys are ignored
    pub fn apply_overrides<I, K, V>(&mut self, vars: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        for (key, value) in vars {
            let Some(name) = key.as_ref().strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let value: String = value.into();
            let invalid = || ConfigError::InvalidValue {
                key: key.as_ref().to_string(),
                value: value.clone(),
            };

            match name {
                "DB_PATH" => self.db_path = PathBuf::from(&value),
                "LOG_DIR" => self.log_dir = PathBuf::from(&value),
                "LOG_LEVEL" => self.log_level = value.clone(),
                "BACKEND" => self.backend = value.parse().map_err(|_| invalid())?,
                "REST_URL" => self.rest.base_url = value.clone(),
                "REST_KEY" => self.rest.api_key = value.clone(),
                "REST_TABLE" => self.rest.table = value.clone(),
                "REST_OWNER_COLUMN" => self.rest.owner_column = value.clone(),
                "REST_RANK_COLUMN" => self.rest.rank_column = value.clone(),
                "REST_BATCH_FUNCTION" => self.rest.batch_function = value.clone(),
                "COMMIT_TIMEOUT_MS" => {
                    self.reorder.commit_timeout_ms = value.parse().map_err(|_| invalid())?
                }
                "PAGE_SIZE" => self.reorder.page_size = value.parse().map_err(|_| invalid())?,
                _ => {}
            }
        }
        Ok(())
    }
}
