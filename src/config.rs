use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct LogStoreConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub retention: RetentionConfig,
    pub query: QueryConfig,
    pub health: HealthConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub transport: String,
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RetentionConfig {
    /// Window enforced after every insert. `0` turns the automatic sweep off.
    pub auto_sweep_hours: u64,
    /// Default window for the explicit `cleanup` operation.
    pub cleanup_days: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct QueryConfig {
    pub default_limit: usize,
    pub search_limit: usize,
    pub recent_errors: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct HealthConfig {
    pub offline_after_secs: f64,
    pub critical_error_rate: f64,
    pub degraded_error_rate: f64,
    pub degraded_warning_rate: f64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: "stdio".into(),
            host: "127.0.0.1".into(),
            port: 7411,
            log_level: "info".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let db_path = default_logstore_dir()
            .join("logs.db")
            .to_string_lossy()
            .into_owned();
        Self { db_path }
    }
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            auto_sweep_hours: 24,
            cleanup_days: 7,
        }
    }
}

impl RetentionConfig {
    /// Automatic sweep window in seconds, or `None` when disabled.
    pub fn auto_sweep_secs(&self) -> Option<f64> {
        (self.auto_sweep_hours > 0).then(|| self.auto_sweep_hours as f64 * 3600.0)
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_limit: 1000,
            search_limit: 50,
            recent_errors: 5,
        }
    }
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            offline_after_secs: 300.0,
            critical_error_rate: 0.10,
            degraded_error_rate: 0.05,
            degraded_warning_rate: 0.20,
        }
    }
}

/// Returns `~/.logstore/`, or `./.logstore/` when no home directory is known.
pub fn default_logstore_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".logstore")
}

/// Returns the default config file path: `~/.logstore/config.toml`
pub fn default_config_path() -> PathBuf {
    default_logstore_dir().join("config.toml")
}

impl LogStoreConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            LogStoreConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides (LOGSTORE_DB, LOGSTORE_LOG_LEVEL, LOGSTORE_TRANSPORT).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("LOGSTORE_DB") {
            self.storage.db_path = val;
        }
        if let Ok(val) = std::env::var("LOGSTORE_LOG_LEVEL") {
            self.server.log_level = val;
        }
        if let Ok(val) = std::env::var("LOGSTORE_TRANSPORT") {
            self.server.transport = val;
        }
    }

    /// Resolve the database path, expanding `~` if needed.
    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
