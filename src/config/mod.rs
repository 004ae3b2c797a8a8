//! Configuration module for the SkillSwap backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::client::DataSource;
use crate::errors::AppError;
use crate::exchanges::TransitionMode;

/// Backend used for the persistence port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// SQLite file at `db_path`
    Sqlite,
    /// Process memory; state is lost on restart
    Memory,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Pre-shared key for API authentication
    pub api_psk: Option<String>,
    /// Path to SQLite database file
    pub db_path: PathBuf,
    pub storage: StorageBackend,
    /// Directory of static mock JSON resources served under `/db`
    pub data_dir: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Base URL of the mock data API
    pub mock_api_url: String,
    pub data_source: DataSource,
    pub transition_mode: TransitionMode,
    /// Per-request timeout for mock API calls
    pub http_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let api_psk = env::var("SKILLSWAP_API_PSK").ok().filter(|s| !s.is_empty());

        let db_path = var_or("SKILLSWAP_DB_PATH", "./data/skillswap.sqlite").into();

        let storage = match var_or("SKILLSWAP_STORAGE", "sqlite").as_str() {
            "sqlite" => StorageBackend::Sqlite,
            "memory" => StorageBackend::Memory,
            other => return Err(invalid("SKILLSWAP_STORAGE", other)),
        };

        let data_dir = var_or("SKILLSWAP_DATA_DIR", "./data/db").into();

        let bind_raw = var_or("SKILLSWAP_BIND_ADDR", "127.0.0.1:8080");
        let bind_addr = bind_raw
            .parse()
            .map_err(|_| invalid("SKILLSWAP_BIND_ADDR", &bind_raw))?;

        let log_level = var_or("SKILLSWAP_LOG_LEVEL", "info");

        let mock_api_url = var_or("SKILLSWAP_MOCK_API_URL", "http://127.0.0.1:8080");

        let source_raw = var_or("SKILLSWAP_DATA_SOURCE", "local");
        let data_source = DataSource::from_name(&source_raw)
            .ok_or_else(|| invalid("SKILLSWAP_DATA_SOURCE", &source_raw))?;

        let transition_mode = match var_or("SKILLSWAP_STRICT_TRANSITIONS", "false").as_str() {
            "true" | "1" => TransitionMode::Strict,
            "false" | "0" => TransitionMode::Permissive,
            other => return Err(invalid("SKILLSWAP_STRICT_TRANSITIONS", other)),
        };

        let timeout_raw = var_or("SKILLSWAP_HTTP_TIMEOUT_SECS", "30");
        let http_timeout = timeout_raw
            .parse()
            .map(Duration::from_secs)
            .map_err(|_| invalid("SKILLSWAP_HTTP_TIMEOUT_SECS", &timeout_raw))?;

        Ok(Self {
            api_psk,
            db_path,
            storage,
            data_dir,
            bind_addr,
            log_level,
            mock_api_url,
            data_source,
            transition_mode,
            http_timeout,
        })
    }
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn invalid(name: &str, value: &str) -> AppError {
    AppError::Config(format!("Invalid {} value: {:?}", name, value))
}
