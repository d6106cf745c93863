/// Configuration management for the centerdesk service
///
/// Handles server binding, database location and the permission table.

use crate::auth::PermissionTable;
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Role -> capability grants, fixed for the lifetime of the process
    pub permissions: PermissionTable,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Server port number
    pub port: u16,
}

/// SQLite storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Directory holding centerdesk.db (default: "data")
    pub data_dir: String,
    /// How long a writer waits for the database lock before failing
    pub busy_timeout_ms: u64,
    /// Upper bound on pooled connections
    pub max_connections: u32,
}

impl Default for Config {
    /// Default configuration with ENV_VAR support for container deployment
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: std::env::var("CENTERDESK_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env_or("CENTERDESK_PORT", 3004),
            },
            database: DatabaseConfig {
                data_dir: std::env::var("CENTERDESK_DATA_DIR").unwrap_or_else(|_| "data".to_string()),
                busy_timeout_ms: env_or("CENTERDESK_BUSY_TIMEOUT_MS", 5000),
                max_connections: env_or("CENTERDESK_MAX_CONNECTIONS", 10),
            },
            permissions: PermissionTable::standard(),
        }
    }
}

impl Config {
    /// Defaults plus an optional permission table from `CENTERDESK_PERMISSIONS_FILE`
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("CENTERDESK_PERMISSIONS_FILE") {
            tracing::info!("🔐 Loading permission table from {}", path);
            config.permissions = PermissionTable::from_json_file(&path)?;
        }

        Ok(config)
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}
