//! Configuration management

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_SERVER_HOST: &str = "127.0.0.1";
pub const DEFAULT_SERVER_PORT: u16 = 8080;
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

pub const DEFAULT_DATABASE_URL: &str = "postgresql://localhost/epr_submissions";
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_DATABASE_MIN_CONNECTIONS: u32 = 2;
pub const DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS: u64 = 10;
/// 10 minutes
pub const DEFAULT_DATABASE_IDLE_TIMEOUT_SECS: u64 = 600;

pub const DEFAULT_CORS_ALLOWED_ORIGIN: &str = "http://localhost:3000";

/// Cap on validation errors or warnings stored per event and returned per query
pub const DEFAULT_MAX_ISSUES_TO_PROCESS: usize = 1000;

pub const DEFAULT_SLOW_REQUEST_THRESHOLD_MS: u64 = 500;

/// Service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub cors: CorsConfig,
    pub storage: StorageBackend,
    pub validation: ValidationConfig,
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub shutdown_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allow_credentials: bool,
}

/// Which store backs the repositories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" | "in-memory" => Ok(StorageBackend::Memory),
            other => Err(anyhow::anyhow!("Invalid storage backend: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    pub max_issues_to_process: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub slow_request_threshold_ms: u64,
}

impl PipelineConfig {
    pub fn slow_request_threshold(&self) -> Duration {
        Duration::from_millis(self.slow_request_threshold_ms)
    }
}

/// Parses an environment variable, falling back to `default` when it is unset
/// or unparsable
fn env_or<T: FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let config = Self::from_env()?;
        config.validate()?;
        Ok(config)
    }

    fn from_env() -> anyhow::Result<Self> {
        let storage = match std::env::var("STORAGE_BACKEND") {
            Ok(value) => value.parse()?,
            Err(_) => StorageBackend::default(),
        };

        Ok(Config {
            server: ServerConfig {
                host: std::env::var("EPR_HOST")
                    .unwrap_or_else(|_| DEFAULT_SERVER_HOST.to_string()),
                port: env_or("EPR_PORT", DEFAULT_SERVER_PORT),
                shutdown_timeout_secs: env_or(
                    "EPR_SHUTDOWN_TIMEOUT",
                    DEFAULT_SHUTDOWN_TIMEOUT_SECS,
                ),
            },
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
                max_connections: env_or(
                    "DATABASE_MAX_CONNECTIONS",
                    DEFAULT_DATABASE_MAX_CONNECTIONS,
                ),
                min_connections: env_or(
                    "DATABASE_MIN_CONNECTIONS",
                    DEFAULT_DATABASE_MIN_CONNECTIONS,
                ),
                connect_timeout_secs: env_or(
                    "DATABASE_CONNECT_TIMEOUT",
                    DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
                ),
                idle_timeout_secs: env_or(
                    "DATABASE_IDLE_TIMEOUT",
                    DEFAULT_DATABASE_IDLE_TIMEOUT_SECS,
                ),
            },
            cors: CorsConfig {
                allowed_origins: std::env::var("CORS_ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| DEFAULT_CORS_ALLOWED_ORIGIN.to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
                allow_credentials: env_or("CORS_ALLOW_CREDENTIALS", true),
            },
            storage,
            validation: ValidationConfig {
                max_issues_to_process: env_or(
                    "MAX_ISSUES_TO_PROCESS",
                    DEFAULT_MAX_ISSUES_TO_PROCESS,
                ),
            },
            pipeline: PipelineConfig {
                slow_request_threshold_ms: env_or(
                    "SLOW_REQUEST_THRESHOLD_MS",
                    DEFAULT_SLOW_REQUEST_THRESHOLD_MS,
                ),
            },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("Server port must be greater than 0");
        }

        if self.storage == StorageBackend::Postgres {
            if self.database.url.is_empty() {
                anyhow::bail!("Database URL cannot be empty");
            }

            if self.database.max_connections == 0 {
                anyhow::bail!("Database max_connections must be greater than 0");
            }

            if self.database.min_connections > self.database.max_connections {
                anyhow::bail!(
                    "Database min_connections ({}) cannot be greater than max_connections ({})",
                    self.database.min_connections,
                    self.database.max_connections
                );
            }
        }

        if self.validation.max_issues_to_process == 0 {
            anyhow::bail!("MAX_ISSUES_TO_PROCESS must be greater than 0");
        }

        if self.cors.allowed_origins.is_empty() {
            tracing::warn!("No CORS origins configured - all origins will be allowed");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: DEFAULT_SERVER_HOST.to_string(),
                port: DEFAULT_SERVER_PORT,
                shutdown_timeout_secs: DEFAULT_SHUTDOWN_TIMEOUT_SECS,
            },
            database: DatabaseConfig {
                url: DEFAULT_DATABASE_URL.to_string(),
                max_connections: DEFAULT_DATABASE_MAX_CONNECTIONS,
                min_connections: DEFAULT_DATABASE_MIN_CONNECTIONS,
                connect_timeout_secs: DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
                idle_timeout_secs: DEFAULT_DATABASE_IDLE_TIMEOUT_SECS,
            },
            cors: CorsConfig {
                allowed_origins: vec![DEFAULT_CORS_ALLOWED_ORIGIN.to_string()],
                allow_credentials: true,
            },
            storage: StorageBackend::default(),
            validation: ValidationConfig {
                max_issues_to_process: DEFAULT_MAX_ISSUES_TO_PROCESS,
            },
            pipeline: PipelineConfig {
                slow_request_threshold_ms: DEFAULT_SLOW_REQUEST_THRESHOLD_MS,
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: &[&str] = &[
        "STORAGE_BACKEND",
        "MAX_ISSUES_TO_PROCESS",
        "SLOW_REQUEST_THRESHOLD_MS",
        "EPR_PORT",
    ];

    fn clear() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_defaults_without_environment() {
        clear();
        let config = Config::from_env().unwrap();
        assert_eq!(config.storage, StorageBackend::Postgres);
        assert_eq!(config.validation.max_issues_to_process, 1000);
        assert_eq!(
            config.pipeline.slow_request_threshold(),
            Duration::from_millis(500)
        );
    }

    #[test]
    #[serial]
    fn test_environment_overrides() {
        clear();
        std::env::set_var("STORAGE_BACKEND", "memory");
        std::env::set_var("MAX_ISSUES_TO_PROCESS", "25");
        std::env::set_var("EPR_PORT", "9090");

        let config = Config::from_env().unwrap();
        assert_eq!(config.storage, StorageBackend::Memory);
        assert_eq!(config.validation.max_issues_to_process, 25);
        assert_eq!(config.server.port, 9090);
        clear();
    }

    #[test]
    #[serial]
    fn test_unknown_backend_is_rejected() {
        clear();
        std::env::set_var("STORAGE_BACKEND", "sqlite");
        assert!(Config::from_env().is_err());
        clear();
    }

    #[test]
    fn test_validate_rejects_bad_pool_sizes() {
        let mut config = Config::default();
        config.database.min_connections = 50;
        assert!(config.validate().is_err());

        // the pool is irrelevant for the memory backend
        config.storage = StorageBackend::Memory;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_issue_cap() {
        let mut config = Config::default();
        config.validation.max_issues_to_process = 0;
        assert!(config.validate().is_err());
    }
}
