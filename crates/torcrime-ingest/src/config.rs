//! Configuration management

use serde::{Deserialize, Serialize};
use std::time::Duration;
use torcrime_common::env;

use crate::error::{IngestError, Result};
use crate::models::{DumpFormat, COLUMNS};

// ============================================================================
// Defaults
// ============================================================================

/// City of Toronto CKAN portal.
pub const DEFAULT_BASE_URL: &str = "https://ckan0.cf.opendata.inter.prod-toronto.ca";

/// Dataset carrying the neighbourhood crime rates.
pub const DEFAULT_DATASET: &str = "neighbourhood-crime-rates";

/// Default HTTP request timeout in seconds.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 60;

/// Default number of rows per multi-row INSERT.
pub const DEFAULT_BATCH_SIZE: usize = 500;

/// Default database URL for local development.
pub const DEFAULT_DATABASE_URL: &str = "postgresql://localhost/toronto_data";

/// The run is sequential, so a tiny pool is plenty.
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 2;

/// Default database connection timeout in seconds.
pub const DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS: u64 = 30;

/// PostgreSQL caps bind parameters per statement at 65 535.
pub const MAX_BIND_PARAMS: usize = 65_535;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub source: SourceConfig,
    pub database: DatabaseConfig,
    pub load: LoadConfig,
}

/// Where and how to fetch the dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub base_url: String,
    pub dataset: String,
    pub dump_format: DumpFormat,
    pub timeout_secs: u64,
}

impl SourceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Connection profile for the destination store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadConfig {
    pub batch_size: usize,
}

impl Config {
    /// Load configuration from `.env`, the environment and defaults
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        let config = Self::from_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Environment and defaults only; no `.env`, no validation
    pub fn from_env() -> Result<Self> {
        Ok(Config {
            source: SourceConfig {
                base_url: env::var_or("TORCRIME_BASE_URL", DEFAULT_BASE_URL),
                dataset: env::var_or("TORCRIME_DATASET", DEFAULT_DATASET),
                dump_format: env::parse_or("TORCRIME_DUMP_FORMAT", DumpFormat::Csv)?,
                timeout_secs: env::parse_or(
                    "TORCRIME_HTTP_TIMEOUT_SECS",
                    DEFAULT_HTTP_TIMEOUT_SECS,
                )?,
            },
            database: DatabaseConfig {
                url: env::var_or("DATABASE_URL", DEFAULT_DATABASE_URL),
                max_connections: env::parse_or(
                    "DB_MAX_CONNECTIONS",
                    DEFAULT_DATABASE_MAX_CONNECTIONS,
                )?,
                connect_timeout_secs: env::parse_or(
                    "DB_CONNECT_TIMEOUT",
                    DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
                )?,
            },
            load: LoadConfig {
                batch_size: env::parse_or("TORCRIME_BATCH_SIZE", DEFAULT_BATCH_SIZE)?,
            },
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.source.base_url.is_empty() {
            return Err(IngestError::config("Portal base URL cannot be empty"));
        }

        if !self.source.base_url.starts_with("http://")
            && !self.source.base_url.starts_with("https://")
        {
            return Err(IngestError::config(format!(
                "Portal base URL must be http(s), got '{}'",
                self.source.base_url
            )));
        }

        if self.source.dataset.is_empty() {
            return Err(IngestError::config("Dataset identifier cannot be empty"));
        }

        if self.source.timeout_secs == 0 {
            return Err(IngestError::config("HTTP timeout must be greater than 0"));
        }

        if self.database.url.is_empty() {
            return Err(IngestError::config("Database URL cannot be empty"));
        }

        if self.database.max_connections == 0 {
            return Err(IngestError::config(
                "Database max_connections must be greater than 0",
            ));
        }

        if self.load.batch_size == 0 {
            return Err(IngestError::config("Batch size must be greater than 0"));
        }

        let max_batch = MAX_BIND_PARAMS / COLUMNS.len();
        if self.load.batch_size > max_batch {
            return Err(IngestError::config(format!(
                "Batch size {} exceeds the {} rows PostgreSQL can bind in one statement",
                self.load.batch_size, max_batch
            )));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: SourceConfig {
                base_url: DEFAULT_BASE_URL.to_string(),
                dataset: DEFAULT_DATASET.to_string(),
                dump_format: DumpFormat::Csv,
                timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            },
            database: DatabaseConfig {
                url: DEFAULT_DATABASE_URL.to_string(),
                max_connections: DEFAULT_DATABASE_MAX_CONNECTIONS,
                connect_timeout_secs: DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
            },
            load: LoadConfig {
                batch_size: DEFAULT_BATCH_SIZE,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 5] = [
        "TORCRIME_BASE_URL",
        "TORCRIME_DATASET",
        "TORCRIME_DUMP_FORMAT",
        "TORCRIME_BATCH_SIZE",
        "DATABASE_URL",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.source.dataset, "neighbourhood-crime-rates");
        assert_eq!(config.load.batch_size, 500);
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        clear_env();
        std::env::set_var("TORCRIME_BASE_URL", "http://localhost:5000");
        std::env::set_var("TORCRIME_DUMP_FORMAT", "json");
        std::env::set_var("TORCRIME_BATCH_SIZE", "50");
        std::env::set_var("DATABASE_URL", "postgresql://localhost/test");

        let config = Config::from_env().unwrap();
        assert_eq!(config.source.base_url, "http://localhost:5000");
        assert_eq!(config.source.dump_format, DumpFormat::Json);
        assert_eq!(config.load.batch_size, 50);
        assert!(config.database.url.ends_with("/test"));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_unparseable_batch_size() {
        clear_env();
        std::env::set_var("TORCRIME_BATCH_SIZE", "lots");
        assert!(matches!(
            Config::from_env(),
            Err(IngestError::Common(_))
        ));
        clear_env();
    }

    #[test]
    fn test_validate_rejects_zero_batch() {
        let mut config = Config::default();
        config.load.batch_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_batch_over_bind_limit() {
        let mut config = Config::default();
        config.load.batch_size = MAX_BIND_PARAMS / COLUMNS.len();
        assert!(config.validate().is_ok());
        config.load.batch_size += 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_non_http_base_url() {
        let mut config = Config::default();
        config.source.base_url = "ftp://ckan.example.org".to_string();
        assert!(config.validate().is_err());
    }
}
