//! Application configuration
//!
//! Loaded from a TOML file (default `~/.config/utility-billing/config.toml`).
//! Every field has a default, so a missing file or a partial file is fine.
//!
//! ```toml
//! [server]
//! api_host = "0.0.0.0"
//! api_port = 8080
//!
//! [database]
//! url = "sqlite://./billing.db?mode=rwc"
//!
//! [logging]
//! level = "info"
//! format = "json"
//!
//! [billing]
//! currency = "SAR"
//! bill_number_prefix = "BILL"
//! due_days = 14
//! late_fee = "50.00"
//! ```

use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::BillingSettings;
use crate::infrastructure::DatabaseConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Default config location: `<config dir>/utility-billing/config.toml`
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("utility-billing")
        .join("config.toml")
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseSection,
    pub logging: LoggingConfig,
    pub billing: BillingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub api_host: String,
    pub api_port: u16,
    /// Seconds to wait for in-flight requests on shutdown
    pub shutdown_timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            api_host: "0.0.0.0".to_string(),
            api_port: 8080,
            shutdown_timeout: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        let db = DatabaseConfig::default();
        Self {
            url: db.url,
            max_connections: db.max_connections,
        }
    }
}

impl DatabaseSection {
    pub fn to_database_config(&self, run_migrations: bool) -> DatabaseConfig {
        DatabaseConfig {
            url: self.url.clone(),
            max_connections: self.max_connections,
            run_migrations,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// EnvFilter directive, e.g. "info" or "utility_billing=debug"
    pub level: String,
    /// "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BillingConfig {
    /// Default currency for new tariffs
    pub currency: String,
    pub bill_number_prefix: String,
    pub due_days: u32,
    pub late_fee: Decimal,
    pub payment_retry_attempts: u32,
}

impl Default for BillingConfig {
    fn default() -> Self {
        let settings = BillingSettings::default();
        Self {
            currency: "SAR".to_string(),
            bill_number_prefix: settings.bill_number_prefix,
            due_days: settings.due_days,
            late_fee: settings.late_fee,
            payment_retry_attempts: settings.retry_attempts,
        }
    }
}

impl BillingConfig {
    pub fn settings(&self) -> BillingSettings {
        BillingSettings {
            bill_number_prefix: self.bill_number_prefix.clone(),
            due_days: self.due_days,
            late_fee: self.late_fee,
            retry_attempts: self.payment_retry_attempts,
        }
    }
}

impl AppConfig {
    /// Load from `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Write the config as TOML, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let body = toml::to_string_pretty(self)?;
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        std::fs::write(path, body).map_err(io_err)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.api_port == 0 {
            return Err(ConfigError::Invalid("server.api_port must not be 0".into()));
        }
        if self.database.url.trim().is_empty() {
            return Err(ConfigError::Invalid("database.url is required".into()));
        }
        if self.billing.bill_number_prefix.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "billing.bill_number_prefix is required".into(),
            ));
        }
        if self.billing.late_fee < Decimal::ZERO {
            return Err(ConfigError::Invalid("billing.late_fee is negative".into()));
        }
        if !matches!(self.logging.format.to_lowercase().as_str(), "pretty" | "json") {
            return Err(ConfigError::Invalid(format!(
                "logging.format '{}' must be 'pretty' or 'json'",
                self.logging.format
            )));
        }
        Ok(())
    }

    pub fn api_address(&self) -> String {
        format!("{}:{}", self.server.api_host, self.server.api_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn partial_file_fills_defaults() {
        let cfg = AppConfig::from_toml(
            r#"
            [server]
            api_port = 9090

            [billing]
            late_fee = "25.50"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.server.api_port, 9090);
        assert_eq!(cfg.server.api_host, "0.0.0.0");
        assert_eq!(cfg.billing.late_fee, dec!(25.50));
        assert_eq!(cfg.billing.bill_number_prefix, "BILL");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn numeric_late_fee_is_accepted() {
        let cfg = AppConfig::from_toml("[billing]\nlate_fee = 40\n").unwrap();
        assert_eq!(cfg.billing.late_fee, dec!(40));
    }

    #[test]
    fn missing_file_is_default() {
        let path = std::env::temp_dir().join("utility-billing-missing/config.toml");
        assert_eq!(AppConfig::load(&path).unwrap(), AppConfig::default());
    }

    #[test]
    fn save_then_load() {
        let dir = std::env::temp_dir().join(format!("utility-billing-{}", uuid::Uuid::new_v4()));
        let path = dir.join("config.toml");
        let mut cfg = AppConfig::default();
        cfg.billing.due_days = 21;
        cfg.save(&path).unwrap();
        assert_eq!(AppConfig::load(&path).unwrap(), cfg);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn rejects_unknown_log_format() {
        let mut cfg = AppConfig::default();
        cfg.logging.format = "xml".into();
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn settings_follow_billing_section() {
        let mut cfg = AppConfig::default();
        cfg.billing.payment_retry_attempts = 5;
        assert_eq!(cfg.billing.settings().retry_attempts, 5);
    }

    #[test]
    fn default_path_ends_with_app_dir() {
        assert!(default_config_path().ends_with("utility-billing/config.toml"));
    }
}
