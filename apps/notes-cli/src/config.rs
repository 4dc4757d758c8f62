//! Centralized configuration for notes-cli.
//!
//! All environment variables are loaded and validated at startup to fail
//! fast on misconfiguration rather than mid-command.

use std::env;
use std::fmt;

use modelkit::AdapterType;

/// Log output format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    fn from_str(s: &str) -> Self {
        if s.eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Pretty
        }
    }
}

/// Configuration error.
#[derive(Debug)]
pub struct ConfigError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Configuration error for {}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

/// CLI configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Storage backend to register (default: sql)
    pub adapter_type: AdapterType,
    /// Connection URI for the adapter
    pub database_url: String,
    /// Name the adapter is registered under
    pub adapter_name: String,
    /// Log format
    pub log_format: LogFormat,
}

impl Config {
    /// Load and validate configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Adapter type; unknown values are a hard error, not a fallback
        let adapter_type = match env::var("ADAPTER_TYPE") {
            Ok(s) => AdapterType::parse(&s).ok_or_else(|| ConfigError {
                field: "ADAPTER_TYPE",
                message: format!("unknown adapter type '{s}' (expected memory or sql)"),
            })?,
            Err(_) => AdapterType::Sql,
        };

        // Connection URI
        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://./data/notes.db".to_string());

        // Registry name for the adapter
        let adapter_name = env::var("ADAPTER_NAME").unwrap_or_else(|_| "primary".to_string());

        // Log format
        let log_format =
            LogFormat::from_str(&env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".into()));

        Ok(Self {
            adapter_type,
            database_url,
            adapter_name,
            log_format,
        })
    }

    /// Log warnings about configurations that lose data.
    pub fn warn_if_volatile(&self) {
        if self.adapter_type == AdapterType::Memory {
            tracing::warn!(
                "ADAPTER_TYPE=memory: notes are kept in process memory and are gone when \
                 the command exits. Use ADAPTER_TYPE=sql to keep them."
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_format_parsing() {
        assert_eq!(LogFormat::from_str("pretty"), LogFormat::Pretty);
        assert_eq!(LogFormat::from_str("json"), LogFormat::Json);
        assert_eq!(LogFormat::from_str("JSON"), LogFormat::Json);
        assert_eq!(LogFormat::from_str("anything"), LogFormat::Pretty);
    }

    #[test]
    fn config_error_names_the_field() {
        let err = ConfigError {
            field: "ADAPTER_TYPE",
            message: "unknown adapter type 'pg'".into(),
        };
        assert!(err.to_string().contains("ADAPTER_TYPE"));
    }
}
