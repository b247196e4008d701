//! Service configuration.
//!
//! Configuration is loaded from environment variables with fallback to defaults.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `EXPO_DB_PATH` | `expo.db` |
//! | `EXPO_DB_MAX_CONNECTIONS` | `5` |
//! | `EXPO_NUMBER_RETRIES` | `8` |
//! | `EXPO_CURRENCY` | `INR` |
//! | `EXPO_ISSUER_NAME` | unset |
//! | `EXPO_DATE_FORMAT` | `%d/%m/%Y` |

use std::env;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use expo_core::render::{format_date, RenderOptions, DEFAULT_CURRENCY, DEFAULT_DATE_FORMAT};
use expo_db::DbConfig;

/// Service configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    /// SQLite database file.
    pub database_path: PathBuf,

    /// Pool size.
    pub max_connections: u32,

    /// How many times creation re-derives the invoice number after a
    /// collision before giving up with `Conflict`.
    pub number_retry_attempts: u32,

    /// Currency label printed on rendered invoices.
    pub currency: String,

    /// Printed under the `INVOICE` heading when set.
    pub issuer_name: Option<String>,

    /// strftime pattern for invoice dates.
    pub date_format: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig {
            database_path: PathBuf::from("expo.db"),
            max_connections: 5,
            number_retry_attempts: 8,
            currency: DEFAULT_CURRENCY.to_string(),
            issuer_name: None,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ServiceConfig::default();

        let config = ServiceConfig {
            database_path: lookup("EXPO_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),

            max_connections: lookup("EXPO_DB_MAX_CONNECTIONS")
                .map(|v| v.trim().parse())
                .transpose()
                .map_err(|_| ConfigError::InvalidValue("EXPO_DB_MAX_CONNECTIONS".to_string()))?
                .unwrap_or(defaults.max_connections),

            number_retry_attempts: lookup("EXPO_NUMBER_RETRIES")
                .map(|v| v.trim().parse())
                .transpose()
                .map_err(|_| ConfigError::InvalidValue("EXPO_NUMBER_RETRIES".to_string()))?
                .unwrap_or(defaults.number_retry_attempts),

            currency: lookup("EXPO_CURRENCY")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.currency),

            issuer_name: lookup("EXPO_ISSUER_NAME").filter(|v| !v.trim().is_empty()),

            date_format: lookup("EXPO_DATE_FORMAT")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.date_format),
        };

        if config.max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "EXPO_DB_MAX_CONNECTIONS".to_string(),
            ));
        }
        if config.number_retry_attempts == 0 {
            return Err(ConfigError::InvalidValue("EXPO_NUMBER_RETRIES".to_string()));
        }
        // Catch bad patterns at startup rather than on the first render.
        if format_date(Utc::now(), &config.date_format).is_err() {
            return Err(ConfigError::InvalidValue("EXPO_DATE_FORMAT".to_string()));
        }

        Ok(config)
    }

    /// Database settings derived from this configuration.
    pub fn to_db_config(&self) -> DbConfig {
        DbConfig::new(self.database_path.clone()).max_connections(self.max_connections)
    }

    /// Render settings for a document produced at `generated_at`.
    pub fn render_options(&self, generated_at: DateTime<Utc>) -> RenderOptions {
        let options = RenderOptions::new(generated_at)
            .with_currency(self.currency.clone())
            .with_date_format(self.date_format.clone());

        match &self.issuer_name {
            Some(issuer) => options.with_issuer_name(issuer.clone()),
            None => options,
        }
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ServiceConfig::default());
        assert_eq!(config.number_retry_attempts, 8);
    }

    #[test]
    fn test_overrides() {
        let config = ServiceConfig::from_lookup(lookup(&[
            ("EXPO_DB_PATH", "/var/lib/expo/expo.db"),
            ("EXPO_DB_MAX_CONNECTIONS", "8"),
            ("EXPO_NUMBER_RETRIES", "5"),
            ("EXPO_CURRENCY", "USD"),
            ("EXPO_ISSUER_NAME", "Pragati Maidan Expo"),
            ("EXPO_DATE_FORMAT", "%Y-%m-%d"),
        ]))
        .unwrap();

        assert_eq!(config.max_connections, 8);
        assert_eq!(config.number_retry_attempts, 5);
        assert_eq!(config.to_db_config().max_connections, 8);

        let options = config.render_options(Utc::now());
        assert_eq!(options.currency, "USD");
        assert_eq!(options.issuer_name.as_deref(), Some("Pragati Maidan Expo"));
        assert_eq!(options.date_format, "%Y-%m-%d");
    }

    #[test]
    fn test_invalid_values() {
        assert!(ServiceConfig::from_lookup(lookup(&[("EXPO_DB_MAX_CONNECTIONS", "many")])).is_err());
        assert!(ServiceConfig::from_lookup(lookup(&[("EXPO_NUMBER_RETRIES", "0")])).is_err());
        assert!(ServiceConfig::from_lookup(lookup(&[("EXPO_DATE_FORMAT", "%d/%m/%")])).is_err());
    }
}
