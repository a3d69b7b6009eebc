//! API configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.
//!
//! | Variable                          | Default                 |
//! |-----------------------------------|-------------------------|
//! | `POKERNIGHT_BIND_ADDR`            | `0.0.0.0:8000`          |
//! | `POKERNIGHT_DATABASE_PATH`        | `data/pokernight.db`    |
//! | `POKERNIGHT_BACKUP_DIR`           | `data/backups`          |
//! | `POKERNIGHT_ADMIN_PASSWORD_HASH`  | unset (admin disabled)  |
//! | `POKERNIGHT_JWT_SECRET`           | development secret      |
//! | `POKERNIGHT_JWT_LIFETIME_SECS`    | `43200` (12 hours)      |
//! | `POKERNIGHT_APP_VERSION`          | crate version           |
//! | `POKERNIGHT_API_BASE_URL`         | `/api`                  |
//! | `POKERNIGHT_DEBUG`                | `false`                 |

use serde::Serialize;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

const DEV_JWT_SECRET: &str = "pokernight-dev-secret-change-in-production";

/// API configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,

    /// SQLite database file
    pub database_path: PathBuf,

    /// Where `POST /api/admin/backup` writes snapshots
    pub backup_dir: PathBuf,

    /// argon2 PHC string for the admin password. Admin login is refused
    /// while unset.
    pub admin_password_hash: Option<String>,

    /// JWT secret key for signing admin tokens
    pub jwt_secret: String,

    /// JWT token lifetime in seconds
    pub jwt_lifetime_secs: i64,

    pub app_version: String,

    pub api_base_url: String,

    pub debug: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            database_path: PathBuf::from("data/pokernight.db"),
            backup_dir: PathBuf::from("data/backups"),
            admin_password_hash: None,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            jwt_lifetime_secs: 12 * 60 * 60,
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            api_base_url: "/api".to_string(),
            debug: false,
        }
    }
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from any key lookup; `load` passes the process
    /// environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = ApiConfig::default();

        let config = ApiConfig {
            bind_addr: match lookup("POKERNIGHT_BIND_ADDR") {
                Some(v) => v
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue("POKERNIGHT_BIND_ADDR".to_string()))?,
                None => defaults.bind_addr,
            },

            database_path: lookup("POKERNIGHT_DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),

            backup_dir: lookup("POKERNIGHT_BACKUP_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.backup_dir),

            admin_password_hash: lookup("POKERNIGHT_ADMIN_PASSWORD_HASH")
                .filter(|v| !v.trim().is_empty()),

            // In production, this MUST be set via environment variable
            jwt_secret: lookup("POKERNIGHT_JWT_SECRET").unwrap_or(defaults.jwt_secret),

            jwt_lifetime_secs: match lookup("POKERNIGHT_JWT_LIFETIME_SECS") {
                Some(v) => v.parse().map_err(|_| {
                    ConfigError::InvalidValue("POKERNIGHT_JWT_LIFETIME_SECS".to_string())
                })?,
                None => defaults.jwt_lifetime_secs,
            },

            app_version: lookup("POKERNIGHT_APP_VERSION").unwrap_or(defaults.app_version),

            api_base_url: lookup("POKERNIGHT_API_BASE_URL").unwrap_or(defaults.api_base_url),

            debug: match lookup("POKERNIGHT_DEBUG") {
                Some(v) => parse_bool(&v)
                    .ok_or_else(|| ConfigError::InvalidValue("POKERNIGHT_DEBUG".to_string()))?,
                None => defaults.debug,
            },
        };

        if config.jwt_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue(
                "POKERNIGHT_JWT_LIFETIME_SECS".to_string(),
            ));
        }

        if config.jwt_secret.is_empty() {
            return Err(ConfigError::MissingRequired("POKERNIGHT_JWT_SECRET".to_string()));
        }

        Ok(config)
    }

    /// True while the development JWT secret is in use.
    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }

    /// Values safe to hand to the browser.
    pub fn public(&self) -> PublicConfig {
        PublicConfig {
            app_version: self.app_version.clone(),
            api_base_url: self.api_base_url.clone(),
            cache_name_prefix: format!("poker-night-v{}", self.app_version),
            debug: self.debug,
        }
    }
}

/// Response body of `GET /api/config`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicConfig {
    pub app_version: String,
    pub api_base_url: String,
    pub cache_name_prefix: String,
    pub debug: bool,
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
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
        let config = ApiConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.bind_addr.port(), 8000);
        assert!(config.admin_password_hash.is_none());
        assert!(config.uses_dev_secret());
        assert!(!config.debug);
    }

    #[test]
    fn test_overrides() {
        let config = ApiConfig::from_lookup(lookup(&[
            ("POKERNIGHT_BIND_ADDR", "127.0.0.1:9000"),
            ("POKERNIGHT_DEBUG", "yes"),
            ("POKERNIGHT_APP_VERSION", "2.1.0"),
            ("POKERNIGHT_JWT_SECRET", "s3cret"),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr.port(), 9000);
        assert!(config.debug);
        assert!(!config.uses_dev_secret());
        assert_eq!(config.public().cache_name_prefix, "poker-night-v2.1.0");
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            ApiConfig::from_lookup(lookup(&[("POKERNIGHT_BIND_ADDR", "nowhere")])),
            Err(ConfigError::InvalidValue(_))
        ));
        assert!(matches!(
            ApiConfig::from_lookup(lookup(&[("POKERNIGHT_JWT_LIFETIME_SECS", "-5")])),
            Err(ConfigError::InvalidValue(_))
        ));
        assert!(matches!(
            ApiConfig::from_lookup(lookup(&[("POKERNIGHT_DEBUG", "maybe")])),
            Err(ConfigError::InvalidValue(_))
        ));
    }
}
