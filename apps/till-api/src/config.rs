//! # Server Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     TILL_PORT=8080                                                     │
//! │     TILL_JWT_SECRET=...                                                │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     $TILL_CONFIG, or                                                   │
//! │     ~/.config/till-pos/server.toml (Linux)                             │
//! │     ~/Library/Application Support/com.till.pos/server.toml (macOS)     │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [server]
//! bind_addr = "0.0.0.0"
//! port = 8080
//!
//! [database]
//! path = "/var/lib/till/till.db"
//! max_connections = 8
//! busy_timeout_ms = 5000
//!
//! [auth]
//! jwt_secret = "change-me-to-something-long"
//! token_lifetime_secs = 43200
//!
//! [sales]
//! max_attempts = 5
//! initial_backoff_ms = 10
//! max_backoff_ms = 500
//!
//! [logging]
//! json = false
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use till_db::{DbConfig, RetryPolicy};

/// Minimum HS256 secret length accepted at startup.
const MIN_SECRET_LEN: usize = 16;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Sections
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerSettings {
    fn default() -> Self {
        ServerSettings {
            bind_addr: default_bind_addr(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file, created on first start.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// How long a writer waits for the SQLite lock before failing as busy.
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_ms: u64,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./till.db")
}

fn default_max_connections() -> u32 {
    8
}

fn default_busy_timeout() -> u64 {
    5000
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_db_path(),
            max_connections: default_max_connections(),
            busy_timeout_ms: default_busy_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSettings {
    /// HS256 signing secret. No default: must come from the file or
    /// `TILL_JWT_SECRET`.
    #[serde(default)]
    pub jwt_secret: String,

    #[serde(default = "default_token_lifetime")]
    pub token_lifetime_secs: i64,
}

fn default_token_lifetime() -> i64 {
    12 * 60 * 60
}

impl Default for AuthSettings {
    fn default() -> Self {
        AuthSettings {
            jwt_secret: String::new(),
            token_lifetime_secs: default_token_lifetime(),
        }
    }
}

/// Retry behaviour of `POST /sales` under write contention.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesSettings {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_ms: u64,

    #[serde(default = "default_max_backoff")]
    pub max_backoff_ms: u64,
}

fn default_max_attempts() -> u32 {
    5
}
fn default_initial_backoff() -> u64 {
    10
}
fn default_max_backoff() -> u64 {
    500
}

impl Default for SalesSettings {
    fn default() -> Self {
        SalesSettings {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff(),
            max_backoff_ms: default_max_backoff(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// One JSON object per line instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

// =============================================================================
// ApiConfig
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub auth: AuthSettings,

    #[serde(default)]
    pub sales: SalesSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

impl ApiConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`config_path`, else `TILL_CONFIG`, else the platform
    ///    config dir)
    /// 3. `TILL_*` environment variables
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        let path = config_path
            .or_else(|| std::env::var_os("TILL_CONFIG").map(PathBuf::from))
            .or_else(Self::default_config_path);

        if let Some(path) = path {
            if path.exists() {
                info!(?path, "Loading server config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.auth.jwt_secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::Invalid(format!(
                "auth.jwt_secret must be at least {} characters (set TILL_JWT_SECRET)",
                MIN_SECRET_LEN
            )));
        }

        if self.auth.token_lifetime_secs <= 0 {
            return Err(ConfigError::Invalid(
                "auth.token_lifetime_secs must be greater than 0".into(),
            ));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        if self.sales.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "sales.max_attempts must be greater than 0".into(),
            ));
        }

        if self.sales.initial_backoff_ms > self.sales.max_backoff_ms {
            return Err(ConfigError::Invalid(
                "sales.initial_backoff_ms must not exceed sales.max_backoff_ms".into(),
            ));
        }

        Ok(())
    }

    /// Applies `TILL_*` overrides read through `lookup`.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(addr) = lookup("TILL_BIND_ADDR") {
            self.server.bind_addr = addr;
        }

        if let Some(port) = lookup("TILL_PORT") {
            match port.parse::<u16>() {
                Ok(p) => {
                    debug!(port = p, "Overriding port from environment");
                    self.server.port = p;
                }
                Err(_) => warn!(value = %port, "Ignoring invalid TILL_PORT"),
            }
        }

        if let Some(path) = lookup("TILL_DATABASE_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Some(max) = lookup("TILL_DB_MAX_CONNECTIONS") {
            if let Ok(m) = max.parse::<u32>() {
                self.database.max_connections = m;
            }
        }

        if let Some(ms) = lookup("TILL_DB_BUSY_TIMEOUT_MS") {
            if let Ok(ms) = ms.parse::<u64>() {
                self.database.busy_timeout_ms = ms;
            }
        }

        if let Some(secret) = lookup("TILL_JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }

        if let Some(secs) = lookup("TILL_TOKEN_LIFETIME_SECS") {
            if let Ok(s) = secs.parse::<i64>() {
                self.auth.token_lifetime_secs = s;
            }
        }

        if let Some(attempts) = lookup("TILL_SALE_MAX_ATTEMPTS") {
            if let Ok(a) = attempts.parse::<u32>() {
                self.sales.max_attempts = a;
            }
        }

        if let Some(json) = lookup("TILL_LOG_JSON") {
            match json.to_lowercase().as_str() {
                "1" | "true" | "yes" => self.logging.json = true,
                "0" | "false" | "no" => self.logging.json = false,
                _ => warn!(value = %json, "Ignoring invalid TILL_LOG_JSON"),
            }
        }
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "till", "pos")
            .map(|dirs| dirs.config_dir().join("server.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.bind_addr, self.server.port)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.sales.max_attempts,
            initial_backoff: Duration::from_millis(self.sales.initial_backoff_ms),
            max_backoff: Duration::from_millis(self.sales.max_backoff_ms),
        }
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database.path)
            .max_connections(self.database.max_connections)
            .busy_timeout(Duration::from_millis(self.database.busy_timeout_ms))
            .sale_retry(self.retry_policy())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn valid() -> ApiConfig {
        let mut config = ApiConfig::default();
        config.auth.jwt_secret = "0123456789abcdef0123".to_string();
        config
    }

    #[test]
    fn test_defaults() {
        let config = ApiConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.sales.max_attempts, 5);
        assert!(!config.logging.json);
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
    }

    #[test]
    fn test_missing_secret_rejected() {
        assert!(matches!(ApiConfig::default().validate(), Err(ConfigError::Invalid(_))));
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn test_backoff_order_validated() {
        let mut config = valid();
        config.sales.initial_backoff_ms = 1000;
        config.sales.max_backoff_ms = 100;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: ApiConfig = toml::from_str(
            r#"
            [server]
            port = 9000

            [sales]
            max_attempts = 2
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.bind_addr, "0.0.0.0");
        assert_eq!(config.sales.max_attempts, 2);
        assert_eq!(config.sales.max_backoff_ms, 500);
        assert_eq!(config.database.busy_timeout_ms, 5000);
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("TILL_PORT", "9191"),
            ("TILL_JWT_SECRET", "from-the-environment-123"),
            ("TILL_DATABASE_PATH", "/tmp/shop.db"),
            ("TILL_LOG_JSON", "true"),
            ("TILL_SALE_MAX_ATTEMPTS", "not-a-number"),
        ]
        .into_iter()
        .collect();

        let mut config = ApiConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.server.port, 9191);
        assert_eq!(config.auth.jwt_secret, "from-the-environment-123");
        assert_eq!(config.database.path, PathBuf::from("/tmp/shop.db"));
        assert!(config.logging.json);
        assert_eq!(config.sales.max_attempts, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_retry_policy_mapping() {
        let policy = valid().retry_policy();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.initial_backoff, Duration::from_millis(10));
        assert_eq!(policy.max_backoff, Duration::from_millis(500));
    }
}
