//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use chrono::Duration;
use std::net::SocketAddr;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

const DEFAULT_SESSION_TTL_SECS: i64 = 30 * 24 * 60 * 60;
/// Ten years.
const MAX_SESSION_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 300;

/// An account created at startup when it does not exist yet.
#[derive(Clone, Debug)]
pub struct BootstrapUser {
    pub username: String,
    pub password: String,
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    /// `None` selects the in-memory storage backend.
    pub database_url: Option<String>,
    pub log_level: Level,
    pub session_ttl: Duration,
    pub session_sweep_interval: std::time::Duration,
    pub cookie_secure: bool,
    pub allowed_origin: String,
    pub bootstrap_user: Option<BootstrapUser>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 3000)),
            database_url: None,
            log_level: Level::INFO,
            session_ttl: Duration::seconds(DEFAULT_SESSION_TTL_SECS),
            session_sweep_interval: std::time::Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
            cookie_secure: true,
            allowed_origin: "http://localhost:3000".to_string(),
            bootstrap_user: None,
        }
    }
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        // --- Server and Database Settings ---
        let bind_address = match lookup("BIND_ADDRESS") {
            Some(raw) => raw.parse::<SocketAddr>().map_err(|e| {
                ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
            })?,
            None => defaults.bind_address,
        };

        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Sessions ---
        let session_ttl = match lookup("SESSION_TTL_SECS") {
            Some(raw) => {
                let secs = parse_positive("SESSION_TTL_SECS", &raw)?;
                if secs > MAX_SESSION_TTL_SECS {
                    return Err(ConfigError::InvalidValue(
                        "SESSION_TTL_SECS".to_string(),
                        format!("'{}' exceeds the maximum of {} seconds", raw, MAX_SESSION_TTL_SECS),
                    ));
                }
                i64::try_from(secs)
                    .ok()
                    .and_then(Duration::try_seconds)
                    .ok_or_else(|| {
                        ConfigError::InvalidValue("SESSION_TTL_SECS".to_string(), raw.clone())
                    })?
            }
            None => defaults.session_ttl,
        };

        let session_sweep_interval = match lookup("SESSION_SWEEP_INTERVAL_SECS") {
            Some(raw) => std::time::Duration::from_secs(parse_positive(
                "SESSION_SWEEP_INTERVAL_SECS",
                &raw,
            )?),
            None => defaults.session_sweep_interval,
        };

        let cookie_secure = match lookup("COOKIE_SECURE") {
            Some(raw) => raw.trim().parse::<bool>().map_err(|_| {
                ConfigError::InvalidValue(
                    "COOKIE_SECURE".to_string(),
                    format!("'{}' is not true or false", raw),
                )
            })?,
            None => defaults.cookie_secure,
        };

        let allowed_origin = lookup("ALLOWED_ORIGIN").unwrap_or(defaults.allowed_origin);

        // --- Optional bootstrap account ---
        let bootstrap_user = match (lookup("BOOTSTRAP_USERNAME"), lookup("BOOTSTRAP_PASSWORD")) {
            (Some(username), Some(password)) => Some(BootstrapUser { username, password }),
            (Some(_), None) => {
                return Err(ConfigError::MissingVar("BOOTSTRAP_PASSWORD".to_string()))
            }
            (None, Some(_)) => {
                return Err(ConfigError::MissingVar("BOOTSTRAP_USERNAME".to_string()))
            }
            (None, None) => None,
        };

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            session_ttl,
            session_sweep_interval,
            cookie_secure,
            allowed_origin,
            bootstrap_user,
        })
    }
}

fn parse_positive(var: &str, raw: &str) -> Result<u64, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidValue(
            var.to_string(),
            format!("'{}' is not a positive number of seconds", raw),
        )),
    }
}
