//! Application configuration structs
//!
//! Loads configuration from environment variables (and a `.env` file if present).

use serde::Deserialize;
use std::env;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub endpoint: EndpointConfig,
    pub liveness: LivenessConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_env")]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "production" => Some(Self::Production),
            "staging" => Some(Self::Staging),
            "development" => Some(Self::Development),
            _ => None,
        }
    }
}

/// Where the persistent connection lives (shared by client and gateway)
#[derive(Debug, Clone, Deserialize)]
pub struct EndpointConfig {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
    /// Use `wss` instead of `ws`
    #[serde(default)]
    pub secure: bool,
    #[serde(default = "default_path")]
    pub path: String,
}

impl EndpointConfig {
    /// Socket address to bind or connect to
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Ping / reconnect timing, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct LivenessConfig {
    #[serde(default = "default_ping_interval_ms")]
    pub ping_interval_ms: u64,
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
    #[serde(default = "default_pong_timeout_ms")]
    pub pong_timeout_ms: u64,
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self {
            ping_interval_ms: default_ping_interval_ms(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
            pong_timeout_ms: default_pong_timeout_ms(),
        }
    }
}

impl LivenessConfig {
    #[must_use]
    pub fn ping_interval(&self) -> Duration {
        Duration::from_millis(self.ping_interval_ms)
    }

    #[must_use]
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    #[must_use]
    pub fn pong_timeout(&self) -> Duration {
        Duration::from_millis(self.pong_timeout_ms)
    }
}

// Default value functions
fn default_app_name() -> String {
    "tether".to_string()
}

fn default_env() -> Environment {
    Environment::Development
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_path() -> String {
    "/ws".to_string()
}

fn default_ping_interval_ms() -> u64 {
    25_000
}

fn default_reconnect_delay_ms() -> u64 {
    5_000
}

fn default_pong_timeout_ms() -> u64 {
    2_000
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if required environment variables are missing or malformed
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    ///
    /// `from_env` is this with `std::env::var`; tests pass a map instead.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let liveness = LivenessConfig {
            ping_interval_ms: parse_millis(&lookup, "TETHER_PING_INTERVAL_MS")?
                .unwrap_or_else(default_ping_interval_ms),
            reconnect_delay_ms: parse_millis(&lookup, "TETHER_RECONNECT_DELAY_MS")?
                .unwrap_or_else(default_reconnect_delay_ms),
            pong_timeout_ms: parse_millis(&lookup, "TETHER_PONG_TIMEOUT_MS")?
                .unwrap_or_else(default_pong_timeout_ms),
        };

        Ok(Self {
            app: AppSettings {
                name: lookup("APP_NAME").unwrap_or_else(default_app_name),
                env: lookup("APP_ENV")
                    .and_then(|s| Environment::parse(&s))
                    .unwrap_or_default(),
            },
            endpoint: EndpointConfig {
                host: lookup("TETHER_HOST").unwrap_or_else(default_host),
                port: lookup("TETHER_PORT")
                    .ok_or(ConfigError::MissingVar("TETHER_PORT"))?
                    .parse()
                    .map_err(|_| invalid(&lookup, "TETHER_PORT"))?,
                secure: match lookup("TETHER_SECURE") {
                    Some(value) => parse_bool(&value)
                        .ok_or(ConfigError::InvalidValue("TETHER_SECURE", value))?,
                    None => false,
                },
                path: lookup("TETHER_PATH").unwrap_or_else(default_path),
            },
            liveness,
        })
    }
}

fn parse_millis<F>(lookup: &F, key: &'static str) -> Result<Option<u64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    match raw.trim().parse::<u64>() {
        Ok(0) | Err(_) => Err(ConfigError::InvalidValue(key, raw)),
        Ok(ms) => Ok(Some(ms)),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn invalid<F>(lookup: &F, key: &'static str) -> ConfigError
where
    F: Fn(&str) -> Option<String>,
{
    ConfigError::InvalidValue(key, lookup(key).unwrap_or_default())
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
