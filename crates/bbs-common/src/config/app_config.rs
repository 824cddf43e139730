//! Application configuration structs
//!
//! Loads configuration from environment variables and an optional .env file.

use serde::Deserialize;
use std::env;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub session: SessionConfig,
    pub hub: HubConfig,
    pub rate_limit: RateLimitConfig,
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
}

/// Server configuration (one process hosts both transports)
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Session registry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Inactivity timeout before the sweep evicts a session, in seconds
    #[serde(default = "default_session_timeout")]
    pub timeout_secs: u64,
    /// Sweep tick interval, in seconds
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

/// Notification hub configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HubConfig {
    /// Interval between server heartbeat pings, in milliseconds
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval_ms: u64,
    /// Missing-ack window before a connection is treated as dead
    #[serde(default = "default_heartbeat_timeout")]
    pub heartbeat_timeout_ms: u64,
    /// Grace period for a connection to identify before force-close
    #[serde(default = "default_auth_grace")]
    pub auth_grace_ms: u64,
    /// Coalescing window for outbound event batches
    #[serde(default = "default_batch_window")]
    pub batch_window_ms: u64,
    /// Maximum events per outbound frame
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
    /// Maximum subscriptions held per connection
    #[serde(default = "default_max_subscriptions")]
    pub max_subscriptions: usize,
}

/// One fixed-window limiter rule: at most `max` operations per `window_secs`
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RateLimitRule {
    pub max: u32,
    pub window_secs: u64,
}

/// Rate limiting configuration, one rule per throttled surface
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_message_rule")]
    pub message_post: RateLimitRule,
    #[serde(default = "default_door_input_rule")]
    pub door_input: RateLimitRule,
    #[serde(default = "default_subscription_rule")]
    pub subscription_change: RateLimitRule,
    /// Transport-level HTTP limit (governor middleware), requests per second
    #[serde(default = "default_http_rps")]
    pub http_requests_per_second: u64,
    /// Transport-level HTTP burst allowance
    #[serde(default = "default_http_burst")]
    pub http_burst: u32,
}

// Default value functions
fn default_app_name() -> String {
    "bbs-host".to_string()
}

fn default_env() -> Environment {
    Environment::Development
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_max_connections() -> u32 {
    20
}

fn default_min_connections() -> u32 {
    5
}

fn default_session_timeout() -> u64 {
    1800 // 30 minutes
}

fn default_sweep_interval() -> u64 {
    60
}

fn default_heartbeat_interval() -> u64 {
    45_000
}

fn default_heartbeat_timeout() -> u64 {
    90_000
}

fn default_auth_grace() -> u64 {
    30_000
}

fn default_batch_window() -> u64 {
    100
}

fn default_max_batch_size() -> usize {
    25
}

fn default_max_subscriptions() -> usize {
    16
}

fn default_message_rule() -> RateLimitRule {
    RateLimitRule {
        max: 10,
        window_secs: 60,
    }
}

fn default_door_input_rule() -> RateLimitRule {
    RateLimitRule {
        max: 30,
        window_secs: 60,
    }
}

fn default_subscription_rule() -> RateLimitRule {
    RateLimitRule {
        max: 20,
        window_secs: 60,
    }
}

fn default_http_rps() -> u64 {
    50
}

fn default_http_burst() -> u32 {
    100
}

fn env_parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.parse().ok())
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if required environment variables are missing
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Ok(Self {
            app: AppSettings {
                name: env::var("APP_NAME").unwrap_or_else(|_| default_app_name()),
                env: env::var("APP_ENV")
                    .ok()
                    .and_then(|s| match s.to_lowercase().as_str() {
                        "production" => Some(Environment::Production),
                        "staging" => Some(Environment::Staging),
                        "development" => Some(Environment::Development),
                        _ => None,
                    })
                    .unwrap_or_default(),
            },
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| default_host()),
                port: env_parsed("SERVER_PORT").ok_or(ConfigError::MissingVar("SERVER_PORT"))?,
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL")
                    .map_err(|_| ConfigError::MissingVar("DATABASE_URL"))?,
                max_connections: env_parsed("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or_else(default_max_connections),
                min_connections: env_parsed("DATABASE_MIN_CONNECTIONS")
                    .unwrap_or_else(default_min_connections),
            },
            session: SessionConfig {
                timeout_secs: env_parsed("SESSION_TIMEOUT_SECS")
                    .unwrap_or_else(default_session_timeout),
                sweep_interval_secs: env_parsed("SESSION_SWEEP_INTERVAL_SECS")
                    .unwrap_or_else(default_sweep_interval),
            },
            hub: HubConfig {
                heartbeat_interval_ms: env_parsed("HUB_HEARTBEAT_INTERVAL_MS")
                    .unwrap_or_else(default_heartbeat_interval),
                heartbeat_timeout_ms: env_parsed("HUB_HEARTBEAT_TIMEOUT_MS")
                    .unwrap_or_else(default_heartbeat_timeout),
                auth_grace_ms: env_parsed("HUB_AUTH_GRACE_MS").unwrap_or_else(default_auth_grace),
                batch_window_ms: env_parsed("HUB_BATCH_WINDOW_MS")
                    .unwrap_or_else(default_batch_window),
                max_batch_size: env_parsed("HUB_MAX_BATCH_SIZE")
                    .unwrap_or_else(default_max_batch_size),
                max_subscriptions: env_parsed("HUB_MAX_SUBSCRIPTIONS")
                    .unwrap_or_else(default_max_subscriptions),
            },
            rate_limit: RateLimitConfig {
                message_post: RateLimitRule {
                    max: env_parsed("RATE_LIMIT_MESSAGE_MAX")
                        .unwrap_or(default_message_rule().max),
                    window_secs: env_parsed("RATE_LIMIT_MESSAGE_WINDOW_SECS")
                        .unwrap_or(default_message_rule().window_secs),
                },
                door_input: RateLimitRule {
                    max: env_parsed("RATE_LIMIT_DOOR_MAX")
                        .unwrap_or(default_door_input_rule().max),
                    window_secs: env_parsed("RATE_LIMIT_DOOR_WINDOW_SECS")
                        .unwrap_or(default_door_input_rule().window_secs),
                },
                subscription_change: RateLimitRule {
                    max: env_parsed("RATE_LIMIT_SUBSCRIPTION_MAX")
                        .unwrap_or(default_subscription_rule().max),
                    window_secs: env_parsed("RATE_LIMIT_SUBSCRIPTION_WINDOW_SECS")
                        .unwrap_or(default_subscription_rule().window_secs),
                },
                http_requests_per_second: env_parsed("RATE_LIMIT_HTTP_RPS")
                    .unwrap_or_else(default_http_rps),
                http_burst: env_parsed("RATE_LIMIT_HTTP_BURST").unwrap_or_else(default_http_burst),
            },
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
