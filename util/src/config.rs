//! Global application configuration manager.
//!
//! `AppConfig` is a lazily initialized, globally accessible singleton containing
//! runtime configuration values loaded from environment variables. It provides
//! thread-safe access and mutation for testing or overrides in runtime environments.

use std::env;
use std::str::FromStr;
use std::sync::{OnceLock, RwLock, RwLockReadGuard};

/// Represents the complete application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: String,
    pub project_name: String,
    pub log_level: String,
    pub log_file: String,
    pub log_to_stdout: bool,
    pub database_path: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_duration_minutes: u64,
    /// Idle interval after which the write loop sends a keepalive ping.
    pub ws_ping_seconds: u64,
    /// Deadline for a single frame write (pings included).
    pub ws_write_timeout_seconds: u64,
    /// Capacity of each connection's outbound queue.
    pub ws_outbound_capacity: usize,
    /// Capacity of each of the hub's intent channels.
    pub hub_channel_capacity: usize,
}

/// Lazily-initialized, thread-safe singleton instance of `AppConfig`.
static CONFIG_INSTANCE: OnceLock<RwLock<AppConfig>> = OnceLock::new();

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            env: "development".into(),
            project_name: "rollcall".into(),
            log_level: "api=info,util=info".into(),
            log_file: "api.log".into(),
            log_to_stdout: false,
            database_path: "data/rollcall.db".into(),
            host: "127.0.0.1".into(),
            port: 3000,
            jwt_secret: String::new(),
            jwt_duration_minutes: 60,
            ws_ping_seconds: 54,
            ws_write_timeout_seconds: 10,
            ws_outbound_capacity: 256,
            hub_channel_capacity: 1024,
        }
    }
}

impl AppConfig {
    /// Loads the configuration from `.env` and environment variables.
    ///
    /// Missing keys fall back to [`AppConfig::default`]. Values that fail to
    /// parse are logged and replaced by their default. An empty `jwt_secret`
    /// is left for the binary to reject at startup.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        Self {
            env: env::var("APP_ENV").unwrap_or(defaults.env),
            project_name: env::var("PROJECT_NAME").unwrap_or(defaults.project_name),
            log_level: env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
            log_file: env::var("LOG_FILE").unwrap_or(defaults.log_file),
            log_to_stdout: env::var("LOG_TO_STDOUT")
                .map(|v| v == "true")
                .unwrap_or(defaults.log_to_stdout),
            database_path: env::var("DATABASE_PATH").unwrap_or(defaults.database_path),
            host: env::var("HOST").unwrap_or(defaults.host),
            port: parse_or("PORT", defaults.port),
            jwt_secret: env::var("JWT_SECRET").unwrap_or(defaults.jwt_secret),
            jwt_duration_minutes: parse_or("JWT_DURATION_MINUTES", defaults.jwt_duration_minutes),
            ws_ping_seconds: parse_or("WS_PING_SECONDS", defaults.ws_ping_seconds),
            ws_write_timeout_seconds: parse_or(
                "WS_WRITE_TIMEOUT_SECONDS",
                defaults.ws_write_timeout_seconds,
            ),
            ws_outbound_capacity: parse_or("WS_OUTBOUND_CAPACITY", defaults.ws_outbound_capacity)
                .max(1),
            hub_channel_capacity: parse_or("HUB_CHANNEL_CAPACITY", defaults.hub_channel_capacity)
                .max(1),
        }
    }

    fn lock() -> &'static RwLock<AppConfig> {
        CONFIG_INSTANCE.get_or_init(|| RwLock::new(AppConfig::from_env()))
    }

    /// Returns a shared reference to the global configuration.
    ///
    /// A poisoned lock is recovered: configuration writes are plain field
    /// assignments and cannot leave the struct half-updated.
    pub fn global() -> RwLockReadGuard<'static, AppConfig> {
        Self::lock()
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Returns an owned copy of the global configuration.
    pub fn snapshot() -> AppConfig {
        Self::global().clone()
    }

    /// Resets the configuration by reloading from environment variables.
    ///
    /// Useful in tests to clear overrides.
    pub fn reset() {
        Self::set_field(|cfg| *cfg = AppConfig::from_env());
    }

    /// Generic internal setter for any field in the config.
    fn set_field<F>(setter: F)
    where
        F: FnOnce(&mut AppConfig),
    {
        let mut guard = Self::lock()
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        setter(&mut guard);
    }

    // --- Per-field setters below ---

    pub fn set_env(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.env = value.into());
    }

    pub fn set_log_level(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.log_level = value.into());
    }

    pub fn set_log_to_stdout(value: bool) {
        AppConfig::set_field(|cfg| cfg.log_to_stdout = value);
    }

    pub fn set_database_path(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.database_path = value.into());
    }

    pub fn set_host(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.host = value.into());
    }

    pub fn set_port(value: u16) {
        AppConfig::set_field(|cfg| cfg.port = value);
    }

    pub fn set_jwt_secret(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.jwt_secret = value.into());
    }

    pub fn set_jwt_duration_minutes(value: u64) {
        AppConfig::set_field(|cfg| cfg.jwt_duration_minutes = value);
    }

    pub fn set_ws_ping_seconds(value: u64) {
        AppConfig::set_field(|cfg| cfg.ws_ping_seconds = value);
    }

    pub fn set_ws_write_timeout_seconds(value: u64) {
        AppConfig::set_field(|cfg| cfg.ws_write_timeout_seconds = value);
    }

    pub fn set_ws_outbound_capacity(value: usize) {
        AppConfig::set_field(|cfg| cfg.ws_outbound_capacity = value.max(1));
    }
}

fn parse_or<T>(key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display + Copy,
{
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, default = %default, "invalid config value; using default");
            default
        }),
        Err(_) => default,
    }
}
