//! Server configuration
//!
//! Stripe settings are read by `clinic-billing`; this covers the process
//! itself: database, bind address, cookie naming and feature toggles.

use std::fmt;

use clinic_shared::db::DEFAULT_MAX_CONNECTIONS;
use clinic_shared::env::non_empty;

pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";
pub const DEFAULT_COOKIE_PREFIX: &str = "better-auth";
pub const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000,http://127.0.0.1:3000";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} has an invalid value: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_address: String,
    pub database_max_connections: u32,
    pub run_migrations: bool,
    pub enable_billing: bool,
    /// Cookie name prefix used by the auth service (`{prefix}.session_token`)
    pub session_cookie_prefix: String,
    /// Include provider error detail in 500 bodies
    pub expose_error_detail: bool,
    pub allowed_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| non_empty(&lookup, key);

        let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let database_max_connections = match get("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => raw.parse::<u32>().map_err(|_| ConfigError::Invalid {
                key: "DATABASE_MAX_CONNECTIONS",
                value: raw.clone(),
            })?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let allowed_origins = get("ALLOWED_ORIGINS")
            .unwrap_or_else(|| DEFAULT_ALLOWED_ORIGINS.to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            database_url,
            bind_address: get("BIND_ADDRESS").unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string()),
            database_max_connections,
            run_migrations: parse_flag("RUN_MIGRATIONS", get("RUN_MIGRATIONS"), false)?,
            enable_billing: parse_flag("ENABLE_BILLING", get("ENABLE_BILLING"), true)?,
            session_cookie_prefix: get("SESSION_COOKIE_PREFIX")
                .unwrap_or_else(|| DEFAULT_COOKIE_PREFIX.to_string()),
            expose_error_detail: parse_flag(
                "EXPOSE_ERROR_DETAIL",
                get("EXPOSE_ERROR_DETAIL"),
                cfg!(debug_assertions),
            )?,
            allowed_origins,
        })
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &"[redacted]")
            .field("bind_address", &self.bind_address)
            .field("database_max_connections", &self.database_max_connections)
            .field("run_migrations", &self.run_migrations)
            .field("enable_billing", &self.enable_billing)
            .field("session_cookie_prefix", &self.session_cookie_prefix)
            .field("expose_error_detail", &self.expose_error_detail)
            .field("allowed_origins", &self.allowed_origins)
            .finish()
    }
}

fn parse_flag(key: &'static str, raw: Option<String>, default: bool) -> Result<bool, ConfigError> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid { key, value: raw }),
    }
}
