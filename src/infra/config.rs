//! Centralized configuration (environment variables + defaults).

use crate::error::ConfigError;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Postgres connection string. When unset the server runs on in-memory storage.
    pub database_url: Option<String>,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub service: ServiceConfig,
}

/// Knobs read by the store record manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Commit attempts per write before giving up on finding a free slug.
    pub slug_retry_limit: u32,
    pub top_stores_limit: usize,
    pub search_limit: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            slug_retry_limit: 5,
            top_stores_limit: crate::domain::aggregate::TOP_STORES_LIMIT,
            search_limit: 5,
        }
    }
}

impl AppConfig {
    /// Loads `.env` (if present) and reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ServiceConfig::default();
        let database_url = lookup("DATABASE_URL").filter(|v| !v.trim().is_empty());
        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

        Ok(Self {
            database_url,
            bind_addr,
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 5u32, "u32")?.max(1),
            service: ServiceConfig {
                slug_retry_limit: parse_or(&lookup, "SLUG_RETRY_LIMIT", defaults.slug_retry_limit, "u32")?
                    .max(1),
                top_stores_limit: parse_or(&lookup, "TOP_STORES_LIMIT", defaults.top_stores_limit, "usize")?,
                search_limit: parse_or(&lookup, "SEARCH_LIMIT", defaults.search_limit, "usize")?,
            },
        })
    }
}

fn parse_or<F, T>(
    lookup: &F,
    name: &'static str,
    default: T,
    expected: &'static str,
) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        None => Ok(default),
        Some(value) => value.trim().parse::<T>().map_err(|_| ConfigError::Invalid {
            name,
            expected,
            value,
        }),
    }
}
