//! Store configuration loaded from the environment.

use thiserror::Error;

pub const ENV_BACKEND: &str = "ARTICLES_STORE";
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
pub const ENV_MAX_CONNECTIONS: &str = "ARTICLES_DB_MAX_CONNECTIONS";
pub const ENV_MAX_PAGE_SIZE: &str = "ARTICLES_MAX_PAGE_SIZE";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown store backend `{0}` (expected `memory` or `postgres`)")]
    UnknownBackend(String),

    #[error("{0} must be set when ARTICLES_STORE=postgres")]
    MissingDatabaseUrl(&'static str),

    #[error("{name} must be a positive integer, got `{value}`")]
    InvalidNumber { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    InMemory,
    Postgres { database_url: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub max_connections: u32,
    /// Upper bound applied to caller-requested page sizes.
    pub max_page_size: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::InMemory,
            max_connections: 5,
            max_page_size: 100,
        }
    }
}

impl StoreConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (tests pass a map instead of the process env).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let backend = match lookup(ENV_BACKEND).as_deref().map(str::trim) {
            None | Some("") | Some("memory") => StoreBackend::InMemory,
            Some("postgres") => StoreBackend::Postgres {
                database_url: lookup(ENV_DATABASE_URL)
                    .filter(|url| !url.is_empty())
                    .ok_or(ConfigError::MissingDatabaseUrl(ENV_DATABASE_URL))?,
            },
            Some(other) => return Err(ConfigError::UnknownBackend(other.to_string())),
        };

        let max_connections =
            positive(&lookup, ENV_MAX_CONNECTIONS)?.unwrap_or(defaults.max_connections);
        let max_page_size = positive(&lookup, ENV_MAX_PAGE_SIZE)?.unwrap_or(defaults.max_page_size);

        Ok(Self {
            backend,
            max_connections,
            max_page_size,
        })
    }
}

fn positive(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<u32>, ConfigError> {
    let Some(value) = lookup(name) else {
        return Ok(None);
    };
    match value.trim().parse::<u32>() {
        Ok(n) if n > 0 => Ok(Some(n)),
        _ => Err(ConfigError::InvalidNumber { name, value }),
    }
}
