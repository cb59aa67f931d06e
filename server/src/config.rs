//! Server configuration read from the environment.
//!
//! | Variable | Default | Meaning |
//! |---|---|---|
//! | `HOST` | `127.0.0.1` | bind address |
//! | `PORT` | `3000` | bind port |
//! | `BASE_PATH` | `/api/v1` | prefix for every route (`/` for none) |
//! | `STORAGE_MODE` | `in_memory` | `in_memory` or `sqlite` |
//! | `DATABASE_URL` | unset | required when `STORAGE_MODE=sqlite` |
//! | `DATABASE_MAX_CONNECTIONS` | `5` | SQLite pool size |

use thiserror::Error;

pub const DEFAULT_BASE_PATH: &str = "/api/v1";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("PORT must be a number between 0 and 65535, got {0:?}")]
    InvalidPort(String),

    #[error("STORAGE_MODE must be `in_memory` or `sqlite`, got {0:?}")]
    UnknownStorageMode(String),

    #[error("DATABASE_URL is required when STORAGE_MODE=sqlite")]
    MissingDatabaseUrl,

    #[error("DATABASE_MAX_CONNECTIONS must be a positive number, got {0:?}")]
    InvalidMaxConnections(String),

    #[error("BASE_PATH must start with `/` and not end with `/`, got {0:?}")]
    InvalidBasePath(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    InMemory,
    Sqlite { url: String, max_connections: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Empty string means routes are mounted at the root.
    pub base_path: String,
    pub storage: StorageConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            base_path: DEFAULT_BASE_PATH.to_string(),
            storage: StorageConfig::InMemory,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let host = get("HOST").unwrap_or(defaults.host);

        let port = match get("PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidPort(raw))?,
            None => defaults.port,
        };

        let base_path = match get("BASE_PATH") {
            Some(raw) if raw == "/" => String::new(),
            Some(raw) if raw.starts_with('/') && !raw.ends_with('/') => raw,
            Some(raw) => return Err(ConfigError::InvalidBasePath(raw)),
            None => defaults.base_path,
        };

        let storage = match get("STORAGE_MODE").as_deref() {
            None | Some("in_memory") => StorageConfig::InMemory,
            Some("sqlite") => {
                let url = get("DATABASE_URL").ok_or(ConfigError::MissingDatabaseUrl)?;
                let max_connections = match get("DATABASE_MAX_CONNECTIONS") {
                    Some(raw) => raw
                        .parse::<u32>()
                        .ok()
                        .filter(|n| *n > 0)
                        .ok_or(ConfigError::InvalidMaxConnections(raw))?,
                    None => 5,
                };
                StorageConfig::Sqlite {
                    url,
                    max_connections,
                }
            }
            Some(other) => return Err(ConfigError::UnknownStorageMode(other.to_string())),
        };

        Ok(Self {
            host,
            port,
            base_path,
            storage,
        })
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
