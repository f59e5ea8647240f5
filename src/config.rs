use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_DATABASE_NAME: &str = "secret_santa";
const MEMORY_SCHEME: &str = "memory:";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Runtime configuration, read from the environment (after `.env`).
#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub database_name: String,
    pub pool_seed_file: Option<PathBuf>,
    pub bcrypt_cost: u32,
    pub allowed_origins: Vec<String>,
    pub transaction_commit_timeout: Duration,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let host = get("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = parse_or("PORT", get("PORT"), 3002)?;

        let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let database_name = get("DATABASE_NAME")
            .or_else(|| database_name_from_uri(&database_url))
            .unwrap_or_else(|| DEFAULT_DATABASE_NAME.to_string());

        let bcrypt_cost = parse_or("BCRYPT_COST", get("BCRYPT_COST"), bcrypt::DEFAULT_COST)?
            .clamp(4, 31);

        let allowed_origins = get("ALLOWED_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_else(|| vec!["http://localhost:3000".to_string()]);

        let commit_secs = parse_or(
            "TRANSACTION_COMMIT_TIMEOUT_SECS",
            get("TRANSACTION_COMMIT_TIMEOUT_SECS"),
            10u64,
        )?;

        Ok(Self {
            host,
            port,
            database_url,
            database_name,
            pool_seed_file: get("POOL_SEED_FILE").map(PathBuf::from),
            bcrypt_cost,
            allowed_origins,
            transaction_commit_timeout: Duration::from_secs(commit_secs),
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// `DATABASE_URL=memory:` runs against the in-process store, for local use
    /// without a MongoDB replica set. Nothing survives a restart.
    pub fn uses_memory_store(&self) -> bool {
        self.database_url.starts_with(MEMORY_SCHEME)
    }
}

fn parse_or<T: std::str::FromStr>(
    key: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

/// Database name from the path segment of a MongoDB URI, if it has one.
pub fn database_name_from_uri(uri: &str) -> Option<String> {
    let rest = uri.split_once("://").map(|(_, rest)| rest)?;
    let (_, path) = rest.split_once('/')?;
    let name = path.split('?').next().unwrap_or_default();
    (!name.is_empty()).then(|| name.to_string())
}
