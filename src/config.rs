use crate::cloud_storage::{S3Config, DEFAULT_COVER_BUCKET};
use crate::discogs::client::DEFAULT_TIMEOUT;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_S3_REGION: &str = "us-east-1";

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },
}

/// Application configuration
/// In debug builds: a .env file is loaded first, then the environment is read
#[derive(Clone, Debug)]
pub struct Config {
    /// Discogs personal access token. The client refuses to start without it.
    pub discogs_token: Option<String>,
    pub bind_addr: SocketAddr,
    /// Bearer token identifying the collection owner on write routes
    pub owner_token: Option<String>,
    pub discogs_timeout: Duration,
    /// Cover image storage, present only when fully configured
    pub storage: Option<S3Config>,
}

impl Config {
    /// Load configuration from the process environment
    pub fn load() -> Result<Self, ConfigError> {
        #[cfg(debug_assertions)]
        {
            if dotenvy::dotenv().is_ok() {
                tracing::info!("Config: Dev mode activated - loaded .env file");
            } else {
                debug!("Config: No .env file found, reading process environment");
            }
        }

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from any key lookup (the environment, a map in tests)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let bind_addr: SocketAddr = match get("ACES_BIND_ADDR") {
            Some(value) => value.parse().map_err(|_| ConfigError::InvalidValue {
                key: "ACES_BIND_ADDR",
                value,
            })?,
            None => DEFAULT_BIND_ADDR
                .parse()
                .map_err(|_| ConfigError::InvalidValue {
                    key: "ACES_BIND_ADDR",
                    value: DEFAULT_BIND_ADDR.to_string(),
                })?,
        };

        let discogs_timeout = match get("ACES_DISCOGS_TIMEOUT_SECS") {
            Some(value) => match value.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "ACES_DISCOGS_TIMEOUT_SECS",
                        value,
                    })
                }
            },
            None => DEFAULT_TIMEOUT,
        };

        let storage = match (
            get("ACES_S3_ACCESS_KEY_ID"),
            get("ACES_S3_SECRET_ACCESS_KEY"),
            get("ACES_STORAGE_PUBLIC_URL"),
        ) {
            (Some(access_key_id), Some(secret_access_key), Some(public_base_url)) => {
                Some(S3Config {
                    bucket_name: get("ACES_S3_BUCKET")
                        .unwrap_or_else(|| DEFAULT_COVER_BUCKET.to_string()),
                    region: get("ACES_S3_REGION")
                        .unwrap_or_else(|| DEFAULT_S3_REGION.to_string()),
                    access_key_id,
                    secret_access_key,
                    endpoint_url: get("ACES_S3_ENDPOINT_URL"),
                    public_base_url,
                })
            }
            _ => None,
        };

        let config = Self {
            discogs_token: get("DISCOGS_PERSONAL_ACCESS_TOKEN"),
            bind_addr,
            owner_token: get("ACES_OWNER_TOKEN"),
            discogs_timeout,
            storage,
        };

        debug!(
            "Config: bind {}, Discogs token {}, owner token {}, cover storage {}",
            config.bind_addr,
            if config.discogs_token.is_some() { "set" } else { "missing" },
            if config.owner_token.is_some() { "set" } else { "missing" },
            if config.storage.is_some() { "configured" } else { "disabled" },
        );

        Ok(config)
    }
}
