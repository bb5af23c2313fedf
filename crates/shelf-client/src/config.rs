//! # Client Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     SHELF_API_URL=https://shelf.example.com/graphql                    │
//! │     SHELF_AUTH_TOKEN=eyJhbGciOi...                                      │
//! │     SHELF_DB_PATH=/tmp/shelf.db                                        │
//! │     SHELF_QUEUE_CAPACITY=512                                           │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/shelf/client.toml (Linux)                                │
//! │     ~/Library/Application Support/com.shelf.books/client.toml (macOS)  │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     http://localhost:3001/graphql, no token, platform data dir         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [api]
//! endpoint = "https://shelf.example.com/graphql"
//! timeout_secs = 10
//! token = "eyJhbGciOi..."
//!
//! [storage]
//! database_path = "/home/me/.local/share/shelf/shelf.db"
//!
//! [persist]
//! queue_capacity = 256
//! max_attempts = 3
//! retry_backoff_ms = 50
//! max_backoff_ms = 2000
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{ClientError, ClientResult};

const CONFIG_FILE: &str = "client.toml";
const DATABASE_FILE: &str = "shelf.db";

// =============================================================================
// API Settings
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiSettings {
    /// GraphQL endpoint. Must be http or https.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Per-request timeout.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Session token sent as `Authorization: Bearer <token>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

fn default_endpoint() -> String {
    "http://localhost:3001/graphql".to_string()
}

fn default_timeout() -> u64 {
    10
}

impl Default for ApiSettings {
    fn default() -> Self {
        ApiSettings {
            endpoint: default_endpoint(),
            timeout_secs: default_timeout(),
            token: None,
        }
    }
}

// =============================================================================
// Storage Settings
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Offline store file. `None` uses the platform data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,
}

// =============================================================================
// Persist Settings
// =============================================================================

/// Offline write queue tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistSettings {
    /// Writes buffered before enqueue starts failing.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Attempts per write, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry; later retries back off exponentially.
    #[serde(default = "default_retry_backoff")]
    pub retry_backoff_ms: u64,

    /// Upper bound for a single retry delay.
    #[serde(default = "default_max_backoff")]
    pub max_backoff_ms: u64,
}

fn default_queue_capacity() -> usize {
    256
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_backoff() -> u64 {
    50
}

fn default_max_backoff() -> u64 {
    2000
}

impl Default for PersistSettings {
    fn default() -> Self {
        PersistSettings {
            queue_capacity: default_queue_capacity(),
            max_attempts: default_max_attempts(),
            retry_backoff_ms: default_retry_backoff(),
            max_backoff_ms: default_max_backoff(),
        }
    }
}

impl PersistSettings {
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }
}

// =============================================================================
// Main Client Configuration
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub api: ApiSettings,

    #[serde(default)]
    pub storage: StorageSettings,

    #[serde(default)]
    pub persist: PersistSettings,
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (client.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ClientResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading client config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns defaults (with env overrides) if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load client config: {}. Using defaults.", e);
            let mut config = Self::default();
            config.apply_env_overrides();
            config
        })
    }

    pub fn save(&self, config_path: Option<PathBuf>) -> ClientResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ClientError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ClientError::ConfigSaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| ClientError::ConfigSaveFailed(e.to_string()))?;

        info!(?path, "Client config saved");
        Ok(())
    }

    pub fn validate(&self) -> ClientResult<()> {
        self.endpoint_url()?;

        if self.api.timeout_secs == 0 {
            return Err(ClientError::InvalidConfig(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        if self.persist.queue_capacity == 0 {
            return Err(ClientError::InvalidConfig(
                "queue_capacity must be greater than 0".into(),
            ));
        }

        if self.persist.max_attempts == 0 {
            return Err(ClientError::InvalidConfig(
                "max_attempts must be greater than 0".into(),
            ));
        }

        if self.persist.max_backoff_ms < self.persist.retry_backoff_ms {
            return Err(ClientError::InvalidConfig(
                "max_backoff_ms must not be less than retry_backoff_ms".into(),
            ));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("SHELF_API_URL") {
            debug!(url = %url, "Overriding API endpoint from environment");
            self.api.endpoint = url;
        }

        if let Ok(token) = std::env::var("SHELF_AUTH_TOKEN") {
            debug!("Overriding auth token from environment");
            self.api.token = Some(token).filter(|t| !t.is_empty());
        }

        if let Ok(path) = std::env::var("SHELF_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.storage.database_path = Some(PathBuf::from(path));
        }

        if let Ok(capacity) = std::env::var("SHELF_QUEUE_CAPACITY") {
            match capacity.parse::<usize>() {
                Ok(c) => self.persist.queue_capacity = c,
                Err(_) => warn!(value = %capacity, "Ignoring invalid SHELF_QUEUE_CAPACITY"),
            }
        }
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "shelf", "books")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Parsed endpoint; only http and https are accepted.
    pub fn endpoint_url(&self) -> ClientResult<Url> {
        let url = Url::parse(&self.api.endpoint)?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ClientError::InvalidUrl(format!(
                "Endpoint must use http:// or https://, got: {}://",
                other
            ))),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    /// Configured database file, else `<data dir>/shelf.db`.
    pub fn database_path(&self) -> Option<PathBuf> {
        self.storage.database_path.clone().or_else(|| {
            directories::ProjectDirs::from("com", "shelf", "books")
                .map(|dirs| dirs.data_dir().join(DATABASE_FILE))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.persist.queue_capacity, 256);
        assert_eq!(config.persist.max_attempts, 3);
        assert_eq!(config.persist.retry_backoff(), Duration::from_millis(50));
        assert_eq!(config.persist.max_backoff(), Duration::from_secs(2));
        assert!(config.api.token.is_none());
    }

    #[test]
    fn test_endpoint_validation() {
        let mut config = ClientConfig::default();

        config.api.endpoint = "ws://localhost:3001/graphql".into();
        assert!(matches!(config.validate(), Err(ClientError::InvalidUrl(_))));

        config.api.endpoint = "not a url".into();
        assert!(config.validate().is_err());

        config.api.endpoint = "https://shelf.example.com/graphql".into();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_limits_rejected() {
        let mut config = ClientConfig::default();
        config.persist.queue_capacity = 0;
        assert!(config.validate().is_err());

        let mut config = ClientConfig::default();
        config.persist.max_attempts = 0;
        assert!(config.validate().is_err());

        let mut config = ClientConfig::default();
        config.api.timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = ClientConfig::default();
        config.persist.max_backoff_ms = config.persist.retry_backoff_ms - 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: ClientConfig = toml::from_str(
            r#"
            [api]
            endpoint = "https://books.example.org/graphql"

            [persist]
            max_attempts = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.api.endpoint, "https://books.example.org/graphql");
        assert_eq!(config.api.timeout_secs, 10);
        assert_eq!(config.persist.max_attempts, 5);
        assert_eq!(config.persist.queue_capacity, 256);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = std::env::temp_dir().join(format!("shelf-config-{}", std::process::id()));
        let path = dir.join("client.toml");

        let mut config = ClientConfig::default();
        config.api.endpoint = "https://books.example.org/graphql".into();
        config.storage.database_path = Some(PathBuf::from("/tmp/shelf.db"));
        config.save(Some(path.clone())).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("[api]"));
        assert!(contents.contains("[persist]"));

        let loaded: ClientConfig = toml::from_str(&contents).unwrap();
        assert_eq!(loaded, config);

        std::fs::remove_dir_all(&dir).ok();
    }
}
