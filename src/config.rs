//! Server configuration.

use std::path::Path;

use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// File read when no `--config` path is given.
pub const DEFAULT_CONFIG_FILE: &str = "daily_wordle.toml";

/// Environment variable that overrides the database path.
pub const DATABASE_URL_VAR: &str = "DATABASE_URL";

/// Where game data lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
pub enum StorageMode {
    /// SQLite file through diesel.
    #[display("sqlite")]
    Sqlite,
    /// Process memory, lost on exit.
    #[display("memory")]
    Memory,
}

/// Configuration for the HTTP game server.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind.
    #[serde(default = "default_host")]
    host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    port: u16,

    /// SQLite database file.
    #[serde(default = "default_db_path")]
    db_path: String,

    /// Storage backend.
    #[serde(default = "default_storage")]
    storage: StorageMode,

    /// Create default accounts and words on startup.
    #[serde(default = "default_seed")]
    seed_defaults: bool,
}

#[instrument]
fn default_host() -> String {
    "127.0.0.1".to_string()
}

#[instrument]
fn default_port() -> u16 {
    8080
}

#[instrument]
fn default_db_path() -> String {
    "daily_wordle.db".to_string()
}

#[instrument]
fn default_storage() -> StorageMode {
    StorageMode::Sqlite
}

#[instrument]
fn default_seed() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            db_path: default_db_path(),
            storage: default_storage(),
            seed_defaults: default_seed(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from a TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;
        Self::from_toml(&content)
    }

    /// Parses configuration from TOML text. Missing keys take defaults.
    #[instrument(skip(content))]
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        info!(host = %config.host, port = config.port, storage = %config.storage, "Config loaded");
        Ok(config)
    }

    /// Loads `path` if given, else [`DEFAULT_CONFIG_FILE`] if it exists,
    /// else the defaults. `DATABASE_URL` then overrides the database path.
    #[instrument]
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(DEFAULT_CONFIG_FILE)?
            }
            None => {
                debug!("No config file, using defaults");
                Self::default()
            }
        };
        if let Ok(url) = std::env::var(DATABASE_URL_VAR) {
            config.apply_database_url(&url)?;
        }
        Ok(config)
    }

    /// Points the config at the database named by a `DATABASE_URL` value.
    ///
    /// Accepts a bare path or a `sqlite://` URL.
    #[instrument(skip(self))]
    pub fn apply_database_url(&mut self, url: &str) -> Result<(), ConfigError> {
        let path = url.strip_prefix("sqlite://").unwrap_or(url);
        if path.is_empty() {
            return Err(ConfigError::new(format!(
                "{} does not name a database file",
                DATABASE_URL_VAR
            )));
        }
        debug!(db_path = path, "Database path taken from environment");
        self.db_path = path.to_string();
        Ok(())
    }

    /// Replaces the bind host.
    pub fn set_host(&mut self, host: String) {
        self.host = host;
    }

    /// Replaces the bind port.
    pub fn set_port(&mut self, port: u16) {
        self.port = port;
    }

    /// Replaces the database file.
    pub fn set_db_path(&mut self, db_path: String) {
        self.db_path = db_path;
    }

    /// Replaces the storage backend.
    pub fn set_storage(&mut self, storage: StorageMode) {
        self.storage = storage;
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::new("host must not be empty".to_string()));
        }
        if self.storage == StorageMode::Sqlite && self.db_path.trim().is_empty() {
            return Err(ConfigError::new(
                "db_path must not be empty for sqlite storage".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
