//! Configuration management for letterfetch.
//!
//! A single config file holds the stored credentials, the Ocean host, and the
//! output-directory preference. Supports TOML, YAML, and JSON based on file
//! extension, with TOML as the default format.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default Ocean host used when none is configured.
pub const DEFAULT_OCEAN_HOST: &str = "https://staging.cognisantmd.com";

/// Default delay between letter requests in milliseconds.
pub const DEFAULT_REQUEST_DELAY_MS: u64 = 2000;

/// Default request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// OAuth2 client credentials for the Ocean API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

/// Errors raised while loading or saving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("Failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to serialize config: {0}")]
    Serialize(String),
}

/// Persisted configuration.
///
/// All fields are optional; [`Config::settings`] resolves them against
/// defaults. Unknown fields in the file are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Stored API credentials.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Credentials>,
    /// Base URL of the Ocean API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocean_host: Option<String>,
    /// Directory letters are written to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<String>,
    /// Delay between letter requests in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_delay_ms: Option<u64>,
    /// Request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<u64>,
    /// Path this config was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

/// Runtime settings resolved from [`Config`] plus defaults.
#[derive(Debug, Clone)]
pub struct Settings {
    pub ocean_host: String,
    pub output_dir: PathBuf,
    pub request_delay: Duration,
    pub request_timeout: Duration,
}

impl Config {
    /// Load configuration from an explicit path or the default location.
    ///
    /// A missing file yields the default (empty) config; a file that exists
    /// but cannot be read or parsed is an error.
    pub async fn load(path_override: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path_override {
            Some(p) => p.to_path_buf(),
            None => default_config_path(),
        };

        if !path.exists() {
            return Ok(Self::default());
        }

        Self::load_from_path(&path).await
    }

    /// Load configuration from a specific file path.
    /// Supports TOML, YAML, and JSON based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

        let parse_err = |e: String| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e,
        };

        let mut config: Config = match ext {
            "yaml" | "yml" => serde_yaml::from_str(&contents).map_err(|e| parse_err(e.to_string()))?,
            "json" => serde_json::from_str(&contents).map_err(|e| parse_err(e.to_string()))?,
            _ => toml::from_str(&contents).map_err(|e| parse_err(e.to_string()))?,
        };

        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Persist configuration to `path`, creating parent directories.
    /// The serialization format follows the file extension, defaulting to TOML.
    pub async fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |source: std::io::Error| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
        }

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

        let contents = match ext {
            "yaml" | "yml" => serde_yaml::to_string(self)
                .map_err(|e| ConfigError::Serialize(e.to_string()))?,
            "json" => serde_json::to_string_pretty(self)
                .map_err(|e| ConfigError::Serialize(e.to_string()))?,
            _ => toml::to_string_pretty(self)
                .map_err(|e| ConfigError::Serialize(e.to_string()))?,
        };

        tokio::fs::write(path, contents).await.map_err(write_err)
    }

    /// Stored credentials, if any.
    ///
    /// `LETTERFETCH_CLIENT_ID` / `LETTERFETCH_CLIENT_SECRET` override the file
    /// when both are set.
    pub fn credentials(&self) -> Option<Credentials> {
        let id = std::env::var("LETTERFETCH_CLIENT_ID").ok();
        let secret = std::env::var("LETTERFETCH_CLIENT_SECRET").ok();
        if let (Some(client_id), Some(client_secret)) = (id, secret) {
            return Some(Credentials {
                client_id,
                client_secret,
            });
        }

        self.credentials.clone()
    }

    /// Resolve runtime settings against defaults.
    pub fn settings(&self) -> Settings {
        let ocean_host = self
            .ocean_host
            .as_deref()
            .unwrap_or(DEFAULT_OCEAN_HOST)
            .trim_end_matches('/')
            .to_string();

        let output_dir = match self.output_dir.as_deref() {
            Some(dir) => PathBuf::from(shellexpand::tilde(dir).as_ref()),
            None => default_output_dir(),
        };

        Settings {
            ocean_host,
            output_dir,
            request_delay: Duration::from_millis(
                self.request_delay_ms.unwrap_or(DEFAULT_REQUEST_DELAY_MS),
            ),
            request_timeout: Duration::from_secs(
                self.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            ),
        }
    }
}

/// Default config file location.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("letterfetch")
        .join("letterfetch.toml")
}

/// Default output directory.
/// Falls back gracefully: Downloads dir -> Home dir -> Current dir.
fn default_output_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}
