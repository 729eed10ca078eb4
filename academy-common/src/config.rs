//! Bootstrap configuration loading
//!
//! Config file resolution follows this priority order:
//! 1. Command-line argument (highest priority)
//! 2. `ACADEMY_CONFIG` environment variable
//! 3. Platform config directory (`<config_dir>/academy/config.toml`)
//! 4. Compiled defaults (fallback, no file at all)
//!
//! A missing config file is not an error: the service starts on compiled
//! defaults and logs a warning. Storage credentials and listener settings can
//! then be supplied through the conventional environment variables, see
//! [`TomlConfig::apply_env_overrides`].

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "ACADEMY_CONFIG";

/// Bootstrap configuration loaded from TOML
///
/// Read once at startup; the process must restart to pick up changes.
#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    /// Path to the SQLite database file
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Interface the HTTP listener binds to
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// HTTP listener port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Allowed browser origin for CORS (credentials allowed). Unset means
    /// no cross-origin access.
    #[serde(default)]
    pub cors_origin: Option<String>,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive (trace, debug, info, warn, error).
    /// `RUST_LOG` takes precedence when set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Which object store backs uploaded lecture materials
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackendKind {
    #[default]
    S3,
    Filesystem,
}

/// Object storage settings for lecture material documents
///
/// Constructed explicitly and handed to the storage backend; nothing reads
/// credentials from process-wide state after startup.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackendKind,

    /// S3 access key id. When both keys are unset the AWS default
    /// credential chain is used.
    #[serde(default)]
    pub access_key: Option<String>,

    #[serde(default)]
    pub secret_key: Option<String>,

    #[serde(default)]
    pub region: Option<String>,

    /// S3 bucket holding material documents (required for the S3 backend)
    #[serde(default)]
    pub bucket: Option<String>,

    /// Root directory (required for the filesystem backend)
    #[serde(default)]
    pub root: Option<PathBuf>,
}

impl StorageConfig {
    /// Check that the selected backend has everything it needs
    pub fn validate(&self) -> Result<()> {
        match self.backend {
            StorageBackendKind::S3 => {
                if self.bucket.as_deref().map_or(true, str::is_empty) {
                    return Err(Error::Config(
                        "storage.bucket (or S3_BUCKET_NAME) is required for the s3 backend"
                            .to_string(),
                    ));
                }
                if self.access_key.is_some() != self.secret_key.is_some() {
                    return Err(Error::Config(
                        "storage.access_key and storage.secret_key must be set together"
                            .to_string(),
                    ));
                }
                Ok(())
            }
            StorageBackendKind::Filesystem => {
                if self.root.is_none() {
                    return Err(Error::Config(
                        "storage.root is required for the filesystem backend".to_string(),
                    ));
                }
                Ok(())
            }
        }
    }

    /// Static credentials, if both halves are configured
    pub fn static_credentials(&self) -> Option<(&str, &str)> {
        match (self.access_key.as_deref(), self.secret_key.as_deref()) {
            (Some(access), Some(secret)) => Some((access, secret)),
            _ => None,
        }
    }
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            bind_addr: default_bind_addr(),
            port: default_port(),
            cors_origin: None,
            logging: LoggingConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl TomlConfig {
    /// Apply overrides from the process environment
    ///
    /// Recognized: `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`, `AWS_REGION`,
    /// `S3_BUCKET_NAME`, `PORT`, `CORS_ORIGIN`.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|name| std::env::var(name).ok());
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(v) = non_empty("AWS_ACCESS_KEY_ID") {
            self.storage.access_key = Some(v);
        }
        if let Some(v) = non_empty("AWS_SECRET_ACCESS_KEY") {
            self.storage.secret_key = Some(v);
        }
        if let Some(v) = non_empty("AWS_REGION") {
            self.storage.region = Some(v);
        }
        if let Some(v) = non_empty("S3_BUCKET_NAME") {
            self.storage.bucket = Some(v);
        }
        if let Some(v) = non_empty("CORS_ORIGIN") {
            self.cors_origin = Some(v);
        }
        if let Some(v) = non_empty("PORT") {
            match v.parse::<u16>() {
                Ok(port) => self.port = port,
                Err(_) => warn!("Ignoring invalid PORT value '{}'", v),
            }
        }
    }
}

fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("academy").join("academy.db"))
        .unwrap_or_else(|| PathBuf::from("./academy_data/academy.db"))
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Locate the config file to use, if any
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    dirs::config_dir()
        .map(|d| d.join("academy").join("config.toml"))
        .filter(|p| p.exists())
}

/// Parse a config file
pub fn load_config_file(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content).map_err(|source| Error::ConfigParse {
        path: path.display().to_string(),
        source,
    })
}

/// Resolve, load and environment-override the bootstrap configuration
///
/// A resolved path that does not exist degrades to compiled defaults; a file
/// that exists but fails to parse is an error.
pub fn load_config(cli_arg: Option<&Path>) -> Result<TomlConfig> {
    let mut config = match resolve_config_path(cli_arg) {
        Some(path) if path.exists() => {
            info!("Loading configuration from {}", path.display());
            load_config_file(&path)?
        }
        Some(path) => {
            warn!(
                "Config file {} not found, using compiled defaults",
                path.display()
            );
            TomlConfig::default()
        }
        None => {
            warn!("No config file found, using compiled defaults");
            TomlConfig::default()
        }
    };

    config.apply_env_overrides();
    Ok(config)
}
