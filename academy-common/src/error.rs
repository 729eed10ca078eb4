//! Error type shared by the academy crates

use thiserror::Error;

/// Result alias over [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Failures raised by configuration loading and database setup
#[derive(Error, Debug)]
pub enum Error {
    /// sqlx query or connection failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Filesystem failure while reading config or creating the database directory
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file exists but is not valid TOML for [`crate::config::TomlConfig`]
    #[error("Config parse error in {path}: {source}")]
    ConfigParse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    /// Semantically invalid configuration (e.g. S3 backend without a bucket)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A referenced row does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller-supplied value rejected before touching the database
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
