//! Object storage for lecture material documents
//!
//! The backend is chosen from [`StorageConfig`] at startup and injected into
//! the application state; handlers and the note pipeline only see the
//! [`DocumentStore`] trait.

mod filesystem;
mod s3;

pub use filesystem::FilesystemDocumentStore;
pub use s3::S3DocumentStore;

use std::sync::Arc;

use academy_common::config::{StorageBackendKind, StorageConfig};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    /// No object under this key
    #[error("Object not found: {0}")]
    NotFound(String),

    /// Backend unreachable or rejected the request
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// Key is empty or escapes the storage root
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage configuration error: {0}")]
    Config(String),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Storage backend for material documents
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read the full object stored under `key`
    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Store `data` under `key`, returning a location URL for the object
    async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<String, StorageError>;
}

/// Build the configured storage backend
pub async fn from_config(config: &StorageConfig) -> Result<Arc<dyn DocumentStore>, StorageError> {
    config
        .validate()
        .map_err(|e| StorageError::Config(e.to_string()))?;

    match config.backend {
        StorageBackendKind::S3 => Ok(Arc::new(S3DocumentStore::from_config(config).await?)),
        StorageBackendKind::Filesystem => {
            let root = config
                .root
                .clone()
                .ok_or_else(|| StorageError::Config("storage.root is not set".to_string()))?;
            Ok(Arc::new(FilesystemDocumentStore::new(root)))
        }
    }
}
