//! S3 backend

use academy_common::config::StorageConfig;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::{debug, error, info};

use super::{DocumentStore, StorageError};

/// Material documents in one S3 bucket
///
/// Built from an explicit [`StorageConfig`]: static credentials when both
/// keys are configured, otherwise the AWS default credential chain.
pub struct S3DocumentStore {
    client: Client,
    bucket: String,
    region: Option<String>,
}

impl S3DocumentStore {
    pub async fn from_config(config: &StorageConfig) -> Result<Self, StorageError> {
        let bucket = config
            .bucket
            .clone()
            .filter(|b| !b.is_empty())
            .ok_or_else(|| StorageError::Config("S3 bucket is not configured".to_string()))?;

        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &config.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some((access_key, secret_key)) = config.static_credentials() {
            loader = loader.credentials_provider(Credentials::new(
                access_key,
                secret_key,
                None,
                None,
                "academy-config",
            ));
        }
        let sdk_config = loader.load().await;

        info!(bucket = %bucket, region = ?config.region, "S3 document store initialized");

        Ok(Self {
            client: Client::new(&sdk_config),
            bucket,
            region: config.region.clone(),
        })
    }

    fn object_url(&self, key: &str) -> String {
        match &self.region {
            Some(region) => format!("https://{}.s3.{}.amazonaws.com/{}", self.bucket, region, key),
            None => format!("https://{}.s3.amazonaws.com/{}", self.bucket, key),
        }
    }
}

#[async_trait]
impl DocumentStore for S3DocumentStore {
    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        debug!(bucket = %self.bucket, storage_key = %key, "S3 GET");

        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let service_error = e.into_service_error();
                if service_error.is_no_such_key() {
                    StorageError::NotFound(key.to_string())
                } else {
                    error!(bucket = %self.bucket, storage_key = %key, "S3 GET failed: {:?}", service_error);
                    StorageError::Unavailable(service_error.to_string())
                }
            })?;

        let body = output
            .body
            .collect()
            .await
            .map_err(|e| StorageError::Unavailable(format!("Failed to read object body: {}", e)))?;

        Ok(body.into_bytes().to_vec())
    }

    async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<String, StorageError> {
        debug!(bucket = %self.bucket, storage_key = %key, size = data.len(), "S3 PUT");

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| {
                error!(bucket = %self.bucket, storage_key = %key, "S3 PUT failed: {:?}", e);
                StorageError::Unavailable(e.to_string())
            })?;

        Ok(self.object_url(key))
    }
}
