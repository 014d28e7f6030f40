//! Object-storage provider port: buckets and objects.

use super::ResourceTag;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for object-storage provider calls.
pub type StorageApiResult<T> = Result<T, StorageApiError>;

/// Object to upload into a bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectUpload {
    /// Forward-slash separated object key.
    pub key: String,
    /// Object contents.
    pub body: Vec<u8>,
    /// MIME type served with the object.
    pub content_type: String,
}

/// Remote object-storage operations used by the storage provisioner.
#[async_trait]
pub trait ObjectStorageApi: Send + Sync {
    /// Creates a bucket in the region.
    ///
    /// # Errors
    ///
    /// Returns [`StorageApiError::AlreadyOwned`] when the caller already owns
    /// the bucket, or [`StorageApiError::Provider`] otherwise.
    async fn create_bucket(&self, region: &str, bucket: &str) -> StorageApiResult<()>;

    /// Enables static website hosting with the given index and error pages.
    async fn configure_website(
        &self,
        region: &str,
        bucket: &str,
        index_document: &str,
        error_document: &str,
    ) -> StorageApiResult<()>;

    /// Enforces bucket-owner object ownership and lifts the public access block.
    async fn allow_public_access(&self, region: &str, bucket: &str) -> StorageApiResult<()>;

    /// Attaches a JSON bucket policy.
    async fn put_bucket_policy(&self, region: &str, bucket: &str, policy: &str)
    -> StorageApiResult<()>;

    /// Replaces the bucket tag set.
    async fn tag_bucket(
        &self,
        region: &str,
        bucket: &str,
        tags: &[ResourceTag],
    ) -> StorageApiResult<()>;

    /// Uploads one object.
    async fn put_object(
        &self,
        region: &str,
        bucket: &str,
        upload: ObjectUpload,
    ) -> StorageApiResult<()>;
}

/// Errors reported by object-storage adapters.
#[derive(Debug, Clone, Error)]
pub enum StorageApiError {
    /// The bucket already exists and belongs to the caller.
    #[error("bucket {0} already owned by you")]
    AlreadyOwned(String),

    /// Any other provider-reported failure.
    #[error("storage provider error: {0}")]
    Provider(Arc<dyn std::error::Error + Send + Sync>),
}

impl StorageApiError {
    /// Wraps a provider failure.
    pub fn provider(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Provider(Arc::new(err))
    }

    /// Builds a provider failure from a message.
    pub fn provider_message(message: impl Into<String>) -> Self {
        Self::provider(std::io::Error::other(message.into()))
    }
}
