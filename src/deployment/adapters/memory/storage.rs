//! In-memory object storage.

use crate::deployment::ports::{
    ObjectStorageApi, ObjectUpload, ResourceTag, StorageApiError, StorageApiResult,
};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

/// Object held by the in-memory store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// MIME type recorded at upload.
    pub content_type: String,
    /// Object contents.
    pub body: Vec<u8>,
}

/// Bucket configuration and contents held by the in-memory store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimulatedBucket {
    /// Region the bucket was created in.
    pub region: String,
    /// Website index document, once configured.
    pub index_document: Option<String>,
    /// Website error document, once configured.
    pub error_document: Option<String>,
    /// Whether ownership and public-access settings were relaxed.
    pub public_access_allowed: bool,
    /// Attached bucket policy.
    pub policy: Option<String>,
    /// Current tag set.
    pub tags: Vec<ResourceTag>,
    /// Uploaded objects keyed by object key.
    pub objects: BTreeMap<String, StoredObject>,
}

/// Thread-safe in-memory object storage.
#[derive(Debug, Clone, Default)]
pub struct InMemoryObjectStorage {
    buckets: Arc<RwLock<BTreeMap<String, SimulatedBucket>>>,
}

impl InMemoryObjectStorage {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of a bucket.
    #[must_use]
    pub fn bucket(&self, name: &str) -> Option<SimulatedBucket> {
        self.buckets
            .read()
            .ok()
            .and_then(|buckets| buckets.get(name).cloned())
    }

    /// Returns the objects stored in a bucket, empty when it does not exist.
    #[must_use]
    pub fn objects(&self, name: &str) -> BTreeMap<String, StoredObject> {
        self.bucket(name)
            .map(|bucket| bucket.objects)
            .unwrap_or_default()
    }

    /// Returns the names of all buckets.
    #[must_use]
    pub fn bucket_names(&self) -> Vec<String> {
        self.buckets
            .read()
            .map(|buckets| buckets.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn with_bucket(
        &self,
        name: &str,
        update: impl FnOnce(&mut SimulatedBucket),
    ) -> StorageApiResult<()> {
        let mut buckets = self
            .buckets
            .write()
            .map_err(|err| StorageApiError::provider_message(err.to_string()))?;
        let bucket = buckets
            .get_mut(name)
            .ok_or_else(|| StorageApiError::provider_message(format!("NoSuchBucket: {name}")))?;
        update(bucket);
        Ok(())
    }
}

#[async_trait]
impl ObjectStorageApi for InMemoryObjectStorage {
    async fn create_bucket(&self, region: &str, bucket: &str) -> StorageApiResult<()> {
        let mut buckets = self
            .buckets
            .write()
            .map_err(|err| StorageApiError::provider_message(err.to_string()))?;
        if buckets.contains_key(bucket) {
            return Err(StorageApiError::AlreadyOwned(bucket.to_owned()));
        }
        buckets.insert(
            bucket.to_owned(),
            SimulatedBucket {
                region: region.to_owned(),
                ..SimulatedBucket::default()
            },
        );
        Ok(())
    }

    async fn configure_website(
        &self,
        _region: &str,
        bucket: &str,
        index_document: &str,
        error_document: &str,
    ) -> StorageApiResult<()> {
        self.with_bucket(bucket, |stored| {
            stored.index_document = Some(index_document.to_owned());
            stored.error_document = Some(error_document.to_owned());
        })
    }

    async fn allow_public_access(&self, _region: &str, bucket: &str) -> StorageApiResult<()> {
        self.with_bucket(bucket, |stored| stored.public_access_allowed = true)
    }

    async fn put_bucket_policy(
        &self,
        _region: &str,
        bucket: &str,
        policy: &str,
    ) -> StorageApiResult<()> {
        self.with_bucket(bucket, |stored| stored.policy = Some(policy.to_owned()))
    }

    async fn tag_bucket(
        &self,
        _region: &str,
        bucket: &str,
        tags: &[ResourceTag],
    ) -> StorageApiResult<()> {
        self.with_bucket(bucket, |stored| stored.tags = tags.to_vec())
    }

    async fn put_object(
        &self,
        _region: &str,
        bucket: &str,
        upload: ObjectUpload,
    ) -> StorageApiResult<()> {
        self.with_bucket(bucket, |stored| {
            stored.objects.insert(
                upload.key,
                StoredObject {
                    content_type: upload.content_type,
                    body: upload.body,
                },
            );
        })
    }
}
