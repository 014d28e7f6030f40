//! Amazon S3 object-storage adapter.

use crate::deployment::ports::{
    ObjectStorageApi, ObjectUpload, ResourceTag, StorageApiError, StorageApiResult,
};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{
    BucketLocationConstraint, CreateBucketConfiguration, ErrorDocument, IndexDocument,
    ObjectOwnership, OwnershipControls, OwnershipControlsRule, PublicAccessBlockConfiguration,
    Tag, Tagging, WebsiteConfiguration,
};

/// Region in which buckets are created without a location constraint.
const LEGACY_DEFAULT_REGION: &str = "us-east-1";

/// Object storage backed by Amazon S3.
///
/// A client is built per call for the requested region from the shared
/// configuration, so credentials resolve once per process.
#[derive(Debug, Clone)]
pub struct S3ObjectStorage {
    sdk_config: SdkConfig,
}

impl S3ObjectStorage {
    /// Creates an adapter from loaded SDK configuration.
    #[must_use]
    pub const fn new(sdk_config: SdkConfig) -> Self {
        Self { sdk_config }
    }

    fn client(&self, region: &str) -> Client {
        let config = aws_sdk_s3::config::Builder::from(&self.sdk_config)
            .region(Region::new(region.to_owned()))
            .build();
        Client::from_conf(config)
    }
}

fn sdk_failure(err: impl std::error::Error) -> StorageApiError {
    StorageApiError::provider_message(DisplayErrorContext(err).to_string())
}

#[async_trait]
impl ObjectStorageApi for S3ObjectStorage {
    async fn create_bucket(&self, region: &str, bucket: &str) -> StorageApiResult<()> {
        let mut request = self.client(region).create_bucket().bucket(bucket);
        if region != LEGACY_DEFAULT_REGION {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(region))
                    .build(),
            );
        }
        match request.send().await {
            Ok(_) => Ok(()),
            Err(err) => {
                let service = err.into_service_error();
                if service.is_bucket_already_owned_by_you() {
                    Err(StorageApiError::AlreadyOwned(bucket.to_owned()))
                } else {
                    Err(sdk_failure(service))
                }
            }
        }
    }

    async fn configure_website(
        &self,
        region: &str,
        bucket: &str,
        index_document: &str,
        error_document: &str,
    ) -> StorageApiResult<()> {
        let website = WebsiteConfiguration::builder()
            .index_document(
                IndexDocument::builder()
                    .suffix(index_document)
                    .build()
                    .map_err(StorageApiError::provider)?,
            )
            .error_document(
                ErrorDocument::builder()
                    .key(error_document)
                    .build()
                    .map_err(StorageApiError::provider)?,
            )
            .build();
        self.client(region)
            .put_bucket_website()
            .bucket(bucket)
            .website_configuration(website)
            .send()
            .await
            .map_err(sdk_failure)?;
        Ok(())
    }

    async fn allow_public_access(&self, region: &str, bucket: &str) -> StorageApiResult<()> {
        let client = self.client(region);
        let ownership = OwnershipControls::builder()
            .rules(
                OwnershipControlsRule::builder()
                    .object_ownership(ObjectOwnership::BucketOwnerEnforced)
                    .build()
                    .map_err(StorageApiError::provider)?,
            )
            .build()
            .map_err(StorageApiError::provider)?;
        client
            .put_bucket_ownership_controls()
            .bucket(bucket)
            .ownership_controls(ownership)
            .send()
            .await
            .map_err(sdk_failure)?;

        client
            .put_public_access_block()
            .bucket(bucket)
            .public_access_block_configuration(
                PublicAccessBlockConfiguration::builder()
                    .block_public_acls(false)
                    .ignore_public_acls(false)
                    .block_public_policy(false)
                    .restrict_public_buckets(false)
                    .build(),
            )
            .send()
            .await
            .map_err(sdk_failure)?;
        Ok(())
    }

    async fn put_bucket_policy(
        &self,
        region: &str,
        bucket: &str,
        policy: &str,
    ) -> StorageApiResult<()> {
        self.client(region)
            .put_bucket_policy()
            .bucket(bucket)
            .policy(policy)
            .send()
            .await
            .map_err(sdk_failure)?;
        Ok(())
    }

    async fn tag_bucket(
        &self,
        region: &str,
        bucket: &str,
        tags: &[ResourceTag],
    ) -> StorageApiResult<()> {
        let tag_set = tags
            .iter()
            .map(|tag| {
                Tag::builder()
                    .key(&tag.key)
                    .value(&tag.value)
                    .build()
                    .map_err(StorageApiError::provider)
            })
            .collect::<StorageApiResult<Vec<_>>>()?;
        let tagging = Tagging::builder()
            .set_tag_set(Some(tag_set))
            .build()
            .map_err(StorageApiError::provider)?;
        self.client(region)
            .put_bucket_tagging()
            .bucket(bucket)
            .tagging(tagging)
            .send()
            .await
            .map_err(sdk_failure)?;
        Ok(())
    }

    async fn put_object(
        &self,
        region: &str,
        bucket: &str,
        upload: ObjectUpload,
    ) -> StorageApiResult<()> {
        self.client(region)
            .put_object()
            .bucket(bucket)
            .key(upload.key)
            .content_type(upload.content_type)
            .body(ByteStream::from(upload.body))
            .send()
            .await
            .map_err(sdk_failure)?;
        Ok(())
    }
}
