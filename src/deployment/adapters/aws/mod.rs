//! AWS SDK adapters for the compute and object-storage ports.

mod ec2;
mod s3;

pub use ec2::Ec2Compute;
pub use s3::S3ObjectStorage;

use aws_config::{BehaviorVersion, Region, SdkConfig};

/// Loads shared SDK configuration from the default provider chain.
///
/// Credentials come from the environment, shared profiles or instance
/// metadata. `default_region` applies when a call does not name one.
pub async fn load_sdk_config(default_region: &str) -> SdkConfig {
    aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(default_region.to_owned()))
        .load()
        .await
}
