//! Port definitions for deployment collaborators.

mod build;
mod compute;
mod registry;
mod source;
mod storage;

pub use build::{BuildInvocation, BuildOutcome, BuildRunner, BuildRunnerError, BuildRunnerResult};
pub use compute::{
    ComputeApi, ComputeApiError, ComputeApiResult, InstanceLaunchRequest, ResourceTag,
    SecurityGroupRequest,
};
pub use registry::{DeploymentRegistry, DeploymentRegistryError, DeploymentRegistryResult};
pub use source::{SourceCheckout, SourceFetchError, SourceFetchResult, SourceFetcher};
pub use storage::{ObjectStorageApi, ObjectUpload, StorageApiError, StorageApiResult};
