//! Errors raised by resource provisioners.

use crate::deployment::ports::{BuildRunnerError, ComputeApiError, StorageApiError};
use std::sync::Arc;
use thiserror::Error;

/// Result type for provisioning operations.
pub type ProvisioningResult<T> = Result<T, ProvisioningError>;

/// Failures raised while creating or inspecting remote resources.
#[derive(Debug, Clone, Error)]
pub enum ProvisioningError {
    /// The requested region or setting has no static configuration.
    #[error("{0}")]
    Configuration(String),

    /// The instance did not become reachable in time. It is left running.
    #[error("instance {instance_id} did not start within {waited_secs}s")]
    ProvisioningTimeout {
        /// Instance that was being waited on.
        instance_id: String,
        /// Configured timeout in seconds.
        waited_secs: u64,
    },

    /// The build command exited unsuccessfully.
    #[error("build command `{command}` failed: {output}")]
    BuildFailure {
        /// Command line that was run.
        command: String,
        /// Captured diagnostic output.
        output: String,
    },

    /// No conventional output directory contained an entry page.
    #[error("could not find build directory with index.html; looked in: {}", candidates.join(", "))]
    MissingBuildOutput {
        /// Directories that were checked, in order.
        candidates: Vec<String>,
    },

    /// The boot script template failed to render.
    #[error("failed to render boot script: {0}")]
    BootScript(Arc<dyn std::error::Error + Send + Sync>),

    /// Local filesystem failure while preparing or reading build output.
    #[error("filesystem error: {0}")]
    Filesystem(Arc<dyn std::error::Error + Send + Sync>),

    /// Compute provider failure.
    #[error(transparent)]
    Compute(#[from] ComputeApiError),

    /// Object-storage provider failure.
    #[error(transparent)]
    Storage(#[from] StorageApiError),

    /// Build tooling could not be started.
    #[error(transparent)]
    BuildRunner(#[from] BuildRunnerError),
}

impl ProvisioningError {
    /// Wraps a boot script rendering failure.
    pub fn boot_script(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::BootScript(Arc::new(err))
    }

    /// Wraps a local filesystem failure.
    pub fn filesystem(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Filesystem(Arc::new(err))
    }
}
