//! Compute provider port: access boundaries and instances.

use crate::deployment::domain::InstanceSnapshot;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for compute provider calls.
pub type ComputeApiResult<T> = Result<T, ComputeApiError>;

/// Key/value tag applied to provider resources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceTag {
    /// Tag key.
    pub key: String,
    /// Tag value.
    pub value: String,
}

impl ResourceTag {
    /// Creates a tag.
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Request to create a named security group in the default network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityGroupRequest {
    /// Provider region.
    pub region: String,
    /// Group name, unique per network.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Tags applied at creation.
    pub tags: Vec<ResourceTag>,
}

/// Request to launch a single instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceLaunchRequest {
    /// Provider region.
    pub region: String,
    /// Base image identifier.
    pub image_id: String,
    /// Instance class.
    pub instance_type: String,
    /// Security group attached to the instance.
    pub security_group_id: String,
    /// Plain-text first-boot script.
    pub user_data: String,
    /// Tags applied at launch.
    pub tags: Vec<ResourceTag>,
    /// Whether per-minute instance metrics are collected.
    pub detailed_monitoring: bool,
}

/// Remote compute provider operations used by the compute provisioner.
#[async_trait]
pub trait ComputeApi: Send + Sync {
    /// Creates a security group and returns its identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ComputeApiError::AlreadyExists`] when a group with the same
    /// name exists, or [`ComputeApiError::Provider`] for other failures.
    async fn create_security_group(&self, request: &SecurityGroupRequest)
    -> ComputeApiResult<String>;

    /// Looks up a security group identifier by name.
    async fn find_security_group(&self, region: &str, name: &str)
    -> ComputeApiResult<Option<String>>;

    /// Opens the given TCP ports to any source address.
    async fn authorize_ingress(
        &self,
        region: &str,
        group_id: &str,
        ports: &[u16],
    ) -> ComputeApiResult<()>;

    /// Launches one instance and returns its identifier.
    async fn run_instance(&self, request: &InstanceLaunchRequest) -> ComputeApiResult<String>;

    /// Describes the current state of an instance.
    async fn describe_instance(
        &self,
        region: &str,
        instance_id: &str,
    ) -> ComputeApiResult<InstanceSnapshot>;
}

/// Errors reported by compute provider adapters.
#[derive(Debug, Clone, Error)]
pub enum ComputeApiError {
    /// The named resource already exists.
    #[error("{resource} already exists")]
    AlreadyExists {
        /// Name of the conflicting resource.
        resource: String,
    },

    /// The provider returned no usable data for a resource.
    #[error("{0} not found")]
    NotFound(String),

    /// Any other provider-reported failure.
    #[error("compute provider error: {0}")]
    Provider(Arc<dyn std::error::Error + Send + Sync>),
}

impl ComputeApiError {
    /// Wraps a provider failure.
    pub fn provider(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Provider(Arc::new(err))
    }

    /// Builds a provider failure from a message.
    pub fn provider_message(message: impl Into<String>) -> Self {
        Self::provider(std::io::Error::other(message.into()))
    }
}
