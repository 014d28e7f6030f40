//! Errors surfaced by deployment workflows.

use crate::deployment::{
    domain::DeploymentDomainError,
    ports::{DeploymentRegistryError, SourceFetchError},
    provisioning::ProvisioningError,
};
use std::fmt;
use thiserror::Error;

/// Role in which a deployment name was looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupRole {
    /// Name given as the backend side of a connection.
    Backend,
    /// Name given as the frontend side of a connection.
    Frontend,
    /// Name given to a single-deployment operation.
    Deployment,
}

impl fmt::Display for LookupRole {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::Backend => "Backend",
            Self::Frontend => "Frontend",
            Self::Deployment => "Deployment",
        })
    }
}

/// Service-level errors for deployment workflows.
#[derive(Debug, Clone, Error)]
pub enum DeploymentServiceError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] DeploymentDomainError),
    /// Registry operation failed.
    #[error(transparent)]
    Registry(#[from] DeploymentRegistryError),
    /// The repository could not be fetched.
    #[error(transparent)]
    Source(#[from] SourceFetchError),
    /// A provisioning step failed.
    #[error(transparent)]
    Provisioning(#[from] ProvisioningError),
    /// No deployment exists under the given name.
    #[error("{role} '{name}' not found")]
    NotFound {
        /// Role the name was looked up in.
        role: LookupRole,
        /// Name as supplied by the caller.
        name: String,
    },
}

impl DeploymentServiceError {
    /// Creates a not-found error.
    pub fn not_found(role: LookupRole, name: impl Into<String>) -> Self {
        Self::NotFound {
            role,
            name: name.into(),
        }
    }
}

/// Result type for deployment workflows.
pub type DeploymentServiceResult<T> = Result<T, DeploymentServiceError>;
