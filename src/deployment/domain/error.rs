//! Error types for deployment domain validation.

use super::DeploymentKind;
use thiserror::Error;

/// Errors returned while constructing or mutating deployment domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeploymentDomainError {
    /// The deployment name is empty after trimming.
    #[error("deployment name must not be empty")]
    EmptyName,

    /// The deployment name contains characters outside `[a-z0-9-]`.
    #[error(
        "deployment name '{0}' contains invalid characters (only lowercase alphanumeric and hyphens allowed)"
    )]
    InvalidName(String),

    /// The deployment name exceeds the length that derived resource names allow.
    #[error("deployment name exceeds 40 character limit: {0}")]
    NameTooLong(String),

    /// The repository matches none of the supported runtime signatures.
    #[error("Unsupported app type: {found}. Supported: nodejs, python")]
    UnsupportedAppType {
        /// Description of what the repository looked like.
        found: String,
    },

    /// An operation expected a record of a different kind.
    #[error("deployment '{name}' is a {actual} deployment, expected {expected}")]
    KindMismatch {
        /// Deployment name.
        name: String,
        /// Kind the operation required.
        expected: DeploymentKind,
        /// Kind stored in the record.
        actual: DeploymentKind,
    },
}

/// Error returned while parsing a runtime name.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown application runtime: {0}")]
pub struct ParseAppRuntimeError(pub String);
