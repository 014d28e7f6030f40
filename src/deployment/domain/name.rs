//! Validated deployment names.

use super::DeploymentDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum length for a deployment name.
///
/// Bucket names are derived as `{name}-{12 hex}` and must stay within 63
/// characters; security group names append `-sg-{8 hex}`.
const MAX_DEPLOYMENT_NAME_LENGTH: usize = 40;

/// Validated, registry-unique deployment name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DeploymentName(String);

impl DeploymentName {
    /// Creates a validated deployment name.
    ///
    /// The input is trimmed and lowercased. Only characters in `[a-z0-9_-]`
    /// are accepted, and the name must start and end with a letter or digit.
    ///
    /// # Errors
    ///
    /// Returns [`DeploymentDomainError`] when validation fails.
    pub fn new(value: impl Into<String>) -> Result<Self, DeploymentDomainError> {
        let normalized = value.into().trim().to_ascii_lowercase();

        if normalized.is_empty() {
            return Err(DeploymentDomainError::EmptyName);
        }

        let is_separator = |character: char| character == '-' || character == '_';
        let is_valid = normalized.chars().all(|character| {
            character.is_ascii_lowercase() || character.is_ascii_digit() || is_separator(character)
        }) && !normalized.starts_with(is_separator)
            && !normalized.ends_with(is_separator);
        if !is_valid {
            return Err(DeploymentDomainError::InvalidName(normalized));
        }

        if normalized.len() > MAX_DEPLOYMENT_NAME_LENGTH {
            return Err(DeploymentDomainError::NameTooLong(normalized));
        }

        Ok(Self(normalized))
    }

    /// Returns the deployment name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the name with underscores replaced by hyphens, as bucket
    /// names require.
    #[must_use]
    pub fn bucket_prefix(&self) -> String {
        self.0.replace('_', "-")
    }
}

impl TryFrom<String> for DeploymentName {
    type Error = DeploymentDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DeploymentName> for String {
    fn from(value: DeploymentName) -> Self {
        value.0
    }
}

impl AsRef<str> for DeploymentName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for DeploymentName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}
