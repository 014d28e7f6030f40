//! Registry port for deployment record persistence.

use crate::deployment::domain::{DeploymentKind, DeploymentName, DeploymentRecord};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

/// Result type for deployment registry operations.
pub type DeploymentRegistryResult<T> = Result<T, DeploymentRegistryError>;

/// Persistence contract for deployment records, one unit per name.
///
/// Saves are last-write-wins with no merge semantics. Concurrent writes to
/// the same name are not ordered by implementations.
#[async_trait]
pub trait DeploymentRegistry: Send + Sync {
    /// Persists or overwrites the record stored under its name.
    ///
    /// `updated_at` is refreshed on every call and `created_at` is set when
    /// the record has none. The stamped record is returned.
    ///
    /// # Errors
    ///
    /// Returns [`DeploymentRegistryError::KindChanged`] when a record of the
    /// other kind already exists under the name, or persistence errors.
    async fn save(&self, record: DeploymentRecord) -> DeploymentRegistryResult<DeploymentRecord>;

    /// Loads the record stored under a name.
    async fn load(&self, name: &DeploymentName)
    -> DeploymentRegistryResult<Option<DeploymentRecord>>;

    /// Returns every stored record keyed by name.
    async fn list(&self) -> DeploymentRegistryResult<BTreeMap<DeploymentName, DeploymentRecord>>;

    /// Removes a record, returning whether one existed.
    async fn delete(&self, name: &DeploymentName) -> DeploymentRegistryResult<bool>;
}

/// Errors returned by deployment registry implementations.
#[derive(Debug, Clone, Error)]
pub enum DeploymentRegistryError {
    /// A save would change the kind of an existing record.
    #[error("deployment '{name}' is stored as {stored} and cannot become {requested}")]
    KindChanged {
        /// Deployment name.
        name: DeploymentName,
        /// Kind of the stored record.
        stored: DeploymentKind,
        /// Kind of the rejected record.
        requested: DeploymentKind,
    },

    /// Persisted data could not be reconstructed into domain types.
    #[error("invalid persisted deployment data: {0}")]
    InvalidPersistedData(Arc<dyn std::error::Error + Send + Sync>),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl DeploymentRegistryError {
    /// Wraps persisted-data decoding or validation failures.
    pub fn invalid_persisted_data(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::InvalidPersistedData(Arc::new(err))
    }

    /// Wraps a persistence-layer failure.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }

    /// Rejects a save that would change a record's kind.
    ///
    /// # Errors
    ///
    /// Returns [`Self::KindChanged`] when the kinds differ.
    pub fn check_kind_unchanged(
        previous: Option<&DeploymentRecord>,
        incoming: &DeploymentRecord,
    ) -> DeploymentRegistryResult<()> {
        match previous {
            Some(stored) if stored.kind() != incoming.kind() => Err(Self::KindChanged {
                name: incoming.name().clone(),
                stored: stored.kind(),
                requested: incoming.kind(),
            }),
            _ => Ok(()),
        }
    }
}
