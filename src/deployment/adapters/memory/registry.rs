//! In-memory deployment registry.

use crate::deployment::{
    domain::{DeploymentName, DeploymentRecord},
    ports::{DeploymentRegistry, DeploymentRegistryError, DeploymentRegistryResult},
};
use async_trait::async_trait;
use mockable::{Clock, DefaultClock};
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

/// Thread-safe in-memory deployment registry.
///
/// Stamping matches the filesystem registry, which makes it a drop-in
/// replacement for tests and simulated runs.
pub struct InMemoryDeploymentRegistry<C = DefaultClock>
where
    C: Clock + Send + Sync,
{
    records: Arc<RwLock<BTreeMap<DeploymentName, DeploymentRecord>>>,
    clock: Arc<C>,
}

impl InMemoryDeploymentRegistry {
    /// Creates an empty registry stamped with the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(DefaultClock))
    }
}

impl Default for InMemoryDeploymentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> InMemoryDeploymentRegistry<C>
where
    C: Clock + Send + Sync,
{
    /// Creates an empty registry stamped with the given clock.
    #[must_use]
    pub fn with_clock(clock: Arc<C>) -> Self {
        Self {
            records: Arc::new(RwLock::new(BTreeMap::new())),
            clock,
        }
    }
}

impl<C> Clone for InMemoryDeploymentRegistry<C>
where
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            records: Arc::clone(&self.records),
            clock: Arc::clone(&self.clock),
        }
    }
}

#[async_trait]
impl<C> DeploymentRegistry for InMemoryDeploymentRegistry<C>
where
    C: Clock + Send + Sync,
{
    async fn save(&self, record: DeploymentRecord) -> DeploymentRegistryResult<DeploymentRecord> {
        let mut records = self.records.write().map_err(|err| {
            DeploymentRegistryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        let previous = records.get(record.name());
        DeploymentRegistryError::check_kind_unchanged(previous, &record)?;
        let stamped = record.stamped(previous, &*self.clock);
        records.insert(stamped.name().clone(), stamped.clone());
        Ok(stamped)
    }

    async fn load(
        &self,
        name: &DeploymentName,
    ) -> DeploymentRegistryResult<Option<DeploymentRecord>> {
        let records = self.records.read().map_err(|err| {
            DeploymentRegistryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        Ok(records.get(name).cloned())
    }

    async fn list(&self) -> DeploymentRegistryResult<BTreeMap<DeploymentName, DeploymentRecord>> {
        let records = self.records.read().map_err(|err| {
            DeploymentRegistryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        Ok(records.clone())
    }

    async fn delete(&self, name: &DeploymentName) -> DeploymentRegistryResult<bool> {
        let mut records = self.records.write().map_err(|err| {
            DeploymentRegistryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        Ok(records.remove(name).is_some())
    }
}
