//! Workflows over existing deployment records.
//!
//! Provides [`DeploymentCatalogService`] which links, refreshes, prices,
//! lists and forgets deployments. None of these operations create or remove
//! remote resources.

use super::{DeploymentServiceError, DeploymentServiceResult, LookupRole, NameLocks};
use crate::deployment::{
    domain::{CostEstimate, DeploymentKind, DeploymentName, DeploymentRecord, DeploymentTarget},
    ports::{ComputeApi, DeploymentRegistry},
    provisioning::{ComputeProvisioner, DEFAULT_STORAGE_GB, storage_monthly_cost},
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Note returned with every connection, as no remote CORS rules are changed.
pub const CORS_NOTE: &str = "Manual CORS configuration may be needed in backend code";

/// Outcome of linking a backend and a frontend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectReport {
    /// Human-readable summary.
    pub message: String,
    /// Address the frontend now points at.
    pub backend_url: String,
    /// Address recorded on the backend.
    pub frontend_url: String,
    /// Follow-up advice.
    pub note: &'static str,
}

/// Service for operations on recorded deployments.
pub struct DeploymentCatalogService<R, A>
where
    R: DeploymentRegistry,
    A: ComputeApi,
{
    registry: Arc<R>,
    compute: ComputeProvisioner<A>,
    locks: NameLocks,
}

impl<R, A> DeploymentCatalogService<R, A>
where
    R: DeploymentRegistry,
    A: ComputeApi,
{
    /// Creates a catalog service.
    #[must_use]
    pub const fn new(registry: Arc<R>, compute: ComputeProvisioner<A>, locks: NameLocks) -> Self {
        Self {
            registry,
            compute,
            locks,
        }
    }

    async fn require(&self, role: LookupRole, raw: &str) -> DeploymentServiceResult<DeploymentRecord> {
        let Ok(name) = DeploymentName::new(raw) else {
            return Err(DeploymentServiceError::not_found(role, raw));
        };
        self.registry
            .load(&name)
            .await?
            .ok_or_else(|| DeploymentServiceError::not_found(role, raw))
    }

    /// Cross-links a backend and a frontend and persists both records.
    ///
    /// # Errors
    ///
    /// Returns [`DeploymentServiceError::NotFound`] naming the missing side
    /// (the backend is checked first), a kind mismatch when either name
    /// resolves to the wrong kind, or registry errors.
    pub async fn connect(
        &self,
        backend_name: &str,
        frontend_name: &str,
    ) -> DeploymentServiceResult<ConnectReport> {
        let backend_key = DeploymentName::new(backend_name)
            .map_err(|_| DeploymentServiceError::not_found(LookupRole::Backend, backend_name))?;
        let frontend_key = DeploymentName::new(frontend_name)
            .map_err(|_| DeploymentServiceError::not_found(LookupRole::Frontend, frontend_name))?;
        let _guard = self.locks.lock_pair(&backend_key, &frontend_key).await;

        let mut backend = self.require(LookupRole::Backend, backend_name).await?;
        let mut frontend = self.require(LookupRole::Frontend, frontend_name).await?;
        backend.ensure_kind(DeploymentKind::Backend)?;
        frontend.ensure_kind(DeploymentKind::Frontend)?;

        let backend_url = backend.url().to_owned();
        let frontend_url = frontend.url().to_owned();
        frontend.link_peer(backend_key.clone(), backend_url.clone());
        backend.link_peer(frontend_key.clone(), frontend_url.clone());

        self.registry.save(frontend).await?;
        self.registry.save(backend).await?;

        info!(backend = %backend_key, frontend = %frontend_key, "services connected");
        Ok(ConnectReport {
            message: format!("Connected {backend_key} and {frontend_key}"),
            backend_url,
            frontend_url,
            note: CORS_NOTE,
        })
    }

    /// Returns a deployment record, refreshing live details for backends.
    ///
    /// A failed instance query is captured in the record as status `error`
    /// instead of failing the call. The refreshed record is persisted.
    ///
    /// # Errors
    ///
    /// Returns [`DeploymentServiceError::NotFound`] or registry errors.
    pub async fn status(&self, deployment_name: &str) -> DeploymentServiceResult<DeploymentRecord> {
        let Ok(name) = DeploymentName::new(deployment_name) else {
            return Err(DeploymentServiceError::not_found(
                LookupRole::Deployment,
                deployment_name,
            ));
        };
        let _guard = self.locks.lock(&name).await;
        let mut record = self.require(LookupRole::Deployment, deployment_name).await?;

        let DeploymentTarget::Backend(backend) = record.target() else {
            return Ok(record);
        };
        let region = backend.region.clone();
        let instance_id = backend.instance_id.clone();
        match self.compute.instance_info(&region, &instance_id).await {
            Ok(snapshot) => record.apply_instance_snapshot(&snapshot),
            Err(err) => {
                warn!(%name, %instance_id, error = %err, "instance status query failed");
                record.record_refresh_failure(err.to_string());
            }
        }
        Ok(self.registry.save(record).await?)
    }

    /// Estimates the monthly cost of a deployment.
    ///
    /// # Errors
    ///
    /// Returns [`DeploymentServiceError::NotFound`] or registry errors.
    pub async fn estimate_cost(&self, deployment_name: &str) -> DeploymentServiceResult<CostEstimate> {
        let record = self.require(LookupRole::Deployment, deployment_name).await?;
        let estimate = CostEstimate::new(record.name().clone());
        Ok(match record.target() {
            DeploymentTarget::Backend(backend) => {
                estimate.with_item("ec2", self.compute.estimate_cost(&backend.instance_type))
            }
            DeploymentTarget::Frontend(_) => {
                estimate.with_item("s3", storage_monthly_cost(DEFAULT_STORAGE_GB))
            }
        })
    }

    /// Returns every recorded deployment keyed by name.
    ///
    /// # Errors
    ///
    /// Returns registry errors.
    pub async fn list(&self) -> DeploymentServiceResult<BTreeMap<DeploymentName, DeploymentRecord>> {
        Ok(self.registry.list().await?)
    }

    /// Forgets a deployment record without touching remote resources.
    ///
    /// Returns whether a record existed. Names that can never be stored
    /// report `false`.
    ///
    /// # Errors
    ///
    /// Returns registry errors.
    pub async fn delete(&self, deployment_name: &str) -> DeploymentServiceResult<bool> {
        let Ok(name) = DeploymentName::new(deployment_name) else {
            return Ok(false);
        };
        let _guard = self.locks.lock(&name).await;
        let existed = self.registry.delete(&name).await?;
        if existed {
            info!(%name, "deployment record removed");
        }
        Ok(existed)
    }
}
