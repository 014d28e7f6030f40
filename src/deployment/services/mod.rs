//! Orchestration workflows for deployments.
//!
//! Each workflow is a sequential pipeline over the provisioners and the
//! registry. A failing step aborts the rest; remote resources created by
//! earlier steps are left in place.

mod backend;
mod catalog;
mod error;
mod frontend;
mod locks;

pub use backend::{
    BackendDeployReport, BackendDeploymentService, DEFAULT_APP_PORT, DEFAULT_INSTANCE_TYPE,
    DeployBackendRequest, SSH_PORT,
};
pub use catalog::{CORS_NOTE, ConnectReport, DeploymentCatalogService};
pub use error::{DeploymentServiceError, DeploymentServiceResult, LookupRole};
pub use frontend::{
    API_URL_VARIABLES, DEFAULT_BUILD_COMMAND, DeployFrontendRequest, FrontendDeployReport,
    FrontendDeploymentService,
};
pub use locks::{NameGuard, NameLocks};

use crate::deployment::{
    domain::{CostEstimate, DeploymentKind, DeploymentName, DeploymentRecord},
    ports::{BuildRunner, ComputeApi, DeploymentRegistry, ObjectStorageApi, SourceFetcher},
    provisioning::{ComputeProvisioner, ReadinessSettings, StorageProvisioner},
};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

/// Returns `len` lowercase hex characters for unique resource names.
pub(crate) fn random_suffix(len: usize) -> String {
    Uuid::new_v4().simple().to_string().chars().take(len).collect()
}

/// Fails when `name` already holds a record of another kind.
///
/// Deploy workflows call this under the name lock before touching any remote
/// resource.
pub(crate) async fn ensure_slot_accepts<R>(
    registry: &R,
    name: &DeploymentName,
    kind: DeploymentKind,
) -> DeploymentServiceResult<()>
where
    R: DeploymentRegistry + ?Sized,
{
    if let Some(existing) = registry.load(name).await? {
        existing.ensure_kind(kind)?;
    }
    Ok(())
}

/// Every deployment workflow behind one object-safe interface.
#[async_trait]
pub trait DeploymentOperations: Send + Sync {
    /// Deploys a backend onto a compute instance.
    async fn deploy_backend(
        &self,
        request: DeployBackendRequest,
    ) -> DeploymentServiceResult<BackendDeployReport>;

    /// Deploys a static frontend into a website bucket.
    async fn deploy_frontend(
        &self,
        request: DeployFrontendRequest,
    ) -> DeploymentServiceResult<FrontendDeployReport>;

    /// Cross-links a backend and a frontend.
    async fn connect(
        &self,
        backend_name: &str,
        frontend_name: &str,
    ) -> DeploymentServiceResult<ConnectReport>;

    /// Returns a deployment record with refreshed live details.
    async fn status(&self, deployment_name: &str) -> DeploymentServiceResult<DeploymentRecord>;

    /// Estimates the monthly cost of a deployment.
    async fn estimate_cost(&self, deployment_name: &str) -> DeploymentServiceResult<CostEstimate>;

    /// Lists every recorded deployment.
    async fn list(&self) -> DeploymentServiceResult<BTreeMap<DeploymentName, DeploymentRecord>>;

    /// Forgets a deployment record.
    async fn delete(&self, deployment_name: &str) -> DeploymentServiceResult<bool>;
}

/// Adapters and settings needed to assemble [`DeploymentWorkflows`].
pub struct WorkflowParts<R, F, A, S, B> {
    /// Record store.
    pub registry: Arc<R>,
    /// Repository cloner.
    pub fetcher: Arc<F>,
    /// Compute provider.
    pub compute: Arc<A>,
    /// Object-storage provider.
    pub storage: Arc<S>,
    /// Build command runner.
    pub builder: Arc<B>,
    /// Instance readiness polling.
    pub readiness: ReadinessSettings,
    /// Region used when a request names none.
    pub default_region: String,
}

/// The three workflow services sharing one registry and lock table.
pub struct DeploymentWorkflows<R, F, A, S, B>
where
    R: DeploymentRegistry,
    F: SourceFetcher,
    A: ComputeApi,
    S: ObjectStorageApi,
    B: BuildRunner,
{
    backend: BackendDeploymentService<R, F, A>,
    frontend: FrontendDeploymentService<R, F, S, B>,
    catalog: DeploymentCatalogService<R, A>,
}

impl<R, F, A, S, B> DeploymentWorkflows<R, F, A, S, B>
where
    R: DeploymentRegistry,
    F: SourceFetcher,
    A: ComputeApi,
    S: ObjectStorageApi,
    B: BuildRunner,
{
    /// Wires the workflow services from their adapters.
    #[must_use]
    pub fn new(parts: WorkflowParts<R, F, A, S, B>) -> Self {
        let locks = NameLocks::new();
        let compute = ComputeProvisioner::new(parts.compute, parts.readiness);
        Self {
            backend: BackendDeploymentService::new(
                Arc::clone(&parts.registry),
                Arc::clone(&parts.fetcher),
                compute.clone(),
                locks.clone(),
                parts.default_region.clone(),
            ),
            frontend: FrontendDeploymentService::new(
                Arc::clone(&parts.registry),
                parts.fetcher,
                StorageProvisioner::new(parts.storage, parts.builder),
                locks.clone(),
                parts.default_region,
            ),
            catalog: DeploymentCatalogService::new(parts.registry, compute, locks),
        }
    }
}

#[async_trait]
impl<R, F, A, S, B> DeploymentOperations for DeploymentWorkflows<R, F, A, S, B>
where
    R: DeploymentRegistry,
    F: SourceFetcher,
    A: ComputeApi,
    S: ObjectStorageApi,
    B: BuildRunner,
{
    async fn deploy_backend(
        &self,
        request: DeployBackendRequest,
    ) -> DeploymentServiceResult<BackendDeployReport> {
        self.backend.deploy(request).await
    }

    async fn deploy_frontend(
        &self,
        request: DeployFrontendRequest,
    ) -> DeploymentServiceResult<FrontendDeployReport> {
        self.frontend.deploy(request).await
    }

    async fn connect(
        &self,
        backend_name: &str,
        frontend_name: &str,
    ) -> DeploymentServiceResult<ConnectReport> {
        self.catalog.connect(backend_name, frontend_name).await
    }

    async fn status(&self, deployment_name: &str) -> DeploymentServiceResult<DeploymentRecord> {
        self.catalog.status(deployment_name).await
    }

    async fn estimate_cost(&self, deployment_name: &str) -> DeploymentServiceResult<CostEstimate> {
        self.catalog.estimate_cost(deployment_name).await
    }

    async fn list(&self) -> DeploymentServiceResult<BTreeMap<DeploymentName, DeploymentRecord>> {
        self.catalog.list().await
    }

    async fn delete(&self, deployment_name: &str) -> DeploymentServiceResult<bool> {
        self.catalog.delete(deployment_name).await
    }
}
