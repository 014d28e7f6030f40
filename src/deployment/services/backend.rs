//! Backend deployment workflow: clone, detect, provision, wait, persist.

use super::{
    DeploymentServiceError, DeploymentServiceResult, NameLocks, ensure_slot_accepts, random_suffix,
};
use crate::deployment::{
    domain::{AppRuntime, BackendDeployment, DeploymentKind, DeploymentName, DeploymentRecord},
    ports::{ComputeApi, DeploymentRegistry, SourceFetcher},
    provisioning::{ComputeProvisioner, LaunchSpec, render_boot_script},
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Port that is always opened for SSH access.
pub const SSH_PORT: u16 = 22;

/// Default instance class for backend deployments.
pub const DEFAULT_INSTANCE_TYPE: &str = "t2.micro";

/// Default application port for backend deployments.
pub const DEFAULT_APP_PORT: u16 = 3000;

/// Parameters of a backend deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployBackendRequest {
    /// Repository to deploy.
    pub repo_url: String,
    /// Deployment name.
    pub name: String,
    /// Instance class to launch.
    pub instance_type: String,
    /// Region override; the service default applies when absent.
    pub region: Option<String>,
    /// Port the application listens on.
    pub port: u16,
}

impl DeployBackendRequest {
    /// Creates a request with the default instance class and port.
    #[must_use]
    pub fn new(repo_url: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            repo_url: repo_url.into(),
            name: name.into(),
            instance_type: DEFAULT_INSTANCE_TYPE.to_owned(),
            region: None,
            port: DEFAULT_APP_PORT,
        }
    }
}

/// Outcome of a successful backend deployment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackendDeployReport {
    /// Launched instance.
    pub instance_id: String,
    /// Application base URL.
    pub url: String,
    /// Public address of the instance.
    pub public_ip: String,
    /// Application port.
    pub port: u16,
    /// Monthly instance cost in USD.
    pub cost_per_month: f64,
    /// Persisted record.
    pub deployment_info: DeploymentRecord,
}

/// Deploys backend applications onto compute instances.
pub struct BackendDeploymentService<R, F, A>
where
    R: DeploymentRegistry,
    F: SourceFetcher,
    A: ComputeApi,
{
    registry: Arc<R>,
    fetcher: Arc<F>,
    compute: ComputeProvisioner<A>,
    locks: NameLocks,
    default_region: String,
}

impl<R, F, A> BackendDeploymentService<R, F, A>
where
    R: DeploymentRegistry,
    F: SourceFetcher,
    A: ComputeApi,
{
    /// Creates a backend deployment service.
    #[must_use]
    pub fn new(
        registry: Arc<R>,
        fetcher: Arc<F>,
        compute: ComputeProvisioner<A>,
        locks: NameLocks,
        default_region: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            fetcher,
            compute,
            locks,
            default_region: default_region.into(),
        }
    }

    /// Runs the full backend pipeline and persists a `running` record.
    ///
    /// Remote resources created before a failure are left in place and
    /// reported in a warning.
    ///
    /// # Errors
    ///
    /// Returns domain errors for invalid names, names already holding a
    /// frontend record, and unsupported repositories,
    /// source errors when cloning fails, provisioning errors (including
    /// [`ProvisioningTimeout`](crate::deployment::provisioning::ProvisioningError::ProvisioningTimeout))
    /// and registry errors.
    pub async fn deploy(
        &self,
        request: DeployBackendRequest,
    ) -> DeploymentServiceResult<BackendDeployReport> {
        let name = DeploymentName::new(request.name)?;
        let region = request
            .region
            .filter(|region| !region.trim().is_empty())
            .unwrap_or_else(|| self.default_region.clone());
        let _guard = self.locks.lock(&name).await;
        ensure_slot_accepts(&*self.registry, &name, DeploymentKind::Backend).await?;
        info!(%name, repo_url = %request.repo_url, %region, "deploying backend");

        let runtime = self.detect_runtime(&request.repo_url).await?;
        info!(%name, runtime = %runtime, "detected application runtime");

        let group_name = format!("{name}-sg-{}", random_suffix(8));
        let ports = if request.port == SSH_PORT {
            vec![SSH_PORT]
        } else {
            vec![request.port, SSH_PORT]
        };
        let group_id = self
            .compute
            .ensure_access_boundary(&region, &group_name, &ports)
            .await?;

        let user_data = render_boot_script(runtime, &request.repo_url, request.port)
            .inspect_err(|_| report_leaked(&name, &[group_id.as_str()]))?;
        let instance_id = self
            .compute
            .launch_instance(LaunchSpec {
                region: &region,
                name: name.as_str(),
                instance_type: &request.instance_type,
                security_group_id: &group_id,
                user_data,
            })
            .await
            .inspect_err(|_| report_leaked(&name, &[group_id.as_str()]))?;

        let public_ip = self
            .compute
            .wait_until_ready(&region, &instance_id)
            .await
            .inspect_err(|_| report_leaked(&name, &[group_id.as_str(), instance_id.as_str()]))?;

        let url = format!("http://{public_ip}:{}", request.port);
        let record = DeploymentRecord::backend(
            name.clone(),
            BackendDeployment {
                instance_id: instance_id.clone(),
                public_ip: Some(public_ip.clone()),
                port: request.port,
                url: url.clone(),
                security_group_id: group_id.clone(),
                instance_type: request.instance_type.clone(),
                region,
                app_type: runtime,
                repo_url: request.repo_url,
                frontend_url: None,
                instance_state: None,
                launch_time: None,
            },
        );
        let saved = self
            .registry
            .save(record)
            .await
            .inspect_err(|_| report_leaked(&name, &[group_id.as_str(), instance_id.as_str()]))?;

        let cost_per_month = self.compute.estimate_cost(&request.instance_type);
        info!(%name, %url, cost_per_month, "backend deployed");
        Ok(BackendDeployReport {
            instance_id,
            url,
            public_ip,
            port: request.port,
            cost_per_month,
            deployment_info: saved,
        })
    }

    async fn detect_runtime(&self, repo_url: &str) -> DeploymentServiceResult<AppRuntime> {
        let checkout = self.fetcher.fetch(repo_url).await?;
        let detected = AppRuntime::detect(checkout.path());
        if let Err(err) = checkout.discard() {
            warn!(error = %err, "failed to remove working copy");
        }
        detected.map_err(DeploymentServiceError::from)
    }
}

fn report_leaked(name: &DeploymentName, resources: &[&str]) {
    warn!(
        %name,
        resources = ?resources,
        "backend deployment failed; created resources need manual cleanup"
    );
}
