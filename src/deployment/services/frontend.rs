//! Frontend deployment workflow: clone, configure, build, upload, persist.

use super::{DeploymentServiceResult, NameLocks, ensure_slot_accepts, random_suffix};
use crate::deployment::{
    domain::{DeploymentKind, DeploymentName, DeploymentRecord, FrontendDeployment},
    ports::{BuildRunner, DeploymentRegistry, ObjectStorageApi, SourceFetcher},
    provisioning::{DEFAULT_STORAGE_GB, ProvisioningError, StorageProvisioner, website_url},
};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Default command used to build a frontend.
pub const DEFAULT_BUILD_COMMAND: &str = "npm run build";

/// Environment variables through which common frameworks read the API address.
pub const API_URL_VARIABLES: [&str; 3] = ["REACT_APP_API_URL", "VITE_API_URL", "NEXT_PUBLIC_API_URL"];

/// Parameters of a frontend deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployFrontendRequest {
    /// Repository to deploy.
    pub repo_url: String,
    /// Deployment name.
    pub name: String,
    /// Command that builds the site.
    pub build_command: String,
    /// Region override; the service default applies when absent.
    pub region: Option<String>,
    /// API address baked into the build.
    pub backend_url: Option<String>,
}

impl DeployFrontendRequest {
    /// Creates a request with the default build command.
    #[must_use]
    pub fn new(repo_url: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            repo_url: repo_url.into(),
            name: name.into(),
            build_command: DEFAULT_BUILD_COMMAND.to_owned(),
            region: None,
            backend_url: None,
        }
    }
}

/// Outcome of a successful frontend deployment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrontendDeployReport {
    /// Bucket holding the site.
    pub bucket_name: String,
    /// Public website address.
    pub url: String,
    /// Number of uploaded files.
    pub file_count: u64,
    /// Monthly storage cost in USD.
    pub cost_per_month: f64,
    /// Persisted record.
    pub deployment_info: DeploymentRecord,
}

/// Deploys static frontends into website buckets.
pub struct FrontendDeploymentService<R, F, S, B>
where
    R: DeploymentRegistry,
    F: SourceFetcher,
    S: ObjectStorageApi,
    B: BuildRunner,
{
    registry: Arc<R>,
    fetcher: Arc<F>,
    storage: StorageProvisioner<S, B>,
    locks: NameLocks,
    default_region: String,
}

impl<R, F, S, B> FrontendDeploymentService<R, F, S, B>
where
    R: DeploymentRegistry,
    F: SourceFetcher,
    S: ObjectStorageApi,
    B: BuildRunner,
{
    /// Creates a frontend deployment service.
    #[must_use]
    pub fn new(
        registry: Arc<R>,
        fetcher: Arc<F>,
        storage: StorageProvisioner<S, B>,
        locks: NameLocks,
        default_region: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            fetcher,
            storage,
            locks,
            default_region: default_region.into(),
        }
    }

    /// Runs the full frontend pipeline and persists a `deployed` record.
    ///
    /// # Errors
    ///
    /// Returns domain errors for invalid names and names already holding a
    /// backend record, source errors when cloning
    /// fails, provisioning errors for build, bucket and upload failures, and
    /// registry errors.
    pub async fn deploy(
        &self,
        request: DeployFrontendRequest,
    ) -> DeploymentServiceResult<FrontendDeployReport> {
        let name = DeploymentName::new(request.name)?;
        let region = request
            .region
            .filter(|region| !region.trim().is_empty())
            .unwrap_or_else(|| self.default_region.clone());
        let backend_url = request.backend_url.filter(|url| !url.trim().is_empty());
        let _guard = self.locks.lock(&name).await;
        ensure_slot_accepts(&*self.registry, &name, DeploymentKind::Frontend).await?;
        info!(%name, repo_url = %request.repo_url, %region, "deploying frontend");

        let checkout = self.fetcher.fetch(&request.repo_url).await?;
        if let Some(url) = &backend_url {
            info!(%name, backend_url = %url, "configuring backend address");
            write_api_env(checkout.path(), url).await?;
        }

        let build_dir = self
            .storage
            .build_site(checkout.path(), &request.build_command)
            .await?;

        let bucket_name = format!("{}-{}", name.bucket_prefix(), random_suffix(12));
        self.storage.create_site_bucket(&region, &bucket_name).await?;
        let file_count = self
            .storage
            .upload_directory(&region, &bucket_name, &build_dir)
            .await?;
        if let Err(err) = checkout.discard() {
            warn!(error = %err, "failed to remove working copy");
        }

        let url = website_url(&region, &bucket_name);
        let record = DeploymentRecord::frontend(
            name.clone(),
            FrontendDeployment {
                bucket_name: bucket_name.clone(),
                url: url.clone(),
                region,
                file_count,
                build_command: request.build_command,
                repo_url: request.repo_url,
                backend_url,
            },
        );
        let saved = self.registry.save(record).await?;

        let cost_per_month = self.storage.estimate_cost(DEFAULT_STORAGE_GB);
        info!(%name, %url, file_count, "frontend deployed");
        Ok(FrontendDeployReport {
            bucket_name,
            url,
            file_count,
            cost_per_month,
            deployment_info: saved,
        })
    }
}

async fn write_api_env(repo_root: &Path, backend_url: &str) -> Result<(), ProvisioningError> {
    let contents: String = API_URL_VARIABLES
        .iter()
        .map(|variable| format!("{variable}={backend_url}\n"))
        .collect();
    tokio::fs::write(repo_root.join(".env"), contents)
        .await
        .map_err(ProvisioningError::filesystem)
}
