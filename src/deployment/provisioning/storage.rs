//! Object-storage provisioning: website buckets, site builds and uploads.

use super::{ProvisioningError, ProvisioningResult, management_tag};
use crate::deployment::domain::NODE_MANIFEST;
use crate::deployment::ports::{
    BuildInvocation, BuildRunner, ObjectStorageApi, ObjectUpload, StorageApiError,
};
use crate::shell::split_command;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use walkdir::WalkDir;

/// Page served for the site root and for missing keys.
pub const INDEX_DOCUMENT: &str = "index.html";

/// Output directories checked after a build, in order.
pub const BUILD_OUTPUT_CANDIDATES: [&str; 5] = ["build", "dist", "out", ".next/out", "public"];

/// Storage size assumed when estimating cost.
pub const DEFAULT_STORAGE_GB: f64 = 1.0;

const STORAGE_PRICE_PER_GB: f64 = 0.023;
const REQUEST_COST: f64 = 0.01;
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Returns the public website address of a bucket.
///
/// Every region uses the `s3-website-<region>` host form.
#[must_use]
pub fn website_url(region: &str, bucket: &str) -> String {
    format!("http://{bucket}.s3-website-{region}.amazonaws.com")
}

/// Returns the monthly cost of hosting `storage_gb` of static content.
#[expect(
    clippy::float_arithmetic,
    reason = "storage pricing is linear in gigabytes"
)]
#[must_use]
pub fn storage_monthly_cost(storage_gb: f64) -> f64 {
    storage_gb * STORAGE_PRICE_PER_GB + REQUEST_COST
}

/// Returns the first conventional output directory holding an entry page.
///
/// # Errors
///
/// Returns [`ProvisioningError::MissingBuildOutput`] when no candidate
/// contains `index.html`.
pub fn locate_build_output(repo_root: &Path) -> ProvisioningResult<PathBuf> {
    BUILD_OUTPUT_CANDIDATES
        .iter()
        .map(|candidate| repo_root.join(candidate))
        .find(|dir| dir.join(INDEX_DOCUMENT).is_file())
        .ok_or_else(|| ProvisioningError::MissingBuildOutput {
            candidates: BUILD_OUTPUT_CANDIDATES.iter().map(|c| (*c).to_owned()).collect(),
        })
}

/// Creates website buckets and publishes built sites into them.
pub struct StorageProvisioner<S, B>
where
    S: ObjectStorageApi,
    B: BuildRunner,
{
    storage: Arc<S>,
    builder: Arc<B>,
}

impl<S, B> Clone for StorageProvisioner<S, B>
where
    S: ObjectStorageApi,
    B: BuildRunner,
{
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
            builder: Arc::clone(&self.builder),
        }
    }
}

impl<S, B> StorageProvisioner<S, B>
where
    S: ObjectStorageApi,
    B: BuildRunner,
{
    /// Creates a storage provisioner.
    #[must_use]
    pub const fn new(storage: Arc<S>, builder: Arc<B>) -> Self {
        Self { storage, builder }
    }

    /// Creates a bucket serving a public static website.
    ///
    /// A bucket already owned by the caller is configured like a new one.
    ///
    /// # Errors
    ///
    /// Returns provider errors from any configuration step.
    pub async fn create_site_bucket(&self, region: &str, bucket: &str) -> ProvisioningResult<()> {
        match self.storage.create_bucket(region, bucket).await {
            Ok(()) => info!(bucket, region, "created bucket"),
            Err(StorageApiError::AlreadyOwned(_)) => {
                info!(bucket, region, "bucket already owned, reconfiguring");
            }
            Err(err) => return Err(err.into()),
        }

        self.storage
            .configure_website(region, bucket, INDEX_DOCUMENT, INDEX_DOCUMENT)
            .await?;
        self.storage.allow_public_access(region, bucket).await?;
        self.storage
            .put_bucket_policy(region, bucket, &public_read_policy(bucket))
            .await?;
        self.storage
            .tag_bucket(region, bucket, &[management_tag()])
            .await?;
        Ok(())
    }

    /// Builds the site in a working copy and returns its output directory.
    ///
    /// A `homepage` field in `package.json` is removed first so assets resolve
    /// from the bucket root. A failed `npm install` is logged and the build
    /// still runs.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError::BuildFailure`] for an empty or failing
    /// build command and [`ProvisioningError::MissingBuildOutput`] when no
    /// output directory is found.
    pub async fn build_site(
        &self,
        repo_root: &Path,
        build_command: &str,
    ) -> ProvisioningResult<PathBuf> {
        let (program, args) =
            split_command(build_command).ok_or_else(|| ProvisioningError::BuildFailure {
                command: build_command.to_owned(),
                output: "build command is empty".to_owned(),
            })?;

        let manifest = repo_root.join(NODE_MANIFEST);
        if manifest.is_file() {
            strip_homepage(&manifest).await?;
            let install = BuildInvocation::new(repo_root, "npm", vec!["install".to_owned()]);
            let outcome = self.builder.run(&install).await?;
            if !outcome.succeeded() {
                warn!(stderr = %outcome.stderr.trim(), "npm install reported failures");
            }
        }

        info!(command = build_command, "building site");
        let build = BuildInvocation::new(repo_root, program, args)
            .with_env("PUBLIC_URL", "/")
            .with_env("GENERATE_SOURCEMAP", "false");
        let outcome = self.builder.run(&build).await?;
        if !outcome.succeeded() {
            let output = if outcome.stderr.trim().is_empty() {
                outcome.stdout
            } else {
                outcome.stderr
            };
            return Err(ProvisioningError::BuildFailure {
                command: build_command.to_owned(),
                output: output.trim().to_owned(),
            });
        }

        let output_dir = locate_build_output(repo_root)?;
        info!(output = %output_dir.display(), "found build output");
        Ok(output_dir)
    }

    /// Uploads every file under `dir` to the bucket root.
    ///
    /// Keys are forward-slash relative paths and content types are guessed
    /// from file extensions. Returns the number of uploaded files.
    ///
    /// # Errors
    ///
    /// Returns filesystem errors while reading files and provider errors
    /// from the upload.
    pub async fn upload_directory(
        &self,
        region: &str,
        bucket: &str,
        dir: &Path,
    ) -> ProvisioningResult<u64> {
        let root = dir.to_path_buf();
        let files = tokio::task::spawn_blocking(move || collect_site_files(&root))
            .await
            .map_err(ProvisioningError::filesystem)??;

        let mut uploaded = 0_u64;
        for (key, path) in files {
            let body = tokio::fs::read(&path)
                .await
                .map_err(ProvisioningError::filesystem)?;
            let content_type = mime_guess::from_path(&path)
                .first_raw()
                .unwrap_or(FALLBACK_CONTENT_TYPE)
                .to_owned();
            self.storage
                .put_object(
                    region,
                    bucket,
                    ObjectUpload {
                        key,
                        body,
                        content_type,
                    },
                )
                .await?;
            uploaded += 1;
        }
        info!(bucket, files = uploaded, "uploaded site");
        Ok(uploaded)
    }

    /// Returns the monthly cost of a site of `storage_gb` gigabytes.
    #[must_use]
    pub fn estimate_cost(&self, storage_gb: f64) -> f64 {
        storage_monthly_cost(storage_gb)
    }
}

fn public_read_policy(bucket: &str) -> String {
    json!({
        "Version": "2012-10-17",
        "Statement": [{
            "Sid": "PublicReadGetObject",
            "Effect": "Allow",
            "Principal": "*",
            "Action": "s3:GetObject",
            "Resource": format!("arn:aws:s3:::{bucket}/*"),
        }],
    })
    .to_string()
}

async fn strip_homepage(manifest: &Path) -> ProvisioningResult<()> {
    let text = tokio::fs::read_to_string(manifest)
        .await
        .map_err(ProvisioningError::filesystem)?;
    let mut package: Value = serde_json::from_str(&text).map_err(ProvisioningError::filesystem)?;
    let Some(removed) = package.as_object_mut().and_then(|fields| fields.remove("homepage")) else {
        return Ok(());
    };
    info!(homepage = %removed, "removing homepage from package.json");
    let rewritten =
        serde_json::to_string_pretty(&package).map_err(ProvisioningError::filesystem)?;
    tokio::fs::write(manifest, rewritten)
        .await
        .map_err(ProvisioningError::filesystem)
}

fn collect_site_files(root: &Path) -> ProvisioningResult<Vec<(String, PathBuf)>> {
    let mut files = Vec::new();
    for walked in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = walked.map_err(ProvisioningError::filesystem)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(root)
            .map_err(ProvisioningError::filesystem)?;
        let key = relative
            .components()
            .map(|part| part.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        files.push((key, entry.path().to_path_buf()));
    }
    Ok(files)
}
