//! Source fetcher shelling out to the `git` CLI.

use crate::deployment::ports::{SourceCheckout, SourceFetchError, SourceFetchResult, SourceFetcher};
use async_trait::async_trait;
use tempfile::TempDir;
use tokio::process::Command;
use tracing::debug;

/// Clones repositories with `git clone --depth 1` into temporary directories.
#[derive(Debug, Clone, Default)]
pub struct GitSourceFetcher;

impl GitSourceFetcher {
    /// Creates a git-backed fetcher.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SourceFetcher for GitSourceFetcher {
    async fn fetch(&self, repo_url: &str) -> SourceFetchResult<SourceCheckout> {
        let root = TempDir::new().map_err(SourceFetchError::workspace)?;
        debug!(repo_url, target = %root.path().display(), "cloning repository");

        let output = Command::new("git")
            .args(["clone", "--depth", "1", "--quiet", "--"])
            .arg(repo_url)
            .arg(root.path())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|err| SourceFetchError::CloneFailed {
                repo_url: repo_url.to_owned(),
                message: format!("failed to run git: {err}"),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SourceFetchError::CloneFailed {
                repo_url: repo_url.to_owned(),
                message: stderr.trim().to_owned(),
            });
        }
        Ok(SourceCheckout::new(root))
    }
}
