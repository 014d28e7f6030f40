//! Source repository port.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use thiserror::Error;

/// Result type for source fetch operations.
pub type SourceFetchResult<T> = Result<T, SourceFetchError>;

/// Local working copy of a repository.
///
/// The directory is removed when the checkout is dropped.
#[derive(Debug)]
pub struct SourceCheckout {
    root: TempDir,
}

impl SourceCheckout {
    /// Wraps a temporary directory holding a checked-out tree.
    #[must_use]
    pub const fn new(root: TempDir) -> Self {
        Self { root }
    }

    /// Returns the root of the working copy.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.root.path()
    }

    /// Removes the working copy, reporting cleanup failures.
    ///
    /// # Errors
    ///
    /// Returns [`SourceFetchError::Cleanup`] when the directory cannot be
    /// removed.
    pub fn discard(self) -> SourceFetchResult<()> {
        self.root.close().map_err(SourceFetchError::cleanup)
    }
}

/// Produces local working copies of remote repositories.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Fetches the latest revision of `repo_url` into a fresh directory.
    ///
    /// # Errors
    ///
    /// Returns [`SourceFetchError::CloneFailed`] when the repository cannot
    /// be retrieved.
    async fn fetch(&self, repo_url: &str) -> SourceFetchResult<SourceCheckout>;
}

/// Errors returned by source fetchers.
#[derive(Debug, Clone, Error)]
pub enum SourceFetchError {
    /// The repository could not be cloned.
    #[error("failed to clone {repo_url}: {message}")]
    CloneFailed {
        /// Repository that was requested.
        repo_url: String,
        /// Diagnostic output from the fetcher.
        message: String,
    },

    /// Local filesystem failure while preparing the working copy.
    #[error("workspace error: {0}")]
    Workspace(Arc<dyn std::error::Error + Send + Sync>),

    /// The working copy could not be removed.
    #[error("failed to remove working copy: {0}")]
    Cleanup(Arc<dyn std::error::Error + Send + Sync>),
}

impl SourceFetchError {
    /// Wraps a local workspace failure.
    pub fn workspace(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Workspace(Arc::new(err))
    }

    /// Wraps a cleanup failure.
    pub fn cleanup(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Cleanup(Arc::new(err))
    }
}
