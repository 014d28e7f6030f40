//! In-memory source fetcher materialising fixture repositories.

use crate::deployment::ports::{SourceCheckout, SourceFetchError, SourceFetchResult, SourceFetcher};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};
use tempfile::TempDir;

type RepositoryFiles = BTreeMap<String, String>;

/// Source fetcher serving registered repositories from memory.
///
/// Each fetch writes the registered files into a fresh temporary directory.
#[derive(Debug, Clone, Default)]
pub struct InMemorySourceFetcher {
    state: Arc<RwLock<FetcherState>>,
}

#[derive(Debug, Default)]
struct FetcherState {
    repositories: BTreeMap<String, RepositoryFiles>,
    fetched: Vec<String>,
}

impl InMemorySourceFetcher {
    /// Creates a fetcher with no repositories.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a repository as a list of `(relative path, contents)` pairs.
    ///
    /// # Errors
    ///
    /// Returns workspace errors when lock acquisition fails.
    pub fn add_repository<P, C>(
        &self,
        repo_url: impl Into<String>,
        files: impl IntoIterator<Item = (P, C)>,
    ) -> SourceFetchResult<()>
    where
        P: Into<String>,
        C: Into<String>,
    {
        let mut state = self
            .state
            .write()
            .map_err(|err| SourceFetchError::workspace(std::io::Error::other(err.to_string())))?;
        state.repositories.insert(
            repo_url.into(),
            files
                .into_iter()
                .map(|(path, contents)| (path.into(), contents.into()))
                .collect(),
        );
        Ok(())
    }

    /// Returns the repository URLs fetched so far, in order.
    #[must_use]
    pub fn fetched(&self) -> Vec<String> {
        self.state
            .read()
            .map(|state| state.fetched.clone())
            .unwrap_or_default()
    }
}

fn materialise(files: &RepositoryFiles) -> std::io::Result<TempDir> {
    let root = TempDir::new()?;
    for (relative, contents) in files {
        let path = root.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;
    }
    Ok(root)
}

#[async_trait]
impl SourceFetcher for InMemorySourceFetcher {
    async fn fetch(&self, repo_url: &str) -> SourceFetchResult<SourceCheckout> {
        let registered = {
            let mut state = self.state.write().map_err(|err| {
                SourceFetchError::workspace(std::io::Error::other(err.to_string()))
            })?;
            state.fetched.push(repo_url.to_owned());
            state.repositories.get(repo_url).cloned()
        };
        let files = registered.ok_or_else(|| SourceFetchError::CloneFailed {
            repo_url: repo_url.to_owned(),
            message: "repository not found".to_owned(),
        })?;

        let root = tokio::task::spawn_blocking(move || materialise(&files))
            .await
            .map_err(SourceFetchError::workspace)?
            .map_err(SourceFetchError::workspace)?;
        Ok(SourceCheckout::new(root))
    }
}
