//! Deployment registry persisting one JSON document per deployment.
//!
//! Records live at `<state_dir>/<name>.json`. Writes go to a hidden
//! temporary sibling first and are renamed into place, so readers never see
//! a partially written document. All directory access goes through a
//! capability handle opened once at construction.

use crate::deployment::{
    domain::{DeploymentName, DeploymentRecord},
    ports::{DeploymentRegistry, DeploymentRegistryError, DeploymentRegistryResult},
};
use async_trait::async_trait;
use camino::Utf8Path;
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use mockable::Clock;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::sync::{Arc, Mutex};

const RECORD_EXTENSION: &str = ".json";

/// Filesystem-backed deployment registry.
pub struct FilesystemDeploymentRegistry<C>
where
    C: Clock + Send + Sync + 'static,
{
    dir: Arc<Dir>,
    clock: Arc<C>,
    write_guard: Arc<Mutex<()>>,
}

impl<C> Clone for FilesystemDeploymentRegistry<C>
where
    C: Clock + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            dir: Arc::clone(&self.dir),
            clock: Arc::clone(&self.clock),
            write_guard: Arc::clone(&self.write_guard),
        }
    }
}

impl<C> FilesystemDeploymentRegistry<C>
where
    C: Clock + Send + Sync + 'static,
{
    /// Opens the registry rooted at `state_dir`, creating the directory when
    /// it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`DeploymentRegistryError::Persistence`] when the directory
    /// cannot be created or opened.
    pub fn open(state_dir: &Utf8Path, clock: Arc<C>) -> DeploymentRegistryResult<Self> {
        Dir::create_ambient_dir_all(state_dir, ambient_authority())
            .map_err(DeploymentRegistryError::persistence)?;
        let dir = Dir::open_ambient_dir(state_dir, ambient_authority())
            .map_err(DeploymentRegistryError::persistence)?;
        Ok(Self {
            dir: Arc::new(dir),
            clock,
            write_guard: Arc::new(Mutex::new(())),
        })
    }

    async fn run_blocking<F, T>(&self, operation: F) -> DeploymentRegistryResult<T>
    where
        F: FnOnce(&Dir, &C, &Mutex<()>) -> DeploymentRegistryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let dir = Arc::clone(&self.dir);
        let clock = Arc::clone(&self.clock);
        let write_guard = Arc::clone(&self.write_guard);
        tokio::task::spawn_blocking(move || operation(&dir, &*clock, &write_guard))
            .await
            .map_err(DeploymentRegistryError::persistence)?
    }
}

fn record_file(name: &DeploymentName) -> String {
    format!("{name}{RECORD_EXTENSION}")
}

fn read_record(dir: &Dir, file_name: &str) -> DeploymentRegistryResult<Option<DeploymentRecord>> {
    let text = match dir.read_to_string(file_name) {
        Ok(text) => text,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(DeploymentRegistryError::persistence(err)),
    };
    serde_json::from_str(&text)
        .map(Some)
        .map_err(DeploymentRegistryError::invalid_persisted_data)
}

fn write_record(dir: &Dir, record: &DeploymentRecord) -> DeploymentRegistryResult<()> {
    let file_name = record_file(record.name());
    let temp_name = format!(".{file_name}.tmp");
    let document =
        serde_json::to_string_pretty(record).map_err(DeploymentRegistryError::persistence)?;
    dir.write(&temp_name, document)
        .map_err(DeploymentRegistryError::persistence)?;
    dir.rename(&temp_name, dir, &file_name)
        .map_err(DeploymentRegistryError::persistence)
}

fn lock_writes(write_guard: &Mutex<()>) -> DeploymentRegistryResult<std::sync::MutexGuard<'_, ()>> {
    write_guard.lock().map_err(|err| {
        DeploymentRegistryError::persistence(std::io::Error::other(err.to_string()))
    })
}

#[async_trait]
impl<C> DeploymentRegistry for FilesystemDeploymentRegistry<C>
where
    C: Clock + Send + Sync + 'static,
{
    async fn save(&self, record: DeploymentRecord) -> DeploymentRegistryResult<DeploymentRecord> {
        self.run_blocking(move |dir, clock, write_guard| {
            let _guard = lock_writes(write_guard)?;
            let previous = read_record(dir, &record_file(record.name()))?;
            DeploymentRegistryError::check_kind_unchanged(previous.as_ref(), &record)?;
            let stamped = record.stamped(previous.as_ref(), clock);
            write_record(dir, &stamped)?;
            Ok(stamped)
        })
        .await
    }

    async fn load(
        &self,
        name: &DeploymentName,
    ) -> DeploymentRegistryResult<Option<DeploymentRecord>> {
        let file_name = record_file(name);
        self.run_blocking(move |dir, _, _| read_record(dir, &file_name))
            .await
    }

    async fn list(&self) -> DeploymentRegistryResult<BTreeMap<DeploymentName, DeploymentRecord>> {
        self.run_blocking(|dir, _, _| {
            let mut records = BTreeMap::new();
            for listed in dir.entries().map_err(DeploymentRegistryError::persistence)? {
                let entry = listed.map_err(DeploymentRegistryError::persistence)?;
                let file_name = entry
                    .file_name()
                    .map_err(DeploymentRegistryError::persistence)?;
                if file_name.starts_with('.') || !file_name.ends_with(RECORD_EXTENSION) {
                    continue;
                }
                if let Some(record) = read_record(dir, &file_name)? {
                    records.insert(record.name().clone(), record);
                }
            }
            Ok(records)
        })
        .await
    }

    async fn delete(&self, name: &DeploymentName) -> DeploymentRegistryResult<bool> {
        let file_name = record_file(name);
        self.run_blocking(move |dir, _, write_guard| {
            let _guard = lock_writes(write_guard)?;
            match dir.remove_file(&file_name) {
                Ok(()) => Ok(true),
                Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
                Err(err) => Err(DeploymentRegistryError::persistence(err)),
            }
        })
        .await
    }
}
