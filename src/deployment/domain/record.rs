//! Deployment record aggregate root.

use super::{AppRuntime, DeploymentDomainError, DeploymentName, InstanceSnapshot};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Status written when a backend instance finished provisioning.
pub const STATUS_RUNNING: &str = "running";
/// Status written when a frontend finished uploading.
pub const STATUS_DEPLOYED: &str = "deployed";
/// Status written when a live status query failed.
pub const STATUS_ERROR: &str = "error";

/// Kind of a deployment. Never changes after a record is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentKind {
    /// Application server running on a compute instance.
    Backend,
    /// Static site served from an object-storage bucket.
    Frontend,
}

impl DeploymentKind {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Backend => "backend",
            Self::Frontend => "frontend",
        }
    }
}

impl fmt::Display for DeploymentKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Backend-specific deployment details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendDeployment {
    /// Provider instance identifier.
    pub instance_id: String,
    /// Public IPv4 address of the instance.
    pub public_ip: Option<String>,
    /// Port the application listens on.
    pub port: u16,
    /// Base URL of the application.
    pub url: String,
    /// Access boundary attached to the instance.
    pub security_group_id: String,
    /// Instance class the application runs on.
    pub instance_type: String,
    /// Provider region.
    pub region: String,
    /// Runtime detected from the repository.
    pub app_type: AppRuntime,
    /// Source repository URL.
    pub repo_url: String,
    /// Website address of the connected frontend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frontend_url: Option<String>,
    /// Provider state observed by the latest status refresh.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_state: Option<String>,
    /// Launch time observed by the latest status refresh.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub launch_time: Option<DateTime<Utc>>,
}

/// Frontend-specific deployment details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontendDeployment {
    /// Bucket holding the site.
    pub bucket_name: String,
    /// Public website address.
    pub url: String,
    /// Provider region.
    pub region: String,
    /// Number of uploaded files.
    pub file_count: u64,
    /// Command used to build the site.
    pub build_command: String,
    /// Source repository URL.
    pub repo_url: String,
    /// API address baked into the build or recorded by a connection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend_url: Option<String>,
}

/// Kind-specific half of a deployment record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeploymentTarget {
    /// Compute-hosted application server.
    Backend(BackendDeployment),
    /// Bucket-hosted static site.
    Frontend(FrontendDeployment),
}

impl DeploymentTarget {
    /// Returns the deployment kind.
    #[must_use]
    pub const fn kind(&self) -> DeploymentKind {
        match self {
            Self::Backend(_) => DeploymentKind::Backend,
            Self::Frontend(_) => DeploymentKind::Frontend,
        }
    }

    /// Returns the public address of the deployment.
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::Backend(backend) => &backend.url,
            Self::Frontend(frontend) => &frontend.url,
        }
    }
}

/// Persisted description of one provisioned backend or frontend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    name: DeploymentName,
    #[serde(flatten)]
    target: DeploymentTarget,
    status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    connected_to: Option<DeploymentName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    updated_at: Option<DateTime<Utc>>,
}

impl DeploymentRecord {
    /// Creates a record for a backend whose instance is running.
    #[must_use]
    pub fn backend(name: DeploymentName, backend: BackendDeployment) -> Self {
        Self::with_target(name, DeploymentTarget::Backend(backend), STATUS_RUNNING)
    }

    /// Creates a record for a frontend whose files were uploaded.
    #[must_use]
    pub fn frontend(name: DeploymentName, frontend: FrontendDeployment) -> Self {
        Self::with_target(name, DeploymentTarget::Frontend(frontend), STATUS_DEPLOYED)
    }

    fn with_target(name: DeploymentName, target: DeploymentTarget, status: &str) -> Self {
        Self {
            name,
            target,
            status: status.to_owned(),
            error: None,
            connected_to: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// Returns the deployment name.
    #[must_use]
    pub const fn name(&self) -> &DeploymentName {
        &self.name
    }

    /// Returns the deployment kind.
    #[must_use]
    pub const fn kind(&self) -> DeploymentKind {
        self.target.kind()
    }

    /// Returns the kind-specific details.
    #[must_use]
    pub const fn target(&self) -> &DeploymentTarget {
        &self.target
    }

    /// Returns backend details when this is a backend record.
    #[must_use]
    pub const fn as_backend(&self) -> Option<&BackendDeployment> {
        match &self.target {
            DeploymentTarget::Backend(backend) => Some(backend),
            DeploymentTarget::Frontend(_) => None,
        }
    }

    /// Returns frontend details when this is a frontend record.
    #[must_use]
    pub const fn as_frontend(&self) -> Option<&FrontendDeployment> {
        match &self.target {
            DeploymentTarget::Frontend(frontend) => Some(frontend),
            DeploymentTarget::Backend(_) => None,
        }
    }

    /// Returns the public address of the deployment.
    #[must_use]
    pub fn url(&self) -> &str {
        self.target.url()
    }

    /// Returns the free-form status string.
    #[must_use]
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Returns the error captured by the last failed status refresh.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Returns the name of the paired deployment.
    #[must_use]
    pub const fn connected_to(&self) -> Option<&DeploymentName> {
        self.connected_to.as_ref()
    }

    /// Returns the creation timestamp once the record has been saved.
    #[must_use]
    pub const fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    /// Returns the latest save timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// Validates that the record has the expected kind.
    ///
    /// # Errors
    ///
    /// Returns [`DeploymentDomainError::KindMismatch`] for the other kind.
    pub fn ensure_kind(&self, expected: DeploymentKind) -> Result<(), DeploymentDomainError> {
        let actual = self.kind();
        if actual == expected {
            return Ok(());
        }
        Err(DeploymentDomainError::KindMismatch {
            name: self.name.as_str().to_owned(),
            expected,
            actual,
        })
    }

    /// Records the paired deployment and its address.
    ///
    /// A backend stores the peer's address as `frontend_url`, a frontend as
    /// `backend_url`.
    pub fn link_peer(&mut self, peer_name: DeploymentName, peer_url: impl Into<String>) {
        let url = Some(peer_url.into());
        match &mut self.target {
            DeploymentTarget::Backend(backend) => backend.frontend_url = url,
            DeploymentTarget::Frontend(frontend) => frontend.backend_url = url,
        }
        self.connected_to = Some(peer_name);
    }

    /// Applies live instance details to a backend record.
    ///
    /// The record status takes the provider state and any previous refresh
    /// error is cleared. Frontend records are left untouched.
    pub fn apply_instance_snapshot(&mut self, snapshot: &InstanceSnapshot) {
        let DeploymentTarget::Backend(backend) = &mut self.target else {
            return;
        };
        backend.instance_state = Some(snapshot.state.clone());
        backend.public_ip.clone_from(&snapshot.public_ip);
        backend.instance_type.clone_from(&snapshot.instance_type);
        backend.launch_time = snapshot.launch_time;
        self.status.clone_from(&snapshot.state);
        self.error = None;
    }

    /// Captures a failed live status query in the record.
    pub fn record_refresh_failure(&mut self, message: impl Into<String>) {
        STATUS_ERROR.clone_into(&mut self.status);
        self.error = Some(message.into());
    }

    /// Stamps persistence timestamps ahead of a save.
    ///
    /// `created_at` is kept when already set, otherwise inherited from the
    /// previously stored record, otherwise set to now. `updated_at` never
    /// moves backwards relative to either record.
    #[must_use]
    pub fn stamped(mut self, previous: Option<&Self>, clock: &impl Clock) -> Self {
        let now = clock.utc();
        let previous_updated = previous.and_then(Self::updated_at);
        let updated_at = [Some(now), previous_updated, self.updated_at]
            .into_iter()
            .flatten()
            .max()
            .unwrap_or(now);
        self.created_at = self
            .created_at
            .or_else(|| previous.and_then(Self::created_at))
            .or(Some(updated_at));
        self.updated_at = Some(updated_at);
        self
    }
}
