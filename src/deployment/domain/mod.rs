//! Domain model for deployments.
//!
//! A deployment is either a backend on a compute instance or a static
//! frontend in a storage bucket. Records carry only the fields relevant to
//! their kind; infrastructure concerns remain outside this boundary.

mod cost;
mod error;
mod instance;
mod name;
mod record;
mod runtime;

pub use cost::{CURRENCY, CostEstimate, round_to_cents};
pub use error::{DeploymentDomainError, ParseAppRuntimeError};
pub use instance::{InstanceSnapshot, RUNNING_STATE};
pub use name::DeploymentName;
pub use record::{
    BackendDeployment, DeploymentKind, DeploymentRecord, DeploymentTarget, FrontendDeployment,
    STATUS_DEPLOYED, STATUS_ERROR, STATUS_RUNNING,
};
pub use runtime::{AppRuntime, NODE_MANIFEST, PYTHON_MANIFEST};
