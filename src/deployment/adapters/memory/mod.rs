//! In-memory adapters for tests and simulated runs.

mod build;
mod compute;
mod registry;
mod source;
mod storage;

pub use build::ScriptedBuildRunner;
pub use compute::InMemoryCompute;
pub use registry::InMemoryDeploymentRegistry;
pub use source::InMemorySourceFetcher;
pub use storage::{InMemoryObjectStorage, SimulatedBucket, StoredObject};
