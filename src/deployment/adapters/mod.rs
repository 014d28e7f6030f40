//! Adapter implementations for deployment ports.

pub mod aws;
pub mod filesystem;
pub mod git;
pub mod memory;
pub mod process;

pub use filesystem::FilesystemDeploymentRegistry;
pub use git::GitSourceFetcher;
pub use process::ProcessBuildRunner;
