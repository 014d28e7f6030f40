//! Serves the Skylift deployment tools over JSON-RPC on stdin and stdout.
//!
//! Usage:
//!
//! ```text
//! skylift-mcp [--region us-east-1] [--state-dir ./deployments] [--simulate]
//! ```
//!
//! Every flag can also be set through its environment variable; see
//! `skylift-mcp --help`. Logs go to stderr because stdout carries the
//! protocol. With `--simulate` the EC2 and S3 providers are replaced by
//! in-memory ones while cloning and builds still run locally.

use clap::Parser;
use mockable::DefaultClock;
use skylift::config::{AgentArgs, AgentConfig};
use skylift::deployment::adapters::aws::{Ec2Compute, S3ObjectStorage, load_sdk_config};
use skylift::deployment::adapters::memory::{InMemoryCompute, InMemoryObjectStorage};
use skylift::deployment::adapters::{
    FilesystemDeploymentRegistry, GitSourceFetcher, ProcessBuildRunner,
};
use skylift::deployment::ports::{ComputeApi, ObjectStorageApi};
use skylift::deployment::services::{DeploymentOperations, DeploymentWorkflows, WorkflowParts};
use skylift::gateway::{ToolGateway, serve_stdio};
use skylift::observability::init_logging;
use std::sync::Arc;
use tracing::info;

/// Boxed error type for the main result.
type BoxError = Box<dyn std::error::Error + Send + Sync>;

type Registry = FilesystemDeploymentRegistry<DefaultClock>;

fn workflows<A, S>(
    config: &AgentConfig,
    registry: Arc<Registry>,
    compute: Arc<A>,
    storage: Arc<S>,
) -> Arc<dyn DeploymentOperations>
where
    A: ComputeApi + 'static,
    S: ObjectStorageApi + 'static,
{
    Arc::new(DeploymentWorkflows::new(WorkflowParts {
        registry,
        fetcher: Arc::new(GitSourceFetcher::new()),
        compute,
        storage,
        builder: Arc::new(ProcessBuildRunner::new()),
        readiness: config.readiness,
        default_region: config.region.clone(),
    }))
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let config = AgentConfig::try_from(AgentArgs::parse())?;
    init_logging(config.log_json)?;

    let registry = Arc::new(Registry::open(&config.state_dir, Arc::new(DefaultClock))?);
    info!(
        region = %config.region,
        state_dir = %config.state_dir,
        simulate = config.simulate,
        "starting skylift tool server"
    );

    let operations = if config.simulate {
        workflows(
            &config,
            registry,
            Arc::new(InMemoryCompute::new()),
            Arc::new(InMemoryObjectStorage::new()),
        )
    } else {
        let sdk_config = load_sdk_config(&config.region).await;
        workflows(
            &config,
            registry,
            Arc::new(Ec2Compute::new(sdk_config.clone())),
            Arc::new(S3ObjectStorage::new(sdk_config)),
        )
    };

    serve_stdio(ToolGateway::new(operations)).await?;
    Ok(())
}
