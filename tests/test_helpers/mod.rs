//! Shared simulated-account wiring for integration tests.

use skylift::deployment::{
    adapters::memory::{
        InMemoryCompute, InMemoryDeploymentRegistry, InMemoryObjectStorage,
        InMemorySourceFetcher, ScriptedBuildRunner,
    },
    provisioning::ReadinessSettings,
    services::{DeploymentWorkflows, WorkflowParts},
};
use std::sync::Arc;
use std::time::Duration;

pub const API_REPO: &str = "https://example.com/shop/api.git";
pub const WEB_REPO: &str = "https://example.com/shop/web.git";

/// In-memory adapters plus the workflows wired over them.
pub struct Simulation {
    pub registry: Arc<InMemoryDeploymentRegistry>,
    pub compute: Arc<InMemoryCompute>,
    pub storage: Arc<InMemoryObjectStorage>,
    pub workflows: Arc<
        DeploymentWorkflows<
            InMemoryDeploymentRegistry,
            InMemorySourceFetcher,
            InMemoryCompute,
            InMemoryObjectStorage,
            ScriptedBuildRunner,
        >,
    >,
}

/// Builds a simulation serving a Node backend at [`API_REPO`] and a
/// prebuilt site at [`WEB_REPO`].
pub fn simulation(compute: InMemoryCompute) -> Simulation {
    let registry = Arc::new(InMemoryDeploymentRegistry::new());
    let fetcher = Arc::new(InMemorySourceFetcher::new());
    let compute_api = Arc::new(compute);
    let storage = Arc::new(InMemoryObjectStorage::new());

    fetcher
        .add_repository(API_REPO, [("package.json", "{\"name\":\"api\"}"), ("index.js", "")])
        .expect("api repository registers");
    fetcher
        .add_repository(
            WEB_REPO,
            [
                ("package.json", "{\"name\":\"web\"}"),
                ("dist/index.html", "<html></html>"),
                ("dist/assets/app.js", "console.log('hi')"),
                ("dist/assets/logo.svg", "<svg/>"),
            ],
        )
        .expect("web repository registers");

    let workflows = Arc::new(DeploymentWorkflows::new(WorkflowParts {
        registry: Arc::clone(&registry),
        fetcher,
        compute: Arc::clone(&compute_api),
        storage: Arc::clone(&storage),
        builder: Arc::new(ScriptedBuildRunner::new()),
        readiness: ReadinessSettings {
            poll_interval: Duration::from_millis(1),
            settle_delay: Duration::ZERO,
            timeout: Duration::from_millis(50),
        },
        default_region: "us-east-1".to_owned(),
    }));

    Simulation {
        registry,
        compute: compute_api,
        storage,
        workflows,
    }
}
