//! Shared world state for deployment workflow scenarios.

use crate::test_helpers::{Simulation, simulation};
use rstest::fixture;
use serde_json::Value;
use skylift::deployment::adapters::memory::InMemoryCompute;
use skylift::gateway::ToolGateway;
use std::sync::Arc;

/// Scenario world wrapping a simulated account and its gateway.
pub struct DeploymentWorld {
    pub simulation: Option<Simulation>,
    pub gateway: Option<ToolGateway>,
    pub last_result: Option<Value>,
}

impl DeploymentWorld {
    /// Creates a world with no account configured yet.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            simulation: None,
            gateway: None,
            last_result: None,
        }
    }

    /// Installs a simulated account backed by `compute`.
    pub fn install(&mut self, compute: InMemoryCompute) {
        let sim = simulation(compute);
        let operations = Arc::clone(&sim.workflows);
        self.gateway = Some(ToolGateway::new(operations));
        self.simulation = Some(sim);
    }

    /// Calls a tool and remembers its result.
    pub fn call(&mut self, tool: &str, arguments: Value) -> Result<&Value, eyre::Report> {
        let gateway = self
            .gateway
            .as_ref()
            .ok_or_else(|| eyre::eyre!("no simulated account in scenario world"))?;
        let result = run_async(gateway.call(tool, arguments));
        Ok(self.last_result.insert(result))
    }

    /// Returns the most recent tool result.
    pub fn result(&self) -> Result<&Value, eyre::Report> {
        self.last_result
            .as_ref()
            .ok_or_else(|| eyre::eyre!("no tool has been called yet"))
    }
}

impl Default for DeploymentWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> DeploymentWorld {
    DeploymentWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
