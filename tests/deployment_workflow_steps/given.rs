//! Given steps for deployment workflow scenarios.

use super::world::DeploymentWorld;
use rstest_bdd_macros::given;
use skylift::deployment::adapters::memory::InMemoryCompute;

#[given("a simulated AWS account")]
fn simulated_account(world: &mut DeploymentWorld) {
    world.install(InMemoryCompute::new());
}

#[given("a simulated AWS account whose instances never start")]
fn stalled_account(world: &mut DeploymentWorld) {
    world.install(InMemoryCompute::never_ready());
}
