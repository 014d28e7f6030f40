//! Then steps for deployment workflow scenarios.

use super::world::{DeploymentWorld, run_async};
use crate::test_helpers::Simulation;
use rstest_bdd_macros::then;
use serde_json::json;
use skylift::deployment::{domain::DeploymentName, ports::DeploymentRegistry};

#[then("the call succeeds")]
fn call_succeeds(world: &DeploymentWorld) -> Result<(), eyre::Report> {
    let result = world.result()?;
    if result["success"] != true {
        return Err(eyre::eyre!("expected success, found {result}"));
    }
    Ok(())
}

#[then(r#"the call fails mentioning "{fragment}""#)]
fn call_fails(world: &DeploymentWorld, fragment: String) -> Result<(), eyre::Report> {
    let result = world.result()?;
    let error = result["error"]
        .as_str()
        .ok_or_else(|| eyre::eyre!("expected an error field, found {result}"))?;
    if result["success"] != false || !error.contains(&fragment) {
        return Err(eyre::eyre!("expected failure mentioning {fragment:?}, found {result}"));
    }
    Ok(())
}

#[then(r#"the call reports "{message}""#)]
fn call_reports(world: &DeploymentWorld, message: String) -> Result<(), eyre::Report> {
    let result = world.result()?;
    let expected = json!({"success": false, "message": message});
    if *result != expected {
        return Err(eyre::eyre!("expected {expected}, found {result}"));
    }
    Ok(())
}

#[then(r#"deployment "{name}" is linked to "{peer}""#)]
fn linked(world: &mut DeploymentWorld, name: String, peer: String) -> Result<(), eyre::Report> {
    let result = world.call(
        "get_deployment_status",
        json!({"deployment_name": name}),
    )?;
    let connected = &result["deployment"]["connected_to"];
    if connected != peer.as_str() {
        return Err(eyre::eyre!("expected {name} linked to {peer}, found {connected}"));
    }
    Ok(())
}

#[then(r#"the monthly cost of "{name}" is "{amount}""#)]
fn monthly_cost(world: &mut DeploymentWorld, name: String, amount: String) -> Result<(), eyre::Report> {
    let result = world.call(
        "estimate_deployment_cost",
        json!({"deployment_name": name}),
    )?;
    let total = result["total_cost_per_month"].to_string();
    if total != amount {
        return Err(eyre::eyre!("expected {amount} per month, found {total}"));
    }
    Ok(())
}

fn simulation(world: &DeploymentWorld) -> Result<&Simulation, eyre::Report> {
    world
        .simulation
        .as_ref()
        .ok_or_else(|| eyre::eyre!("no simulated account in scenario world"))
}

#[then("{count:usize} instance has been launched")]
fn instances_launched(world: &DeploymentWorld, count: usize) -> Result<(), eyre::Report> {
    let launched = simulation(world)?.compute.launches().len();
    if launched != count {
        return Err(eyre::eyre!("expected {count} launches, found {launched}"));
    }
    Ok(())
}

#[then(r#"the site bucket for "{name}" holds {count:usize} files"#)]
fn bucket_holds(world: &DeploymentWorld, name: String, count: usize) -> Result<(), eyre::Report> {
    let sim = simulation(world)?;
    let prefix = format!("{name}-");
    let bucket = sim
        .storage
        .bucket_names()
        .into_iter()
        .find(|bucket| bucket.starts_with(&prefix))
        .ok_or_else(|| eyre::eyre!("no bucket created for {name}"))?;
    let stored = sim.storage.objects(&bucket).len();
    if stored != count {
        return Err(eyre::eyre!("expected {count} objects in {bucket}, found {stored}"));
    }
    Ok(())
}

#[then(r#"no deployment named "{name}" is recorded"#)]
fn not_recorded(world: &DeploymentWorld, name: String) -> Result<(), eyre::Report> {
    let sim = simulation(world)?;
    let key = DeploymentName::new(name)?;
    if run_async(sim.registry.load(&key))?.is_some() {
        return Err(eyre::eyre!("deployment {key} should not be recorded"));
    }
    Ok(())
}
