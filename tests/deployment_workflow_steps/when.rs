//! When steps for deployment workflow scenarios.

use super::world::DeploymentWorld;
use crate::test_helpers::{API_REPO, WEB_REPO};
use rstest_bdd_macros::when;
use serde_json::json;

#[when(r#"the backend "{name}" is deployed"#)]
fn deploy_backend(world: &mut DeploymentWorld, name: String) -> Result<(), eyre::Report> {
    world.call(
        "deploy_backend_to_ec2",
        json!({"repo_url": API_REPO, "name": name}),
    )?;
    Ok(())
}

#[when(r#"the frontend "{name}" is deployed"#)]
fn deploy_frontend(world: &mut DeploymentWorld, name: String) -> Result<(), eyre::Report> {
    world.call(
        "deploy_frontend_to_s3",
        json!({"repo_url": WEB_REPO, "name": name}),
    )?;
    Ok(())
}

#[when(r#"backend "{backend}" is connected to frontend "{frontend}""#)]
fn connect(
    world: &mut DeploymentWorld,
    backend: String,
    frontend: String,
) -> Result<(), eyre::Report> {
    world.call(
        "connect_services",
        json!({"backend_name": backend, "frontend_name": frontend}),
    )?;
    Ok(())
}
