//! Unit tests for connect, status, cost, list and delete workflows.

use super::harness::{Harness, NODE_REPO, SITE_REPO, harness};
use crate::deployment::{
    domain::{DeploymentDomainError, DeploymentName, STATUS_ERROR},
    ports::DeploymentRegistry,
    services::{
        CORS_NOTE, DeployBackendRequest, DeployFrontendRequest, DeploymentOperations,
        DeploymentServiceError, LookupRole,
    },
};
use rstest::{fixture, rstest};

#[fixture]
fn world() -> Harness {
    harness()
}

fn name(value: &str) -> DeploymentName {
    DeploymentName::new(value).expect("valid name")
}

async fn deploy_pair(world: &Harness) {
    world
        .workflows
        .deploy_backend(DeployBackendRequest::new(NODE_REPO, "api"))
        .await
        .expect("backend deploy succeeds");
    world
        .workflows
        .deploy_frontend(DeployFrontendRequest::new(SITE_REPO, "web"))
        .await
        .expect("frontend deploy succeeds");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn connect_cross_links_both_records(world: Harness) {
    deploy_pair(&world).await;

    let report = world
        .workflows
        .connect("api", "web")
        .await
        .expect("connect succeeds");
    assert_eq!(report.note, CORS_NOTE);

    let backend = world
        .registry
        .load(&name("api"))
        .await
        .expect("load succeeds")
        .expect("backend exists");
    let frontend = world
        .registry
        .load(&name("web"))
        .await
        .expect("load succeeds")
        .expect("frontend exists");

    assert_eq!(backend.connected_to(), Some(&name("web")));
    assert_eq!(frontend.connected_to(), Some(&name("api")));
    assert_eq!(
        backend.as_backend().and_then(|b| b.frontend_url.as_deref()),
        Some(frontend.url())
    );
    assert_eq!(
        frontend.as_frontend().and_then(|f| f.backend_url.as_deref()),
        Some(backend.url())
    );
    assert_eq!(report.backend_url, backend.url());
    assert_eq!(report.frontend_url, frontend.url());
}

#[rstest]
#[case("api", "web", "Backend 'api' not found")]
#[case("ghost", "phantom", "Backend 'ghost' not found")]
#[tokio::test(flavor = "multi_thread")]
async fn connect_reports_missing_backend_first(
    world: Harness,
    #[case] backend: &str,
    #[case] frontend: &str,
    #[case] expected: &str,
) {
    let err = world
        .workflows
        .connect(backend, frontend)
        .await
        .expect_err("nothing is deployed");
    assert_eq!(err.to_string(), expected);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn connect_reports_missing_frontend(world: Harness) {
    world
        .workflows
        .deploy_backend(DeployBackendRequest::new(NODE_REPO, "api"))
        .await
        .expect("backend deploy succeeds");

    let err = world
        .workflows
        .connect("api", "web")
        .await
        .expect_err("frontend is missing");
    assert!(matches!(
        err,
        DeploymentServiceError::NotFound {
            role: LookupRole::Frontend,
            ..
        }
    ));
    assert_eq!(err.to_string(), "Frontend 'web' not found");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn connect_rejects_swapped_roles(world: Harness) {
    deploy_pair(&world).await;

    let err = world
        .workflows
        .connect("web", "api")
        .await
        .expect_err("roles are swapped");
    assert!(matches!(
        err,
        DeploymentServiceError::Domain(DeploymentDomainError::KindMismatch { .. })
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn status_refreshes_live_instance_details(world: Harness) {
    deploy_pair(&world).await;

    let record = world.workflows.status("api").await.expect("status succeeds");
    let backend = record.as_backend().expect("backend details");
    assert_eq!(backend.instance_state.as_deref(), Some("running"));
    assert!(backend.launch_time.is_some());
    assert_eq!(record.status(), "running");
    assert_eq!(record.error(), None);

    let stored = world
        .registry
        .load(&name("api"))
        .await
        .expect("load succeeds")
        .expect("record exists");
    assert_eq!(
        stored.as_backend().and_then(|b| b.instance_state.clone()),
        Some("running".to_owned())
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn status_captures_query_failure_in_record(world: Harness) {
    deploy_pair(&world).await;
    world
        .compute
        .fail_describe("RequestLimitExceeded")
        .expect("failure is scripted");

    let record = world
        .workflows
        .status("api")
        .await
        .expect("status still succeeds");
    assert_eq!(record.status(), STATUS_ERROR);
    assert!(
        record
            .error()
            .is_some_and(|message| message.contains("RequestLimitExceeded"))
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn status_of_frontend_is_the_stored_record(world: Harness) {
    deploy_pair(&world).await;

    let record = world.workflows.status("web").await.expect("status succeeds");
    assert_eq!(record.status(), "deployed");
}

#[rstest]
#[case("ghost")]
#[case("Not A Name")]
#[tokio::test(flavor = "multi_thread")]
async fn status_of_unknown_name_is_not_found(world: Harness, #[case] deployment: &str) {
    let err = world
        .workflows
        .status(deployment)
        .await
        .expect_err("nothing is deployed");
    assert_eq!(err.to_string(), format!("Deployment '{deployment}' not found"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn cost_estimates_follow_deployment_kind(world: Harness) {
    deploy_pair(&world).await;

    let backend = world
        .workflows
        .estimate_cost("api")
        .await
        .expect("estimate succeeds");
    assert!((backend.total_cost_per_month() - 8.47).abs() < f64::EPSILON);
    assert!(backend.breakdown().contains_key("ec2"));

    let frontend = world
        .workflows
        .estimate_cost("web")
        .await
        .expect("estimate succeeds");
    assert!((frontend.total_cost_per_month() - 0.03).abs() < f64::EPSILON);
    assert!(frontend.breakdown().contains_key("s3"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unknown_instance_class_costs_nothing(world: Harness) {
    let mut request = DeployBackendRequest::new(NODE_REPO, "big");
    request.instance_type = "m7i.48xlarge".to_owned();
    world
        .workflows
        .deploy_backend(request)
        .await
        .expect("backend deploy succeeds");

    let estimate = world
        .workflows
        .estimate_cost("big")
        .await
        .expect("estimate succeeds");
    assert!(estimate.total_cost_per_month().abs() < f64::EPSILON);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn cost_of_unknown_name_is_not_found(world: Harness) {
    let err = world
        .workflows
        .estimate_cost("ghost")
        .await
        .expect_err("nothing is deployed");
    assert_eq!(err.to_string(), "Deployment 'ghost' not found");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn list_and_delete_manage_records_only(world: Harness) {
    deploy_pair(&world).await;

    let listed = world.workflows.list().await.expect("list succeeds");
    assert_eq!(
        listed.keys().map(DeploymentName::as_str).collect::<Vec<_>>(),
        vec!["api", "web"]
    );

    assert!(world.workflows.delete("api").await.expect("delete succeeds"));
    assert!(!world.workflows.delete("api").await.expect("delete succeeds"));
    assert!(!world.workflows.delete("Not A Name").await.expect("delete succeeds"));
    assert_eq!(world.compute.launches().len(), 1);
    assert_eq!(world.workflows.list().await.expect("list succeeds").len(), 1);
}
