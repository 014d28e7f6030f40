//! Compute provisioning: access boundaries, instances and readiness.

use super::{ProvisioningError, ProvisioningResult, managed_tags};
use crate::deployment::domain::InstanceSnapshot;
use crate::deployment::ports::{
    ComputeApi, ComputeApiError, InstanceLaunchRequest, SecurityGroupRequest,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::{debug, info};

/// Monthly on-demand price in USD per instance class.
const INSTANCE_COSTS: &[(&str, f64)] = &[
    ("t2.nano", 4.25),
    ("t2.micro", 8.47),
    ("t2.small", 16.79),
    ("t2.medium", 33.58),
    ("t3.nano", 3.80),
    ("t3.micro", 7.59),
    ("t3.small", 15.18),
    ("t3.medium", 30.37),
    ("t3.large", 60.74),
];

/// Ubuntu 24.04 LTS base images per region.
const BASE_IMAGES: &[(&str, &str)] = &[
    ("us-east-1", "ami-0c7217cdde317cfec"),
    ("us-east-2", "ami-0ea3c35c5c3284d82"),
    ("us-west-1", "ami-0d5ae304a0b933620"),
    ("us-west-2", "ami-0aff18ec83b712f05"),
    ("eu-west-1", "ami-0d64bb532e0502c46"),
    ("eu-central-1", "ami-0084a47cc718c111a"),
];

/// Timing of the instance readiness wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessSettings {
    /// Delay between two state queries.
    pub poll_interval: Duration,
    /// Grace period after the instance is reachable, letting the boot script run.
    pub settle_delay: Duration,
    /// Overall bound on the wait.
    pub timeout: Duration,
}

impl Default for ReadinessSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(10),
            settle_delay: Duration::from_secs(60),
            timeout: Duration::from_secs(600),
        }
    }
}

/// Returns the monthly cost of an instance class, or `0.0` when unknown.
#[must_use]
pub fn instance_monthly_cost(instance_type: &str) -> f64 {
    INSTANCE_COSTS
        .iter()
        .find(|(class, _)| *class == instance_type)
        .map_or(0.0, |(_, cost)| *cost)
}

/// Returns the base image configured for a region.
///
/// # Errors
///
/// Returns [`ProvisioningError::Configuration`] for regions without an image.
pub fn base_image(region: &str) -> ProvisioningResult<&'static str> {
    BASE_IMAGES
        .iter()
        .find(|(name, _)| *name == region)
        .map(|(_, image)| *image)
        .ok_or_else(|| {
            let supported: Vec<&str> = BASE_IMAGES.iter().map(|(name, _)| *name).collect();
            ProvisioningError::Configuration(format!(
                "No AMI configured for region {region}. Supported regions: {}",
                supported.join(", ")
            ))
        })
}

/// Instance launch parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec<'a> {
    /// Provider region.
    pub region: &'a str,
    /// Deployment name used for the `Name` tag.
    pub name: &'a str,
    /// Instance class.
    pub instance_type: &'a str,
    /// Access boundary attached to the instance.
    pub security_group_id: &'a str,
    /// Rendered boot script.
    pub user_data: String,
}

/// Creates and inspects compute resources through a [`ComputeApi`].
pub struct ComputeProvisioner<A>
where
    A: ComputeApi,
{
    api: Arc<A>,
    readiness: ReadinessSettings,
}

impl<A> Clone for ComputeProvisioner<A>
where
    A: ComputeApi,
{
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            readiness: self.readiness,
        }
    }
}

impl<A> ComputeProvisioner<A>
where
    A: ComputeApi,
{
    /// Creates a provisioner with the given readiness timing.
    #[must_use]
    pub const fn new(api: Arc<A>, readiness: ReadinessSettings) -> Self {
        Self { api, readiness }
    }

    /// Returns the readiness timing in use.
    #[must_use]
    pub const fn readiness(&self) -> ReadinessSettings {
        self.readiness
    }

    /// Creates a security group opening `ports` to any source address.
    ///
    /// A group that already exists under `group_name` is reused as is.
    ///
    /// # Errors
    ///
    /// Returns provider errors other than the name conflict, or a provider
    /// error when the conflicting group cannot be found again.
    pub async fn ensure_access_boundary(
        &self,
        region: &str,
        group_name: &str,
        ports: &[u16],
    ) -> ProvisioningResult<String> {
        let request = SecurityGroupRequest {
            region: region.to_owned(),
            name: group_name.to_owned(),
            description: format!("Security group for {group_name}"),
            tags: managed_tags(group_name),
        };

        match self.api.create_security_group(&request).await {
            Ok(group_id) => {
                if !ports.is_empty() {
                    self.api.authorize_ingress(region, &group_id, ports).await?;
                }
                info!(%group_id, group_name, ?ports, "created security group");
                Ok(group_id)
            }
            Err(ComputeApiError::AlreadyExists { .. }) => {
                let group_id = self
                    .api
                    .find_security_group(region, group_name)
                    .await?
                    .ok_or_else(|| ComputeApiError::NotFound(format!("security group {group_name}")))?;
                info!(%group_id, group_name, "reusing existing security group");
                Ok(group_id)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Launches one tagged instance from the region's base image.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError::Configuration`] for unsupported regions
    /// and provider errors from the launch call.
    pub async fn launch_instance(&self, spec: LaunchSpec<'_>) -> ProvisioningResult<String> {
        let image_id = base_image(spec.region)?;
        let request = InstanceLaunchRequest {
            region: spec.region.to_owned(),
            image_id: image_id.to_owned(),
            instance_type: spec.instance_type.to_owned(),
            security_group_id: spec.security_group_id.to_owned(),
            user_data: spec.user_data,
            tags: managed_tags(spec.name),
            detailed_monitoring: true,
        };
        let instance_id = self.api.run_instance(&request).await?;
        info!(%instance_id, image_id, instance_type = spec.instance_type, "launched instance");
        Ok(instance_id)
    }

    /// Polls until the instance runs with a public address, then waits the
    /// settle delay and returns the address.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError::ProvisioningTimeout`] when the instance is
    /// not reachable within the configured timeout, or provider errors from
    /// the state query.
    pub async fn wait_until_ready(
        &self,
        region: &str,
        instance_id: &str,
    ) -> ProvisioningResult<String> {
        let started = Instant::now();
        loop {
            let snapshot = self.api.describe_instance(region, instance_id).await?;
            debug!(instance_id, state = %snapshot.state, "polled instance state");

            if let Some(address) = snapshot.ready_address() {
                info!(
                    instance_id,
                    public_ip = address,
                    settle_secs = self.readiness.settle_delay.as_secs(),
                    "instance running, waiting for application start"
                );
                let public_ip = address.to_owned();
                sleep(self.readiness.settle_delay).await;
                return Ok(public_ip);
            }

            if started.elapsed() >= self.readiness.timeout {
                return Err(ProvisioningError::ProvisioningTimeout {
                    instance_id: instance_id.to_owned(),
                    waited_secs: self.readiness.timeout.as_secs(),
                });
            }
            sleep(self.readiness.poll_interval).await;
        }
    }

    /// Returns a point-in-time view of an instance.
    ///
    /// # Errors
    ///
    /// Returns provider errors from the state query.
    pub async fn instance_info(
        &self,
        region: &str,
        instance_id: &str,
    ) -> ProvisioningResult<InstanceSnapshot> {
        Ok(self.api.describe_instance(region, instance_id).await?)
    }

    /// Returns the monthly cost of an instance class, or `0.0` when unknown.
    #[must_use]
    pub fn estimate_cost(&self, instance_type: &str) -> f64 {
        instance_monthly_cost(instance_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deployment::ports::ComputeApiResult;
    use async_trait::async_trait;
    use mockall::{Sequence, mock};
    use rstest::rstest;

    mock! {
        Compute {}

        #[async_trait]
        impl ComputeApi for Compute {
            async fn create_security_group(
                &self,
                request: &SecurityGroupRequest,
            ) -> ComputeApiResult<String>;
            async fn find_security_group(
                &self,
                region: &str,
                name: &str,
            ) -> ComputeApiResult<Option<String>>;
            async fn authorize_ingress(
                &self,
                region: &str,
                group_id: &str,
                ports: &[u16],
            ) -> ComputeApiResult<()>;
            async fn run_instance(&self, request: &InstanceLaunchRequest) -> ComputeApiResult<String>;
            async fn describe_instance(
                &self,
                region: &str,
                instance_id: &str,
            ) -> ComputeApiResult<InstanceSnapshot>;
        }
    }

    fn instant_readiness() -> ReadinessSettings {
        ReadinessSettings {
            poll_interval: Duration::ZERO,
            settle_delay: Duration::ZERO,
            timeout: Duration::ZERO,
        }
    }

    fn snapshot(state: &str, public_ip: Option<&str>) -> InstanceSnapshot {
        InstanceSnapshot {
            instance_id: "i-0abc".to_owned(),
            state: state.to_owned(),
            public_ip: public_ip.map(str::to_owned),
            instance_type: "t2.micro".to_owned(),
            launch_time: None,
        }
    }

    fn provisioner(api: MockCompute, readiness: ReadinessSettings) -> ComputeProvisioner<MockCompute> {
        ComputeProvisioner::new(Arc::new(api), readiness)
    }

    #[rstest]
    #[case("t2.micro", 8.47)]
    #[case("t3.large", 60.74)]
    #[case("t2.nano", 4.25)]
    #[case("m5.24xlarge", 0.0)]
    fn instance_cost_table(#[case] instance_type: &str, #[case] expected: f64) {
        assert!((instance_monthly_cost(instance_type) - expected).abs() < f64::EPSILON);
    }

    #[test]
    fn unsupported_region_is_a_configuration_error() {
        assert_eq!(base_image("eu-west-1").ok(), Some("ami-0d64bb532e0502c46"));
        assert!(matches!(
            base_image("ap-south-1"),
            Err(ProvisioningError::Configuration(message)) if message.contains("ap-south-1")
        ));
    }

    #[tokio::test]
    async fn new_group_gets_ingress_rules() {
        let mut api = MockCompute::new();
        api.expect_create_security_group()
            .withf(|request| {
                request.name == "api-sg-0011aabb"
                    && request.tags.iter().any(|tag| tag.key == "ManagedBy" && tag.value == "skylift")
            })
            .times(1)
            .returning(|_| Ok("sg-123".to_owned()));
        api.expect_authorize_ingress()
            .withf(|region, group_id, ports| {
                region == "us-east-1" && group_id == "sg-123" && ports == [3000, 22]
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let group_id = provisioner(api, instant_readiness())
            .ensure_access_boundary("us-east-1", "api-sg-0011aabb", &[3000, 22])
            .await
            .expect("group should be created");

        assert_eq!(group_id, "sg-123");
    }

    #[tokio::test]
    async fn existing_group_is_reused_without_new_rules() {
        let mut api = MockCompute::new();
        api.expect_create_security_group().returning(|request| {
            Err(ComputeApiError::AlreadyExists {
                resource: request.name.clone(),
            })
        });
        api.expect_find_security_group()
            .withf(|region, name| region == "us-east-1" && name == "api-sg-0011aabb")
            .times(1)
            .returning(|_, _| Ok(Some("sg-existing".to_owned())));
        api.expect_authorize_ingress().never();

        let group_id = provisioner(api, instant_readiness())
            .ensure_access_boundary("us-east-1", "api-sg-0011aabb", &[3000, 22])
            .await
            .expect("existing group should be reused");

        assert_eq!(group_id, "sg-existing");
    }

    #[tokio::test]
    async fn other_provider_failures_propagate() {
        let mut api = MockCompute::new();
        api.expect_create_security_group()
            .returning(|_| Err(ComputeApiError::provider_message("UnauthorizedOperation")));
        api.expect_find_security_group().never();

        let result = provisioner(api, instant_readiness())
            .ensure_access_boundary("us-east-1", "api-sg-1", &[22])
            .await;

        assert!(matches!(
            result,
            Err(ProvisioningError::Compute(ComputeApiError::Provider(_)))
        ));
    }

    #[tokio::test]
    async fn launch_uses_region_image_and_name_tag() {
        let mut api = MockCompute::new();
        api.expect_run_instance()
            .withf(|request| {
                request.image_id == "ami-0ea3c35c5c3284d82"
                    && request.instance_type == "t3.small"
                    && request.tags.iter().any(|tag| tag.key == "Name" && tag.value == "api")
                    && request.detailed_monitoring
            })
            .times(1)
            .returning(|_| Ok("i-0abc".to_owned()));

        let instance_id = provisioner(api, instant_readiness())
            .launch_instance(LaunchSpec {
                region: "us-east-2",
                name: "api",
                instance_type: "t3.small",
                security_group_id: "sg-1",
                user_data: "#!/bin/bash".to_owned(),
            })
            .await
            .expect("launch should succeed");

        assert_eq!(instance_id, "i-0abc");
    }

    #[tokio::test]
    async fn launch_in_unsupported_region_fails_before_provider_call() {
        let mut api = MockCompute::new();
        api.expect_run_instance().never();

        let result = provisioner(api, instant_readiness())
            .launch_instance(LaunchSpec {
                region: "sa-east-1",
                name: "api",
                instance_type: "t2.micro",
                security_group_id: "sg-1",
                user_data: String::new(),
            })
            .await;

        assert!(matches!(result, Err(ProvisioningError::Configuration(_))));
    }

    #[tokio::test]
    async fn wait_returns_address_once_running() {
        let mut api = MockCompute::new();
        let mut sequence = Sequence::new();
        api.expect_describe_instance()
            .times(2)
            .in_sequence(&mut sequence)
            .returning(|_, _| Ok(snapshot("pending", None)));
        api.expect_describe_instance()
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_, _| Ok(snapshot("running", Some("54.1.2.3"))));

        let readiness = ReadinessSettings {
            timeout: Duration::from_secs(60),
            ..instant_readiness()
        };
        let address = provisioner(api, readiness)
            .wait_until_ready("us-east-1", "i-0abc")
            .await
            .expect("instance should become ready");

        assert_eq!(address, "54.1.2.3");
    }

    #[tokio::test]
    async fn wait_times_out_when_instance_stays_pending() {
        let mut api = MockCompute::new();
        api.expect_describe_instance()
            .returning(|_, _| Ok(snapshot("pending", None)));

        let result = provisioner(api, instant_readiness())
            .wait_until_ready("us-east-1", "i-0abc")
            .await;

        assert!(matches!(
            result,
            Err(ProvisioningError::ProvisioningTimeout { instance_id, .. }) if instance_id == "i-0abc"
        ));
    }
}
