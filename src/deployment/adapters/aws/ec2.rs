//! Amazon EC2 compute adapter.

use crate::deployment::{
    domain::InstanceSnapshot,
    ports::{
        ComputeApi, ComputeApiError, ComputeApiResult, InstanceLaunchRequest, ResourceTag,
        SecurityGroupRequest,
    },
};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_ec2::Client;
use aws_sdk_ec2::config::Region;
use aws_sdk_ec2::error::DisplayErrorContext;
use aws_sdk_ec2::types::{
    Filter, InstanceType, IpPermission, IpRange, ResourceType, RunInstancesMonitoringEnabled, Tag,
    TagSpecification,
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};

const DUPLICATE_GROUP_MARKERS: [&str; 2] = ["InvalidGroup.Duplicate", "already exists"];
const ANY_ADDRESS: &str = "0.0.0.0/0";

/// Compute provider backed by Amazon EC2.
#[derive(Debug, Clone)]
pub struct Ec2Compute {
    sdk_config: SdkConfig,
}

impl Ec2Compute {
    /// Creates an adapter from loaded SDK configuration.
    #[must_use]
    pub const fn new(sdk_config: SdkConfig) -> Self {
        Self { sdk_config }
    }

    fn client(&self, region: &str) -> Client {
        let config = aws_sdk_ec2::config::Builder::from(&self.sdk_config)
            .region(Region::new(region.to_owned()))
            .build();
        Client::from_conf(config)
    }

    async fn default_vpc_id(&self, client: &Client) -> ComputeApiResult<String> {
        let output = client
            .describe_vpcs()
            .filters(Filter::builder().name("isDefault").values("true").build())
            .send()
            .await
            .map_err(sdk_failure)?;
        output
            .vpcs()
            .first()
            .and_then(|vpc| vpc.vpc_id())
            .map(str::to_owned)
            .ok_or_else(|| ComputeApiError::NotFound("default VPC".to_owned()))
    }
}

fn sdk_failure(err: impl std::error::Error) -> ComputeApiError {
    ComputeApiError::provider_message(DisplayErrorContext(err).to_string())
}

fn tag_specification(resource_type: ResourceType, tags: &[ResourceTag]) -> TagSpecification {
    let sdk_tags = tags
        .iter()
        .map(|tag| Tag::builder().key(&tag.key).value(&tag.value).build())
        .collect();
    TagSpecification::builder()
        .resource_type(resource_type)
        .set_tags(Some(sdk_tags))
        .build()
}

fn launch_time(instance: &aws_sdk_ec2::types::Instance) -> Option<DateTime<Utc>> {
    instance
        .launch_time()
        .and_then(|time| DateTime::from_timestamp(time.secs(), time.subsec_nanos()))
}

#[async_trait]
impl ComputeApi for Ec2Compute {
    async fn create_security_group(
        &self,
        request: &SecurityGroupRequest,
    ) -> ComputeApiResult<String> {
        let client = self.client(&request.region);
        let vpc_id = self.default_vpc_id(&client).await?;
        let output = client
            .create_security_group()
            .group_name(&request.name)
            .description(&request.description)
            .vpc_id(vpc_id)
            .tag_specifications(tag_specification(ResourceType::SecurityGroup, &request.tags))
            .send()
            .await
            .map_err(|err| {
                let message = DisplayErrorContext(err).to_string();
                if DUPLICATE_GROUP_MARKERS
                    .iter()
                    .any(|marker| message.contains(marker))
                {
                    ComputeApiError::AlreadyExists {
                        resource: request.name.clone(),
                    }
                } else {
                    ComputeApiError::provider_message(message)
                }
            })?;
        output
            .group_id()
            .map(str::to_owned)
            .ok_or_else(|| ComputeApiError::provider_message("create_security_group returned no id"))
    }

    async fn find_security_group(
        &self,
        region: &str,
        name: &str,
    ) -> ComputeApiResult<Option<String>> {
        let output = self
            .client(region)
            .describe_security_groups()
            .filters(Filter::builder().name("group-name").values(name).build())
            .send()
            .await
            .map_err(sdk_failure)?;
        Ok(output
            .security_groups()
            .first()
            .and_then(|group| group.group_id())
            .map(str::to_owned))
    }

    async fn authorize_ingress(
        &self,
        region: &str,
        group_id: &str,
        ports: &[u16],
    ) -> ComputeApiResult<()> {
        let permissions = ports
            .iter()
            .map(|port| {
                IpPermission::builder()
                    .ip_protocol("tcp")
                    .from_port(i32::from(*port))
                    .to_port(i32::from(*port))
                    .ip_ranges(
                        IpRange::builder()
                            .cidr_ip(ANY_ADDRESS)
                            .description(format!("Allow port {port}"))
                            .build(),
                    )
                    .build()
            })
            .collect();
        self.client(region)
            .authorize_security_group_ingress()
            .group_id(group_id)
            .set_ip_permissions(Some(permissions))
            .send()
            .await
            .map_err(sdk_failure)?;
        Ok(())
    }

    async fn run_instance(&self, request: &InstanceLaunchRequest) -> ComputeApiResult<String> {
        let output = self
            .client(&request.region)
            .run_instances()
            .image_id(&request.image_id)
            .instance_type(InstanceType::from(request.instance_type.as_str()))
            .min_count(1)
            .max_count(1)
            .security_group_ids(&request.security_group_id)
            .monitoring(
                RunInstancesMonitoringEnabled::builder()
                    .enabled(request.detailed_monitoring)
                    .build(),
            )
            .user_data(STANDARD.encode(&request.user_data))
            .tag_specifications(tag_specification(ResourceType::Instance, &request.tags))
            .send()
            .await
            .map_err(sdk_failure)?;
        output
            .instances()
            .first()
            .and_then(|instance| instance.instance_id())
            .map(str::to_owned)
            .ok_or_else(|| ComputeApiError::provider_message("run_instances returned no instance"))
    }

    async fn describe_instance(
        &self,
        region: &str,
        instance_id: &str,
    ) -> ComputeApiResult<InstanceSnapshot> {
        let output = self
            .client(region)
            .describe_instances()
            .instance_ids(instance_id)
            .send()
            .await
            .map_err(sdk_failure)?;
        let instance = output
            .reservations()
            .first()
            .and_then(|reservation| reservation.instances().first())
            .ok_or_else(|| ComputeApiError::NotFound(format!("instance {instance_id}")))?;

        Ok(InstanceSnapshot {
            instance_id: instance_id.to_owned(),
            state: instance
                .state()
                .and_then(|state| state.name())
                .map_or("unknown", |name| name.as_str())
                .to_owned(),
            public_ip: instance.public_ip_address().map(str::to_owned),
            instance_type: instance
                .instance_type()
                .map_or("unknown", InstanceType::as_str)
                .to_owned(),
            launch_time: launch_time(instance),
        })
    }
}
