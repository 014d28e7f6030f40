//! Typed argument shapes for each tool.
//!
//! Unknown fields are rejected so a misspelt optional argument fails loudly
//! instead of silently taking its default.

use crate::deployment::services::{
    DEFAULT_APP_PORT, DEFAULT_BUILD_COMMAND, DEFAULT_INSTANCE_TYPE, DeployBackendRequest,
    DeployFrontendRequest,
};
use serde::Deserialize;
use serde_json::Value;

fn default_instance_type() -> String {
    DEFAULT_INSTANCE_TYPE.to_owned()
}

const fn default_port() -> u16 {
    DEFAULT_APP_PORT
}

fn default_build_command() -> String {
    DEFAULT_BUILD_COMMAND.to_owned()
}

const fn default_min_size() -> u32 {
    1
}

const fn default_max_size() -> u32 {
    3
}

const fn default_target_cpu() -> u32 {
    70
}

/// Arguments of `deploy_backend_to_ec2`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeployBackendArgs {
    /// Repository to deploy.
    pub repo_url: String,
    /// Deployment name.
    pub name: String,
    /// Instance class.
    #[serde(default = "default_instance_type")]
    pub instance_type: String,
    /// Application port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Region override.
    #[serde(default)]
    pub region: Option<String>,
}

impl From<DeployBackendArgs> for DeployBackendRequest {
    fn from(args: DeployBackendArgs) -> Self {
        Self {
            repo_url: args.repo_url,
            name: args.name,
            instance_type: args.instance_type,
            region: args.region,
            port: args.port,
        }
    }
}

/// Arguments of `deploy_frontend_to_s3`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeployFrontendArgs {
    /// Repository to deploy.
    pub repo_url: String,
    /// Deployment name.
    pub name: String,
    /// Build command.
    #[serde(default = "default_build_command")]
    pub build_command: String,
    /// API address baked into the build.
    #[serde(default)]
    pub backend_url: Option<String>,
    /// Region override.
    #[serde(default)]
    pub region: Option<String>,
}

impl From<DeployFrontendArgs> for DeployFrontendRequest {
    fn from(args: DeployFrontendArgs) -> Self {
        Self {
            repo_url: args.repo_url,
            name: args.name,
            build_command: args.build_command,
            region: args.region,
            backend_url: args.backend_url,
        }
    }
}

/// Arguments of `connect_services`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectServicesArgs {
    /// Backend deployment name.
    pub backend_name: String,
    /// Frontend deployment name.
    pub frontend_name: String,
}

/// Arguments naming a single deployment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeploymentNameArgs {
    /// Deployment name.
    pub deployment_name: String,
}

/// Arguments of `list_deployments`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListDeploymentsArgs {}

/// Arguments of `setup_nginx_proxy`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NginxProxyArgs {
    /// Instance to configure.
    pub instance_name: String,
    /// Route definitions.
    pub routes: Vec<Value>,
}

/// Arguments of `create_autoscaling_group`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AutoscalingArgs {
    /// Instance to scale.
    pub instance_name: String,
    /// Minimum group size.
    #[serde(default = "default_min_size")]
    pub min_size: u32,
    /// Maximum group size.
    #[serde(default = "default_max_size")]
    pub max_size: u32,
    /// Target CPU utilisation percentage.
    #[serde(default = "default_target_cpu")]
    pub target_cpu: u32,
}
