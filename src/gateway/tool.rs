//! Tool catalogue: names, descriptions and input schemas.

use serde::Serialize;
use serde_json::{Value, json};
use std::fmt;

/// Every operation the gateway exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolName {
    /// Deploy a backend to a compute instance.
    DeployBackend,
    /// Deploy a static frontend to a website bucket.
    DeployFrontend,
    /// Cross-link a backend and a frontend.
    ConnectServices,
    /// Refresh and return a deployment record.
    GetDeploymentStatus,
    /// Estimate the monthly cost of a deployment.
    EstimateDeploymentCost,
    /// List every recorded deployment.
    ListDeployments,
    /// Forget a deployment record.
    DeleteDeployment,
    /// Reverse proxy placeholder.
    SetupNginxProxy,
    /// Auto-scaling placeholder.
    CreateAutoscalingGroup,
}

impl ToolName {
    /// All tools in catalogue order.
    pub const ALL: [Self; 9] = [
        Self::DeployBackend,
        Self::DeployFrontend,
        Self::ConnectServices,
        Self::GetDeploymentStatus,
        Self::EstimateDeploymentCost,
        Self::ListDeployments,
        Self::DeleteDeployment,
        Self::SetupNginxProxy,
        Self::CreateAutoscalingGroup,
    ];

    /// Returns the wire name of the tool.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DeployBackend => "deploy_backend_to_ec2",
            Self::DeployFrontend => "deploy_frontend_to_s3",
            Self::ConnectServices => "connect_services",
            Self::GetDeploymentStatus => "get_deployment_status",
            Self::EstimateDeploymentCost => "estimate_deployment_cost",
            Self::ListDeployments => "list_deployments",
            Self::DeleteDeployment => "delete_deployment",
            Self::SetupNginxProxy => "setup_nginx_proxy",
            Self::CreateAutoscalingGroup => "create_autoscaling_group",
        }
    }

    /// Resolves a wire name.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.as_str() == name)
    }

    /// Returns the one-line description published to clients.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::DeployBackend => {
                "Deploy a Node.js or Python backend from a Git repository to an EC2 instance"
            }
            Self::DeployFrontend => {
                "Build a frontend from a Git repository and host it as an S3 static website"
            }
            Self::ConnectServices => "Point a deployed frontend at a deployed backend",
            Self::GetDeploymentStatus => "Return a deployment record with live instance details",
            Self::EstimateDeploymentCost => "Estimate the monthly AWS cost of a deployment",
            Self::ListDeployments => "List every recorded deployment",
            Self::DeleteDeployment => {
                "Forget a deployment record without removing its AWS resources"
            }
            Self::SetupNginxProxy => "Configure an Nginx reverse proxy on an instance",
            Self::CreateAutoscalingGroup => "Create an auto-scaling group for an instance",
        }
    }

    /// Returns the JSON Schema of the tool arguments.
    #[must_use]
    pub fn input_schema(self) -> Value {
        match self {
            Self::DeployBackend => json!({
                "type": "object",
                "properties": {
                    "repo_url": {"type": "string", "description": "Git repository URL"},
                    "name": {"type": "string", "description": "Deployment name"},
                    "instance_type": {"type": "string", "default": "t2.micro"},
                    "port": {"type": "integer", "minimum": 1, "maximum": 65535, "default": 3000},
                    "region": {"type": "string", "description": "AWS region"}
                },
                "required": ["repo_url", "name"],
                "additionalProperties": false
            }),
            Self::DeployFrontend => json!({
                "type": "object",
                "properties": {
                    "repo_url": {"type": "string", "description": "Git repository URL"},
                    "name": {"type": "string", "description": "Deployment name"},
                    "build_command": {"type": "string", "default": "npm run build"},
                    "backend_url": {"type": "string", "description": "API address baked into the build"},
                    "region": {"type": "string", "description": "AWS region"}
                },
                "required": ["repo_url", "name"],
                "additionalProperties": false
            }),
            Self::ConnectServices => json!({
                "type": "object",
                "properties": {
                    "backend_name": {"type": "string"},
                    "frontend_name": {"type": "string"}
                },
                "required": ["backend_name", "frontend_name"],
                "additionalProperties": false
            }),
            Self::GetDeploymentStatus | Self::EstimateDeploymentCost | Self::DeleteDeployment => {
                json!({
                    "type": "object",
                    "properties": {"deployment_name": {"type": "string"}},
                    "required": ["deployment_name"],
                    "additionalProperties": false
                })
            }
            Self::ListDeployments => json!({
                "type": "object",
                "properties": {},
                "additionalProperties": false
            }),
            Self::SetupNginxProxy => json!({
                "type": "object",
                "properties": {
                    "instance_name": {"type": "string"},
                    "routes": {"type": "array", "items": {"type": "object"}}
                },
                "required": ["instance_name", "routes"],
                "additionalProperties": false
            }),
            Self::CreateAutoscalingGroup => json!({
                "type": "object",
                "properties": {
                    "instance_name": {"type": "string"},
                    "min_size": {"type": "integer", "default": 1},
                    "max_size": {"type": "integer", "default": 3},
                    "target_cpu": {"type": "integer", "default": 70}
                },
                "required": ["instance_name"],
                "additionalProperties": false
            }),
        }
    }

    /// Returns the published definition of the tool.
    #[must_use]
    pub fn definition(self) -> ToolDefinition {
        ToolDefinition {
            name: self.as_str(),
            description: self.description(),
            input_schema: self.input_schema(),
        }
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Tool metadata as published by `tools/list`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    /// Wire name.
    pub name: &'static str,
    /// One-line description.
    pub description: &'static str,
    /// JSON Schema of the arguments.
    pub input_schema: Value,
}

/// Returns the definitions of every tool.
#[must_use]
pub fn tool_definitions() -> Vec<ToolDefinition> {
    ToolName::ALL.into_iter().map(ToolName::definition).collect()
}
