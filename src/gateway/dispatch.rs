//! Routes tool calls to deployment workflows and shapes their results.
//!
//! [`ToolGateway::call`] never fails: decoding problems, unknown tools and
//! workflow errors all become `{"success": false, ...}` objects.

use super::arguments::{
    AutoscalingArgs, ConnectServicesArgs, DeployBackendArgs, DeployFrontendArgs,
    DeploymentNameArgs, ListDeploymentsArgs, NginxProxyArgs,
};
use super::tool::ToolName;
use crate::deployment::services::{DeploymentOperations, DeploymentServiceError};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use tracing::{Instrument, info, info_span, warn};

const NGINX_STUB_MESSAGE: &str = "Nginx setup coming soon! Focus on MVP first.";
const AUTOSCALING_STUB_MESSAGE: &str = "Auto-scaling coming soon! Focus on MVP first.";

/// Transport-independent entry point for tool calls.
#[derive(Clone)]
pub struct ToolGateway {
    operations: Arc<dyn DeploymentOperations>,
}

impl ToolGateway {
    /// Creates a gateway over a set of workflows.
    #[must_use]
    pub fn new(operations: Arc<dyn DeploymentOperations>) -> Self {
        Self { operations }
    }

    /// Executes a tool and returns its structured result.
    ///
    /// The result always carries a boolean `success` field.
    pub async fn call(&self, name: &str, arguments: Value) -> Value {
        let Some(tool) = ToolName::parse(name) else {
            warn!(tool = name, "unknown tool requested");
            return failure(format!("Unknown tool: {name}"));
        };
        let span = info_span!("tool_call", tool = %tool);
        async move {
            info!("tool call started");
            let result = self.dispatch(tool, arguments).await;
            if result.get("success") == Some(&Value::Bool(true)) {
                info!("tool call succeeded");
            } else {
                warn!(result = %result, "tool call failed");
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn dispatch(&self, tool: ToolName, arguments: Value) -> Value {
        self.route(tool, arguments)
            .await
            .unwrap_or_else(|rejected| rejected)
    }

    async fn route(&self, tool: ToolName, arguments: Value) -> Result<Value, Value> {
        Ok(match tool {
            ToolName::DeployBackend => {
                let args: DeployBackendArgs = decode(tool, arguments)?;
                respond(self.operations.deploy_backend(args.into()).await, |report| {
                    let message =
                        format!("Backend '{}' deployed successfully", report.deployment_info.name());
                    with_message(report, message)
                })
            }
            ToolName::DeployFrontend => {
                let args: DeployFrontendArgs = decode(tool, arguments)?;
                respond(self.operations.deploy_frontend(args.into()).await, |report| {
                    let message =
                        format!("Frontend '{}' deployed successfully", report.deployment_info.name());
                    with_message(report, message)
                })
            }
            ToolName::ConnectServices => {
                let args: ConnectServicesArgs = decode(tool, arguments)?;
                respond(
                    self.operations
                        .connect(&args.backend_name, &args.frontend_name)
                        .await,
                    succeed,
                )
            }
            ToolName::GetDeploymentStatus => {
                let args: DeploymentNameArgs = decode(tool, arguments)?;
                respond(self.operations.status(&args.deployment_name).await, |record| {
                    succeed(json!({ "deployment": record }))
                })
            }
            ToolName::EstimateDeploymentCost => {
                let args: DeploymentNameArgs = decode(tool, arguments)?;
                respond(
                    self.operations.estimate_cost(&args.deployment_name).await,
                    succeed,
                )
            }
            ToolName::ListDeployments => {
                let ListDeploymentsArgs {} = decode(tool, arguments)?;
                respond(self.operations.list().await, |deployments| {
                    succeed(json!({
                        "count": deployments.len(),
                        "deployments": deployments,
                    }))
                })
            }
            ToolName::DeleteDeployment => {
                let args: DeploymentNameArgs = decode(tool, arguments)?;
                let name = args.deployment_name;
                respond(self.operations.delete(&name).await, |deleted| {
                    let message = if deleted {
                        format!("Deployment '{name}' record removed")
                    } else {
                        format!("Deployment '{name}' not found")
                    };
                    succeed(json!({ "deleted": deleted, "message": message }))
                })
            }
            ToolName::SetupNginxProxy => {
                let _: NginxProxyArgs = decode(tool, arguments)?;
                stub(NGINX_STUB_MESSAGE)
            }
            ToolName::CreateAutoscalingGroup => {
                let _: AutoscalingArgs = decode(tool, arguments)?;
                stub(AUTOSCALING_STUB_MESSAGE)
            }
        })
    }
}

fn decode<T: DeserializeOwned>(tool: ToolName, arguments: Value) -> Result<T, Value> {
    let object = if arguments.is_null() {
        Value::Object(Map::new())
    } else {
        arguments
    };
    serde_json::from_value(object)
        .map_err(|err| failure(format!("Invalid arguments for {tool}: {err}")))
}

fn respond<T>(
    result: Result<T, DeploymentServiceError>,
    on_success: impl FnOnce(T) -> Value,
) -> Value {
    match result {
        Ok(value) => on_success(value),
        Err(err @ DeploymentServiceError::NotFound { .. }) => json!({
            "success": false,
            "message": err.to_string(),
        }),
        Err(err) => failure(err.to_string()),
    }
}

fn succeed(payload: impl Serialize) -> Value {
    match serde_json::to_value(payload) {
        Ok(Value::Object(mut fields)) => {
            fields.insert("success".to_owned(), Value::Bool(true));
            Value::Object(fields)
        }
        Ok(other) => json!({ "success": true, "result": other }),
        Err(err) => failure(format!("Failed to encode result: {err}")),
    }
}

fn with_message(payload: impl Serialize, message: String) -> Value {
    let mut result = succeed(payload);
    if let Some(fields) = result
        .as_object_mut()
        .filter(|fields| fields.get("success") == Some(&Value::Bool(true)))
    {
        fields.insert("message".to_owned(), Value::String(message));
    }
    result
}

fn failure(error: String) -> Value {
    let mut fields = Map::new();
    fields.insert("success".to_owned(), Value::Bool(false));
    fields.insert("error".to_owned(), Value::String(error));
    Value::Object(fields)
}

fn stub(message: &str) -> Value {
    json!({ "success": false, "message": message })
}
