//! Newline-delimited JSON-RPC 2.0 transport for the tool gateway.
//!
//! Every `tools/call` runs as its own task so a slow deployment does not
//! block status queries. Responses are written by a single task and may
//! arrive out of request order; clients match them by `id`.

use super::dispatch::ToolGateway;
use super::tool::tool_definitions;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Protocol revision announced during `initialize`.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Name announced during `initialize`.
pub const SERVER_NAME: &str = "skylift";

const JSONRPC_VERSION: &str = "2.0";
const PARSE_ERROR: i64 = -32_700;
const INVALID_REQUEST: i64 = -32_600;
const METHOD_NOT_FOUND: i64 = -32_601;
const INVALID_PARAMS: i64 = -32_602;
const CALL_FAULT_MESSAGE: &str = "Tool call failed unexpectedly";

/// Errors that stop the transport.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Reading requests or writing responses failed.
    #[error("transport I/O failed: {0}")]
    Io(Arc<std::io::Error>),
    /// The response writer task ended abnormally.
    #[error("response writer stopped: {0}")]
    Writer(Arc<tokio::task::JoinError>),
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(Arc::new(err))
    }
}

#[derive(Debug, Deserialize)]
struct RpcRequest {
    #[serde(default)]
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Value,
}

#[derive(Debug, Deserialize)]
struct CallParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

enum Inbound {
    Reply(Value),
    Call {
        id: Value,
        name: String,
        arguments: Value,
    },
    Ignore,
}

/// Serves the gateway on the process's stdin and stdout until stdin closes.
///
/// # Errors
///
/// Returns [`TransportError`] when stdin or stdout fail.
pub async fn serve_stdio(gateway: ToolGateway) -> Result<(), TransportError> {
    serve(
        gateway,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    )
    .await
}

/// Serves the gateway over an arbitrary line-oriented duplex channel.
///
/// Returns once the reader is exhausted and every in-flight call has been
/// answered.
///
/// # Errors
///
/// Returns [`TransportError`] when reading or writing fails.
pub async fn serve<R, W>(gateway: ToolGateway, reader: R, writer: W) -> Result<(), TransportError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (sender, receiver) = unbounded_channel();
    let writer_task = tokio::spawn(write_responses(writer, receiver));
    let mut calls = JoinSet::new();
    let mut lines = reader.lines();

    info!("tool server ready");
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match classify(&line) {
            Inbound::Reply(response) => send(&sender, response),
            Inbound::Call {
                id,
                name,
                arguments,
            } => {
                let call_gateway = gateway.clone();
                let call_sender = sender.clone();
                calls.spawn(async move {
                    let tool = name.clone();
                    let outcome =
                        tokio::spawn(async move { call_gateway.call(&name, arguments).await })
                            .await;
                    let result = outcome.unwrap_or_else(|err| {
                        warn!(%tool, error = %err, "tool call task ended abnormally");
                        json!({ "success": false, "error": CALL_FAULT_MESSAGE })
                    });
                    send(&call_sender, success_response(id, call_result(&result)));
                });
            }
            Inbound::Ignore => {}
        }
    }

    while let Some(joined) = calls.join_next().await {
        if let Err(err) = joined {
            warn!(error = %err, "tool call forwarder ended abnormally");
        }
    }
    drop(sender);
    writer_task
        .await
        .map_err(|err| TransportError::Writer(Arc::new(err)))??;
    info!("tool server stopped");
    Ok(())
}

fn classify(line: &str) -> Inbound {
    let Ok(message) = serde_json::from_str::<Value>(line) else {
        return Inbound::Reply(error_response(Value::Null, PARSE_ERROR, "Parse error"));
    };
    let request = match serde_json::from_value::<RpcRequest>(message) {
        Ok(request) => request,
        Err(err) => {
            return Inbound::Reply(error_response(
                Value::Null,
                INVALID_REQUEST,
                &format!("Invalid request: {err}"),
            ));
        }
    };
    let Some(id) = request.id else {
        debug!(method = %request.method, "notification received");
        return Inbound::Ignore;
    };

    match request.method.as_str() {
        "initialize" => Inbound::Reply(success_response(
            id,
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": { "tools": {} },
                "serverInfo": {
                    "name": SERVER_NAME,
                    "version": env!("CARGO_PKG_VERSION"),
                },
            }),
        )),
        "ping" => Inbound::Reply(success_response(id, json!({}))),
        "tools/list" => Inbound::Reply(success_response(
            id,
            json!({ "tools": tool_definitions() }),
        )),
        "tools/call" => match serde_json::from_value::<CallParams>(request.params) {
            Ok(params) => Inbound::Call {
                id,
                name: params.name,
                arguments: params.arguments,
            },
            Err(err) => Inbound::Reply(error_response(
                id,
                INVALID_PARAMS,
                &format!("Invalid params: {err}"),
            )),
        },
        other => Inbound::Reply(error_response(
            id,
            METHOD_NOT_FOUND,
            &format!("Method not found: {other}"),
        )),
    }
}

fn call_result(result: &Value) -> Value {
    let text = serde_json::to_string_pretty(result).unwrap_or_else(|_| result.to_string());
    let failed = result.get("success") != Some(&Value::Bool(true));
    json!({
        "content": [{ "type": "text", "text": text }],
        "isError": failed,
    })
}

fn envelope(id: Value, key: &str, body: Value) -> Value {
    let mut fields = Map::new();
    fields.insert("jsonrpc".to_owned(), Value::from(JSONRPC_VERSION));
    fields.insert("id".to_owned(), id);
    fields.insert(key.to_owned(), body);
    Value::Object(fields)
}

fn success_response(id: Value, result: Value) -> Value {
    envelope(id, "result", result)
}

fn error_response(id: Value, code: i64, message: &str) -> Value {
    envelope(id, "error", json!({ "code": code, "message": message }))
}

fn send(sender: &UnboundedSender<Value>, response: Value) {
    if sender.send(response).is_err() {
        warn!("response dropped after writer stopped");
    }
}

async fn write_responses<W>(
    mut writer: W,
    mut receiver: UnboundedReceiver<Value>,
) -> Result<(), TransportError>
where
    W: AsyncWrite + Unpin,
{
    while let Some(response) = receiver.recv().await {
        let mut line = response.to_string();
        line.push('\n');
        writer.write_all(line.as_bytes()).await?;
        writer.flush().await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deployment::adapters::memory::{
        InMemoryCompute, InMemoryDeploymentRegistry, InMemoryObjectStorage, InMemorySourceFetcher,
        ScriptedBuildRunner,
    };
    use crate::deployment::domain::{CostEstimate, DeploymentName, DeploymentRecord};
    use crate::deployment::provisioning::ReadinessSettings;
    use crate::deployment::services::{
        BackendDeployReport, ConnectReport, DeployBackendRequest, DeployFrontendRequest,
        DeploymentOperations, DeploymentServiceError, DeploymentServiceResult, DeploymentWorkflows,
        FrontendDeployReport, LookupRole, WorkflowParts,
    };
    use std::collections::BTreeMap;
    use tokio::io::AsyncReadExt;

    fn gateway() -> ToolGateway {
        let workflows = DeploymentWorkflows::new(WorkflowParts {
            registry: Arc::new(InMemoryDeploymentRegistry::new()),
            fetcher: Arc::new(InMemorySourceFetcher::new()),
            compute: Arc::new(InMemoryCompute::new()),
            storage: Arc::new(InMemoryObjectStorage::new()),
            builder: Arc::new(ScriptedBuildRunner::new()),
            readiness: ReadinessSettings::default(),
            default_region: "us-east-1".to_owned(),
        });
        ToolGateway::new(Arc::new(workflows))
    }

    async fn exchange(input: &'static str) -> Vec<Value> {
        exchange_with(gateway(), input).await
    }

    async fn exchange_with(gateway: ToolGateway, input: &'static str) -> Vec<Value> {
        let (client, server) = tokio::io::duplex(64 * 1024);
        let serving = tokio::spawn(serve(gateway, input.as_bytes(), server));
        let mut output = String::new();
        let mut reader = client;
        reader
            .read_to_string(&mut output)
            .await
            .expect("server output is readable");
        serving
            .await
            .expect("server task joins")
            .expect("server exits cleanly");
        output
            .lines()
            .map(|line| serde_json::from_str(line).expect("response is JSON"))
            .collect()
    }

    fn by_id(responses: &[Value], id: i64) -> &Value {
        responses
            .iter()
            .find(|response| response["id"] == id)
            .expect("response with id")
    }

    #[tokio::test]
    async fn initialize_announces_tools_capability() {
        let responses = exchange(
            "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"initialize\",\"params\":{}}\n",
        )
        .await;
        let result = &by_id(&responses, 1)["result"];
        assert_eq!(result["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(result["serverInfo"]["name"], SERVER_NAME);
        assert!(result["capabilities"]["tools"].is_object());
    }

    #[tokio::test]
    async fn notifications_get_no_reply() {
        let responses = exchange(concat!(
            "{\"jsonrpc\":\"2.0\",\"method\":\"notifications/initialized\"}\n",
            "{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"ping\"}\n",
        ))
        .await;
        assert_eq!(responses.len(), 1);
        assert_eq!(by_id(&responses, 2)["result"], json!({}));
    }

    #[tokio::test]
    async fn tools_list_publishes_every_tool() {
        let responses =
            exchange("{\"jsonrpc\":\"2.0\",\"id\":3,\"method\":\"tools/list\"}\n").await;
        let tools = by_id(&responses, 3)["result"]["tools"]
            .as_array()
            .expect("tool array");
        assert_eq!(tools.len(), 9);
        assert!(tools.iter().all(|tool| tool["inputSchema"].is_object()));
    }

    #[tokio::test]
    async fn tools_call_wraps_result_as_text() {
        let responses = exchange(concat!(
            "{\"jsonrpc\":\"2.0\",\"id\":4,\"method\":\"tools/call\",",
            "\"params\":{\"name\":\"estimate_deployment_cost\",",
            "\"arguments\":{\"deployment_name\":\"ghost\"}}}\n",
        ))
        .await;
        let result = &by_id(&responses, 4)["result"];
        assert_eq!(result["isError"], true);
        let text = result["content"][0]["text"].as_str().expect("text content");
        let payload: Value = serde_json::from_str(text).expect("payload is JSON");
        assert_eq!(payload["message"], "Deployment 'ghost' not found");
    }

    #[tokio::test]
    async fn protocol_errors_use_standard_codes() {
        let responses = exchange(concat!(
            "not json\n",
            "{\"jsonrpc\":\"2.0\",\"id\":5,\"method\":\"resources/list\"}\n",
        ))
        .await;
        assert_eq!(responses.len(), 2);
        assert!(
            responses
                .iter()
                .any(|response| response["error"]["code"] == PARSE_ERROR)
        );
        assert_eq!(by_id(&responses, 5)["error"]["code"], METHOD_NOT_FOUND);
    }

    /// Operations whose listing panics; every other call finds nothing.
    struct FaultyOperations;

    #[async_trait::async_trait]
    impl DeploymentOperations for FaultyOperations {
        async fn deploy_backend(
            &self,
            request: DeployBackendRequest,
        ) -> DeploymentServiceResult<BackendDeployReport> {
            Err(DeploymentServiceError::not_found(LookupRole::Backend, &request.name))
        }

        async fn deploy_frontend(
            &self,
            request: DeployFrontendRequest,
        ) -> DeploymentServiceResult<FrontendDeployReport> {
            Err(DeploymentServiceError::not_found(LookupRole::Frontend, &request.name))
        }

        async fn connect(
            &self,
            backend_name: &str,
            _frontend_name: &str,
        ) -> DeploymentServiceResult<ConnectReport> {
            Err(DeploymentServiceError::not_found(LookupRole::Backend, backend_name))
        }

        async fn status(&self, deployment_name: &str) -> DeploymentServiceResult<DeploymentRecord> {
            Err(DeploymentServiceError::not_found(LookupRole::Deployment, deployment_name))
        }

        async fn estimate_cost(
            &self,
            deployment_name: &str,
        ) -> DeploymentServiceResult<CostEstimate> {
            Err(DeploymentServiceError::not_found(LookupRole::Deployment, deployment_name))
        }

        async fn list(
            &self,
        ) -> DeploymentServiceResult<BTreeMap<DeploymentName, DeploymentRecord>> {
            panic!("listing is broken");
        }

        async fn delete(&self, _deployment_name: &str) -> DeploymentServiceResult<bool> {
            Ok(false)
        }
    }

    #[tokio::test]
    async fn panicking_call_still_gets_a_reply() {
        let responses = exchange_with(
            ToolGateway::new(Arc::new(FaultyOperations)),
            concat!(
                "{\"jsonrpc\":\"2.0\",\"id\":7,\"method\":\"tools/call\",",
                "\"params\":{\"name\":\"list_deployments\",\"arguments\":{}}}\n",
                "{\"jsonrpc\":\"2.0\",\"id\":8,\"method\":\"tools/call\",",
                "\"params\":{\"name\":\"delete_deployment\",",
                "\"arguments\":{\"deployment_name\":\"api\"}}}\n",
            ),
        )
        .await;

        let faulted = &by_id(&responses, 7)["result"];
        assert_eq!(faulted["isError"], true);
        let text = faulted["content"][0]["text"].as_str().expect("text content");
        let payload: Value = serde_json::from_str(text).expect("payload is JSON");
        assert_eq!(
            payload,
            json!({"success": false, "error": CALL_FAULT_MESSAGE})
        );
        assert_eq!(by_id(&responses, 8)["result"]["isError"], false);
    }
}
