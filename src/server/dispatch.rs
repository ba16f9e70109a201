// src/server/dispatch.rs

//! Route JSON-RPC requests to handlers.

use std::future::Future;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::diagnostic::{DiagnosticError, ErrorKind};
use crate::handlers::{self, HandlerResult, ToolContext};

use super::rpc::{self, INTERNAL_ERROR, INVALID_PARAMS, PROTOCOL_VERSION, RpcError, ToolCallResult};
use super::tools::{self, tools_list};

/// A decoded inbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum Incoming {
    Request {
        id: Value,
        method: String,
        params: Value,
    },
    Notification {
        method: String,
    },
    Invalid {
        id: Value,
        reason: &'static str,
    },
}

impl Incoming {
    pub fn classify(message: Value) -> Self {
        let Value::Object(mut map) = message else {
            return Incoming::Invalid {
                id: Value::Null,
                reason: "request must be a JSON object",
            };
        };

        let id = map.remove("id");
        let method = match map.remove("method") {
            Some(Value::String(m)) => m,
            _ => {
                return Incoming::Invalid {
                    id: id.unwrap_or(Value::Null),
                    reason: "missing 'method'",
                };
            }
        };

        match id {
            None => Incoming::Notification { method },
            Some(id) => Incoming::Request {
                id,
                method,
                params: map.remove("params").unwrap_or(Value::Null),
            },
        }
    }
}

/// Answer one request. `tools/call` is the only method that reaches a
/// handler.
pub async fn handle_request(ctx: &ToolContext, id: Value, method: &str, params: Value) -> Value {
    match method {
        "initialize" => rpc::success(
            id,
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {
                    "tools": {}
                },
                "serverInfo": {
                    "name": env!("CARGO_PKG_NAME"),
                    "version": env!("CARGO_PKG_VERSION")
                }
            }),
        ),
        "ping" => rpc::success(id, json!({})),
        "tools/list" => rpc::success(id, json!({ "tools": tools_list() })),
        "tools/call" => {
            let Some(name) = params.get("name").and_then(Value::as_str) else {
                return rpc::failure(id, RpcError::new(INVALID_PARAMS, "tools/call requires 'name'"));
            };
            let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);
            match handle_tools_call(ctx, name, arguments).await {
                Ok(result) => match serde_json::to_value(&result) {
                    Ok(value) => rpc::success(id, value),
                    Err(e) => rpc::failure(
                        id,
                        RpcError::new(INTERNAL_ERROR, format!("could not encode result: {e}")),
                    ),
                },
                Err(err) => rpc::failure(id, err),
            }
        }
        other => rpc::failure(id, RpcError::method_not_found(other)),
    }
}

pub fn handle_notification(method: &str) {
    match method {
        "notifications/initialized" | "notifications/cancelled" => {
            debug!(%method, "notification received");
        }
        other => warn!(method = %other, "unknown notification"),
    }
}

/// Run a tool by name.
///
/// Unknown names are a protocol error; everything a handler reports,
/// including undecodable arguments, comes back in-band as an error result.
pub async fn handle_tools_call(
    ctx: &ToolContext,
    name: &str,
    arguments: Value,
) -> Result<ToolCallResult, RpcError> {
    let arguments = match arguments {
        Value::Null => json!({}),
        other => other,
    };

    info!(tool = %name, "tools/call");
    let outcome = match name {
        tools::CHECK_INSTALLATION => encode(handlers::check_installation(ctx).await),
        tools::LIST_BOARDS => call(name, arguments, |p| handlers::list_boards(ctx, p)).await,
        tools::GET_BOARD_INFO => call(name, arguments, |p| handlers::get_board_info(ctx, p)).await,
        tools::LIST_DEVICES => encode(handlers::list_devices(ctx).await),
        tools::INIT_PROJECT => call(name, arguments, |p| handlers::init_project(ctx, p)).await,
        tools::BUILD_PROJECT => call(name, arguments, |p| handlers::build_project(ctx, p)).await,
        tools::CLEAN_PROJECT => call(name, arguments, |p| handlers::clean_project(ctx, p)).await,
        tools::UPLOAD_FIRMWARE => {
            call(name, arguments, |p| handlers::upload_firmware(ctx, p)).await
        }
        tools::START_MONITOR => call(name, arguments, |p| handlers::start_monitor(ctx, p)).await,
        tools::SEARCH_LIBRARIES => {
            call(name, arguments, |p| handlers::search_libraries(ctx, p)).await
        }
        tools::INSTALL_LIBRARY => {
            call(name, arguments, |p| handlers::install_library(ctx, p)).await
        }
        tools::LIST_INSTALLED_LIBRARIES => {
            call(name, arguments, |p| handlers::list_installed_libraries(ctx, p)).await
        }
        unknown => return Err(RpcError::unknown_tool(unknown)),
    };

    Ok(match outcome {
        Ok(text) => ToolCallResult::text(text),
        Err(err) => {
            warn!(tool = %name, kind = %err.kind, message = %err.message, "tool call failed");
            ToolCallResult::error(&err)
        }
    })
}

async fn call<P, T, Fut>(tool: &str, arguments: Value, run: impl FnOnce(P) -> Fut) -> HandlerResult<String>
where
    P: DeserializeOwned,
    T: Serialize,
    Fut: Future<Output = HandlerResult<T>>,
{
    let params = decode::<P>(tool, arguments)?;
    encode(run(params).await)
}

fn decode<P: DeserializeOwned>(tool: &str, arguments: Value) -> HandlerResult<P> {
    serde_json::from_value(arguments).map_err(|e| {
        DiagnosticError::new(
            ErrorKind::InvalidArgument,
            format!("invalid arguments for {tool}: {e}"),
        )
        .with_context("operation", tool)
        .with_hint("Check the tool's input schema in tools/list.")
    })
}

fn encode<T: Serialize>(result: HandlerResult<T>) -> HandlerResult<String> {
    let payload = result?;
    serde_json::to_string_pretty(&payload).map_err(|e| {
        DiagnosticError::new(
            ErrorKind::OperationFailed,
            format!("could not encode result: {e}"),
        )
    })
}
