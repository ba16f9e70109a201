// src/server/mod.rs

//! Newline-delimited JSON-RPC over a byte stream (stdio in production).
//!
//! The read loop decodes one message per line. Each `tools/call` runs on
//! its own task so a long build does not block `ping` or a board lookup.
//! All responses go through one writer task, which keeps frames whole.
//!
//! When the input ends or `shutdown` fires, the token is cancelled (the
//! executor terminates running processes), in-flight calls are awaited so
//! each still gets its `Cancelled` response, and the writer is drained.

pub mod dispatch;
pub mod rpc;
pub mod tools;

use std::sync::Arc;

use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::errors::{PioMcpError, Result};
use crate::handlers::ToolContext;

pub use dispatch::{Incoming, handle_request, handle_tools_call};
pub use rpc::{RpcError, ToolCallResult};
pub use tools::{TOOL_NAMES, tools_list};

/// Serve requests from `input` until it ends or `shutdown` is cancelled.
pub async fn serve<R, W>(
    ctx: Arc<ToolContext>,
    input: R,
    output: W,
    shutdown: CancellationToken,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel::<Value>();
    let writer = tokio::spawn(write_loop(output, rx));
    let mut in_flight = JoinSet::new();
    let mut lines = input.lines();

    info!("server ready");
    let read_result = loop {
        let line = tokio::select! {
            _ = shutdown.cancelled() => {
                info!("shutdown requested");
                break Ok(());
            }
            line = lines.next_line() => line,
        };

        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => {
                info!("input closed");
                break Ok(());
            }
            Err(e) => break Err(PioMcpError::from(e)),
        };

        while let Some(joined) = in_flight.try_join_next() {
            log_join(joined);
        }

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let message: Value = match serde_json::from_str(line) {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, "unparseable message");
                let _ = tx.send(rpc::failure(
                    Value::Null,
                    RpcError::new(rpc::PARSE_ERROR, format!("Parse error: {e}")),
                ));
                continue;
            }
        };

        match Incoming::classify(message) {
            Incoming::Notification { method } => dispatch::handle_notification(&method),
            Incoming::Invalid { id, reason } => {
                let _ = tx.send(rpc::failure(
                    id,
                    RpcError::new(rpc::INVALID_REQUEST, format!("Invalid request: {reason}")),
                ));
            }
            Incoming::Request { id, method, params } => {
                debug!(%method, %id, "request");
                let ctx = Arc::clone(&ctx);
                let tx = tx.clone();
                in_flight.spawn(async move {
                    let response = handle_request(&ctx, id, &method, params).await;
                    let _ = tx.send(response);
                });
            }
        }
    };

    shutdown.cancel();
    if !in_flight.is_empty() {
        info!(count = in_flight.len(), "waiting for in-flight calls");
    }
    while let Some(joined) = in_flight.join_next().await {
        log_join(joined);
    }

    drop(tx);
    match writer.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!(error = %e, "response writer failed"),
        Err(e) => error!(error = %e, "response writer task panicked"),
    }

    read_result
}

fn log_join(joined: std::result::Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined {
        error!(error = %e, "request task failed");
    }
}

async fn write_loop<W>(mut output: W, mut rx: mpsc::UnboundedReceiver<Value>) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(message) = rx.recv().await {
        let mut frame = serde_json::to_string(&message)?;
        frame.push('\n');
        output.write_all(frame.as_bytes()).await?;
        output.flush().await?;
    }
    Ok(())
}
