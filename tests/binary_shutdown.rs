// tests/binary_shutdown.rs
//
// Drives the built binary over real pipes; Unix only.
#![cfg(unix)]

mod common;
use crate::common::{TestResult, init_tracing, with_timeout};

use std::process::Stdio;

use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;

#[tokio::test]
async fn ctrl_c_stops_the_server_while_stdin_stays_open() -> TestResult {
    init_tracing();
    let root = tempfile::tempdir()?;

    let mut child = Command::new(env!("CARGO_BIN_EXE_pio-mcp"))
        .arg("--allowed-root")
        .arg(root.path())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()?;

    let mut stdin = child.stdin.take().ok_or("no stdin pipe")?;
    let stdout = child.stdout.take().ok_or("no stdout pipe")?;
    let mut lines = BufReader::new(stdout).lines();

    // A response proves the server loop and its signal handler are running.
    let request = json!({"jsonrpc": "2.0", "id": 1, "method": "ping"});
    stdin.write_all(format!("{request}\n").as_bytes()).await?;
    stdin.flush().await?;
    let line = with_timeout(lines.next_line())
        .await?
        .ok_or("server closed stdout before answering")?;
    let response: Value = serde_json::from_str(&line)?;
    assert_eq!(response["id"], 1);

    let pid = Pid::from_raw(i32::try_from(child.id().ok_or("child already reaped")?)?);
    kill(pid, Signal::SIGINT)?;

    let status = with_timeout(child.wait()).await?;
    assert!(status.success(), "server exited with {status}");

    // Held open until here so the server never sees EOF.
    drop(stdin);
    Ok(())
}
