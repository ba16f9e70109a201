// src/exec/process.rs

//! Run a single tool process under a deadline.

use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::outcome::{ExecutionFailure, ExecutionOutcome, ExecutionResult};
use super::spec::CommandSpec;

/// How long to keep reading pipes after the main process is gone. A
/// backgrounded grandchild can hold them open forever.
const STREAM_DRAIN_LIMIT: Duration = Duration::from_secs(2);

/// Spawn `spec`, capture both streams in full, and enforce its deadline.
///
/// - Spawned directly from argv; no shell.
/// - On Unix the child leads a new process group, and termination signals
///   the whole group: SIGTERM, then SIGKILL after `terminate_grace`.
/// - `shutdown` firing while the process runs terminates it the same way
///   and yields [`ExecutionFailure::Cancelled`].
/// - Never retries.
pub async fn run_process(
    spec: CommandSpec,
    terminate_grace: Duration,
    shutdown: &CancellationToken,
) -> ExecutionResult {
    let program = spec.program().display().to_string();
    let timeout_ms = spec.timeout().as_millis() as u64;

    info!(
        program = %program,
        cwd = %spec.cwd(),
        timeout_ms,
        cmd = %spec.display_line(),
        "starting tool process"
    );

    // A missing cwd makes spawn fail with NotFound, which reads exactly like
    // a missing binary.
    if !tokio::fs::metadata(spec.cwd().as_path())
        .await
        .is_ok_and(|meta| meta.is_dir())
    {
        let dir = spec.cwd().to_string();
        warn!(program = %program, cwd = %dir, "working directory does not exist; not spawning");
        return Err(ExecutionFailure::MissingWorkDir { dir });
    }

    let mut cmd = Command::new(spec.program());
    cmd.args(spec.args())
        .current_dir(spec.cwd().as_path())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    #[cfg(unix)]
    cmd.process_group(0);

    let started = Instant::now();
    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(source) => {
            warn!(program = %program, error = %source, "failed to spawn tool process");
            return Err(ExecutionFailure::SpawnFailed { program, source });
        }
    };

    let stdout = child.stdout.take().map(|s| tokio::spawn(read_stream(s)));
    let stderr = child.stderr.take().map(|s| tokio::spawn(read_stream(s)));

    tokio::select! {
        status = child.wait() => {
            let elapsed = started.elapsed();
            match status {
                Ok(status) => {
                    let exit_code = status.code().unwrap_or(-1);
                    let stdout = collect_stream(stdout, "stdout").await;
                    let stderr = collect_stream(stderr, "stderr").await;

                    info!(
                        program = %program,
                        exit_code,
                        elapsed_ms = elapsed.as_millis() as u64,
                        stdout_bytes = stdout.len(),
                        stderr_bytes = stderr.len(),
                        "tool process exited"
                    );

                    Ok(ExecutionOutcome {
                        stdout,
                        stderr,
                        exit_code,
                        elapsed,
                    })
                }
                Err(source) => {
                    warn!(program = %program, error = %source, "waiting on tool process failed");
                    terminate(&mut child, terminate_grace).await;
                    abort_streams(stdout, stderr);
                    Err(ExecutionFailure::Wait { program, source })
                }
            }
        }

        () = tokio::time::sleep(spec.timeout()) => {
            warn!(
                program = %program,
                timeout_ms,
                "tool process exceeded its deadline; terminating process group"
            );
            terminate(&mut child, terminate_grace).await;
            abort_streams(stdout, stderr);
            let elapsed = started.elapsed();
            debug!(program = %program, elapsed_ms = elapsed.as_millis() as u64, "timed-out process reaped");
            Err(ExecutionFailure::Timeout { elapsed })
        }

        () = shutdown.cancelled() => {
            info!(program = %program, "shutdown requested; terminating running tool process");
            terminate(&mut child, terminate_grace).await;
            abort_streams(stdout, stderr);
            Err(ExecutionFailure::Cancelled)
        }
    }
}

async fn read_stream<R: AsyncRead + Unpin>(mut reader: R) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf).await?;
    Ok(buf)
}

async fn collect_stream(
    handle: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
    name: &'static str,
) -> String {
    let Some(mut handle) = handle else {
        return String::new();
    };

    match tokio::time::timeout(STREAM_DRAIN_LIMIT, &mut handle).await {
        Ok(Ok(Ok(bytes))) => String::from_utf8_lossy(&bytes).into_owned(),
        Ok(Ok(Err(e))) => {
            warn!(stream = name, error = %e, "failed to read tool output");
            String::new()
        }
        Ok(Err(e)) => {
            warn!(stream = name, error = %e, "output reader task failed");
            String::new()
        }
        Err(_) => {
            warn!(stream = name, "output still open after process exit; giving up on it");
            handle.abort();
            String::new()
        }
    }
}

fn abort_streams(
    stdout: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
    stderr: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
) {
    for handle in [stdout, stderr].into_iter().flatten() {
        handle.abort();
    }
}

/// Terminate the child and everything in its process group, then reap it.
#[cfg(unix)]
async fn terminate(child: &mut Child, grace: Duration) {
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    let Some(pgid) = child.id().and_then(|pid| i32::try_from(pid).ok()) else {
        // Already reaped, or a pid we cannot address as a group.
        let _ = child.kill().await;
        return;
    };
    let pgid = Pid::from_raw(pgid);

    let _ = killpg(pgid, Signal::SIGTERM);

    tokio::select! {
        _ = child.wait() => {}
        () = tokio::time::sleep(grace) => {
            debug!(pgid = pgid.as_raw(), "grace period elapsed; sending SIGKILL");
        }
    }

    // Sweep the group even if the leader exited: children that ignored
    // SIGTERM are still in it.
    let _ = killpg(pgid, Signal::SIGKILL);
    let _ = child.wait().await;
}

#[cfg(not(unix))]
async fn terminate(child: &mut Child, _grace: Duration) {
    if let Err(e) = child.kill().await {
        warn!(error = %e, "failed to kill tool process");
    }
}
