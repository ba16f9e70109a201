use std::collections::VecDeque;
use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pio_mcp::exec::{
    CommandSpec, ExecutionFailure, ExecutionOutcome, ExecutionResult, ExecutorBackend,
};

/// What the fake saw for one `execute` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub timeout: Duration,
}

/// One scripted reply.
#[derive(Debug, Clone)]
pub enum Scripted {
    Exit {
        code: i32,
        stdout: String,
        stderr: String,
    },
    Timeout,
    SpawnFailed(io::ErrorKind),
    Cancelled,
}

impl Scripted {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Scripted::Exit {
            code: 0,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn json(value: serde_json::Value) -> Self {
        Scripted::ok(value.to_string())
    }

    pub fn fail(code: i32, stderr: impl Into<String>) -> Self {
        Scripted::Exit {
            code,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }
}

/// A fake executor that:
/// - records every `CommandSpec` it is handed
/// - replies with the next scripted result, or a silent exit 0 when the
///   script is exhausted.
#[derive(Debug, Default)]
pub struct FakeExecutor {
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    script: Arc<Mutex<VecDeque<Scripted>>>,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(self, reply: Scripted) -> Self {
        self.push(reply);
        self
    }

    pub fn push(&self, reply: Scripted) {
        self.script.lock().unwrap().push_back(reply);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Arguments of the only call made. Panics unless exactly one was made.
    pub fn single_args(&self) -> Vec<String> {
        let calls = self.calls();
        assert_eq!(calls.len(), 1, "expected exactly one execution, got {calls:?}");
        calls[0].args.clone()
    }
}

impl ExecutorBackend for FakeExecutor {
    fn execute(
        &self,
        spec: CommandSpec,
    ) -> Pin<Box<dyn Future<Output = ExecutionResult> + Send + '_>> {
        let program = spec.program().display().to_string();
        self.calls.lock().unwrap().push(RecordedCall {
            program: spec.program().to_path_buf(),
            args: spec.args_lossy(),
            cwd: spec.cwd().as_path().to_path_buf(),
            timeout: spec.timeout(),
        });
        let reply = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Scripted::ok(""));
        let elapsed = Duration::from_millis(5);

        Box::pin(async move {
            match reply {
                Scripted::Exit {
                    code,
                    stdout,
                    stderr,
                } => Ok(ExecutionOutcome {
                    stdout,
                    stderr,
                    exit_code: code,
                    elapsed,
                }),
                Scripted::Timeout => Err(ExecutionFailure::Timeout {
                    elapsed: spec.timeout(),
                }),
                Scripted::SpawnFailed(kind) => Err(ExecutionFailure::SpawnFailed {
                    program,
                    source: io::Error::from(kind),
                }),
                Scripted::Cancelled => Err(ExecutionFailure::Cancelled),
            }
        })
    }
}
