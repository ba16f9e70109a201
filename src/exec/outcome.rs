// src/exec/outcome.rs

use std::time::Duration;

use thiserror::Error;

/// A process that ran to completion within its deadline.
///
/// Not `Clone`: an outcome is moved into the interpreter and
/// consumed there.
#[derive(Debug)]
#[must_use = "every execution outcome must be interpreted"]
pub struct ExecutionOutcome {
    /// Full stdout, lossily decoded as UTF-8.
    pub stdout: String,
    /// Full stderr, lossily decoded as UTF-8.
    pub stderr: String,
    /// Exit status; `-1` when the process was ended by a signal.
    pub exit_code: i32,
    pub elapsed: Duration,
}

impl ExecutionOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Why an execution attempt produced no [`ExecutionOutcome`].
#[derive(Error, Debug)]
pub enum ExecutionFailure {
    /// Deadline elapsed; the process group was terminated.
    #[error("timed out after {} ms", elapsed.as_millis())]
    Timeout { elapsed: Duration },

    /// The working directory is missing or not a directory. Nothing was
    /// spawned.
    #[error("working directory '{dir}' does not exist")]
    MissingWorkDir { dir: String },

    /// The binary could not be located or started.
    #[error("failed to start '{program}': {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The server shut down while the process was running.
    #[error("execution cancelled")]
    Cancelled,

    /// The process started but waiting on it failed.
    #[error("error while waiting for '{program}': {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

pub type ExecutionResult = std::result::Result<ExecutionOutcome, ExecutionFailure>;
