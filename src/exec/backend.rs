// src/exec/backend.rs

//! Pluggable executor backend abstraction.
//!
//! Handlers talk to an `ExecutorBackend` instead of spawning processes
//! themselves. This makes it easy to swap in a fake executor in tests while
//! keeping the production implementation in [`super::process`].
//!
//! - `RealExecutorBackend` spawns the tool with `tokio::process`.
//! - Tests can provide their own `ExecutorBackend` that records each
//!   `CommandSpec` and replays a scripted outcome.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::outcome::ExecutionResult;
use super::process::run_process;
use super::spec::CommandSpec;

/// Trait abstracting how a command is executed.
///
/// One call is one attempt: implementations must not retry.
pub trait ExecutorBackend: Send + Sync {
    fn execute(
        &self,
        spec: CommandSpec,
    ) -> Pin<Box<dyn Future<Output = ExecutionResult> + Send + '_>>;
}

/// Real executor backend used in production.
///
/// Holds no per-call state; any number of executions may be in flight.
#[derive(Debug, Clone)]
pub struct RealExecutorBackend {
    terminate_grace: Duration,
    shutdown: CancellationToken,
}

impl RealExecutorBackend {
    /// `terminate_grace` is the SIGTERM → SIGKILL delay used when a
    /// deadline fires.
    pub fn new(terminate_grace: Duration) -> Self {
        Self {
            terminate_grace,
            shutdown: CancellationToken::new(),
        }
    }

    /// Terminate in-flight processes when `token` is cancelled.
    pub fn with_shutdown(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }
}

impl ExecutorBackend for RealExecutorBackend {
    fn execute(
        &self,
        spec: CommandSpec,
    ) -> Pin<Box<dyn Future<Output = ExecutionResult> + Send + '_>> {
        Box::pin(run_process(spec, self.terminate_grace, &self.shutdown))
    }
}
