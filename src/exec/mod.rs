// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for actually running the tool, using
//! `tokio::process::Command`, and handing back exactly one
//! [`ExecutionOutcome`] or [`ExecutionFailure`] per call.
//!
//! - [`spec`] defines `CommandSpec`, the only way to describe a command.
//! - [`outcome`] holds the result types.
//! - [`process`] spawns, captures, and enforces the deadline.
//! - [`backend`] provides the `ExecutorBackend` trait and the concrete
//!   `RealExecutorBackend`, which tests replace with a fake.
//! - [`locate`] finds the tool binary on `PATH`.

pub mod backend;
pub mod locate;
pub mod outcome;
pub mod process;
pub mod spec;

pub use backend::{ExecutorBackend, RealExecutorBackend};
pub use locate::{ResolvedTool, ToolLocator, ToolMissing};
pub use outcome::{ExecutionFailure, ExecutionOutcome, ExecutionResult};
pub use process::run_process;
pub use spec::{CommandArg, CommandSpec, ProjectOption};
