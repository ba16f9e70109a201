// src/diagnostic/classify.rs

//! Map every failure source onto an [`ErrorKind`].

use std::fmt;
use std::time::Duration;

use tracing::debug;

use crate::exec::{ExecutionFailure, ToolMissing};
use crate::interpret::{SignatureKind, ToolFailure};
use crate::validate::ValidationError;

use super::{DiagnosticError, ErrorKind};

/// Exit status shells and `posix_spawnp` wrappers use for "not found".
const EXIT_COMMAND_NOT_FOUND: i32 = 127;

/// Longest stdout excerpt attached to a `MalformedOutput` error.
const OUTPUT_EXCERPT_CHARS: usize = 200;

pub fn from_validation(err: ValidationError) -> DiagnosticError {
    let kind = match &err {
        ValidationError::InvalidPath { .. } => ErrorKind::InvalidPath,
        ValidationError::InvalidIdentifier { .. } => ErrorKind::InvalidIdentifier,
        ValidationError::InvalidPort { .. } => ErrorKind::InvalidPort,
        ValidationError::InvalidArgument { .. } => ErrorKind::InvalidArgument,
    };
    let field = err.field();
    let input = err.input().to_string();
    DiagnosticError::new(kind, err.to_string()).with_context(field, input)
}

impl From<ValidationError> for DiagnosticError {
    fn from(err: ValidationError) -> Self {
        from_validation(err)
    }
}

pub fn tool_missing(missing: &ToolMissing) -> DiagnosticError {
    DiagnosticError::new(
        ErrorKind::ToolNotInstalled,
        format!(
            "PlatformIO executable not found on PATH (tried: {})",
            missing.tried.join(", ")
        ),
    )
}

/// Classify an executor failure. `timeout` is the deadline that applied.
pub fn from_execution(failure: ExecutionFailure, timeout: Duration) -> DiagnosticError {
    match failure {
        ExecutionFailure::Timeout { elapsed } => DiagnosticError::new(
            ErrorKind::Timeout,
            format!(
                "PlatformIO did not finish within {}s and was terminated",
                timeout.as_secs_f64()
            ),
        )
        .with_context("elapsed_ms", elapsed.as_millis()),
        ExecutionFailure::MissingWorkDir { dir } => DiagnosticError::new(
            ErrorKind::NotFound,
            format!("working directory '{dir}' does not exist"),
        )
        .with_context("cwd", dir)
        .with_hint("Create the directory, or point [paths].work_dir at an existing directory inside the allowed roots."),
        ExecutionFailure::SpawnFailed { program, source }
            if source.kind() == std::io::ErrorKind::NotFound =>
        {
            DiagnosticError::new(
                ErrorKind::ToolNotInstalled,
                format!("could not start '{program}': {source}"),
            )
        }
        ExecutionFailure::SpawnFailed { program, source }
            if source.kind() == std::io::ErrorKind::PermissionDenied =>
        {
            DiagnosticError::new(
                ErrorKind::ToolNotInstalled,
                format!("'{program}' is not executable: {source}"),
            )
            .with_hint(
                "The PlatformIO binary exists but cannot be executed. Check its permissions or reinstall PlatformIO Core.",
            )
        }
        ExecutionFailure::SpawnFailed { program, source } => DiagnosticError::new(
            ErrorKind::OperationFailed,
            format!("could not start '{program}': {source}"),
        )
        .with_hint("The operating system refused to start the process. Check system resources and retry."),
        ExecutionFailure::Cancelled => DiagnosticError::new(
            ErrorKind::Cancelled,
            "the command was cancelled because the server is shutting down",
        ),
        ExecutionFailure::Wait { program, source } => DiagnosticError::new(
            ErrorKind::OperationFailed,
            format!("lost track of '{program}' while it was running: {source}"),
        ),
    }
}

/// Classify a non-zero exit.
pub fn from_tool_failure(failure: ToolFailure) -> DiagnosticError {
    let lines = failure.lines();

    if failure.exit_code == EXIT_COMMAND_NOT_FOUND
        || failure.primary == Some(SignatureKind::CommandNotFound)
    {
        debug!(exit_code = failure.exit_code, "tool failure classified as missing command");
        return DiagnosticError::new(
            ErrorKind::ToolNotInstalled,
            "PlatformIO or one of the tools it calls could not be found",
        )
        .with_context("exit_code", failure.exit_code)
        .with_diagnostics(lines);
    }

    let headline = lines
        .first()
        .map(|l| format!(": {l}"))
        .unwrap_or_default();
    let mut err = DiagnosticError::new(
        ErrorKind::OperationFailed,
        format!("PlatformIO exited with status {}{headline}", failure.exit_code),
    )
    .with_context("exit_code", failure.exit_code)
    .with_diagnostics(lines);

    if let Some(kind) = failure.primary {
        err = err.with_hint(kind.hint()).with_context("signature", kind);
    }
    err
}

/// Output that exited zero but does not decode into the expected shape.
pub fn malformed_output(expected: &str, err: impl fmt::Display, stdout: &str) -> DiagnosticError {
    let excerpt: String = stdout.trim().chars().take(OUTPUT_EXCERPT_CHARS).collect();
    DiagnosticError::new(
        ErrorKind::MalformedOutput,
        format!("could not decode PlatformIO output as {expected}: {err}"),
    )
    .with_context("output_excerpt", excerpt)
}
