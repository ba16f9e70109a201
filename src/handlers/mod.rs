// src/handlers/mod.rs

//! One handler per exposed capability.
//!
//! Every handler follows the same shape: validate the request fields, build
//! exactly one [`CommandSpec`], run it through [`ToolContext::invoke`], and
//! decode stdout into a typed payload. Failures come back as
//! [`DiagnosticError`] values, never as panics.
//!
//! - [`discovery`]: installation check, boards, devices.
//! - [`project`]: init, build, clean.
//! - [`upload`]: flashing and the serial monitor command.
//! - [`library`]: registry search, install, installed list.
//! - [`payload`]: typed decoding of the tool's JSON output and the result
//!   types handlers return.

pub mod discovery;
pub mod library;
pub mod payload;
pub mod project;
pub mod upload;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::config::ConfigFile;
use crate::diagnostic::{
    DiagnosticError, ErrorKind, from_execution, from_tool_failure, malformed_output, tool_missing,
};
use crate::exec::{CommandSpec, ExecutorBackend, ResolvedTool, ToolLocator};
use crate::interpret::{Interpretation, interpret};
use crate::types::TimeoutClass;
use crate::validate::{PathPolicy, ValidatedPath};

pub use discovery::{
    BoardInfoParams, ListBoardsParams, check_installation, get_board_info, list_boards,
    list_devices,
};
pub use library::{
    InstallLibraryParams, ListInstalledParams, SearchLibrariesParams, install_library,
    list_installed_libraries, search_libraries,
};
pub use project::{BuildParams, CleanParams, InitParams, build_project, clean_project, init_project};
pub use upload::{MonitorParams, UploadParams, start_monitor, upload_firmware};

pub type HandlerResult<T> = std::result::Result<T, DiagnosticError>;

/// Everything a handler needs, passed in explicitly.
pub struct ToolContext {
    config: ConfigFile,
    policy: PathPolicy,
    locator: ToolLocator,
    executor: Arc<dyn ExecutorBackend>,
}

impl fmt::Debug for ToolContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolContext")
            .field("policy", &self.policy)
            .field("locator", &self.locator)
            .finish_non_exhaustive()
    }
}

impl ToolContext {
    pub fn new(
        config: ConfigFile,
        locator: ToolLocator,
        executor: Arc<dyn ExecutorBackend>,
    ) -> Self {
        let policy = config.path_policy();
        Self {
            config,
            policy,
            locator,
            executor,
        }
    }

    /// Context whose locator searches `PATH` for the configured names.
    pub fn from_config(config: ConfigFile, executor: Arc<dyn ExecutorBackend>) -> Self {
        let tool = config.tool();
        let locator = ToolLocator::new(tool.command.clone(), tool.fallback.clone());
        Self::new(config, locator, executor)
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    pub fn policy(&self) -> &PathPolicy {
        &self.policy
    }

    pub fn timeout(&self, class: TimeoutClass) -> Duration {
        self.config.timeouts().for_class(class)
    }

    /// Validate a caller-supplied project directory.
    pub fn project_dir(&self, raw: &str) -> HandlerResult<ValidatedPath> {
        Ok(self.policy.validate(raw)?)
    }

    /// Working directory for commands that are not tied to a project.
    pub fn work_dir(&self, op: &Operation) -> HandlerResult<ValidatedPath> {
        self.policy
            .validate_path(&self.config.paths().work_dir)
            .map_err(|e| op.annotate(e.into()))
    }

    pub async fn tool(&self) -> HandlerResult<&ResolvedTool> {
        self.locator.resolve().await.map_err(|missing| {
            warn!(tried = ?missing.tried, "PlatformIO executable not found");
            tool_missing(&missing)
        })
    }

    /// Start a command for the resolved tool.
    ///
    /// Fails with `ToolNotInstalled`, annotated with `op`, before anything
    /// is spawned when the tool cannot be located.
    pub async fn command(
        &self,
        op: &Operation,
        cwd: ValidatedPath,
        class: TimeoutClass,
    ) -> HandlerResult<CommandSpec> {
        let tool = self.tool().await.map_err(|e| op.annotate(e))?;
        let timeout = self.timeout(class);
        debug!(%class, timeout_ms = timeout.as_millis() as u64, cwd = %cwd, "preparing command");
        Ok(CommandSpec::new(tool.path.clone(), cwd, timeout))
    }

    /// Execute `spec` once and interpret the result.
    ///
    /// Every outcome or failure is classified here, with `op`'s context
    /// attached to any error.
    pub async fn invoke(&self, op: &Operation, spec: CommandSpec) -> HandlerResult<ToolOutput> {
        let timeout = spec.timeout();
        info!(operation = op.name, cmd = %spec.display_line(), "invoking PlatformIO");

        let outcome = match self.executor.execute(spec).await {
            Ok(outcome) => outcome,
            Err(failure) => {
                warn!(operation = op.name, error = %failure, "PlatformIO execution failed");
                return Err(op.annotate(from_execution(failure, timeout)));
            }
        };

        match interpret(outcome) {
            Interpretation::Success { stdout, elapsed } => {
                debug!(
                    operation = op.name,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "PlatformIO succeeded"
                );
                Ok(ToolOutput { stdout, elapsed })
            }
            Interpretation::Failure(failure) => {
                warn!(
                    operation = op.name,
                    exit_code = failure.exit_code,
                    primary = ?failure.primary,
                    "PlatformIO reported failure"
                );
                Err(op.annotate(from_tool_failure(failure)))
            }
        }
    }

    /// Require an existing PlatformIO project at `dir`.
    pub async fn ensure_project(&self, op: &Operation, dir: &ValidatedPath) -> HandlerResult<()> {
        match tokio::fs::metadata(dir.as_path()).await {
            Ok(meta) if meta.is_dir() => {}
            _ => {
                return Err(op.annotate(DiagnosticError::new(
                    ErrorKind::NotFound,
                    format!("project directory '{dir}' does not exist"),
                )));
            }
        }

        if tokio::fs::metadata(dir.as_path().join("platformio.ini"))
            .await
            .is_err()
        {
            return Err(op.annotate(
                DiagnosticError::new(
                    ErrorKind::NotFound,
                    format!("'{dir}' is not a PlatformIO project (no platformio.ini)"),
                )
                .with_hint("Create the project first with init_project."),
            ));
        }
        Ok(())
    }
}

/// Stdout of a successful run.
#[derive(Debug)]
pub struct ToolOutput {
    pub stdout: String,
    pub elapsed: Duration,
}

impl ToolOutput {
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed.as_millis() as u64
    }
}

/// Name and context of the operation being performed, for error reports.
#[derive(Debug, Clone)]
pub struct Operation {
    name: &'static str,
    context: Vec<(&'static str, String)>,
}

impl Operation {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            context: Vec::new(),
        }
    }

    pub fn with(mut self, key: &'static str, value: impl fmt::Display) -> Self {
        self.context.push((key, value.to_string()));
        self
    }

    pub fn with_opt(self, key: &'static str, value: Option<impl fmt::Display>) -> Self {
        match value {
            Some(v) => self.with(key, v),
            None => self,
        }
    }

    /// Attach this operation's context to an error.
    pub fn annotate(&self, err: DiagnosticError) -> DiagnosticError {
        self.context
            .iter()
            .fold(err.with_context("operation", self.name), |err, (k, v)| {
                err.with_context(*k, v)
            })
    }

    /// Decode JSON stdout into `T`, or fail with `MalformedOutput`.
    ///
    /// Anything the tool printed before the JSON document (upgrade notices,
    /// for example) is skipped.
    pub fn decode_json<T: DeserializeOwned>(
        &self,
        expected: &str,
        stdout: &str,
    ) -> HandlerResult<T> {
        let trimmed = stdout.trim();
        let first = serde_json::from_str::<T>(trimmed);
        let err = match first {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if let Some(start) = trimmed.find(['[', '{']).filter(|&i| i > 0) {
            if let Ok(value) = serde_json::from_str::<T>(&trimmed[start..]) {
                debug!(operation = self.name, skipped = start, "skipped non-JSON preamble");
                return Ok(value);
            }
        }

        Err(self.annotate(malformed_output(expected, &err, stdout)))
    }
}
