// src/handlers/upload.rs

//! Flashing firmware and preparing a serial monitor session.

use serde::Deserialize;
use tracing::info;

use crate::types::TimeoutClass;
use crate::validate::{BaudRate, validate_baud_rate, validate_port};

use super::payload::{MonitorCommand, UploadResult, parse_environment_statuses};
use super::project::optional_identifier;
use super::{HandlerResult, Operation, ToolContext};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UploadParams {
    pub project_dir: String,
    #[serde(default)]
    pub environment: Option<String>,
    /// Serial port; the tool auto-detects when absent.
    #[serde(default)]
    pub port: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MonitorParams {
    #[serde(default)]
    pub port: Option<String>,
    #[serde(default)]
    pub baud: Option<u32>,
    #[serde(default)]
    pub project_dir: Option<String>,
}

const MONITOR_NOTE: &str = "The serial monitor is interactive and runs until stopped, so it is not started here. Run this command in a terminal; press Ctrl+C to exit.";

/// Build (if needed) and flash a project with one invocation of the
/// tool's `upload` target.
pub async fn upload_firmware(ctx: &ToolContext, params: UploadParams) -> HandlerResult<UploadResult> {
    let project_dir = ctx.project_dir(&params.project_dir)?;
    let environment = optional_identifier("environment", params.environment.as_deref())?;
    let port = params
        .port
        .as_deref()
        .filter(|p| !p.is_empty())
        .map(validate_port)
        .transpose()?;

    let op = Operation::new("upload_firmware")
        .with("project_dir", &project_dir)
        .with_opt("environment", environment.as_ref())
        .with_opt("port", port.as_ref());
    ctx.ensure_project(&op, &project_dir).await?;

    let spec = ctx
        .command(&op, project_dir.clone(), TimeoutClass::Flash)
        .await?
        .literal("run")
        .literal("--target")
        .literal("upload")
        .literal("--project-dir")
        .arg(&project_dir)
        .flag_opt("--environment", environment.as_ref())
        .flag_opt("--upload-port", port.as_ref());

    let output = ctx.invoke(&op, spec).await?;
    info!(
        project_dir = %project_dir,
        elapsed_ms = output.elapsed_ms(),
        "firmware uploaded"
    );

    Ok(UploadResult {
        duration_ms: output.elapsed_ms(),
        environments: parse_environment_statuses(&output.stdout),
        project_dir,
        environment,
        port,
    })
}

/// Validated `device monitor` command line. Nothing is executed.
pub async fn start_monitor(ctx: &ToolContext, params: MonitorParams) -> HandlerResult<MonitorCommand> {
    let port = params
        .port
        .as_deref()
        .filter(|p| !p.is_empty())
        .map(validate_port)
        .transpose()?;
    let baud = params
        .baud
        .map(validate_baud_rate)
        .transpose()?
        .unwrap_or(BaudRate::DEFAULT);
    let project_dir = params
        .project_dir
        .as_deref()
        .map(|d| ctx.project_dir(d))
        .transpose()?;
    let op = Operation::new("start_monitor")
        .with_opt("port", port.as_ref())
        .with("baud", baud)
        .with_opt("project_dir", project_dir.as_ref());

    let cwd = match &project_dir {
        Some(dir) => dir.clone(),
        None => ctx.work_dir(&op)?,
    };
    let spec = ctx
        .command(&op, cwd, TimeoutClass::Short)
        .await?
        .literal("device")
        .literal("monitor")
        .flag_opt("--port", port.as_ref())
        .literal("--baud")
        .arg(&baud)
        .flag_opt("--project-dir", project_dir.as_ref());

    let mut argv = vec![spec.program().display().to_string()];
    argv.extend(spec.args_lossy());
    let command_line = argv
        .iter()
        .map(|a| shell_quote(a))
        .collect::<Vec<_>>()
        .join(" ");

    Ok(MonitorCommand {
        argv,
        command_line,
        port,
        baud,
        note: MONITOR_NOTE,
    })
}

/// Quote `arg` for display in a POSIX shell, when it needs it.
fn shell_quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/' | ':' | '=' | '+' | '@' | ','));
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}
