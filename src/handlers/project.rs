// src/handlers/project.rs

//! Project lifecycle: create, compile, clean.

use serde::Deserialize;
use tracing::{debug, info};

use crate::diagnostic::{DiagnosticError, ErrorKind};
use crate::exec::ProjectOption;
use crate::types::TimeoutClass;
use crate::validate::{ValidatedIdentifier, validate_identifier};

use super::payload::{
    BuildResult, CleanResult, InitResult, parse_environment_statuses, parse_memory_usage,
};
use super::{HandlerResult, Operation, ToolContext};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct InitParams {
    pub board: String,
    pub project_dir: String,
    #[serde(default)]
    pub framework: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BuildParams {
    pub project_dir: String,
    #[serde(default)]
    pub environment: Option<String>,
}

pub type CleanParams = BuildParams;

pub(crate) fn optional_identifier(
    field: &'static str,
    raw: Option<&str>,
) -> HandlerResult<Option<ValidatedIdentifier>> {
    Ok(raw
        .filter(|s| !s.is_empty())
        .map(|s| validate_identifier(field, s))
        .transpose()?)
}

/// Create (or extend) a PlatformIO project for `board`.
///
/// The directory is created first so the tool can run inside it.
pub async fn init_project(ctx: &ToolContext, params: InitParams) -> HandlerResult<InitResult> {
    let project_dir = ctx.project_dir(&params.project_dir)?;
    let board = validate_identifier("board", &params.board)?;
    let framework = optional_identifier("framework", params.framework.as_deref())?;

    let op = Operation::new("init_project")
        .with("project_dir", &project_dir)
        .with("board", &board)
        .with_opt("framework", framework.as_ref());

    let mut spec = ctx
        .command(&op, project_dir.clone(), TimeoutClass::Short)
        .await?
        .literal("project")
        .literal("init")
        .literal("--board")
        .arg(&board);
    if let Some(framework) = &framework {
        spec = spec
            .literal("--project-option")
            .arg(&ProjectOption::new("framework", framework));
    }
    let spec = spec.literal("--project-dir").arg(&project_dir);

    tokio::fs::create_dir_all(project_dir.as_path())
        .await
        .map_err(|e| {
            op.annotate(
                DiagnosticError::new(
                    ErrorKind::OperationFailed,
                    format!("could not create project directory: {e}"),
                )
                .with_hint("Check that the parent directory is writable."),
            )
        })?;

    ctx.invoke(&op, spec).await?;
    info!(project_dir = %project_dir, board = %board, "project initialized");

    Ok(InitResult {
        project_dir,
        board,
        framework,
    })
}

/// Compile a project, optionally a single environment.
pub async fn build_project(ctx: &ToolContext, params: BuildParams) -> HandlerResult<BuildResult> {
    let project_dir = ctx.project_dir(&params.project_dir)?;
    let environment = optional_identifier("environment", params.environment.as_deref())?;

    let op = Operation::new("build_project")
        .with("project_dir", &project_dir)
        .with_opt("environment", environment.as_ref());
    ctx.ensure_project(&op, &project_dir).await?;

    let spec = ctx
        .command(&op, project_dir.clone(), TimeoutClass::Compile)
        .await?
        .literal("run")
        .literal("--project-dir")
        .arg(&project_dir)
        .flag_opt("--environment", environment.as_ref());

    let output = ctx.invoke(&op, spec).await?;
    let memory = parse_memory_usage(&output.stdout);
    let environments = parse_environment_statuses(&output.stdout);
    debug!(
        regions = memory.len(),
        environments = environments.len(),
        "parsed build summary"
    );

    Ok(BuildResult {
        duration_ms: output.elapsed_ms(),
        project_dir,
        environment,
        memory,
        environments,
    })
}

pub async fn clean_project(ctx: &ToolContext, params: CleanParams) -> HandlerResult<CleanResult> {
    let project_dir = ctx.project_dir(&params.project_dir)?;
    let environment = optional_identifier("environment", params.environment.as_deref())?;

    let op = Operation::new("clean_project")
        .with("project_dir", &project_dir)
        .with_opt("environment", environment.as_ref());
    ctx.ensure_project(&op, &project_dir).await?;

    let spec = ctx
        .command(&op, project_dir.clone(), TimeoutClass::Short)
        .await?
        .literal("run")
        .literal("--target")
        .literal("clean")
        .literal("--project-dir")
        .arg(&project_dir)
        .flag_opt("--environment", environment.as_ref());

    ctx.invoke(&op, spec).await?;

    Ok(CleanResult {
        project_dir,
        environment,
        cleaned: true,
    })
}
