// src/handlers/library.rs

//! Library registry search and library installation.

use std::num::NonZeroU32;

use serde::Deserialize;
use tracing::info;

use crate::diagnostic::{DiagnosticError, ErrorKind};
use crate::types::TimeoutClass;
use crate::validate::{ValidatedPath, validate_library_spec, validate_search_query};

use super::payload::{
    InstallResult, InstalledLibraries, InstalledListing, LibraryScope, LibrarySearch, tail_lines,
};
use super::{HandlerResult, Operation, ToolContext};

/// Lines of install output kept in the result.
const INSTALL_OUTPUT_LINES: usize = 5;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SearchLibrariesParams {
    pub query: String,
    /// 1-based result page.
    #[serde(default)]
    pub page: Option<NonZeroU32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct InstallLibraryParams {
    pub library: String,
    /// Install into this project; omit and set `global` for global storage.
    #[serde(default)]
    pub project_dir: Option<String>,
    #[serde(default)]
    pub global: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ListInstalledParams {
    #[serde(default)]
    pub project_dir: Option<String>,
    #[serde(default)]
    pub global: bool,
}

/// Where a library operation applies.
enum Target {
    Project(ValidatedPath),
    Global,
}

impl Target {
    fn scope(&self) -> LibraryScope {
        match self {
            Target::Project(_) => LibraryScope::Project,
            Target::Global => LibraryScope::Global,
        }
    }

    fn project_dir(&self) -> Option<&ValidatedPath> {
        match self {
            Target::Project(dir) => Some(dir),
            Target::Global => None,
        }
    }

    fn into_project_dir(self) -> Option<ValidatedPath> {
        match self {
            Target::Project(dir) => Some(dir),
            Target::Global => None,
        }
    }
}

/// Exactly one of `project_dir` and `global` must be given.
fn resolve_target(
    ctx: &ToolContext,
    project_dir: Option<&str>,
    global: bool,
) -> HandlerResult<Target> {
    let project_dir = project_dir.filter(|d| !d.is_empty());
    match (project_dir, global) {
        (Some(dir), false) => Ok(Target::Project(ctx.project_dir(dir)?)),
        (None, true) => Ok(Target::Global),
        (Some(dir), true) => Err(DiagnosticError::new(
            ErrorKind::InvalidArgument,
            "projectDir and global are mutually exclusive",
        )
        .with_context("projectDir", dir)),
        (None, false) => Err(DiagnosticError::new(
            ErrorKind::InvalidArgument,
            "either projectDir or global=true is required",
        )),
    }
}

pub async fn search_libraries(
    ctx: &ToolContext,
    params: SearchLibrariesParams,
) -> HandlerResult<LibrarySearch> {
    let query = validate_search_query(&params.query)?;
    let op = Operation::new("search_libraries")
        .with("query", &query)
        .with_opt("page", params.page);

    let spec = ctx
        .command(&op, ctx.work_dir(&op)?, TimeoutClass::Short)
        .await?
        .literal("lib")
        .literal("search")
        .literal("--json-output")
        .flag_opt("--page", params.page.as_ref())
        .arg(&query);

    let output = ctx.invoke(&op, spec).await?;
    op.decode_json("a library search page", &output.stdout)
}

pub async fn install_library(
    ctx: &ToolContext,
    params: InstallLibraryParams,
) -> HandlerResult<InstallResult> {
    let library = validate_library_spec(&params.library)?;
    let target = resolve_target(ctx, params.project_dir.as_deref(), params.global)?;

    let op = Operation::new("install_library")
        .with("library", &library)
        .with("scope", scope_name(target.scope()))
        .with_opt("project_dir", target.project_dir());

    let cwd = match &target {
        Target::Project(dir) => {
            ctx.ensure_project(&op, dir).await?;
            dir.clone()
        }
        Target::Global => ctx.work_dir(&op)?,
    };

    let spec = ctx
        .command(&op, cwd, TimeoutClass::Short)
        .await?
        .literal("pkg")
        .literal("install")
        .literal("--library")
        .arg(&library);
    let spec = match &target {
        Target::Project(dir) => spec.literal("--project-dir").arg(dir),
        Target::Global => spec.literal("--global"),
    };

    let output = ctx.invoke(&op, spec).await?;
    info!(library = %library, scope = scope_name(target.scope()), "library installed");

    Ok(InstallResult {
        library,
        scope: target.scope(),
        output: tail_lines(&output.stdout, INSTALL_OUTPUT_LINES),
        project_dir: target.into_project_dir(),
    })
}

pub async fn list_installed_libraries(
    ctx: &ToolContext,
    params: ListInstalledParams,
) -> HandlerResult<InstalledLibraries> {
    let target = resolve_target(ctx, params.project_dir.as_deref(), params.global)?;
    let op = Operation::new("list_installed_libraries")
        .with("scope", scope_name(target.scope()))
        .with_opt("project_dir", target.project_dir());

    let spec = match &target {
        Target::Project(dir) => {
            ctx.ensure_project(&op, dir).await?;
            ctx.command(&op, dir.clone(), TimeoutClass::Short)
                .await?
                .literal("lib")
                .literal("-d")
                .arg(dir)
        }
        Target::Global => ctx
            .command(&op, ctx.work_dir(&op)?, TimeoutClass::Short)
            .await?
            .literal("lib")
            .literal("--global"),
    }
    .literal("list")
    .literal("--json-output");

    let output = ctx.invoke(&op, spec).await?;
    let listing: InstalledListing =
        op.decode_json("a list of installed libraries", &output.stdout)?;

    Ok(InstalledLibraries {
        scope: target.scope(),
        libraries: listing.into_libraries(),
        project_dir: target.into_project_dir(),
    })
}

fn scope_name(scope: LibraryScope) -> &'static str {
    match scope {
        LibraryScope::Project => "project",
        LibraryScope::Global => "global",
    }
}
