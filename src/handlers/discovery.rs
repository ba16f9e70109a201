// src/handlers/discovery.rs

//! Installation check, board catalogue, attached devices.

use serde::Deserialize;
use tracing::debug;

use crate::diagnostic::{DiagnosticError, ErrorKind, malformed_output};
use crate::types::TimeoutClass;
use crate::validate::{SearchQuery, validate_identifier, validate_search_query};

use super::payload::{Board, Device, InstallationInfo, parse_version};
use super::{HandlerResult, Operation, ToolContext};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ListBoardsParams {
    /// Free-text filter passed to the tool (matches id, name, MCU...).
    #[serde(default)]
    pub filter: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BoardInfoParams {
    pub board: String,
}

pub async fn check_installation(ctx: &ToolContext) -> HandlerResult<InstallationInfo> {
    let op = Operation::new("check_installation");
    let tool = ctx.tool().await.map_err(|e| op.annotate(e))?;
    let path = tool.path.display().to_string();

    let spec = ctx
        .command(&op, ctx.work_dir(&op)?, TimeoutClass::Short)
        .await?
        .literal("--version");
    let output = ctx.invoke(&op, spec).await?;

    let version = parse_version(&output.stdout).ok_or_else(|| {
        op.annotate(malformed_output(
            "a version string",
            "no 'version X.Y.Z' in output",
            &output.stdout,
        ))
    })?;
    debug!(%version, %path, "PlatformIO installation verified");

    Ok(InstallationInfo {
        installed: true,
        path,
        version,
    })
}

pub async fn list_boards(ctx: &ToolContext, params: ListBoardsParams) -> HandlerResult<Vec<Board>> {
    let filter: Option<SearchQuery> = params
        .filter
        .as_deref()
        .filter(|f| !f.trim().is_empty())
        .map(validate_search_query)
        .transpose()?;
    let op = Operation::new("list_boards").with_opt("filter", filter.as_ref());

    let mut spec = ctx
        .command(&op, ctx.work_dir(&op)?, TimeoutClass::Short)
        .await?
        .literal("boards")
        .literal("--json-output");
    if let Some(filter) = &filter {
        spec = spec.arg(filter);
    }

    let output = ctx.invoke(&op, spec).await?;
    op.decode_json("a list of boards", &output.stdout)
}

/// Details for one board id.
///
/// The tool's filter is a fuzzy match, so the listing is searched for the
/// exact, case-sensitive id.
pub async fn get_board_info(ctx: &ToolContext, params: BoardInfoParams) -> HandlerResult<Board> {
    let board = validate_identifier("board", &params.board)?;
    let op = Operation::new("get_board_info").with("board", &board);

    let spec = ctx
        .command(&op, ctx.work_dir(&op)?, TimeoutClass::Short)
        .await?
        .literal("boards")
        .literal("--json-output")
        .arg(&board);
    let output = ctx.invoke(&op, spec).await?;
    let boards: Vec<Board> = op.decode_json("a list of boards", &output.stdout)?;

    let candidates = boards.len();
    boards
        .into_iter()
        .find(|b| b.id == board.as_str())
        .ok_or_else(|| {
            op.annotate(
                DiagnosticError::new(
                    ErrorKind::NotFound,
                    format!("no board with id '{board}' is known to PlatformIO"),
                )
                .with_context("candidates", candidates)
                .with_hint("Board ids are case-sensitive. Use list_boards to find the exact id."),
            )
        })
}

pub async fn list_devices(ctx: &ToolContext) -> HandlerResult<Vec<Device>> {
    let op = Operation::new("list_devices");
    let spec = ctx
        .command(&op, ctx.work_dir(&op)?, TimeoutClass::Short)
        .await?
        .literal("device")
        .literal("list")
        .literal("--json-output");
    let output = ctx.invoke(&op, spec).await?;
    op.decode_json("a list of serial devices", &output.stdout)
}
