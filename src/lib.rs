// src/lib.rs

pub mod cli;
pub mod config;
pub mod diagnostic;
pub mod errors;
pub mod exec;
pub mod handlers;
pub mod interpret;
pub mod logging;
pub mod server;
pub mod types;
pub mod validate;

use std::sync::Arc;

use anyhow::Result;
use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::{ConfigFile, RawConfigFile, load_raw_or_default};
use crate::exec::RealExecutorBackend;
use crate::handlers::ToolContext;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and CLI overrides
/// - the process executor and tool locator
/// - the stdio server
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let mut raw = load_raw_or_default(args.config.as_deref())?;
    apply_overrides(&mut raw, &args);
    let cfg = ConfigFile::try_from(raw)?;

    if args.print_config {
        print_config(&cfg);
        return Ok(());
    }

    let shutdown = CancellationToken::new();
    let executor = RealExecutorBackend::new(cfg.timeouts().terminate_grace)
        .with_shutdown(shutdown.clone());
    let ctx = Arc::new(ToolContext::from_config(cfg, Arc::new(executor)));

    // Ctrl-C → graceful shutdown.
    {
        let token = shutdown.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for Ctrl+C");
                return;
            }
            info!("Ctrl+C received");
            token.cancel();
        });
    }

    info!(
        roots = ?ctx.policy().roots(),
        tool = %ctx.config().tool().command,
        "pio-mcp starting"
    );

    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();
    server::serve(ctx, stdin, stdout, shutdown).await?;

    debug!("server stopped");
    Ok(())
}

/// Apply `--allowed-root` and `--tool` on top of the file config.
pub fn apply_overrides(raw: &mut RawConfigFile, args: &CliArgs) {
    if !args.allowed_roots.is_empty() {
        raw.paths.allowed_roots = args.allowed_roots.clone();
        // A work_dir from the file may sit outside the new roots.
        raw.paths.work_dir = None;
    }
    if let Some(tool) = &args.tool {
        raw.tool.command = tool.clone();
    }
}

fn print_config(cfg: &ConfigFile) {
    let tool = cfg.tool();
    let timeouts = cfg.timeouts();
    let paths = cfg.paths();

    println!("pio-mcp effective configuration");
    println!("  tool.command = {}", tool.command);
    match &tool.fallback {
        Some(fallback) => println!("  tool.fallback = {fallback}"),
        None => println!("  tool.fallback = (none)"),
    }
    println!();

    println!("  timeouts.short = {}s", timeouts.short.as_secs());
    println!("  timeouts.compile = {}s", timeouts.compile.as_secs());
    println!("  timeouts.flash = {}s", timeouts.flash.as_secs());
    println!(
        "  timeouts.terminate_grace = {}ms",
        timeouts.terminate_grace.as_millis()
    );
    println!();

    println!("allowed roots ({}):", paths.allowed_roots.len());
    for root in &paths.allowed_roots {
        println!("  - {}", root.display());
    }
    println!("work dir: {}", paths.work_dir.display());

    debug!("print-config complete (server not started)");
}
