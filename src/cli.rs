// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `pio-mcp`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "pio-mcp",
    version,
    about = "Expose PlatformIO Core to AI assistants as MCP tools over stdio.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to a config file (TOML). All settings have defaults.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `PIO_MCP_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Directory that project paths must live under. Repeatable; replaces
    /// `[paths].allowed_roots` from the config file.
    #[arg(long = "allowed-root", value_name = "DIR")]
    pub allowed_roots: Vec<String>,

    /// PlatformIO executable name or path; replaces `[tool].command`.
    #[arg(long, value_name = "COMMAND")]
    pub tool: Option<String>,

    /// Validate and print the effective configuration, then exit.
    #[arg(long)]
    pub print_config: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
