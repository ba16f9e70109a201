// src/logging.rs

//! `tracing` subscriber setup.
//!
//! The level comes from, in order:
//! 1. `--log-level`
//! 2. `PIO_MCP_LOG`, either a bare level (`debug`) or a full filter
//!    directive (`pio_mcp::exec=trace,info`)
//! 3. `info`
//!
//! Everything is written to STDERR. STDOUT carries protocol frames only, so
//! a stray log line there would corrupt the transport.

use anyhow::Result;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::cli::LogLevel;

pub const LOG_ENV: &str = "PIO_MCP_LOG";

const DEFAULT_DIRECTIVE: &str = "info";

/// Install the global subscriber. Call once, before the server starts.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let filter = match cli_level {
        Some(lvl) => EnvFilter::new(Level::from(lvl).as_str()),
        None => filter_from_env(std::env::var(LOG_ENV).ok().as_deref()),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install log subscriber: {e}"))
}

impl From<LogLevel> for Level {
    fn from(lvl: LogLevel) -> Self {
        match lvl {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

/// Filter for a `PIO_MCP_LOG` value. Unset, blank or unparsable values
/// fall back to `info`.
pub fn filter_from_env(value: Option<&str>) -> EnvFilter {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return EnvFilter::new(DEFAULT_DIRECTIVE);
    };

    // `warning` is a common spelling that `Level`'s parser does not know.
    let bare = if value.eq_ignore_ascii_case("warning") {
        Ok(Level::WARN)
    } else {
        value.parse::<Level>()
    };
    match bare {
        Ok(level) => EnvFilter::new(level.as_str()),
        Err(_) => EnvFilter::try_new(value).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE)),
    }
}
