// src/errors.rs

//! Server-level errors.
//!
//! Tool-facing failures are not represented here: those are classified into
//! [`crate::diagnostic::DiagnosticError`] and returned in-band. This enum is
//! for what stops the server itself: a bad config file or a broken stdio
//! stream.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PioMcpError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Could not encode response: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PioMcpError>;
