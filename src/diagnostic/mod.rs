// src/diagnostic/mod.rs

//! The error type handed back to the transport.
//!
//! Every failure path ends in exactly one [`ErrorKind`]. Nothing here is
//! retried: a `DiagnosticError` is terminal for the request that produced
//! it.

pub mod classify;

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

pub use classify::{
    from_execution, from_tool_failure, from_validation, malformed_output, tool_missing,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    InvalidPath,
    InvalidIdentifier,
    InvalidPort,
    InvalidArgument,
    ToolNotInstalled,
    Timeout,
    OperationFailed,
    MalformedOutput,
    NotFound,
    Cancelled,
}

impl ErrorKind {
    /// Fixed remediation text for the kind.
    ///
    /// `OperationFailed` usually gets a more specific hint from the matched
    /// signature instead.
    pub fn default_hint(self) -> &'static str {
        match self {
            ErrorKind::InvalidPath => {
                "Pass an absolute project directory inside one of the allowed roots, without '..' segments that leave it."
            }
            ErrorKind::InvalidIdentifier => {
                "Use only letters, digits, '-', '_' and '.'; ids are case-sensitive (see list_boards)."
            }
            ErrorKind::InvalidPort => {
                "Use a port name as reported by list_devices, e.g. /dev/ttyUSB0, /dev/cu.usbserial-0001 or COM3."
            }
            ErrorKind::InvalidArgument => "Check the argument value and try again.",
            ErrorKind::ToolNotInstalled => {
                "Install PlatformIO Core (`pip install -U platformio` or the official installer) and make sure `pio` is on PATH."
            }
            ErrorKind::Timeout => {
                "The command was stopped at its deadline. Check the device connection, or raise the timeout in the server config."
            }
            ErrorKind::OperationFailed => "Read the diagnostics below for the tool's own error message.",
            ErrorKind::MalformedOutput => {
                "PlatformIO returned output in an unexpected format. Check the installed version with check_installation and upgrade with `pio upgrade`."
            }
            ErrorKind::NotFound => "Check the name or id and try again.",
            ErrorKind::Cancelled => "The server was shutting down. Run the command again.",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Classified failure with operation context.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("{message}")]
pub struct DiagnosticError {
    pub kind: ErrorKind,
    pub message: String,
    /// Which directory, environment, port... the failure concerned.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub context: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Extracted lines from the tool's error output.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<String>,
}

impl DiagnosticError {
    /// New error carrying the kind's default hint.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            context: BTreeMap::new(),
            hint: Some(kind.default_hint().to_string()),
            diagnostics: Vec::new(),
        }
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.context.insert(key.into(), value.to_string());
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_diagnostics(mut self, lines: Vec<String>) -> Self {
        self.diagnostics = lines;
        self
    }

    /// Plain-text rendering meant to be shown to the user verbatim.
    pub fn render(&self) -> String {
        let mut out = format!("[{}] {}", self.kind, self.message);
        if !self.diagnostics.is_empty() {
            out.push_str("\n\nDetails:");
            for line in &self.diagnostics {
                out.push_str("\n  ");
                out.push_str(line);
            }
        }
        if let Some(hint) = &self.hint {
            out.push_str("\n\nHint: ");
            out.push_str(hint);
        }
        out
    }
}
