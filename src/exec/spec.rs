// src/exec/spec.rs

//! Argv-style command description handed to the executor.
//!
//! Arguments are added either as `&'static str` literals (flags and
//! subcommands written in this crate) or as validated values through
//! [`CommandArg`]. There is no method that takes a runtime `String`, so a
//! request field cannot reach the command line without passing a validator.

use std::ffi::{OsStr, OsString};
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::validate::{
    BaudRate, LibrarySpec, SearchQuery, ValidatedIdentifier, ValidatedPath, ValidatedPort,
};

/// A value that may be placed on a tool command line.
///
/// Implemented only for validated newtypes.
pub trait CommandArg {
    fn to_arg(&self) -> OsString;
}

impl CommandArg for ValidatedPath {
    fn to_arg(&self) -> OsString {
        self.as_os_str().to_os_string()
    }
}

impl CommandArg for ValidatedIdentifier {
    fn to_arg(&self) -> OsString {
        OsString::from(self.as_str())
    }
}

impl CommandArg for ValidatedPort {
    fn to_arg(&self) -> OsString {
        OsString::from(self.as_str())
    }
}

impl CommandArg for LibrarySpec {
    fn to_arg(&self) -> OsString {
        OsString::from(self.as_str())
    }
}

impl CommandArg for SearchQuery {
    fn to_arg(&self) -> OsString {
        OsString::from(self.as_str())
    }
}

impl CommandArg for BaudRate {
    fn to_arg(&self) -> OsString {
        OsString::from(self.get().to_string())
    }
}

/// Page numbers and other counts that were range-checked by their type.
impl CommandArg for NonZeroU32 {
    fn to_arg(&self) -> OsString {
        OsString::from(self.get().to_string())
    }
}

/// `key=value` for `pio project init --project-option`.
#[derive(Debug, Clone, Copy)]
pub struct ProjectOption<'a> {
    key: &'static str,
    value: &'a ValidatedIdentifier,
}

impl<'a> ProjectOption<'a> {
    pub fn new(key: &'static str, value: &'a ValidatedIdentifier) -> Self {
        Self { key, value }
    }
}

impl CommandArg for ProjectOption<'_> {
    fn to_arg(&self) -> OsString {
        OsString::from(format!("{}={}", self.key, self.value.as_str()))
    }
}

/// One external invocation: program, argv, working directory, deadline.
///
/// Built fresh per call and consumed by the executor.
#[derive(Debug)]
pub struct CommandSpec {
    program: PathBuf,
    args: Vec<OsString>,
    cwd: ValidatedPath,
    timeout: Duration,
}

impl CommandSpec {
    /// `timeout` is clamped to at least one millisecond.
    pub fn new(program: impl Into<PathBuf>, cwd: ValidatedPath, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd,
            timeout: timeout.max(Duration::from_millis(1)),
        }
    }

    /// Append a literal written in this crate (subcommand, flag).
    pub fn literal(mut self, arg: &'static str) -> Self {
        self.args.push(OsString::from(arg));
        self
    }

    /// Append a validated value.
    pub fn arg(mut self, arg: &impl CommandArg) -> Self {
        self.args.push(arg.to_arg());
        self
    }

    /// Append `flag value` when `value` is present.
    pub fn flag_opt<A: CommandArg>(self, flag: &'static str, value: Option<&A>) -> Self {
        match value {
            Some(v) => self.literal(flag).arg(v),
            None => self,
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    pub fn cwd(&self) -> &ValidatedPath {
        &self.cwd
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Arguments as lossy strings, for logs, tests and monitor hints.
    pub fn args_lossy(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    /// Human-readable command line. Not meant to be fed to a shell.
    pub fn display_line(&self) -> String {
        let mut line = program_name(&self.program);
        for arg in &self.args {
            line.push(' ');
            line.push_str(&arg.to_string_lossy());
        }
        line
    }
}

fn program_name(program: &Path) -> String {
    program
        .file_name()
        .unwrap_or(OsStr::new(""))
        .to_string_lossy()
        .into_owned()
}
