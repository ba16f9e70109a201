// src/interpret/signatures.rs

//! Known failure signatures of PlatformIO and the tools it drives.
//!
//! The table is ordered: for a given line the first matching entry wins, and
//! across lines the entry nearest the top decides the overall failure kind.
//! Add new message formats here; the interpreter's control flow does not
//! change.

use std::fmt;
use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use serde::Serialize;
use tracing::error;

/// What a matched stderr line says went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SignatureKind {
    CommandNotFound,
    UnknownOption,
    UnknownBoard,
    UnknownEnvironment,
    PortBusy,
    PermissionDenied,
    PortUnavailable,
    PackageNotFound,
    NetworkError,
    CompileError,
}

impl SignatureKind {
    /// Remediation for a failure dominated by this signature.
    pub fn hint(self) -> &'static str {
        match self {
            SignatureKind::CommandNotFound => {
                "PlatformIO Core is not installed or not on PATH. Install it with `pip install -U platformio` (or the official installer script) and make sure `pio` is on PATH."
            }
            SignatureKind::UnknownOption => {
                "The installed PlatformIO does not accept this option. Upgrade it with `pio upgrade`."
            }
            SignatureKind::UnknownBoard => {
                "Board id not recognized. Use list_boards to find the exact id; ids are case-sensitive."
            }
            SignatureKind::UnknownEnvironment => {
                "Environment not defined in platformio.ini. Check the [env:NAME] sections of the project."
            }
            SignatureKind::PortBusy => {
                "The serial port is in use by another program, often a serial monitor. Close it and try again."
            }
            SignatureKind::PermissionDenied => {
                "Permission denied. On Linux add your user to the 'dialout' (or 'uucp') group and install the PlatformIO udev rules; also check the project directory permissions."
            }
            SignatureKind::PortUnavailable => {
                "Could not open the serial port. Check that the board is connected and the port name is right (see list_devices)."
            }
            SignatureKind::PackageNotFound => {
                "Package or library not found in the registry. Check the name with search_libraries."
            }
            SignatureKind::NetworkError => {
                "Network error while contacting the PlatformIO registry. Check connectivity or proxy settings."
            }
            SignatureKind::CompileError => {
                "Compilation failed. Fix the reported source errors and build again."
            }
        }
    }

    /// Whether this signature concerns the serial port.
    pub fn is_port_related(self) -> bool {
        matches!(
            self,
            SignatureKind::PortBusy | SignatureKind::PortUnavailable
        )
    }
}

impl fmt::Display for SignatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SignatureKind::CommandNotFound => "command not found",
            SignatureKind::UnknownOption => "unknown option",
            SignatureKind::UnknownBoard => "unknown board",
            SignatureKind::UnknownEnvironment => "unknown environment",
            SignatureKind::PortBusy => "port busy",
            SignatureKind::PermissionDenied => "permission denied",
            SignatureKind::PortUnavailable => "port unavailable",
            SignatureKind::PackageNotFound => "package not found",
            SignatureKind::NetworkError => "network error",
            SignatureKind::CompileError => "compile error",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone)]
pub struct Signature {
    kind: SignatureKind,
    pattern: Regex,
}

impl Signature {
    pub fn kind(&self) -> SignatureKind {
        self.kind
    }

    pub fn matches(&self, line: &str) -> bool {
        self.pattern.is_match(line)
    }
}

/// Ordered pattern → kind table.
#[derive(Debug, Clone, Default)]
pub struct SignatureTable {
    entries: Vec<Signature>,
}

impl SignatureTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a case-insensitive pattern.
    pub fn with(mut self, kind: SignatureKind, pattern: &str) -> Result<Self, regex::Error> {
        self.push(kind, pattern)?;
        Ok(self)
    }

    pub fn push(&mut self, kind: SignatureKind, pattern: &str) -> Result<(), regex::Error> {
        let pattern = RegexBuilder::new(pattern).case_insensitive(true).build()?;
        self.entries.push(Signature { kind, pattern });
        Ok(())
    }

    /// The table shipped with the crate.
    pub fn builtin() -> &'static SignatureTable {
        &BUILTIN
    }

    pub fn entries(&self) -> &[Signature] {
        &self.entries
    }

    /// First matching entry for `line`, with its position in the table.
    pub fn match_line(&self, line: &str) -> Option<(usize, SignatureKind)> {
        self.entries
            .iter()
            .enumerate()
            .find(|(_, sig)| sig.matches(line))
            .map(|(rank, sig)| (rank, sig.kind))
    }
}

const BUILTIN_PATTERNS: &[(SignatureKind, &str)] = &[
    (
        SignatureKind::CommandNotFound,
        r"command not found|is not recognized as an internal or external command",
    ),
    (
        SignatureKind::UnknownOption,
        r"no such option|unrecognized option|unknown option|got unexpected extra argument",
    ),
    (SignatureKind::UnknownBoard, r"unknown board id|unknownboard"),
    (
        SignatureKind::UnknownEnvironment,
        r"unknown environment names?|unknownenvname",
    ),
    (
        SignatureKind::PortBusy,
        r"is busy|resource busy|\[errno 16\]|port is already (open|in use)",
    ),
    (
        SignatureKind::PermissionDenied,
        r"permission denied|access is denied|\[errno 13\]",
    ),
    (
        SignatureKind::PortUnavailable,
        r"could not open port|could not find (a |the )?(serial |upload )?port|no serial port|please specify `?upload_port`?|failed to connect to",
    ),
    (
        SignatureKind::PackageNotFound,
        r"could not find the package|unknownpackageerror|library .* not found|could not find .* library",
    ),
    (
        SignatureKind::NetworkError,
        r"httpclienterror|connection (refused|reset|timed out)|max retries exceeded|could not resolve host|internetisoffline|getaddrinfo failed",
    ),
    (
        SignatureKind::CompileError,
        r":\d+:(\d+:)? (fatal )?error:|\*\*\* \[[^\]]+\] error \d+|compilation terminated",
    ),
];

static BUILTIN: LazyLock<SignatureTable> = LazyLock::new(|| {
    let mut table = SignatureTable::new();
    for (kind, pattern) in BUILTIN_PATTERNS {
        if let Err(e) = table.push(*kind, pattern) {
            error!(%kind, error = %e, "skipping invalid builtin signature pattern");
        }
    }
    table
});
