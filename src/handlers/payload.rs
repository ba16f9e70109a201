// src/handlers/payload.rs

//! Typed shapes for PlatformIO's JSON output and for handler results.
//!
//! Decoding goes through these structs instead of passing the tool's JSON
//! along untouched, so a format change shows up as `MalformedOutput` rather
//! than as a surprise for the caller. Unknown fields are ignored; fields the
//! tool does not always emit are optional.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::validate::{
    BaudRate, LibrarySpec, ValidatedIdentifier, ValidatedPath, ValidatedPort,
};

// ---------------------------------------------------------------------------
// Discovery
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallationInfo {
    pub installed: bool,
    pub path: String,
    pub version: String,
}

static VERSION_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)version\s+v?(\d+(?:\.\d+)+\S*)").ok());

/// Version number from `pio --version` output
/// (`PlatformIO Core, version 6.1.15`).
pub fn parse_version(stdout: &str) -> Option<String> {
    let re = VERSION_RE.as_ref()?;
    stdout
        .lines()
        .find_map(|line| re.captures(line))
        .map(|caps| caps[1].to_string())
}

/// One entry of `pio boards --json-output`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    pub id: String,
    pub name: String,
    pub platform: String,
    #[serde(default)]
    pub mcu: Option<String>,
    /// CPU frequency in Hz.
    #[serde(default)]
    pub fcpu: Option<u64>,
    /// RAM size in bytes.
    #[serde(default)]
    pub ram: Option<u64>,
    /// Flash size in bytes.
    #[serde(default)]
    pub rom: Option<u64>,
    #[serde(default)]
    pub frameworks: Vec<String>,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub connectivity: Vec<String>,
}

/// One entry of `pio device list --json-output`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Device {
    pub port: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub hwid: String,
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitResult {
    pub project_dir: ValidatedPath,
    pub board: ValidatedIdentifier,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub framework: Option<ValidatedIdentifier>,
}

/// A memory region line from the build summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryUsage {
    /// `RAM` or `Flash`, as printed by the tool.
    pub region: String,
    pub percent: f64,
    pub used_bytes: u64,
    pub total_bytes: u64,
}

/// A row of the per-environment summary table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentStatus {
    pub environment: String,
    pub status: String,
    pub duration: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildResult {
    pub project_dir: ValidatedPath,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<ValidatedIdentifier>,
    pub duration_ms: u64,
    pub memory: Vec<MemoryUsage>,
    pub environments: Vec<EnvironmentStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanResult {
    pub project_dir: ValidatedPath,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<ValidatedIdentifier>,
    pub cleaned: bool,
}

static MEMORY_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"^(RAM|Flash):\s*\[[^\]]*\]\s*([0-9]+(?:\.[0-9]+)?)%\s*\(used\s+([0-9]+)\s+bytes\s+from\s+([0-9]+)\s+bytes\)",
    )
    .ok()
});

static ENV_STATUS_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^(\S+)\s+(SUCCESS|FAILED|IGNORED|SKIPPED|ERROR)\s+([0-9]{2}:[0-9]{2}:[0-9]{2}(?:\.[0-9]+)?)\s*$")
        .ok()
});

/// `RAM:   [=   ]  9.2% (used 188 bytes from 2048 bytes)` lines.
pub fn parse_memory_usage(stdout: &str) -> Vec<MemoryUsage> {
    let Some(re) = MEMORY_RE.as_ref() else {
        return Vec::new();
    };
    stdout
        .lines()
        .filter_map(|line| {
            let caps = re.captures(line.trim())?;
            Some(MemoryUsage {
                region: caps[1].to_string(),
                percent: caps[2].parse().ok()?,
                used_bytes: caps[3].parse().ok()?,
                total_bytes: caps[4].parse().ok()?,
            })
        })
        .collect()
}

/// Rows of the `Environment  Status  Duration` table printed after a run.
pub fn parse_environment_statuses(stdout: &str) -> Vec<EnvironmentStatus> {
    let Some(re) = ENV_STATUS_RE.as_ref() else {
        return Vec::new();
    };
    stdout
        .lines()
        .filter_map(|line| {
            let caps = re.captures(line.trim())?;
            Some(EnvironmentStatus {
                environment: caps[1].to_string(),
                status: caps[2].to_string(),
                duration: caps[3].to_string(),
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Upload / monitor
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    pub project_dir: ValidatedPath,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<ValidatedIdentifier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<ValidatedPort>,
    pub duration_ms: u64,
    pub environments: Vec<EnvironmentStatus>,
}

/// Command the caller should run in their own terminal to open a monitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorCommand {
    pub argv: Vec<String>,
    pub command_line: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<ValidatedPort>,
    pub baud: BaudRate,
    pub note: &'static str,
}

// ---------------------------------------------------------------------------
// Libraries
// ---------------------------------------------------------------------------

/// Page of `pio lib search --json-output`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LibrarySearch {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub perpage: u32,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub items: Vec<LibrarySummary>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LibrarySummary {
    #[serde(default)]
    pub id: Option<u64>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default, alias = "authornames")]
    pub authors: Vec<String>,
    #[serde(default, alias = "versionname")]
    pub version: Option<String>,
    #[serde(default)]
    pub updated: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct InstalledLibrary {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Library storage directory, when the listing is grouped by storage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<String>,
}

/// `pio lib list --json-output` prints a flat array for global storage and an
/// object keyed by storage directory for projects.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum InstalledListing {
    Flat(Vec<InstalledLibrary>),
    ByStorage(BTreeMap<String, Vec<InstalledLibrary>>),
}

impl InstalledListing {
    pub fn into_libraries(self) -> Vec<InstalledLibrary> {
        match self {
            InstalledListing::Flat(libs) => libs,
            InstalledListing::ByStorage(groups) => groups
                .into_iter()
                .flat_map(|(storage, libs)| {
                    libs.into_iter().map(move |mut lib| {
                        lib.storage.get_or_insert_with(|| storage.clone());
                        lib
                    })
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LibraryScope {
    Project,
    Global,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallResult {
    pub library: LibrarySpec,
    pub scope: LibraryScope,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_dir: Option<ValidatedPath>,
    /// Last lines of the tool's output, which name the resolved version.
    pub output: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstalledLibraries {
    pub scope: LibraryScope,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_dir: Option<ValidatedPath>,
    pub libraries: Vec<InstalledLibrary>,
}

/// The last `n` non-empty lines of `text`.
pub fn tail_lines(text: &str, n: usize) -> Vec<String> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim_end)
        .filter(|l| !l.trim().is_empty())
        .collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].iter().map(|l| l.to_string()).collect()
}
