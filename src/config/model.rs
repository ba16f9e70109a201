// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::TimeoutClass;
use crate::validate::PathPolicy;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [tool]
/// command = "pio"
/// fallback = "platformio"
///
/// [timeouts]
/// short_secs = 30
/// compile_secs = 600
/// flash_secs = 300
/// terminate_grace_ms = 2000
///
/// [paths]
/// allowed_roots = ["~/Projects", "/tmp"]
/// work_dir = "~/Projects"
/// ```
///
/// All sections are optional and have reasonable defaults. This is the raw,
/// unvalidated form; convert it with `ConfigFile::try_from`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub tool: ToolSection,

    #[serde(default)]
    pub timeouts: TimeoutSection,

    #[serde(default)]
    pub paths: PathSection,
}

/// `[tool]` section.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ToolSection {
    /// Executable name or absolute path.
    #[serde(default = "default_command")]
    pub command: String,

    /// Alternate name tried when `command` is not found. Empty disables it.
    #[serde(default = "default_fallback")]
    pub fallback: Option<String>,
}

fn default_command() -> String {
    "pio".to_string()
}

fn default_fallback() -> Option<String> {
    Some("platformio".to_string())
}

impl Default for ToolSection {
    fn default() -> Self {
        Self {
            command: default_command(),
            fallback: default_fallback(),
        }
    }
}

/// `[timeouts]` section.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TimeoutSection {
    #[serde(default = "default_short_secs")]
    pub short_secs: u64,

    #[serde(default = "default_compile_secs")]
    pub compile_secs: u64,

    #[serde(default = "default_flash_secs")]
    pub flash_secs: u64,

    /// Delay between SIGTERM and SIGKILL when a deadline fires.
    #[serde(default = "default_terminate_grace_ms")]
    pub terminate_grace_ms: u64,
}

fn default_short_secs() -> u64 {
    30
}

fn default_compile_secs() -> u64 {
    600
}

fn default_flash_secs() -> u64 {
    300
}

fn default_terminate_grace_ms() -> u64 {
    2000
}

impl Default for TimeoutSection {
    fn default() -> Self {
        Self {
            short_secs: default_short_secs(),
            compile_secs: default_compile_secs(),
            flash_secs: default_flash_secs(),
            terminate_grace_ms: default_terminate_grace_ms(),
        }
    }
}

/// `[paths]` section.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PathSection {
    /// Directories project paths must live under. `~` is expanded.
    ///
    /// Empty means: the user's home directory and the system temp directory.
    #[serde(default)]
    pub allowed_roots: Vec<String>,

    /// Working directory for commands that are not tied to a project.
    /// Defaults to the first allowed root.
    #[serde(default)]
    pub work_dir: Option<String>,
}

/// Validated configuration.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    tool: ToolSettings,
    timeouts: TimeoutSettings,
    paths: PathSettings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSettings {
    pub command: String,
    pub fallback: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutSettings {
    pub short: Duration,
    pub compile: Duration,
    pub flash: Duration,
    pub terminate_grace: Duration,
}

impl TimeoutSettings {
    pub fn for_class(&self, class: TimeoutClass) -> Duration {
        match class {
            TimeoutClass::Short => self.short,
            TimeoutClass::Compile => self.compile,
            TimeoutClass::Flash => self.flash,
        }
    }
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        let raw = TimeoutSection::default();
        Self {
            short: Duration::from_secs(raw.short_secs),
            compile: Duration::from_secs(raw.compile_secs),
            flash: Duration::from_secs(raw.flash_secs),
            terminate_grace: Duration::from_millis(raw.terminate_grace_ms),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSettings {
    pub allowed_roots: Vec<PathBuf>,
    pub work_dir: PathBuf,
}

impl ConfigFile {
    /// Construct without validation. Only `validate.rs` should call this.
    pub(crate) fn new_unchecked(
        tool: ToolSettings,
        timeouts: TimeoutSettings,
        paths: PathSettings,
    ) -> Self {
        Self {
            tool,
            timeouts,
            paths,
        }
    }

    pub fn tool(&self) -> &ToolSettings {
        &self.tool
    }

    pub fn timeouts(&self) -> &TimeoutSettings {
        &self.timeouts
    }

    pub fn paths(&self) -> &PathSettings {
        &self.paths
    }

    pub fn path_policy(&self) -> PathPolicy {
        PathPolicy::new(&self.paths.allowed_roots)
    }
}
