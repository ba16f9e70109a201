// src/config/validate.rs

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::model::{
    ConfigFile, PathSection, PathSettings, RawConfigFile, TimeoutSection, TimeoutSettings,
    ToolSection, ToolSettings,
};
use crate::errors::{PioMcpError, Result};
use crate::validate::PathPolicy;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = PioMcpError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let tool = validate_tool(&raw.tool)?;
        let timeouts = validate_timeouts(&raw.timeouts)?;
        let paths = validate_paths(&raw.paths)?;
        Ok(ConfigFile::new_unchecked(tool, timeouts, paths))
    }
}

/// Check a config without keeping the result.
pub fn validate_config(raw: &RawConfigFile) -> Result<()> {
    ConfigFile::try_from(raw.clone()).map(|_| ())
}

fn validate_tool(section: &ToolSection) -> Result<ToolSettings> {
    let command = section.command.trim();
    if command.is_empty() {
        return Err(PioMcpError::ConfigError(
            "[tool].command must not be empty".to_string(),
        ));
    }

    let fallback = section
        .fallback
        .as_deref()
        .map(str::trim)
        .filter(|f| !f.is_empty() && *f != command)
        .map(str::to_string);

    Ok(ToolSettings {
        command: command.to_string(),
        fallback,
    })
}

fn validate_timeouts(section: &TimeoutSection) -> Result<TimeoutSettings> {
    let checks = [
        ("short_secs", section.short_secs),
        ("compile_secs", section.compile_secs),
        ("flash_secs", section.flash_secs),
        ("terminate_grace_ms", section.terminate_grace_ms),
    ];
    for (name, value) in checks {
        if value == 0 {
            return Err(PioMcpError::ConfigError(format!(
                "[timeouts].{name} must be >= 1 (got 0)"
            )));
        }
    }

    Ok(TimeoutSettings {
        short: Duration::from_secs(section.short_secs),
        compile: Duration::from_secs(section.compile_secs),
        flash: Duration::from_secs(section.flash_secs),
        terminate_grace: Duration::from_millis(section.terminate_grace_ms),
    })
}

fn validate_paths(section: &PathSection) -> Result<PathSettings> {
    let roots: Vec<PathBuf> = if section.allowed_roots.is_empty() {
        default_roots()
    } else {
        section
            .allowed_roots
            .iter()
            .map(|r| expand_home(r))
            .collect::<Result<_>>()?
    };

    if roots.is_empty() {
        return Err(PioMcpError::ConfigError(
            "[paths].allowed_roots is empty and no home or temp directory could be determined"
                .to_string(),
        ));
    }

    for root in &roots {
        if !root.is_absolute() {
            return Err(PioMcpError::ConfigError(format!(
                "[paths].allowed_roots entry '{}' must be an absolute path",
                root.display()
            )));
        }
    }

    let policy = PathPolicy::new(&roots);
    if policy.roots().len() != roots.len() {
        return Err(PioMcpError::ConfigError(
            "[paths].allowed_roots contains a path that climbs above the filesystem root"
                .to_string(),
        ));
    }

    let work_dir = match &section.work_dir {
        Some(dir) => {
            let dir = expand_home(dir)?;
            policy
                .validate_path(&dir)
                .map_err(|e| PioMcpError::ConfigError(format!("[paths].work_dir: {e}")))?
                .into_path_buf()
        }
        None => policy.base().map(Path::to_path_buf).ok_or_else(|| {
            PioMcpError::ConfigError("[paths] has no usable root for work_dir".to_string())
        })?,
    };

    Ok(PathSettings {
        allowed_roots: policy.roots().to_vec(),
        work_dir,
    })
}

fn default_roots() -> Vec<PathBuf> {
    let mut roots = Vec::new();
    if let Some(home) = dirs::home_dir() {
        roots.push(home);
    }
    let tmp = std::env::temp_dir();
    if tmp.is_absolute() && !roots.contains(&tmp) {
        roots.push(tmp);
    }
    // `temp_dir` is per-user on macOS (`/var/folders/...`), so `/tmp` is
    // added alongside it.
    #[cfg(unix)]
    {
        let slash_tmp = PathBuf::from("/tmp");
        if slash_tmp.is_dir() && !roots.contains(&slash_tmp) {
            roots.push(slash_tmp);
        }
    }
    roots
}

/// Expand a leading `~` to the home directory.
pub(crate) fn expand_home(raw: &str) -> Result<PathBuf> {
    let raw = raw.trim();
    let Some(rest) = raw.strip_prefix('~') else {
        return Ok(PathBuf::from(raw));
    };
    if !(rest.is_empty() || rest.starts_with('/') || rest.starts_with('\\')) {
        return Err(PioMcpError::ConfigError(format!(
            "'{raw}': only '~' for the current user is supported"
        )));
    }
    let home = dirs::home_dir().ok_or_else(|| {
        PioMcpError::ConfigError(format!("'{raw}': home directory is unknown"))
    })?;
    let rest = rest.trim_start_matches(['/', '\\']);
    Ok(if rest.is_empty() {
        home
    } else {
        Path::new(&home).join(rest)
    })
}
