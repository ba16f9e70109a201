// src/config/loader.rs

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Read and deserialize a TOML config file. No semantic checks.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    let raw: RawConfigFile = toml::from_str(&contents)?;
    debug!(path = %path.display(), "config file parsed");
    Ok(raw)
}

/// [`load_from_path`] followed by `ConfigFile::try_from`.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    ConfigFile::try_from(load_from_path(path)?)
}

/// Raw config from `path` when given, otherwise all defaults.
///
/// CLI overrides are applied to the raw form before validation, which is
/// why this stops short of producing a `ConfigFile`.
pub fn load_raw_or_default(path: Option<&Path>) -> Result<RawConfigFile> {
    match path {
        Some(p) => load_from_path(p),
        None => Ok(RawConfigFile::default()),
    }
}
