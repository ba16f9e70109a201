// src/validate/path.rs

//! Project directory validation.
//!
//! Paths are normalized lexically: `.` segments are dropped and `..` pops the
//! previous segment. Relative inputs are resolved against the policy's base
//! directory. The result must stay inside one of the allowed roots.
//!
//! Symlinks are not resolved here since that would need filesystem access;
//! the roots are trusted directories, and what lives inside them is the
//! user's own project tree.

use std::ffi::OsStr;
use std::fmt;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;

use super::{SHELL_METACHARACTERS, ValidationError, printable};

/// A directory path that passed normalization and containment checks.
///
/// Only [`PathPolicy::validate`] constructs this type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ValidatedPath(PathBuf);

impl ValidatedPath {
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    pub fn as_os_str(&self) -> &OsStr {
        self.0.as_os_str()
    }

    pub fn into_path_buf(self) -> PathBuf {
        self.0
    }
}

impl AsRef<Path> for ValidatedPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for ValidatedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Set of directories that project paths must live under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPolicy {
    roots: Vec<PathBuf>,
}

impl PathPolicy {
    /// Build a policy from absolute root directories.
    ///
    /// Roots are normalized the same way inputs are. Relative or
    /// unnormalizable roots are dropped; config validation rejects them
    /// before they get here.
    pub fn new<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let roots = roots
            .into_iter()
            .filter(|r| r.as_ref().is_absolute())
            .filter_map(|r| normalize(r.as_ref()))
            .collect();
        Self { roots }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Directory that relative inputs are resolved against.
    pub fn base(&self) -> Option<&Path> {
        self.roots.first().map(PathBuf::as_path)
    }

    /// Validate and normalize a caller-supplied directory.
    pub fn validate(&self, raw: &str) -> Result<ValidatedPath, ValidationError> {
        let reject = |reason: &str| ValidationError::InvalidPath {
            input: printable(raw),
            reason: reason.to_string(),
        };

        if raw.trim().is_empty() {
            return Err(reject("path is empty"));
        }
        if raw.contains('\0') {
            return Err(reject("path contains a null byte"));
        }
        if raw.contains(SHELL_METACHARACTERS) {
            return Err(reject("path contains shell metacharacters"));
        }

        let candidate = Path::new(raw);
        let joined = if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            match self.base() {
                Some(base) => base.join(candidate),
                None => return Err(reject("relative path given and no base directory configured")),
            }
        };

        let normalized =
            normalize(&joined).ok_or_else(|| reject("path climbs above the filesystem root"))?;

        if !self.roots.iter().any(|root| normalized.starts_with(root)) {
            return Err(reject("path is outside the allowed project roots"));
        }

        Ok(ValidatedPath(normalized))
    }

    /// Validate one of the roots itself (used for the default working
    /// directory of discovery commands).
    pub fn validate_path(&self, path: &Path) -> Result<ValidatedPath, ValidationError> {
        match path.to_str() {
            Some(s) => self.validate(s),
            None => Err(ValidationError::InvalidPath {
                input: path.display().to_string(),
                reason: "path is not valid UTF-8".to_string(),
            }),
        }
    }
}

/// Lexically normalize an absolute path.
///
/// Returns `None` when a `..` segment would climb above the root.
fn normalize(path: &Path) -> Option<PathBuf> {
    let mut out = PathBuf::new();
    let mut depth = 0usize;

    for component in path.components() {
        match component {
            Component::Prefix(prefix) => out.push(prefix.as_os_str()),
            Component::RootDir => out.push(Component::RootDir.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                if depth == 0 {
                    return None;
                }
                out.pop();
                depth -= 1;
            }
            Component::Normal(seg) => {
                out.push(seg);
                depth += 1;
            }
        }
    }

    Some(out)
}
