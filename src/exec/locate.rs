// src/exec/locate.rs

//! Lazily memoized lookup of the PlatformIO binary.

use std::path::PathBuf;

use tokio::sync::OnceCell;
use tracing::{debug, info};

/// The binary that commands will be spawned with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTool {
    pub path: PathBuf,
    /// The configured name that matched (`pio` or the fallback).
    pub name: String,
}

/// Neither the primary nor the fallback name resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolMissing {
    pub tried: Vec<String>,
}

/// Capability check for the external tool.
///
/// The first successful lookup is cached for the lifetime of the locator.
/// Failures are not cached, so installing the tool while the server runs
/// takes effect on the next request.
#[derive(Debug)]
pub struct ToolLocator {
    primary: String,
    fallback: Option<String>,
    resolved: OnceCell<ResolvedTool>,
}

impl ToolLocator {
    pub fn new(primary: impl Into<String>, fallback: Option<String>) -> Self {
        Self {
            primary: primary.into(),
            fallback: fallback.filter(|f| !f.trim().is_empty()),
            resolved: OnceCell::new(),
        }
    }

    /// A locator that skips the `PATH` lookup and always yields `path`.
    pub fn preresolved(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            primary: name.clone(),
            fallback: None,
            resolved: OnceCell::new_with(Some(ResolvedTool { path, name })),
        }
    }

    pub fn candidates(&self) -> Vec<String> {
        std::iter::once(self.primary.clone())
            .chain(self.fallback.clone())
            .collect()
    }

    pub async fn resolve(&self) -> Result<&ResolvedTool, ToolMissing> {
        self.resolved
            .get_or_try_init(|| async { self.lookup() })
            .await
    }

    fn lookup(&self) -> Result<ResolvedTool, ToolMissing> {
        let candidates = self.candidates();
        for name in &candidates {
            match which::which(name) {
                Ok(path) => {
                    info!(tool = %name, path = %path.display(), "located PlatformIO binary");
                    return Ok(ResolvedTool {
                        path,
                        name: name.clone(),
                    });
                }
                Err(e) => debug!(tool = %name, error = %e, "tool candidate not found"),
            }
        }
        Err(ToolMissing { tried: candidates })
    }
}
