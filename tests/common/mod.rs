#![allow(dead_code)]

use std::error::Error;
use std::path::Path;
use std::sync::Arc;

use tempfile::TempDir;

use pio_mcp::handlers::ToolContext;
pub use pio_mcp_test_utils::{
    ConfigFileBuilder, FAKE_PIO, FakeExecutor, Scripted, fake_context, init_tracing,
    missing_tool_context, with_timeout, write_project,
};

pub type TestResult = Result<(), Box<dyn Error>>;

/// A scratch allowed root plus a fake-backed context that only accepts
/// paths under it.
pub struct Sandbox {
    pub root: TempDir,
    pub fake: Arc<FakeExecutor>,
    pub ctx: ToolContext,
}

impl Sandbox {
    pub fn new() -> Self {
        Self::with_fake(FakeExecutor::new())
    }

    pub fn with_fake(fake: FakeExecutor) -> Self {
        init_tracing();
        let root = tempfile::tempdir().expect("create temp root");
        let fake = Arc::new(fake);
        let config = ConfigFileBuilder::new().allowed_root(root.path()).build();
        let ctx = fake_context(config, &fake);
        Self { root, fake, ctx }
    }

    pub fn path(&self, rel: &str) -> String {
        self.root.path().join(rel).display().to_string()
    }

    /// Create a PlatformIO project under the root and return its path.
    pub fn project(&self, rel: &str) -> String {
        let dir = self.root.path().join(rel);
        write_project(&dir, "uno");
        dir.display().to_string()
    }

    pub fn root_path(&self) -> &Path {
        self.root.path()
    }
}
