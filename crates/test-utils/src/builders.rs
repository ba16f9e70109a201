#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use pio_mcp::config::{ConfigFile, RawConfigFile};
use pio_mcp::exec::{ExecutionOutcome, ToolLocator};
use pio_mcp::handlers::ToolContext;

use crate::fake_executor::FakeExecutor;

/// Path the fake locator pretends PlatformIO lives at.
pub const FAKE_PIO: &str = "/opt/platformio/bin/pio";

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn allowed_root(mut self, root: impl AsRef<Path>) -> Self {
        self.config
            .paths
            .allowed_roots
            .push(root.as_ref().display().to_string());
        self
    }

    pub fn work_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.config.paths.work_dir = Some(dir.as_ref().display().to_string());
        self
    }

    pub fn tool(mut self, command: &str, fallback: Option<&str>) -> Self {
        self.config.tool.command = command.to_string();
        self.config.tool.fallback = fallback.map(str::to_string);
        self
    }

    pub fn short_secs(mut self, secs: u64) -> Self {
        self.config.timeouts.short_secs = secs;
        self
    }

    pub fn compile_secs(mut self, secs: u64) -> Self {
        self.config.timeouts.compile_secs = secs;
        self
    }

    pub fn flash_secs(mut self, secs: u64) -> Self {
        self.config.timeouts.flash_secs = secs;
        self
    }

    pub fn terminate_grace_ms(mut self, ms: u64) -> Self {
        self.config.timeouts.terminate_grace_ms = ms;
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Context over `fake` whose tool is already "installed" at [`FAKE_PIO`].
pub fn fake_context(config: ConfigFile, fake: &Arc<FakeExecutor>) -> ToolContext {
    ToolContext::new(
        config,
        ToolLocator::preresolved(FAKE_PIO),
        Arc::clone(fake) as Arc<dyn pio_mcp::exec::ExecutorBackend>,
    )
}

/// Context whose tool cannot be found anywhere on `PATH`.
pub fn missing_tool_context(config: ConfigFile, fake: &Arc<FakeExecutor>) -> ToolContext {
    ToolContext::new(
        config,
        ToolLocator::new("pio-definitely-not-installed-7c1e", None),
        Arc::clone(fake) as Arc<dyn pio_mcp::exec::ExecutorBackend>,
    )
}

/// Create `dir` with a minimal `platformio.ini` so it counts as a project.
pub fn write_project(dir: &Path, board: &str) {
    std::fs::create_dir_all(dir).expect("create project dir");
    std::fs::write(
        dir.join("platformio.ini"),
        format!("[env:{board}]\nplatform = atmelavr\nboard = {board}\nframework = arduino\n"),
    )
    .expect("write platformio.ini");
}

pub fn outcome(exit_code: i32, stdout: &str, stderr: &str) -> ExecutionOutcome {
    ExecutionOutcome {
        stdout: stdout.to_string(),
        stderr: stderr.to_string(),
        exit_code,
        elapsed: Duration::from_millis(10),
    }
}
