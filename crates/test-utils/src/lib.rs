//! Shared fixtures for the `pio-mcp` integration tests: a scripted
//! executor, config builders and a tracing setup that honours `PIO_MCP_LOG`.

pub mod builders;
pub mod fake_executor;

pub use builders::{
    ConfigFileBuilder, FAKE_PIO, fake_context, missing_tool_context, outcome, write_project,
};
pub use fake_executor::{FakeExecutor, RecordedCall, Scripted};

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use pio_mcp::logging::{LOG_ENV, filter_from_env};

/// Upper bound for any single awaited step in a test.
pub const TEST_DEADLINE: Duration = Duration::from_secs(10);

static TRACING: Once = Once::new();

/// Install a test-writer subscriber once per test binary.
///
/// Output is captured by the harness and shown for failing tests only.
/// `PIO_MCP_LOG=debug` raises the level the same way it does for the server.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = filter_from_env(std::env::var(LOG_ENV).ok().as_deref());
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .try_init();
    });
}

/// Await `fut`, failing the test if it takes longer than [`TEST_DEADLINE`].
pub async fn with_timeout<F: Future>(fut: F) -> F::Output {
    match tokio::time::timeout(TEST_DEADLINE, fut).await {
        Ok(out) => out,
        Err(_) => panic!("test step did not finish within {TEST_DEADLINE:?}"),
    }
}
