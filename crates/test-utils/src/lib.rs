pub mod builders;
pub mod console;
pub mod fake_launcher;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use rigdeploy::logging::LOG_ENV_VAR;
use tracing_subscriber::{EnvFilter, fmt};

/// Upper bound for any single awaited step in a test.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

static INIT: Once = Once::new();

/// Initialise tracing for tests, once per test binary.
///
/// Output goes through the test writer, so it only shows for failing tests
/// (or with `--nocapture`). The filter is read from `RIGDEPLOY_LOG`, the
/// variable the binary uses, then `RUST_LOG`, then defaults to `info`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| EnvFilter::new("info"));

        let _ = fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .try_init();
    });
}

/// Run a future, failing the test if it takes longer than [`TEST_TIMEOUT`].
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    tokio::time::timeout(TEST_TIMEOUT, f)
        .await
        .expect("Test timed out after 5 seconds")
}

/// Poll `condition` every 10ms until it holds, within [`TEST_TIMEOUT`].
pub async fn wait_until<C>(mut condition: C)
where
    C: FnMut() -> bool,
{
    with_timeout(async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
}
