//! Shared helpers for the `runtask` integration tests.

pub mod builders;
pub mod fixtures;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::{EnvFilter, fmt};

/// Upper bound for a single test; process tests sleep and signal real
/// children, so this is generous.
const TEST_BUDGET: Duration = Duration::from_secs(10);

static TRACING: Once = Once::new();

/// Route engine logs into the per-test output capture.
///
/// `RUST_LOG` overrides the default `runtask=debug,warn`; run with
/// `-- --nocapture` to see logs of passing tests too.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("runtask=debug,warn"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Await `f`, failing the test if it takes longer than the test budget.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    match tokio::time::timeout(TEST_BUDGET, f).await {
        Ok(value) => value,
        Err(_) => panic!("test did not finish within {TEST_BUDGET:?}"),
    }
}
