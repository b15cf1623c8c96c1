//! Test log output for the bridge crates.
//!
//! Most exchange tests submit tokens that are meant to be rejected, and every
//! rejection emits a `SECURITY_EXCHANGE_FAILED` warning. The default filter
//! keeps those out of test output; set `TEST_LOG` (or `RUST_LOG`) to see them.

use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, EnvFilter};

/// Used when neither `TEST_LOG` nor `RUST_LOG` is set.
pub const DEFAULT_TEST_FILTER: &str = "warn,token_bridge::logging::security=error";

static INSTALLED: OnceCell<()> = OnceCell::new();

/// Install the test subscriber once per process. Later calls do nothing, and
/// a subscriber installed by someone else is left alone.
pub fn init() {
    INSTALLED.get_or_init(|| {
        let _ = fmt()
            .with_env_filter(test_filter())
            .with_test_writer()
            .with_target(true)
            .without_time()
            .try_init();
    });
}

fn test_filter() -> EnvFilter {
    ["TEST_LOG", "RUST_LOG"]
        .into_iter()
        .find_map(|key| std::env::var(key).ok())
        .map(EnvFilter::new)
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_TEST_FILTER))
}
