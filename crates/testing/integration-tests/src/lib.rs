//! End-to-end test utilities for the Quill semantic core

pub mod fixtures;

use std::sync::Once;
use tracing_subscriber::{EnvFilter, fmt};

static TRACING: Once = Once::new();

/// Initialize logging for tests
///
/// Use the `RUST_LOG` environment variable to override the default filter,
/// which only shows warnings. Only the first call installs a subscriber.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        fmt().with_env_filter(filter).with_test_writer().init();
    });
}
