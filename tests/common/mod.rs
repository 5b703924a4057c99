#![allow(dead_code)]

pub use kiln_test_utils::builders::{Harness, HarnessBuilder};
pub use kiln_test_utils::{init_tracing, with_timeout};

use std::time::{Duration, SystemTime};

/// A fixed point in time well before any test runs.
pub fn at(secs: u64) -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
}

/// Reference time most watcher tests start from.
pub const REFERENCE_SECS: u64 = 1_000;
