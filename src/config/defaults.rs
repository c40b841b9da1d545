//! Default values for configuration options.
//!
//! Centralized constants to avoid magic numbers scattered across the codebase.

use std::time::Duration;

use crate::plan::PlannerPolicy;

/// Default file name written by `init`.
pub const CONFIG_FILE: &str = "paramsync.toml";

/// Default maximum number of settings per remote call.
pub const MAX_CHUNK_SIZE: usize = PlannerPolicy::DEFAULT_MAX_CHUNK_SIZE;

/// Default per-call timeout in seconds.
pub const TIMEOUT_SECS: u64 = 30;

/// Default maximum number of attempts per remote call.
pub const RETRY_MAX_ATTEMPTS: u32 = 5;

/// Default initial retry delay in milliseconds.
pub const RETRY_INITIAL_DELAY_MS: u64 = 1_000;

/// Default maximum retry delay in milliseconds.
pub const RETRY_MAX_DELAY_MS: u64 = 30_000;

/// Default retry backoff multiplier.
pub const RETRY_MULTIPLIER: f64 = 2.0;

/// Default jitter fraction applied to each backoff delay.
pub const RETRY_JITTER: f64 = 0.2;

/// Default per-call timeout as Duration.
#[must_use]
pub const fn timeout() -> Duration {
    Duration::from_secs(TIMEOUT_SECS)
}

/// Default initial retry delay as Duration.
#[must_use]
pub const fn retry_initial_delay() -> Duration {
    Duration::from_millis(RETRY_INITIAL_DELAY_MS)
}

/// Default maximum retry delay as Duration.
#[must_use]
pub const fn retry_max_delay() -> Duration {
    Duration::from_millis(RETRY_MAX_DELAY_MS)
}
