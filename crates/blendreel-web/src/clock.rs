#![forbid(unsafe_code)]

//! Host timestamps (`performance.now()` milliseconds) to engine time.

use std::time::Duration;

/// Convert a host timestamp, clamping anything unrepresentable.
///
/// Negative and NaN stamps map to zero; stamps past `Duration::MAX` saturate.
#[must_use]
pub fn host_time(now_ms: f64) -> Duration {
    match Duration::try_from_secs_f64(now_ms / 1000.0) {
        Ok(d) => d,
        Err(_) if now_ms > 0.0 => Duration::MAX,
        Err(_) => Duration::ZERO,
    }
}
