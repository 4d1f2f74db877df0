//! Wall-clock time for the minute windows and the mining start barrier.
//!
//! Tick pacing uses the monotonic `tokio` clock directly.

use std::time::{SystemTime, UNIX_EPOCH};

/// A source of unix time in seconds.
pub trait Clock: Send + Sync + 'static {
    /// Seconds since the unix epoch.
    fn unix_now(&self) -> u64;
}

/// The system's wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

/// Wall-clock time advancing with the `tokio` clock from a fixed unix time.
///
/// Follows `tokio::time::pause` and `advance`, so tests can drive minute
/// windows and the start barrier deterministically.
#[derive(Clone, Copy, Debug)]
pub struct AnchoredClock {
    unix: u64,
    origin: tokio::time::Instant,
}

impl Clock for SystemClock {
    fn unix_now(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

impl AnchoredClock {
    /// A clock reading `unix` now.
    pub fn new(unix: u64) -> Self {
        Self {
            unix,
            origin: tokio::time::Instant::now(),
        }
    }
}

impl Clock for AnchoredClock {
    fn unix_now(&self) -> u64 {
        self.unix + self.origin.elapsed().as_secs()
    }
}
