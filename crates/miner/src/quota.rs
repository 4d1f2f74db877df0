//! Per-minute transaction quota and its division into ticks and batches.

use effort_types::MicroAlgos;
use std::ops::Range;

/// Ticks in one minute window at the two second cadence.
pub const TICKS_PER_MINUTE: u64 = 30;

/// Maximum number of transactions in one atomic group.
pub const MAX_GROUP_SIZE: u64 = 16;

/// Length of a quota window in seconds.
pub const WINDOW_SECS: u64 = 60;

/// The target sending rate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rate {
    /// Transactions per minute.
    pub tpm: u64,
    /// Flat fee paid per transaction.
    pub fee: MicroAlgos,
}

/// The transactions left to send in the current minute window.
///
/// Exactly one allocation is live per window. Unused quota is dropped when a
/// new window begins.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Quota {
    tpm: u64,
    window: Option<u64>,
    remaining: u64,
}

impl Rate {
    /// The total fees spent per minute at this rate.
    pub fn cost_per_minute(&self) -> MicroAlgos {
        self.tpm.saturating_mul(self.fee)
    }
}

impl Quota {
    /// A quota of `tpm` transactions per minute. No window has begun yet.
    pub fn new(tpm: u64) -> Self {
        Self {
            tpm,
            window: None,
            remaining: 0,
        }
    }

    /// Transactions sent per tick to reach the target: `ceil(tpm / 30)`.
    pub fn per_tick(&self) -> u64 {
        self.tpm.div_ceil(TICKS_PER_MINUTE)
    }

    /// Quota left in the current window.
    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Start of the current window, if any tick has begun.
    pub fn window(&self) -> Option<u64> {
        self.window
    }

    /// Begin a tick at the given unix time and return how many transactions
    /// it may send.
    ///
    /// Entering a new window resets the remaining quota to `tpm`.
    pub fn begin_tick(&mut self, unix_now: u64) -> u64 {
        let window = window_start(unix_now);
        if self.window != Some(window) {
            self.window = Some(window);
            self.remaining = self.tpm;
        }
        self.per_tick().min(self.remaining)
    }

    /// Consume quota for transactions dispatched this tick, whether or not
    /// they end up confirmed.
    pub fn commit(&mut self, dispatched: u64) {
        debug_assert!(dispatched <= self.remaining);
        self.remaining = self.remaining.saturating_sub(dispatched);
    }
}

/// The start of the minute window containing `unix`.
pub fn window_start(unix: u64) -> u64 {
    unix - unix % WINDOW_SECS
}

/// Split `total` transactions starting at sequence number `start` into
/// contiguous batches of at most [`MAX_GROUP_SIZE`].
pub fn split_batches(start: u64, total: u64) -> impl Iterator<Item = Range<u64>> {
    (0..total)
        .step_by(MAX_GROUP_SIZE as usize)
        .map(move |offset| start + offset..start + total.min(offset + MAX_GROUP_SIZE))
}
