//! Solvency checks gating the mining loop.

use effort_types::MicroAlgos;
use std::fmt;
use thiserror::Error;

/// Spendable balance required to keep mining, unless configured otherwise.
pub const DEFAULT_THRESHOLD: MicroAlgos = 1_000_000;

/// Halts mining once the spendable balance drops below a threshold.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BalanceGuard {
    /// The minimum spendable balance.
    pub threshold: MicroAlgos,
}

/// The spendable balance is below the guard's threshold.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("insufficient funds: {spendable} spendable, {threshold} required")]
pub struct InsufficientFunds {
    /// The spendable balance.
    pub spendable: MicroAlgos,
    /// The threshold it fell below.
    pub threshold: MicroAlgos,
}

/// How long a balance lasts at a given rate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunEstimate {
    /// Whole hours.
    pub hours: u64,
    /// Remaining whole minutes.
    pub minutes: u64,
}

impl Default for BalanceGuard {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

impl BalanceGuard {
    /// A guard with the given threshold.
    pub const fn new(threshold: MicroAlgos) -> Self {
        Self { threshold }
    }

    /// Whether mining may continue with the given spendable balance.
    pub fn may_proceed(&self, spendable: MicroAlgos) -> bool {
        spendable >= self.threshold
    }

    /// Like [`BalanceGuard::may_proceed`], but describes the failure.
    pub fn check(&self, spendable: MicroAlgos) -> Result<(), InsufficientFunds> {
        if self.may_proceed(spendable) {
            Ok(())
        } else {
            Err(InsufficientFunds {
                spendable,
                threshold: self.threshold,
            })
        }
    }
    /// The startup check: the spendable balance must exceed the threshold,
    /// not merely reach it.
    pub fn check_exceeds(&self, spendable: MicroAlgos) -> Result<(), InsufficientFunds> {
        if spendable > self.threshold {
            Ok(())
        } else {
            Err(InsufficientFunds {
                spendable,
                threshold: self.threshold,
            })
        }
    }
}

/// Estimate how long `spendable` lasts when sending `tpm` transactions per
/// minute at `fee` each.
///
/// Returns `None` if nothing is spent.
pub fn estimate_runtime(tpm: u64, fee: MicroAlgos, spendable: MicroAlgos) -> Option<RunEstimate> {
    let per_minute = u128::from(tpm) * u128::from(fee);
    if per_minute == 0 {
        return None;
    }
    let seconds = u128::from(spendable) * 60 / per_minute;
    let seconds = u64::try_from(seconds).unwrap_or(u64::MAX);
    Some(RunEstimate {
        hours: seconds / 3600,
        minutes: seconds % 3600 / 60,
    })
}

impl fmt::Display for RunEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} hours and {} minutes", self.hours, self.minutes)
    }
}
