//! # In-flight
//! Counts of dispatched transactions, shared between the scheduler and the
//! submission tasks.
//!
//! The counts sit behind one mutex that is only reachable through
//! [`InFlight::apply`], so it can never be held across an await.

use std::sync::{Arc, Mutex, PoisonError};

/// Shared transaction counts. Cloning shares the same counts.
#[derive(Clone, Debug, Default)]
pub struct InFlight {
    counts: Arc<Mutex<Counts>>,
}

/// A point-in-time copy of the counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Counts {
    /// Dispatched and not yet completed.
    pub pending: u64,
    /// Completed and confirmed.
    pub confirmed: u64,
    /// Completed and dropped after a failure.
    pub failed: u64,
}

/// Transactions of one dispatched batch counted as pending.
///
/// Dropping the reservation releases it, exactly once, whatever the batch's
/// outcome.
#[derive(Debug)]
#[must_use = "dropping a reservation releases it immediately"]
pub struct Reservation {
    in_flight: InFlight,
    count: u64,
    failed: bool,
}

impl InFlight {
    /// Apply a function to the counts.
    fn apply<U>(&self, f: impl FnOnce(&mut Counts) -> U) -> U {
        f(&mut self.counts.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Count `count` transactions as pending until the reservation is dropped.
    pub fn reserve(&self, count: u64) -> Reservation {
        self.apply(|c| c.pending += count);
        Reservation {
            in_flight: self.clone(),
            count,
            failed: false,
        }
    }

    /// Transactions dispatched and not yet completed.
    pub fn pending(&self) -> u64 {
        self.apply(|c| c.pending)
    }

    /// A copy of all counts.
    pub fn counts(&self) -> Counts {
        self.apply(|c| *c)
    }
}

impl Reservation {
    /// The number of transactions reserved.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Record the batch as failed when released.
    pub fn fail(&mut self) {
        self.failed = true;
    }
}

impl Drop for Reservation {
    fn drop(&mut self) {
        let (count, failed) = (self.count, self.failed);
        self.in_flight.apply(|c| {
            debug_assert!(c.pending >= count);
            c.pending = c.pending.saturating_sub(count);
            if failed {
                c.failed += count;
            } else {
                c.confirmed += count;
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_on_drop() {
        let in_flight = InFlight::default();
        let a = in_flight.reserve(16);
        let mut b = in_flight.reserve(4);
        assert_eq!(in_flight.pending(), 20);
        assert_eq!(b.count(), 4);

        b.fail();
        drop(b);
        assert_eq!(
            in_flight.counts(),
            Counts {
                pending: 16,
                confirmed: 0,
                failed: 4
            }
        );

        drop(a);
        assert_eq!(
            in_flight.counts(),
            Counts {
                pending: 0,
                confirmed: 16,
                failed: 4
            }
        );
    }

    #[test]
    fn clones_share_counts() {
        let in_flight = InFlight::default();
        let reservation = in_flight.clone().reserve(3);
        assert_eq!(in_flight.pending(), 3);
        drop(reservation);
        assert_eq!(in_flight.pending(), 0);
    }
}
