//! Typed views over the mining contract's key-value state and the miner's
//! accounts.
//!
//! ## Snapshots
//!
//! - [`snapshot::decode`] decodes the contract's global state into a
//!   [`ContractSnapshot`].
//! - [`snapshot::fetch`] queries a [`ChainGateway`] and decodes the result.
//!
//! ## Accounts
//!
//! - [`account::MinerAccountStatus`] combines the miner's spendable balance with
//!   the effort recorded for the deposit account.
//!
//! ## Solvency
//!
//! - [`guard::BalanceGuard`] decides whether mining may continue.

#![deny(missing_docs)]
#![deny(unsafe_code)]

use effort_gateway::ChainGateway;
use thiserror::Error;

pub use account::{AccountError, MinerAccountStatus};
pub use guard::{BalanceGuard, InsufficientFunds, RunEstimate};
pub use snapshot::{ContractSnapshot, SnapshotError};

pub mod account;
pub mod guard;
pub mod snapshot;

/// Failed to query the chain or to interpret its response.
#[derive(Debug, Error)]
pub enum FetchError<E, D> {
    /// The gateway request failed.
    #[error("gateway request failed: {0}")]
    Gateway(E),
    /// The response could not be interpreted.
    #[error("{0}")]
    Decode(D),
}

/// Shorthand for the result of fetching through the gateway `G`.
pub type FetchResult<T, G, D> = Result<T, FetchError<<G as ChainGateway>::Error, D>>;
