//! Errors that stop the miner.

use effort_state::{AccountError, FetchError, InsufficientFunds, SnapshotError};
use effort_types::{Address, AppId, AssetId, MicroAlgos};
use std::fmt;
use thiserror::Error;

/// Shorthand for a `Result` where the error type is a `MinerError`.
pub type MinerResult<T, E> = Result<T, MinerError<E>>;

/// A fatal condition. The miner exits rather than retrying.
///
/// `E` is the error type of the chain gateway in use.
#[derive(Debug, Error)]
pub enum MinerError<E> {
    /// A required node request failed.
    #[error("node request failed: {0}")]
    Gateway(E),
    /// The contract state could not be decoded.
    #[error("invalid contract state: {0}")]
    Snapshot(#[from] SnapshotError),
    /// The mining accounts are not usable.
    #[error(transparent)]
    Account(#[from] AccountError),
    /// The deposit account must opt in but no signing key is available.
    #[error("deposit account {address} is not opted into {target} and no deposit secret key is configured")]
    MissingOptIn {
        /// The deposit account.
        address: Address,
        /// What it must opt into.
        target: OptInTarget,
    },
    /// The deposit account cannot afford an opt-in.
    #[error("deposit account {address} needs {needed} spendable to opt in, has {spendable}")]
    OptInFunds {
        /// The deposit account.
        address: Address,
        /// The spendable balance required.
        needed: MicroAlgos,
        /// The spendable balance available.
        spendable: MicroAlgos,
    },
    /// The miner ran out of funds.
    #[error(transparent)]
    InsufficientFunds(#[from] InsufficientFunds),
}

/// Something the deposit account opts into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OptInTarget {
    /// The mining application.
    App(AppId),
    /// The reward asset.
    Asset(AssetId),
}

impl fmt::Display for OptInTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptInTarget::App(id) => write!(f, "application {id}"),
            OptInTarget::Asset(id) => write!(f, "asset {id}"),
        }
    }
}

impl<E> From<FetchError<E, SnapshotError>> for MinerError<E> {
    fn from(err: FetchError<E, SnapshotError>) -> Self {
        match err {
            FetchError::Gateway(e) => MinerError::Gateway(e),
            FetchError::Decode(e) => MinerError::Snapshot(e),
        }
    }
}

impl<E> From<FetchError<E, AccountError>> for MinerError<E> {
    fn from(err: FetchError<E, AccountError>) -> Self {
        match err {
            FetchError::Gateway(e) => MinerError::Gateway(e),
            FetchError::Decode(e) => MinerError::Account(e),
        }
    }
}
