//! Decoding of the mining contract's global state.

use crate::{FetchError, FetchResult};
use effort_gateway::ChainGateway;
use effort_types::{
    state::{encode_key, lookup},
    Address, AppId, AssetId, Round, StateValue, TealKeyValue,
};
use thiserror::Error;

/// The mining contract's global state at one point in time.
///
/// Always fetched fresh and replaced wholesale.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContractSnapshot {
    /// The application id of the contract.
    pub id: AppId,
    /// The reward asset.
    pub asset: AssetId,
    /// The current mining block (epoch).
    pub block: Round,
    /// Effort accumulated across all miners.
    pub total_effort: u64,
    /// Mining transactions processed by the contract.
    pub total_transactions: u64,
    /// Number of halvings so far.
    pub halving: u64,
    /// Supply mined before the next halving.
    pub halving_supply: u64,
    /// Supply mined so far.
    pub mined_supply: u64,
    /// Reward paid per block.
    pub miner_reward: u64,
    /// The miner that won the previous block.
    pub last_miner: Address,
    /// The effort of the previous block's winner.
    pub last_miner_effort: u64,
    /// The miner currently leading the block.
    pub current_miner: Address,
    /// The effort of the current leader.
    pub current_miner_effort: u64,
    /// Unix time (seconds) at which mining opens.
    pub start_timestamp: u64,
}

/// Failed to decode a [`ContractSnapshot`].
///
/// Every variant indicates a misconfigured contract id or an incompatible
/// contract and is not worth retrying.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SnapshotError {
    /// A required key is absent.
    #[error("contract state has no `{0}` key")]
    MissingKey(&'static str),
    /// The key holds the other value variant.
    #[error("contract state key `{0}` has an unexpected type")]
    UnexpectedType(&'static str),
    /// An address key does not hold a 32-byte public key.
    #[error("contract state key `{key}` holds {len} bytes, expected a 32 byte address")]
    InvalidAddress {
        /// The key.
        key: &'static str,
        /// The number of bytes found.
        len: usize,
    },
}

fn value<'a>(state: &'a [TealKeyValue], key: &'static str) -> Result<&'a StateValue, SnapshotError> {
    lookup(state, key).ok_or(SnapshotError::MissingKey(key))
}

fn uint(state: &[TealKeyValue], key: &'static str) -> Result<u64, SnapshotError> {
    value(state, key)?
        .as_uint()
        .ok_or(SnapshotError::UnexpectedType(key))
}

fn address(state: &[TealKeyValue], key: &'static str) -> Result<Address, SnapshotError> {
    let bytes = value(state, key)?
        .as_bytes()
        .ok_or(SnapshotError::UnexpectedType(key))?;
    Address::from_slice(bytes).map_err(|_| SnapshotError::InvalidAddress {
        key,
        len: bytes.len(),
    })
}

/// Decode the contract's global state.
pub fn decode(app_id: AppId, state: &[TealKeyValue]) -> Result<ContractSnapshot, SnapshotError> {
    Ok(ContractSnapshot {
        id: app_id,
        asset: uint(state, "token")?,
        block: uint(state, "block")?,
        total_effort: uint(state, "total_effort")?,
        total_transactions: uint(state, "total_transactions")?,
        halving: uint(state, "halving")?,
        halving_supply: uint(state, "halving_supply")?,
        mined_supply: uint(state, "mined_supply")?,
        miner_reward: uint(state, "miner_reward")?,
        last_miner: address(state, "last_miner")?,
        last_miner_effort: uint(state, "last_miner_effort")?,
        current_miner: address(state, "current_miner")?,
        current_miner_effort: uint(state, "current_miner_effort")?,
        start_timestamp: uint(state, "start_timestamp")?,
    })
}

/// Fetch the contract's global state through the gateway and decode it.
#[tracing::instrument(skip(gateway), err)]
pub async fn fetch<G: ChainGateway>(
    gateway: &G,
    app_id: AppId,
) -> FetchResult<ContractSnapshot, G, SnapshotError> {
    let app = gateway
        .application_info(app_id)
        .await
        .map_err(FetchError::Gateway)?;
    tracing::trace!(keys = app.global_state.len(), "fetched global state");
    decode(app_id, &app.global_state).map_err(FetchError::Decode)
}

impl ContractSnapshot {
    /// Encode back into global state entries, as the contract would report them.
    ///
    /// Useful for seeding test chains.
    pub fn to_global_state(&self) -> Vec<TealKeyValue> {
        let uints = [
            ("token", self.asset),
            ("block", self.block),
            ("total_effort", self.total_effort),
            ("total_transactions", self.total_transactions),
            ("halving", self.halving),
            ("halving_supply", self.halving_supply),
            ("mined_supply", self.mined_supply),
            ("miner_reward", self.miner_reward),
            ("last_miner_effort", self.last_miner_effort),
            ("current_miner_effort", self.current_miner_effort),
            ("start_timestamp", self.start_timestamp),
        ];
        let addresses = [
            ("last_miner", self.last_miner),
            ("current_miner", self.current_miner),
        ];
        uints
            .into_iter()
            .map(|(k, n)| TealKeyValue {
                key: encode_key(k),
                value: StateValue::Uint(n),
            })
            .chain(addresses.into_iter().map(|(k, a)| TealKeyValue {
                key: encode_key(k),
                value: StateValue::Bytes(a.0.to_vec()),
            }))
            .collect()
    }
}
