//! The miner's view of its own accounts.

use crate::{FetchError, FetchResult};
use effort_gateway::ChainGateway;
use effort_types::{state::lookup, AccountInfo, Address, AppId, MicroAlgos};
use thiserror::Error;

/// Local state key holding an account's accumulated effort.
pub const EFFORT_KEY: &str = "effort";

/// Balance and effort of the mining accounts, recomputed on every check.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MinerAccountStatus {
    /// The miner's balance above its minimum reserve.
    pub spendable: MicroAlgos,
    /// Effort the contract has recorded for the deposit account.
    pub own_effort: u64,
}

/// The accounts are not usable for mining.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccountError {
    /// The deposit account has no local state for the application.
    #[error("deposit account {address} is not opted into application {app_id}")]
    NotOptedIn {
        /// The deposit account.
        address: Address,
        /// The application.
        app_id: AppId,
    },
}

impl MinerAccountStatus {
    /// Combine the miner's account with the deposit account's local state.
    pub fn new(
        miner: &AccountInfo,
        deposit: &AccountInfo,
        app_id: AppId,
    ) -> Result<Self, AccountError> {
        let local = deposit
            .local_state(app_id)
            .ok_or(AccountError::NotOptedIn {
                address: deposit.address,
                app_id,
            })?;
        // The contract only writes the key after the first mining call.
        let own_effort = lookup(local, EFFORT_KEY)
            .and_then(|v| v.as_uint())
            .unwrap_or(0);
        Ok(Self {
            spendable: miner.spendable(),
            own_effort,
        })
    }

    /// Own effort as a percentage of the given effort, or zero if that is zero.
    pub fn effort_share(&self, of: u64) -> f64 {
        if of == 0 {
            return 0.0;
        }
        self.own_effort as f64 / of as f64 * 100.0
    }
}

/// Query both accounts and build their status.
pub async fn fetch<G: ChainGateway>(
    gateway: &G,
    miner: &Address,
    deposit: &Address,
    app_id: AppId,
) -> FetchResult<MinerAccountStatus, G, AccountError> {
    let miner = gateway
        .account_info(miner)
        .await
        .map_err(FetchError::Gateway)?;
    let deposit = gateway
        .account_info(deposit)
        .await
        .map_err(FetchError::Gateway)?;
    MinerAccountStatus::new(&miner, &deposit, app_id).map_err(FetchError::Decode)
}
