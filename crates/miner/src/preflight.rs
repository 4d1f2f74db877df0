//! Checks run once before mining starts.
//!
//! Every failure here is fatal.

use crate::{
    config::{DepositCredential, Settings},
    error::OptInTarget,
    quota::Rate,
    MinerError, MinerResult,
};
use effort_gateway::ChainGateway;
use effort_state::{guard::estimate_runtime, ContractSnapshot, RunEstimate};
use effort_types::{
    transaction::{AppCall, AssetTransfer, Header, OnCompletion},
    AccountInfo, Address, MicroAlgos, NodeStatus, Transaction,
};

/// Spare balance needed to opt into the application: its minimum balance
/// increase plus the transaction fee.
pub const APP_OPT_IN_COST: MicroAlgos = 129_500;

/// Spare balance needed to opt into the asset.
pub const ASSET_OPT_IN_COST: MicroAlgos = 101_000;

/// Minimum balance of an account that has never been funded.
pub const NEW_ACCOUNT_COST: MicroAlgos = 100_000;

/// Rounds to wait for an opt-in to be confirmed.
pub const OPT_IN_ROUNDS: u64 = 4;

/// Opt-ins submitted on behalf of the deposit account.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OptIns {
    /// Whether the deposit account was opted into the application.
    pub app: bool,
    /// Whether the deposit account was opted into the asset.
    pub asset: bool,
}

/// The outcome of the miner balance check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MinerCheck {
    /// The miner's spendable balance.
    pub spendable: MicroAlgos,
    /// Fees spent per minute at the requested rate.
    pub cost_per_minute: MicroAlgos,
    /// How long the balance lasts at that rate.
    pub estimate: Option<RunEstimate>,
}

/// Check the node is reachable.
pub async fn check_node<G: ChainGateway>(gateway: &G) -> MinerResult<NodeStatus, G::Error> {
    let status = gateway.status().await.map_err(MinerError::Gateway)?;
    tracing::info!(round = status.last_round, "connected to node");
    Ok(status)
}

/// Make sure the deposit account is opted into the application and its
/// reward asset, opting it in if its key is available.
pub async fn ensure_deposit_opted_in<G: ChainGateway>(
    gateway: &G,
    settings: &Settings,
    snapshot: &ContractSnapshot,
) -> MinerResult<OptIns, G::Error> {
    let address = settings.deposit.address();
    let mut opted = OptIns::default();

    let info = account(gateway, &address).await?;
    if info.local_state(snapshot.id).is_none() {
        let target = OptInTarget::App(snapshot.id);
        opt_in(gateway, &settings.deposit, target, APP_OPT_IN_COST, info).await?;
        opted.app = true;
    }

    let info = account(gateway, &address).await?;
    if !info.holds_asset(snapshot.asset) {
        let target = OptInTarget::Asset(snapshot.asset);
        opt_in(gateway, &settings.deposit, target, ASSET_OPT_IN_COST, info).await?;
        opted.asset = true;
    }
    Ok(opted)
}

/// Check the miner can afford to mine and estimate for how long.
pub async fn check_miner<G: ChainGateway>(
    gateway: &G,
    settings: &Settings,
    rate: Rate,
) -> MinerResult<MinerCheck, G::Error> {
    let info = account(gateway, &settings.miner.address()).await?;
    let spendable = info.spendable();
    settings.guard.check_exceeds(spendable)?;
    let check = MinerCheck {
        spendable,
        cost_per_minute: rate.cost_per_minute(),
        estimate: estimate_runtime(rate.tpm, rate.fee, spendable),
    };
    tracing::info!(
        tpm = rate.tpm,
        fee = rate.fee,
        cost_per_minute = check.cost_per_minute,
        spendable,
        "miner funded"
    );
    if let Some(estimate) = check.estimate {
        tracing::info!("miner will run for approximately {estimate}");
    }
    Ok(check)
}

async fn account<G: ChainGateway>(
    gateway: &G,
    address: &Address,
) -> MinerResult<AccountInfo, G::Error> {
    gateway
        .account_info(address)
        .await
        .map_err(MinerError::Gateway)
}

/// The spendable balance `info` needs to cover `cost`.
fn required_balance(info: &AccountInfo, cost: MicroAlgos) -> MicroAlgos {
    if info.amount == 0 {
        cost + NEW_ACCOUNT_COST
    } else {
        cost
    }
}

async fn opt_in<G: ChainGateway>(
    gateway: &G,
    deposit: &DepositCredential,
    target: OptInTarget,
    cost: MicroAlgos,
    info: AccountInfo,
) -> MinerResult<(), G::Error> {
    let address = info.address;
    let Some(keypair) = deposit.keypair() else {
        return Err(MinerError::MissingOptIn { address, target });
    };
    let needed = required_balance(&info, cost);
    let spendable = info.spendable();
    if spendable < needed {
        return Err(MinerError::OptInFunds {
            address,
            needed,
            spendable,
        });
    }

    tracing::info!(%address, %target, "opting deposit account in");
    let params = gateway
        .suggested_params()
        .await
        .map_err(MinerError::Gateway)?;
    let fee = params.fee.max(params.min_fee);
    let header = Header::from_params(keypair.address(), &params.with_flat_fee(fee));
    let txn = match target {
        OptInTarget::App(app_id) => Transaction::app_call(
            header,
            AppCall {
                app_id,
                on_complete: OnCompletion::OptIn,
                ..Default::default()
            },
        ),
        OptInTarget::Asset(asset_id) => Transaction::asset_transfer(
            header,
            AssetTransfer {
                asset_id,
                amount: 0,
                receiver: keypair.address(),
            },
        ),
    };
    let confirmation = gateway
        .submit_group(vec![effort_sign::sign(txn, keypair)], OPT_IN_ROUNDS)
        .await
        .map_err(MinerError::Gateway)?;
    tracing::info!(round = confirmation.confirmed_round, %target, "opt-in confirmed");
    Ok(())
}
