#![allow(dead_code)]

use effort_gateway::{memory::MemoryGateway, AlgodEndpoint};
use effort_miner::{
    clock::AnchoredClock,
    config::{DepositCredential, Settings},
    submit::DEFAULT_METHOD,
    Rate, Scheduler,
};
use effort_sign::Keypair;
use effort_state::{account::EFFORT_KEY, BalanceGuard, ContractSnapshot};
use effort_types::{
    AccountInfo, Address, AppId, AppLocalState, ApplicationInfo, AssetHolding, AssetId, Network,
    StateValue, SuggestedParams, TealKeyValue, Transaction,
};
use std::sync::Arc;

// A minute boundary.
pub const START: u64 = 1_699_999_980;
pub const APP_ID: AppId = 12;
pub const ASSET: AssetId = 77;
pub const FEE: u64 = 2_000;
pub const LAST_MINER: Address = Address([3; 32]);

pub fn miner() -> Keypair {
    Keypair::from_seed([1; 32])
}

pub fn deposit() -> Keypair {
    Keypair::from_seed([2; 32])
}

pub fn params() -> SuggestedParams {
    SuggestedParams {
        fee: 0,
        min_fee: 1_000,
        flat_fee: false,
        first_valid: 100,
        last_valid: 1_100,
        genesis_id: "testnet-v1.0".to_string(),
        genesis_hash: [9; 32],
    }
}

pub fn snapshot() -> ContractSnapshot {
    ContractSnapshot {
        id: APP_ID,
        asset: ASSET,
        block: 42,
        total_effort: 1_000,
        total_transactions: 250,
        halving: 0,
        halving_supply: 500_000,
        mined_supply: 120_000,
        miner_reward: 5_000,
        last_miner: LAST_MINER,
        last_miner_effort: 40,
        current_miner: Address([4; 32]),
        current_miner_effort: 8,
        start_timestamp: START,
    }
}

pub fn miner_account(amount: u64) -> AccountInfo {
    AccountInfo {
        address: miner().address(),
        amount,
        ..Default::default()
    }
}

pub fn deposit_account(amount: u64, opted_in: bool) -> AccountInfo {
    let mut info = AccountInfo {
        address: deposit().address(),
        amount,
        ..Default::default()
    };
    if opted_in {
        info.min_balance = 328_500;
        info.assets = vec![AssetHolding {
            asset_id: ASSET,
            amount: 0,
        }];
        info.apps_local_state = vec![AppLocalState {
            id: APP_ID,
            key_value: vec![TealKeyValue::new(EFFORT_KEY, StateValue::Uint(5))],
        }];
    }
    info
}

// A chain with the mining application, a funded miner and an opted-in deposit account.
pub fn chain(miner_amount: u64) -> MemoryGateway {
    let gateway = MemoryGateway::new(params());
    gateway.set_application(ApplicationInfo {
        id: APP_ID,
        global_state: snapshot().to_global_state(),
    });
    gateway.set_account(miner_account(miner_amount));
    gateway.set_account(deposit_account(1_000_000, true));
    gateway
}

pub fn settings(deposit: DepositCredential) -> Settings {
    Settings {
        network: Network::Testnet,
        endpoint: AlgodEndpoint {
            server: "http://localhost".to_string(),
            ..Default::default()
        },
        app_id: APP_ID,
        miner: miner(),
        deposit,
        guard: BalanceGuard::default(),
        method: DEFAULT_METHOD.to_string(),
        max_in_flight_batches: None,
        snapshot_refresh_ticks: 1,
    }
}

pub fn read_only() -> DepositCredential {
    DepositCredential::ReadOnly(deposit().address())
}

pub fn scheduler(
    gateway: &MemoryGateway,
    settings: Settings,
    tpm: u64,
) -> Scheduler<MemoryGateway, AnchoredClock> {
    Scheduler::new(
        gateway.clone(),
        AnchoredClock::new(START),
        Arc::new(settings),
        Rate { tpm, fee: FEE },
    )
}

// Sequence numbers carried in the notes of the given transactions, sorted.
pub fn sequences(txs: &[Transaction]) -> Vec<u64> {
    let mut seqs: Vec<u64> = txs
        .iter()
        .map(|tx| effort_types::note::decode_sequence(&tx.header.note).unwrap())
        .collect();
    seqs.sort_unstable();
    seqs
}
