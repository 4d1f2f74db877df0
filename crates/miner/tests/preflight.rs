use effort_gateway::memory::MemoryError;
use effort_miner::{
    config::DepositCredential,
    error::OptInTarget,
    preflight::{self, OptIns},
    MinerError, Rate,
};
use effort_state::{InsufficientFunds, RunEstimate};
use effort_types::{
    transaction::{AssetTransfer, OnCompletion},
    TransactionKind,
};
use util::*;

mod util;

fn with_key() -> DepositCredential {
    DepositCredential::WithSigningKey(deposit())
}

#[tokio::test]
async fn node_check() {
    let gateway = chain(10_000_000);
    let status = preflight::check_node(&gateway).await.unwrap();
    assert_eq!(status.last_round, params().first_valid);

    gateway.set_offline(true);
    let err = preflight::check_node(&gateway).await.unwrap_err();
    assert!(matches!(err, MinerError::Gateway(MemoryError::Offline)));
}

#[tokio::test]
async fn opted_in_deposit_is_left_alone() {
    let gateway = chain(10_000_000);
    let opted = preflight::ensure_deposit_opted_in(&gateway, &settings(with_key()), &snapshot())
        .await
        .unwrap();
    assert_eq!(opted, OptIns::default());
    assert!(gateway.submitted().is_empty());
}

#[tokio::test]
async fn deposit_with_key_opts_in() {
    let _ = tracing_subscriber::fmt::try_init();
    let gateway = chain(10_000_000);
    gateway.set_account(deposit_account(1_000_000, false));

    let opted = preflight::ensure_deposit_opted_in(&gateway, &settings(with_key()), &snapshot())
        .await
        .unwrap();
    assert_eq!(
        opted,
        OptIns {
            app: true,
            asset: true
        }
    );

    let txs = gateway.submitted_txs();
    assert_eq!(gateway.submitted().len(), 2);
    assert!(txs.iter().all(|tx| *tx.sender() == deposit().address()));
    assert!(txs.iter().all(|tx| tx.header.fee == params().min_fee));
    match &txs[0].kind {
        TransactionKind::AppCall(call) => {
            assert_eq!(call.app_id, APP_ID);
            assert_eq!(call.on_complete, OnCompletion::OptIn);
        }
        kind => panic!("expected an application opt-in, got {kind:?}"),
    }
    assert_eq!(
        txs[1].kind,
        TransactionKind::AssetTransfer(AssetTransfer {
            asset_id: ASSET,
            amount: 0,
            receiver: deposit().address(),
        })
    );
}

#[tokio::test]
async fn read_only_deposit_must_already_be_opted_in() {
    let gateway = chain(10_000_000);
    gateway.set_account(deposit_account(1_000_000, false));

    let err = preflight::ensure_deposit_opted_in(&gateway, &settings(read_only()), &snapshot())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        MinerError::MissingOptIn {
            target: OptInTarget::App(APP_ID),
            ..
        }
    ));
    assert!(gateway.submitted().is_empty());
}

#[tokio::test]
async fn empty_deposit_cannot_afford_opt_in() {
    let gateway = chain(10_000_000);
    gateway.set_account(deposit_account(0, false));

    let err = preflight::ensure_deposit_opted_in(&gateway, &settings(with_key()), &snapshot())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        MinerError::OptInFunds {
            needed: 229_500,
            spendable: 0,
            ..
        }
    ));
}

#[tokio::test]
async fn funded_miner_gets_estimate() {
    let gateway = chain(10_000_000);
    let rate = Rate { tpm: 1, fee: FEE };
    let check = preflight::check_miner(&gateway, &settings(read_only()), rate)
        .await
        .unwrap();
    assert_eq!(check.spendable, 10_000_000);
    assert_eq!(check.cost_per_minute, 2_000);
    assert_eq!(
        check.estimate,
        Some(RunEstimate {
            hours: 83,
            minutes: 20
        })
    );
}

#[tokio::test]
async fn underfunded_miner_is_rejected() {
    let gateway = chain(999_999);
    let rate = Rate { tpm: 1, fee: FEE };
    let err = preflight::check_miner(&gateway, &settings(read_only()), rate)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        MinerError::InsufficientFunds(InsufficientFunds {
            spendable: 999_999,
            threshold: 1_000_000
        })
    ));
}

#[tokio::test]
async fn miner_exactly_at_threshold_is_rejected() {
    let gateway = chain(1_000_000);
    let rate = Rate { tpm: 1, fee: FEE };
    let err = preflight::check_miner(&gateway, &settings(read_only()), rate)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        MinerError::InsufficientFunds(InsufficientFunds {
            spendable: 1_000_000,
            threshold: 1_000_000
        })
    ));

    let gateway = chain(1_000_001);
    assert!(preflight::check_miner(&gateway, &settings(read_only()), rate)
        .await
        .is_ok());
}
