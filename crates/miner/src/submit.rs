//! Building and submitting one batch of mining calls.

use crate::inflight::Reservation;
use effort_gateway::ChainGateway;
use effort_hash::{group_id, method_selector};
use effort_sign::Keypair;
use effort_state::ContractSnapshot;
use effort_types::{
    note::encode_sequence,
    transaction::{AppCall, Header, OnCompletion},
    Address, AppId, AssetId, Confirmation, SignedTransaction, SuggestedParams, Transaction,
};
use std::ops::Range;
use thiserror::Error;

/// Rounds to wait for a batch to be confirmed.
pub const CONFIRMATION_ROUNDS: u64 = 5;

/// The ABI method called to mine, unless configured otherwise.
pub const DEFAULT_METHOD: &str = "mine(address)void";

/// The parts of a mining call shared by every transaction of a tick.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MiningCall {
    /// The mining application.
    pub app_id: AppId,
    /// The reward asset, referenced by every call.
    pub asset: AssetId,
    /// Selector of the ABI method.
    pub selector: [u8; 4],
    /// The account credited with the effort.
    pub deposit: Address,
    /// The previous block's winner, referenced by every call.
    pub last_miner: Address,
    /// Transaction parameters, with the fee already set.
    pub params: SuggestedParams,
}

/// A batch could not be submitted.
#[derive(Debug, Error)]
pub enum SubmitError<E> {
    /// The batch has no transactions.
    #[error("batch is empty")]
    Empty,
    /// The node failed or rejected the group.
    #[error("group submission failed: {0}")]
    Gateway(E),
}

impl MiningCall {
    /// Calls to `method` crediting `deposit`, against the given contract state.
    pub fn new(
        method: &str,
        deposit: Address,
        snapshot: &ContractSnapshot,
        params: SuggestedParams,
    ) -> Self {
        Self {
            app_id: snapshot.id,
            asset: snapshot.asset,
            selector: method_selector(method),
            deposit,
            last_miner: snapshot.last_miner,
            params,
        }
    }

    /// The unsigned call sent by `sender` carrying sequence number `seq`.
    pub fn transaction(&self, sender: Address, seq: u64) -> Transaction {
        let mut header = Header::from_params(sender, &self.params);
        header.note = encode_sequence(seq);
        Transaction::app_call(
            header,
            AppCall {
                app_id: self.app_id,
                on_complete: OnCompletion::NoOp,
                args: vec![self.selector.to_vec(), self.deposit.as_bytes().to_vec()],
                accounts: vec![self.last_miner, self.deposit],
                foreign_assets: vec![self.asset],
            },
        )
    }

    /// One signed call per sequence number, grouped when there is more than one.
    pub fn group(&self, miner: &Keypair, seqs: Range<u64>) -> Vec<SignedTransaction> {
        let sender = miner.address();
        let mut txs: Vec<_> = seqs.map(|seq| self.transaction(sender, seq)).collect();
        if txs.len() > 1 {
            group_id::assign(&mut txs);
        }
        txs.into_iter()
            .map(|tx| effort_sign::sign(tx, miner))
            .collect()
    }
}

/// Submit the calls for `seqs` as one atomic group and wait for confirmation.
pub async fn submit_batch<G: ChainGateway>(
    gateway: &G,
    miner: &Keypair,
    call: &MiningCall,
    seqs: Range<u64>,
) -> Result<Confirmation, SubmitError<G::Error>> {
    if seqs.is_empty() {
        return Err(SubmitError::Empty);
    }
    let group = call.group(miner, seqs);
    gateway
        .submit_group(group, CONFIRMATION_ROUNDS)
        .await
        .map_err(SubmitError::Gateway)
}

/// Submit one batch and release its reservation.
///
/// Failures are logged and the batch is dropped. It is never retried.
#[tracing::instrument(skip_all, fields(first = seqs.start, count = reservation.count()))]
pub async fn run_batch<G: ChainGateway>(
    gateway: &G,
    miner: &Keypair,
    call: &MiningCall,
    seqs: Range<u64>,
    mut reservation: Reservation,
) -> Option<Confirmation> {
    match submit_batch(gateway, miner, call, seqs).await {
        Ok(confirmation) => {
            tracing::debug!(
                tx_id = %confirmation.tx_id,
                round = confirmation.confirmed_round,
                "batch confirmed"
            );
            Some(confirmation)
        }
        Err(err) => {
            reservation.fail();
            tracing::warn!(%err, "dropping batch");
            None
        }
    }
}
