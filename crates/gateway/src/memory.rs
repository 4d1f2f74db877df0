//! An in-process [`ChainGateway`] backed by maps.
//!
//! Accounts and applications are set up front; submitted groups are verified
//! (signatures and group id), charged their fees, and recorded so tests can
//! inspect exactly what was sent.

use crate::{BoxFuture, ChainGateway};
use effort_types::{
    AccountInfo, Address, AppId, ApplicationInfo, Confirmation, NodeStatus, Round,
    SignedTransaction, SuggestedParams, Transaction,
};
use std::{
    collections::{HashMap, VecDeque},
    future,
    sync::{Arc, Mutex},
    time::Duration,
};
use thiserror::Error;

/// An in-memory chain.
#[derive(Clone, Default)]
pub struct MemoryGateway {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    round: Round,
    accounts: HashMap<Address, AccountInfo>,
    apps: HashMap<AppId, ApplicationInfo>,
    params: SuggestedParams,
    submitted: Vec<Vec<SignedTransaction>>,
    reject_next: usize,
    delays: VecDeque<Duration>,
    offline: bool,
    accounts_unavailable: bool,
}

/// Errors produced by the [`MemoryGateway`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MemoryError {
    /// The account has never been set.
    #[error("unknown account {0}")]
    UnknownAccount(Address),
    /// The application has never been set.
    #[error("unknown application {0}")]
    UnknownApp(AppId),
    /// The gateway was switched offline.
    #[error("node unreachable")]
    Offline,
    /// The group was rejected.
    #[error("group rejected: {0}")]
    Rejected(String),
}

impl MemoryGateway {
    /// A chain with the given transaction parameters and no accounts.
    pub fn new(params: SuggestedParams) -> Self {
        let gateway = Self::default();
        gateway.apply(|inner| {
            inner.round = params.first_valid;
            inner.params = params;
        });
        gateway
    }

    fn apply<U>(&self, f: impl FnOnce(&mut Inner) -> U) -> U {
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut guard)
    }

    /// Insert or replace an account.
    pub fn set_account(&self, info: AccountInfo) {
        self.apply(|inner| inner.accounts.insert(info.address, info));
    }

    /// Modify an existing account in place.
    pub fn update_account(&self, address: &Address, f: impl FnOnce(&mut AccountInfo)) {
        self.apply(|inner| {
            if let Some(info) = inner.accounts.get_mut(address) {
                f(info);
            }
        });
    }

    /// Insert or replace an application.
    pub fn set_application(&self, info: ApplicationInfo) {
        self.apply(|inner| inner.apps.insert(info.id, info));
    }

    /// Reject the next `n` submitted groups.
    pub fn reject_next(&self, n: usize) {
        self.apply(|inner| inner.reject_next = n);
    }

    /// Delay completion of the next submitted group.
    pub fn delay_next(&self, delay: Duration) {
        self.apply(|inner| inner.delays.push_back(delay));
    }

    /// Make every request fail.
    pub fn set_offline(&self, offline: bool) {
        self.apply(|inner| inner.offline = offline);
    }

    /// Make account queries fail while every other request still succeeds.
    pub fn set_accounts_unavailable(&self, unavailable: bool) {
        self.apply(|inner| inner.accounts_unavailable = unavailable);
    }

    /// All groups committed so far, in commit order.
    pub fn submitted(&self) -> Vec<Vec<SignedTransaction>> {
        self.apply(|inner| inner.submitted.clone())
    }

    /// Every committed transaction, flattened in commit order.
    pub fn submitted_txs(&self) -> Vec<Transaction> {
        self.apply(|inner| {
            inner
                .submitted
                .iter()
                .flatten()
                .map(|signed| signed.txn.clone())
                .collect()
        })
    }

    fn query<T: Send + 'static>(
        &self,
        f: impl FnOnce(&Inner) -> Result<T, MemoryError>,
    ) -> BoxFuture<T, MemoryError> {
        let result = self.apply(|inner| {
            if inner.offline {
                return Err(MemoryError::Offline);
            }
            f(inner)
        });
        Box::pin(future::ready(result))
    }

    fn commit(&self, group: Vec<SignedTransaction>) -> Result<Confirmation, MemoryError> {
        validate(&group)?;
        self.apply(|inner| {
            if inner.offline {
                return Err(MemoryError::Offline);
            }
            if inner.reject_next > 0 {
                inner.reject_next -= 1;
                return Err(MemoryError::Rejected("rejected by test".to_string()));
            }
            for signed in &group {
                let sender = signed.txn.sender();
                let account = inner
                    .accounts
                    .get_mut(sender)
                    .ok_or(MemoryError::UnknownAccount(*sender))?;
                account.amount = account
                    .amount
                    .checked_sub(signed.txn.header.fee)
                    .ok_or_else(|| MemoryError::Rejected("overspend".to_string()))?;
            }
            inner.round += 1;
            let confirmation = Confirmation {
                tx_id: effort_hash::tx_id_string(&group[0].txn),
                confirmed_round: inner.round,
            };
            inner.submitted.push(group);
            Ok(confirmation)
        })
    }
}

/// Check signatures and that every transaction carries the group's id.
fn validate(group: &[SignedTransaction]) -> Result<(), MemoryError> {
    if group.is_empty() {
        return Err(MemoryError::Rejected("empty group".to_string()));
    }
    for signed in group {
        effort_sign::verify(signed).map_err(|e| MemoryError::Rejected(e.to_string()))?;
    }
    let mut txs: Vec<Transaction> = group.iter().map(|s| s.txn.clone()).collect();
    let claimed = txs[0].header.group;
    if group.len() > 1 || claimed.is_some() {
        let expected = effort_hash::group_id::assign(&mut txs);
        if group.iter().any(|s| s.txn.header.group != Some(expected)) {
            return Err(MemoryError::Rejected("incomplete group".to_string()));
        }
    }
    Ok(())
}

impl ChainGateway for MemoryGateway {
    type Error = MemoryError;
    type Future<T: Send + 'static> = BoxFuture<T, MemoryError>;

    fn status(&self) -> Self::Future<NodeStatus> {
        self.query(|inner| {
            Ok(NodeStatus {
                last_round: inner.round,
            })
        })
    }

    fn account_info(&self, address: &Address) -> Self::Future<AccountInfo> {
        let address = *address;
        self.query(move |inner| {
            if inner.accounts_unavailable {
                return Err(MemoryError::Offline);
            }
            inner
                .accounts
                .get(&address)
                .cloned()
                .ok_or(MemoryError::UnknownAccount(address))
        })
    }

    fn application_info(&self, app_id: AppId) -> Self::Future<ApplicationInfo> {
        self.query(move |inner| {
            inner
                .apps
                .get(&app_id)
                .cloned()
                .ok_or(MemoryError::UnknownApp(app_id))
        })
    }

    fn suggested_params(&self) -> Self::Future<SuggestedParams> {
        self.query(|inner| {
            let mut params = inner.params.clone();
            params.first_valid = inner.round;
            params.last_valid = inner.round + crate::algod::VALIDITY_WINDOW;
            Ok(params)
        })
    }

    fn submit_group(
        &self,
        group: Vec<SignedTransaction>,
        _wait_rounds: u64,
    ) -> Self::Future<Confirmation> {
        let this = self.clone();
        let delay = self.apply(|inner| inner.delays.pop_front());
        Box::pin(async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            this.commit(group)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use effort_sign::Keypair;
    use effort_types::transaction::{AppCall, Header};

    fn setup() -> (MemoryGateway, Keypair) {
        let keypair = Keypair::from_seed([5; 32]);
        let gateway = MemoryGateway::new(SuggestedParams {
            first_valid: 10,
            ..Default::default()
        });
        gateway.set_account(AccountInfo {
            address: keypair.address(),
            amount: 10_000,
            ..Default::default()
        });
        (gateway, keypair)
    }

    fn call(keypair: &Keypair, note: u8) -> Transaction {
        let header = Header {
            sender: keypair.address(),
            fee: 1_000,
            note: vec![note],
            ..Default::default()
        };
        Transaction::app_call(header, AppCall::default())
    }

    fn signed_group(keypair: &Keypair, n: u8) -> Vec<SignedTransaction> {
        let mut txs: Vec<_> = (0..n).map(|i| call(keypair, i)).collect();
        effort_hash::group_id::assign(&mut txs);
        txs.into_iter()
            .map(|tx| effort_sign::sign(tx, keypair))
            .collect()
    }

    #[tokio::test]
    async fn commits_valid_group() {
        let (gateway, keypair) = setup();
        let confirmation = gateway
            .submit_group(signed_group(&keypair, 3), 5)
            .await
            .unwrap();
        assert_eq!(confirmation.confirmed_round, 11);
        assert_eq!(gateway.submitted_txs().len(), 3);

        let account = gateway.account_info(&keypair.address()).await.unwrap();
        assert_eq!(account.amount, 7_000);
        assert_eq!(gateway.status().await.unwrap().last_round, 11);
    }

    #[tokio::test]
    async fn rejects_bad_signature() {
        let (gateway, keypair) = setup();
        let mut group = signed_group(&keypair, 2);
        group[1].sig[0] ^= 1;
        let err = gateway.submit_group(group, 5).await.unwrap_err();
        assert!(matches!(err, MemoryError::Rejected(_)));
        assert!(gateway.submitted().is_empty());
    }

    #[tokio::test]
    async fn rejects_incomplete_group() {
        let (gateway, keypair) = setup();
        let mut group = signed_group(&keypair, 3);
        group.pop();
        let err = gateway.submit_group(group, 5).await.unwrap_err();
        assert_eq!(err, MemoryError::Rejected("incomplete group".to_string()));
    }

    #[tokio::test]
    async fn rejects_overspend_and_injected_failures() {
        let (gateway, keypair) = setup();
        gateway.reject_next(1);
        let single = vec![effort_sign::sign(call(&keypair, 0), &keypair)];
        assert!(gateway.submit_group(single.clone(), 5).await.is_err());
        gateway.submit_group(single, 5).await.unwrap();

        gateway.update_account(&keypair.address(), |info| info.amount = 500);
        let single = vec![effort_sign::sign(call(&keypair, 1), &keypair)];
        let err = gateway.submit_group(single, 5).await.unwrap_err();
        assert_eq!(err, MemoryError::Rejected("overspend".to_string()));
    }
}
