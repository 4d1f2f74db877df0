//! Atomic group identifiers.

use crate::{hash, Id, GROUP_TAG};
use effort_types::{transaction::Transaction, Hash};
use serde::Serialize;

/// The hashed form of a transaction group.
#[derive(Serialize)]
struct TxGroup<'a> {
    #[serde(rename = "txlist", serialize_with = "serialize_ids")]
    ids: &'a [Hash],
}

fn serialize_ids<S>(ids: &&[Hash], s: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    effort_types::serde::bytes::seq::serialize(ids, s)
}

/// The group id of the given transaction ids, in order.
pub fn from_tx_ids(ids: &[Hash]) -> Hash {
    hash(GROUP_TAG, &TxGroup { ids })
}

/// Compute the group id of the given transactions and assign it to each of them.
///
/// Any previously assigned group is cleared before the ids are computed.
pub fn assign(txs: &mut [Transaction]) -> Hash {
    let ids: Vec<Hash> = txs
        .iter_mut()
        .map(|tx| {
            tx.header.group = None;
            tx.id()
        })
        .collect();
    let group = from_tx_ids(&ids);
    for tx in txs {
        tx.header.group = Some(group);
    }
    group
}
