//! # Transaction
//!
//! Transactions the miner builds and signs. Serialization follows the chain's
//! canonical encoding: abbreviated field names in sorted order, with empty
//! fields omitted. Use a named-field msgpack serializer to produce the bytes
//! that are hashed and signed.

use crate::{Address, AppId, AssetId, Hash, MicroAlgos, Round, SuggestedParams};
use serde::{Serialize, Serializer};

/// Fields common to every transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Header {
    /// The sender, who pays the fee and signs.
    pub sender: Address,
    /// The fee paid.
    pub fee: MicroAlgos,
    /// First round the transaction is valid in.
    pub first_valid: Round,
    /// Last round the transaction is valid in.
    pub last_valid: Round,
    /// The genesis id of the network.
    pub genesis_id: String,
    /// The genesis hash of the network.
    pub genesis_hash: Hash,
    /// Arbitrary data attached to the transaction.
    pub note: Vec<u8>,
    /// The id of the atomic group this transaction belongs to, if any.
    pub group: Option<Hash>,
}

/// The type-specific part of a transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransactionKind {
    /// Call an application.
    AppCall(AppCall),
    /// Transfer an asset. A zero transfer to oneself opts into the asset.
    AssetTransfer(AssetTransfer),
}

/// What happens to the sender's local state when an application call completes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OnCompletion {
    /// Plain call.
    #[default]
    NoOp = 0,
    /// Opt the sender into the application.
    OptIn = 1,
}

/// An application call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AppCall {
    /// The application to call.
    pub app_id: AppId,
    /// What to do on completion.
    pub on_complete: OnCompletion,
    /// Raw call arguments. For ABI calls the first is the method selector.
    pub args: Vec<Vec<u8>>,
    /// Additional accounts the call may reference.
    pub accounts: Vec<Address>,
    /// Assets the call may reference.
    pub foreign_assets: Vec<AssetId>,
}

/// An asset transfer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AssetTransfer {
    /// The asset to transfer.
    pub asset_id: AssetId,
    /// The amount to transfer.
    pub amount: u64,
    /// The receiver.
    pub receiver: Address,
}

/// An unsigned transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    /// The common fields.
    pub header: Header,
    /// The type-specific fields.
    pub kind: TransactionKind,
}

/// A transaction together with the sender's Ed25519 signature over it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SignedTransaction {
    /// The 64-byte signature.
    #[serde(with = "crate::serde::bytes")]
    pub sig: [u8; 64],
    /// The signed transaction.
    pub txn: Transaction,
}

impl Header {
    /// A header using the given network parameters.
    pub fn from_params(sender: Address, params: &SuggestedParams) -> Self {
        Self {
            sender,
            fee: params.fee,
            first_valid: params.first_valid,
            last_valid: params.last_valid,
            genesis_id: params.genesis_id.clone(),
            genesis_hash: params.genesis_hash,
            note: Vec::new(),
            group: None,
        }
    }
}

impl Transaction {
    /// Shorthand for an application call transaction.
    pub fn app_call(header: Header, call: AppCall) -> Self {
        Self {
            header,
            kind: TransactionKind::AppCall(call),
        }
    }

    /// Shorthand for an asset transfer transaction.
    pub fn asset_transfer(header: Header, transfer: AssetTransfer) -> Self {
        Self {
            header,
            kind: TransactionKind::AssetTransfer(transfer),
        }
    }

    /// The sender.
    pub fn sender(&self) -> &Address {
        &self.header.sender
    }

    /// The type tag used on the wire.
    pub fn type_tag(&self) -> &'static str {
        match self.kind {
            TransactionKind::AppCall(_) => "appl",
            TransactionKind::AssetTransfer(_) => "axfer",
        }
    }
}

/// The flat, canonically ordered wire form. Field order is alphabetical by
/// wire name and must stay that way.
#[derive(Serialize)]
struct Wire<'a> {
    #[serde(skip_serializing_if = "is_zero")]
    aamt: u64,
    #[serde(skip_serializing_if = "<[_]>::is_empty", with = "crate::serde::bytes::seq")]
    apaa: &'a [Vec<u8>],
    #[serde(skip_serializing_if = "is_zero")]
    apan: u64,
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    apas: &'a [AssetId],
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    apat: &'a [Address],
    #[serde(skip_serializing_if = "is_zero")]
    apid: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    arcv: Option<&'a Address>,
    #[serde(skip_serializing_if = "is_zero")]
    fee: u64,
    #[serde(skip_serializing_if = "is_zero")]
    fv: u64,
    #[serde(skip_serializing_if = "str::is_empty")]
    gen: &'a str,
    #[serde(with = "crate::serde::bytes")]
    gh: &'a Hash,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "opt_bytes")]
    grp: Option<&'a Hash>,
    #[serde(skip_serializing_if = "is_zero")]
    lv: u64,
    #[serde(skip_serializing_if = "<[_]>::is_empty", with = "crate::serde::bytes")]
    note: &'a [u8],
    snd: &'a Address,
    #[serde(rename = "type")]
    ty: &'static str,
    #[serde(skip_serializing_if = "is_zero")]
    xaid: u64,
}

fn is_zero(n: &u64) -> bool {
    *n == 0
}

fn opt_bytes<S>(hash: &Option<&Hash>, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match hash {
        Some(hash) => crate::serde::bytes::serialize(*hash, s),
        None => s.serialize_none(),
    }
}

impl Serialize for Transaction {
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        const EMPTY_ARGS: &[Vec<u8>] = &[];
        let h = &self.header;
        let mut wire = Wire {
            aamt: 0,
            apaa: EMPTY_ARGS,
            apan: 0,
            apas: &[],
            apat: &[],
            apid: 0,
            arcv: None,
            fee: h.fee,
            fv: h.first_valid,
            gen: &h.genesis_id,
            gh: &h.genesis_hash,
            grp: h.group.as_ref(),
            lv: h.last_valid,
            note: &h.note,
            snd: &h.sender,
            ty: self.type_tag(),
            xaid: 0,
        };
        match &self.kind {
            TransactionKind::AppCall(call) => {
                wire.apaa = &call.args;
                wire.apan = call.on_complete as u64;
                wire.apas = &call.foreign_assets;
                wire.apat = &call.accounts;
                wire.apid = call.app_id;
            }
            TransactionKind::AssetTransfer(transfer) => {
                wire.aamt = transfer.amount;
                wire.arcv = Some(&transfer.receiver);
                wire.xaid = transfer.asset_id;
            }
        }
        wire.serialize(s)
    }
}
