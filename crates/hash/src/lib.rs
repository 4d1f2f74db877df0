//! A minimal crate containing the effort miner's [`hash`] function and the
//! associated canonical pre-hash serialization [`serialize`] based on msgpack.
//!
//! Every signed or hashed object is prefixed with a short domain separation tag
//! (`"TX"` for transactions, `"TG"` for transaction groups) before hashing.

#![deny(missing_docs)]
#![deny(unsafe_code)]

use data_encoding::BASE32_NOPAD;
use effort_types::{transaction::Transaction, Hash};
use serde::Serialize;
use sha2::{Digest, Sha512_256};

pub mod group_id;

/// Domain separation tag for transactions.
pub const TX_TAG: &[u8] = b"TX";

/// Domain separation tag for transaction groups.
pub const GROUP_TAG: &[u8] = b"TG";

/// Types with a canonical identifier.
pub trait Id {
    /// Produce the identifier for self.
    fn id(&self) -> Hash;
}

/// Serialize data for hashing using named-field msgpack.
///
/// The chain only accepts this canonical form: map keys in the order the
/// types declare them and integers in their smallest encoding.
pub fn serialize<T: Serialize>(t: &T) -> Vec<u8> {
    rmp_serde::to_vec_named(t).expect("`rmp_serde`'s named serializer should never fail")
}

/// Hash raw bytes with SHA-512/256.
pub fn hash_bytes(bytes: &[u8]) -> Hash {
    Sha512_256::digest(bytes).into()
}

/// Hash data under the given domain separation tag.
///
/// Internally, this first serializes the given type using [`serialize`] then
/// hashes `tag || bytes`.
pub fn hash<T: Serialize>(tag: &[u8], t: &T) -> Hash {
    let mut hasher = Sha512_256::new();
    hasher.update(tag);
    hasher.update(serialize(t));
    hasher.finalize().into()
}

/// The bytes a sender signs for the given transaction: `"TX" || serialize(tx)`.
pub fn signing_bytes(tx: &Transaction) -> Vec<u8> {
    let mut bytes = TX_TAG.to_vec();
    bytes.extend(serialize(tx));
    bytes
}

/// Shorthand for the transaction id.
pub fn tx_id(tx: &Transaction) -> Hash {
    tx.id()
}

/// The transaction id in the text form reported by the node.
pub fn tx_id_string(tx: &Transaction) -> String {
    BASE32_NOPAD.encode(&tx_id(tx))
}

/// The 4-byte ABI method selector for a method signature such as
/// `"mine(address)void"`.
pub fn method_selector(signature: &str) -> [u8; 4] {
    let digest = hash_bytes(signature.as_bytes());
    [digest[0], digest[1], digest[2], digest[3]]
}

impl Id for Transaction {
    fn id(&self) -> Hash {
        hash(TX_TAG, self)
    }
}
