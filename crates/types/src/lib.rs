//! Base types shared across the effort miner crates.
//!
//! Includes the chain's [`Address`] type, the [`Network`] selector, the typed
//! views of node responses (accounts, applications, state values) and the
//! [`Transaction`][transaction::Transaction] representation submitted by the
//! miner.

#![deny(missing_docs)]
#![deny(unsafe_code)]

use sha2::{Digest, Sha512_256};
use thiserror::Error;

pub mod account;
mod fmt;
pub mod note;
pub mod serde;
pub mod state;
pub mod transaction;

pub use account::{
    AccountInfo, AppLocalState, ApplicationInfo, AssetHolding, Confirmation, NodeStatus,
    SuggestedParams,
};
pub use state::{StateValue, TealKeyValue};
pub use transaction::{SignedTransaction, Transaction, TransactionKind};

/// A 32-byte SHA-512/256 digest.
pub type Hash = [u8; 32];

/// Identifier of a deployed application (smart contract).
pub type AppId = u64;

/// Identifier of an asset.
pub type AssetId = u64;

/// Amount of the native currency in micro-units.
pub type MicroAlgos = u64;

/// A block number.
pub type Round = u64;

/// Number of bytes of the public key digest appended as an address checksum.
pub const CHECKSUM_LEN: usize = 4;

/// Length of the checksummed textual address.
pub const ADDRESS_LEN: usize = 58;

/// An account address: the raw 32-byte Ed25519 public key.
///
/// Formatting with `Display` produces the checksummed base32 text form used by
/// the chain. Parsing from a string verifies that checksum.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(pub [u8; 32]);

/// Selects which chain deployment the miner talks to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, ::serde::Serialize, ::serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Public test network.
    #[default]
    Testnet,
    /// Production network.
    Mainnet,
}

/// Failed to parse an [`Address`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidAddress {
    /// The text form must be exactly [`ADDRESS_LEN`] characters.
    #[error("address must be {ADDRESS_LEN} characters, got {0}")]
    Length(usize),
    /// The text form is not valid base32.
    #[error("address is not valid base32")]
    Encoding,
    /// Raw address bytes must be exactly 32 bytes.
    #[error("address must be 32 bytes, got {0}")]
    ByteLength(usize),
    /// The trailing checksum does not match the public key.
    #[error("address checksum mismatch")]
    Checksum,
}

/// Failed to parse a [`Network`].
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown network `{0}`, expected `testnet` or `mainnet`")]
pub struct UnknownNetwork(pub String);

impl Address {
    /// The all-zero address.
    pub const ZERO: Self = Address([0; 32]);

    /// Construct an address from a byte slice, which must be exactly 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, InvalidAddress> {
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| InvalidAddress::ByteLength(bytes.len()))?;
        Ok(Self(arr))
    }

    /// The four checksum bytes appended to the public key in the text form.
    pub fn checksum(&self) -> [u8; CHECKSUM_LEN] {
        let digest: Hash = Sha512_256::digest(self.0).into();
        let mut checksum = [0u8; CHECKSUM_LEN];
        checksum.copy_from_slice(&digest[32 - CHECKSUM_LEN..]);
        checksum
    }

    /// The raw public key bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl From<[u8; 32]> for Address {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl From<Address> for [u8; 32] {
    fn from(address: Address) -> Self {
        address.0
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Network {
    /// The lowercase name, as accepted on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Testnet => "testnet",
            Network::Mainnet => "mainnet",
        }
    }
}
