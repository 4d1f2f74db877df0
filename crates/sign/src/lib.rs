//! A minimal crate providing the effort miner's key handling, transaction
//! signing and verification implemented using [`ed25519_dalek`] and the
//! [`effort_hash`] crate.
//!
//! Includes [`Keypair`], [`sign`] and [`verify`].

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub use ed25519_dalek;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use effort_hash::signing_bytes;
use effort_types::{Address, SignedTransaction, Transaction};
use std::fmt;
use thiserror::Error;

/// An Ed25519 signing key together with the address it controls.
#[derive(Clone)]
pub struct Keypair {
    signing_key: SigningKey,
}

/// Failed to load a secret key.
#[derive(Debug, Error)]
pub enum InvalidKey {
    /// The key is not valid hex.
    #[error("secret key is not valid hex: {0}")]
    Hex(#[from] hex::FromHexError),
    /// The key is not a 32-byte seed.
    #[error("secret key must be a 32 byte seed, got {0} bytes")]
    Length(usize),
}

impl Keypair {
    /// Construct from a 32-byte secret seed.
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(&seed),
        }
    }

    /// Construct from a 32-byte secret seed encoded as hex (64 characters).
    pub fn from_hex(hex: &str) -> Result<Self, InvalidKey> {
        let bytes = hex::decode(hex.trim())?;
        let seed: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| InvalidKey::Length(bytes.len()))?;
        Ok(Self::from_seed(seed))
    }

    /// The address controlled by this key.
    pub fn address(&self) -> Address {
        Address(self.signing_key.verifying_key().to_bytes())
    }

    /// Sign arbitrary bytes.
    pub fn sign_bytes(&self, bytes: &[u8]) -> [u8; 64] {
        self.signing_key.sign(bytes).to_bytes()
    }
}

impl From<SigningKey> for Keypair {
    fn from(signing_key: SigningKey) -> Self {
        Self { signing_key }
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

/// Sign a transaction.
///
/// The signature covers `"TX" || serialize(tx)`, so the group id must be
/// assigned before signing.
pub fn sign(txn: Transaction, keypair: &Keypair) -> SignedTransaction {
    let sig = keypair.sign_bytes(&signing_bytes(&txn));
    SignedTransaction { sig, txn }
}

/// Verify a signed transaction against its sender's address.
pub fn verify(signed: &SignedTransaction) -> Result<(), ed25519_dalek::SignatureError> {
    let key = VerifyingKey::from_bytes(signed.txn.sender().as_bytes())?;
    let signature = Signature::from_bytes(&signed.sig);
    key.verify(&signing_bytes(&signed.txn), &signature)
}
