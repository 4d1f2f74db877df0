//! Custom [`Address`] serialization.
//!
//! Human-readable formats use the checksummed base32 text form. Binary formats
//! use the raw 32 public key bytes.

use crate::Address;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

impl Serialize for Address {
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if s.is_human_readable() {
            self.to_string().serialize(s)
        } else {
            s.serialize_bytes(&self.0)
        }
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D>(d: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        if d.is_human_readable() {
            let string = String::deserialize(d)?;
            string.parse().map_err(serde::de::Error::custom)
        } else {
            let bytes: Vec<u8> = super::bytes::deserialize(d)?;
            Address::from_slice(&bytes).map_err(serde::de::Error::custom)
        }
    }
}
