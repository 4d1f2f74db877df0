//! Custom serde module implementations.
//!
//! Byte fields serialize as raw binary for the chain's msgpack encoding and as
//! base64 strings for the node's JSON responses.

pub mod address;
pub mod bytes;
