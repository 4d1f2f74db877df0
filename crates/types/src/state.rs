//! Key-value application state as reported by the node.

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// A single state value: either an unsigned integer or a byte string.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum StateValue {
    /// The `uint` variant.
    Uint(u64),
    /// The `bytes` variant.
    Bytes(Vec<u8>),
}

/// One entry of global or local application state.
///
/// The key is kept in the node's base64 encoding so lookups compare encoded
/// keys, exactly as the node reports them.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TealKeyValue {
    /// The base64 encoded state key.
    pub key: String,
    /// The decoded value.
    pub value: StateValue,
}

/// The node's wire representation of a state value.
#[derive(Serialize, Deserialize)]
struct RawValue {
    #[serde(rename = "type")]
    ty: u8,
    #[serde(default)]
    bytes: String,
    #[serde(default)]
    uint: u64,
}

const TYPE_BYTES: u8 = 1;
const TYPE_UINT: u8 = 2;

impl StateValue {
    /// The integer value, if this is the `uint` variant.
    pub fn as_uint(&self) -> Option<u64> {
        match self {
            StateValue::Uint(n) => Some(*n),
            StateValue::Bytes(_) => None,
        }
    }

    /// The byte string, if this is the `bytes` variant.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            StateValue::Bytes(b) => Some(b),
            StateValue::Uint(_) => None,
        }
    }
}

impl TealKeyValue {
    /// Construct an entry from a plain (unencoded) key.
    pub fn new(key: &str, value: StateValue) -> Self {
        Self {
            key: encode_key(key),
            value,
        }
    }
}

/// Encode a plain state key name the way the node reports it.
pub fn encode_key(name: &str) -> String {
    STANDARD.encode(name.as_bytes())
}

/// Find the value stored under the plain key `name`.
pub fn lookup<'a>(state: &'a [TealKeyValue], name: &str) -> Option<&'a StateValue> {
    let key = encode_key(name);
    state.iter().find(|kv| kv.key == key).map(|kv| &kv.value)
}

impl Serialize for StateValue {
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let raw = match self {
            StateValue::Uint(n) => RawValue {
                ty: TYPE_UINT,
                bytes: String::new(),
                uint: *n,
            },
            StateValue::Bytes(b) => RawValue {
                ty: TYPE_BYTES,
                bytes: STANDARD.encode(b),
                uint: 0,
            },
        };
        raw.serialize(s)
    }
}

impl<'de> Deserialize<'de> for StateValue {
    fn deserialize<D>(d: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = RawValue::deserialize(d)?;
        match raw.ty {
            TYPE_UINT => Ok(StateValue::Uint(raw.uint)),
            TYPE_BYTES => STANDARD
                .decode(raw.bytes)
                .map(StateValue::Bytes)
                .map_err(de::Error::custom),
            other => Err(de::Error::custom(format!("unknown state value type {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_node_json() {
        let json = r#"[
            {"key": "YmxvY2s=", "value": {"type": 2, "bytes": "", "uint": 42}},
            {"key": "bGFzdF9taW5lcg==", "value": {"type": 1, "bytes": "AAEC", "uint": 0}}
        ]"#;
        let state: Vec<TealKeyValue> = serde_json::from_str(json).unwrap();
        assert_eq!(lookup(&state, "block"), Some(&StateValue::Uint(42)));
        assert_eq!(
            lookup(&state, "last_miner"),
            Some(&StateValue::Bytes(vec![0, 1, 2]))
        );
        assert_eq!(lookup(&state, "missing"), None);
    }

    #[test]
    fn unknown_type_is_rejected() {
        let json = r#"{"type": 7, "uint": 1}"#;
        assert!(serde_json::from_str::<StateValue>(json).is_err());
    }

    #[test]
    fn encoded_key_matches_node() {
        assert_eq!(encode_key("block"), "YmxvY2s=");
        assert_eq!(TealKeyValue::new("block", StateValue::Uint(1)).key, "YmxvY2s=");
    }
}
