//! Byte string serialization: msgpack `bin` or a base64 string.

use base64::{engine::general_purpose::STANDARD, Engine};
use core::fmt;
use serde::{
    de::{self, SeqAccess, Visitor},
    ser::SerializeSeq,
    Deserialize, Deserializer, Serialize, Serializer,
};

/// Serialize any byte container.
pub fn serialize<T, S>(bytes: &T, s: S) -> Result<S::Ok, S::Error>
where
    T: AsRef<[u8]> + ?Sized,
    S: Serializer,
{
    if s.is_human_readable() {
        STANDARD.encode(bytes.as_ref()).serialize(s)
    } else {
        s.serialize_bytes(bytes.as_ref())
    }
}

/// Deserialize into any type constructible from a `Vec<u8>`, e.g. `[u8; 32]`.
pub fn deserialize<'de, T, D>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<Vec<u8>>,
{
    let bytes: Vec<u8> = if d.is_human_readable() {
        let string = String::deserialize(d)?;
        STANDARD.decode(string).map_err(de::Error::custom)?
    } else {
        d.deserialize_byte_buf(BytesVisitor)?
    };
    let len = bytes.len();
    T::try_from(bytes).map_err(|_err| {
        de::Error::custom(format!("unexpected byte string length {len}"))
    })
}

/// A sequence of byte strings, e.g. application call arguments.
pub mod seq {
    use super::*;

    /// Serialize a sequence of byte containers.
    pub fn serialize<T, S>(items: &[T], s: S) -> Result<S::Ok, S::Error>
    where
        T: AsRef<[u8]>,
        S: Serializer,
    {
        let mut seq = s.serialize_seq(Some(items.len()))?;
        for item in items {
            seq.serialize_element(&Bytes(item.as_ref()))?;
        }
        seq.end()
    }

    struct Bytes<'a>(&'a [u8]);

    impl Serialize for Bytes<'_> {
        fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            super::serialize(self.0, s)
        }
    }
}

struct BytesVisitor;

impl<'de> Visitor<'de> for BytesVisitor {
    type Value = Vec<u8>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a byte string")
    }

    fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Self::Value, E> {
        Ok(v.to_vec())
    }

    fn visit_byte_buf<E: de::Error>(self, v: Vec<u8>) -> Result<Self::Value, E> {
        Ok(v)
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut bytes = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(b) = seq.next_element()? {
            bytes.push(b);
        }
        Ok(bytes)
    }
}
