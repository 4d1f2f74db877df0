//! Transaction note payloads carrying the miner's sequence numbers.
//!
//! Every mining transaction carries a distinct note so that otherwise
//! identical calls within the same validity window hash to distinct ids.

/// Encode a sequence number as big-endian bytes using the minimal number of
/// bytes that represents the value. Zero encodes as a single `0x00` byte.
pub fn encode_sequence(seq: u64) -> Vec<u8> {
    let bytes = seq.to_be_bytes();
    let leading = (seq.leading_zeros() / 8) as usize;
    let start = leading.min(bytes.len() - 1);
    bytes[start..].to_vec()
}

/// Decode a note produced by [`encode_sequence`].
///
/// Returns `None` for an empty note or one wider than eight bytes.
pub fn decode_sequence(note: &[u8]) -> Option<u64> {
    if note.is_empty() || note.len() > 8 {
        return None;
    }
    let mut bytes = [0u8; 8];
    bytes[8 - note.len()..].copy_from_slice(note);
    Some(u64::from_be_bytes(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_width() {
        assert_eq!(encode_sequence(0), vec![0x00]);
        assert_eq!(encode_sequence(1), vec![0x01]);
        assert_eq!(encode_sequence(255), vec![0xFF]);
        assert_eq!(encode_sequence(256), vec![0x01, 0x00]);
        assert_eq!(encode_sequence(300), vec![0x01, 0x2C]);
        assert_eq!(encode_sequence(u64::MAX), vec![0xFF; 8]);
    }

    #[test]
    fn decode_inverts_encode() {
        for seq in [0, 1, 127, 300, 65_535, 65_536, u64::MAX] {
            assert_eq!(decode_sequence(&encode_sequence(seq)), Some(seq));
        }
        assert_eq!(decode_sequence(&[]), None);
        assert_eq!(decode_sequence(&[0; 9]), None);
    }
}
