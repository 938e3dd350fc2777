//! Key encoding for case records and index entries.

use super::RecordId;

/// Size of an encoded record id in bytes.
pub const RECORD_ID_SIZE: usize = 8;

/// Separator between the name and value parts of an index key.
const KEY_SEPARATOR: u8 = 0x00;

/// Encode a record id as a data tree key.
///
/// Big-endian encoding makes sled's lexicographic iteration order match
/// numeric id order, so the projection sees a stable, deterministic order.
pub fn encode_id(id: RecordId) -> [u8; RECORD_ID_SIZE] {
    id.to_be_bytes()
}

/// Decode a record id from a data tree key.
pub fn decode_id(bytes: &[u8]) -> Option<RecordId> {
    let bytes: [u8; RECORD_ID_SIZE] = bytes.try_into().ok()?;
    Some(RecordId::from_be_bytes(bytes))
}

/// Build the index key for a `(name, value)` pair.
///
/// Format: `[name_len:2][name][0x00][value]`
pub fn index_key(name: &str, value: &str) -> Vec<u8> {
    let name_bytes = name.as_bytes();
    let mut key = Vec::with_capacity(name_bytes.len() + value.len() + 3);
    key.extend_from_slice(&(name_bytes.len() as u16).to_be_bytes());
    key.extend_from_slice(name_bytes);
    key.push(KEY_SEPARATOR);
    key.extend_from_slice(value.as_bytes());
    key
}

/// Encode a list of record ids as packed big-endian words.
pub fn encode_id_list(ids: &[RecordId]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(ids.len() * RECORD_ID_SIZE);
    for id in ids {
        buf.extend_from_slice(&encode_id(*id));
    }
    buf
}

/// Decode a packed id list. Trailing partial words are ignored.
pub fn decode_id_list(bytes: &[u8]) -> Vec<RecordId> {
    bytes
        .chunks_exact(RECORD_ID_SIZE)
        .filter_map(decode_id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_ordering() {
        assert!(encode_id(1) < encode_id(2));
        assert!(encode_id(255) < encode_id(256));
    }

    #[test]
    fn test_decode_invalid_length() {
        assert!(decode_id(&[0u8; 4]).is_none());
        assert!(decode_id(&[0u8; 9]).is_none());
    }

    #[test]
    fn test_index_keys_do_not_collide_across_names() {
        // "ab" + "c" must differ from "a" + "bc"
        assert_ne!(index_key("ab", "c"), index_key("a", "bc"));
    }

    #[test]
    fn test_id_list_ignores_partial_word() {
        let mut bytes = encode_id_list(&[7, 9]);
        bytes.extend_from_slice(&[1, 2, 3]);
        assert_eq!(decode_id_list(&bytes), vec![7, 9]);
    }
}
