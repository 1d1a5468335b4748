//! Order-preserving byte encoding for [`Key`].
//!
//! The encoded form sorts byte-wise in the same order the [`Key`] enum sorts
//! natively. Each encoding starts with a variant tag byte (0x01 integer,
//! 0x02 text, 0x03 bytes); integers flip the sign bit and serialize
//! big-endian so negative values order before positive ones; text and bytes
//! serialize raw, which preserves lexicographic order.
//!
//! Byte-ordered backends (the fjall adapter) store encoded keys directly;
//! the index layer uses the encoding to persist primary keys as index map
//! values.

use crate::common::Key;
use crate::errors::{ErrorKind, KvError, KvResult};

const TAG_INTEGER: u8 = 0x01;
const TAG_TEXT: u8 = 0x02;
const TAG_BYTES: u8 = 0x03;

/// Encodes a key into its order-preserving byte form.
pub fn encode(key: &Key) -> Vec<u8> {
    match key {
        Key::Integer(i) => {
            let mut out = Vec::with_capacity(9);
            out.push(TAG_INTEGER);
            // flip the sign bit so the big-endian bytes sort numerically
            out.extend_from_slice(&((*i as u64) ^ (1 << 63)).to_be_bytes());
            out
        }
        Key::Text(s) => {
            let mut out = Vec::with_capacity(1 + s.len());
            out.push(TAG_TEXT);
            out.extend_from_slice(s.as_bytes());
            out
        }
        Key::Bytes(b) => {
            let mut out = Vec::with_capacity(1 + b.len());
            out.push(TAG_BYTES);
            out.extend_from_slice(b);
            out
        }
    }
}

/// Decodes a key from its encoded byte form.
///
/// Fails with `ErrorKind::EncodingError` on an empty buffer, an unknown tag,
/// or a malformed payload.
pub fn decode(bytes: &[u8]) -> KvResult<Key> {
    let (tag, payload) = bytes.split_first().ok_or_else(|| {
        KvError::new("cannot decode key from empty buffer", ErrorKind::EncodingError)
    })?;

    match *tag {
        TAG_INTEGER => {
            let raw: [u8; 8] = payload.try_into().map_err(|_| {
                KvError::new(
                    &format!("integer key payload must be 8 bytes, got {}", payload.len()),
                    ErrorKind::EncodingError,
                )
            })?;
            Ok(Key::Integer((u64::from_be_bytes(raw) ^ (1 << 63)) as i64))
        }
        TAG_TEXT => {
            let text = std::str::from_utf8(payload).map_err(|e| {
                KvError::new(
                    &format!("text key payload is not valid UTF-8: {}", e),
                    ErrorKind::EncodingError,
                )
            })?;
            Ok(Key::Text(text.to_string()))
        }
        TAG_BYTES => Ok(Key::Bytes(payload.to_vec())),
        other => Err(KvError::new(
            &format!("unknown key tag byte: 0x{:02x}", other),
            ErrorKind::EncodingError,
        )),
    }
}
