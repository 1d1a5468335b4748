use fjall::UserKey;
use polystore::common::Value;
use polystore::errors::{ErrorKind, KvError};
use thiserror::Error;

/// Error type for FjallValue serialization/deserialization operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FjallValueError {
    /// Deserialization of binary data failed
    #[error("Deserialization failed: {0}")]
    DeserializationError(String),
    /// Serialization of a value failed
    #[error("Serialization failed: {0}")]
    SerializationError(String),
}

impl From<FjallValueError> for KvError {
    /// Converts a `FjallValueError` to a `KvError` with EncodingError kind.
    fn from(err: FjallValueError) -> Self {
        KvError::new(&err.to_string(), ErrorKind::EncodingError)
    }
}

/// Result type for FjallValue operations.
pub type FjallValueResult<T> = Result<T, FjallValueError>;

/// Byte-serialized wrapper for polystore values.
///
/// Encapsulates a [`Value`] as a `Vec<u8>` for storage in a Fjall
/// partition, serialized with bincode. Keys use the order-preserving codec
/// instead, so only values pass through this wrapper.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FjallValue(Vec<u8>);

impl FjallValue {
    /// Serializes a value into its byte form.
    ///
    /// # Returns
    /// - `Ok(FjallValue)` on successful serialization
    /// - `Err(FjallValueError)` on serialization failure
    #[inline]
    pub fn try_from_value(value: &Value) -> FjallValueResult<FjallValue> {
        bincode::serde::encode_to_vec(value, bincode::config::standard())
            .map(FjallValue)
            .map_err(|e| FjallValueError::SerializationError(e.to_string()))
    }

    /// Deserializes the wrapped bytes back into a value.
    ///
    /// # Returns
    /// - `Ok(Value)` on successful deserialization
    /// - `Err(FjallValueError)` on corrupted or invalid data
    #[inline]
    pub fn try_into_value(self) -> FjallValueResult<Value> {
        bincode::serde::decode_from_slice(&self.0, bincode::config::standard())
            .map(|(value, _)| value)
            .map_err(|e| FjallValueError::DeserializationError(e.to_string()))
    }

    /// Wraps raw bytes read back from a partition.
    #[inline]
    pub fn from_bytes(bytes: &[u8]) -> FjallValue {
        FjallValue(bytes.to_vec())
    }
}

impl From<FjallValue> for UserKey {
    #[inline]
    fn from(val: FjallValue) -> Self {
        UserKey::new(&val.0)
    }
}

impl AsRef<[u8]> for FjallValue {
    #[inline]
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Converts Fjall backend errors to polystore errors.
///
/// Maps error message patterns to the closest error kind:
/// - "closed" → StoreClosed
/// - "corrupt" → EncodingError
/// - everything else → BackendError
pub fn to_kv_error(err: fjall::Error) -> KvError {
    let message = err.to_string();
    let lower = message.to_lowercase();
    let kind = if lower.contains("closed") {
        ErrorKind::StoreClosed
    } else if lower.contains("corrupt") {
        ErrorKind::EncodingError
    } else {
        ErrorKind::BackendError
    };
    KvError::new(&format!("fjall error: {}", message), kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_round_trip() {
        for value in [
            Value::Integer(42),
            Value::Integer(i64::MIN),
            Value::Text("hello".into()),
            Value::Text(String::new()),
            Value::Bytes(vec![0x00, 0xff]),
        ] {
            let encoded = FjallValue::try_from_value(&value).unwrap();
            let decoded = FjallValue::from_bytes(encoded.as_ref())
                .try_into_value()
                .unwrap();
            assert_eq!(value, decoded);
        }
    }

    #[test]
    fn test_corrupted_bytes_fail_deserialization() {
        let result = FjallValue::from_bytes(&[0xff, 0xff, 0xff]).try_into_value();
        assert!(result.is_err());
    }

    #[test]
    fn test_error_converts_to_encoding_kind() {
        let err = FjallValueError::DeserializationError("bad".into());
        let kv: KvError = err.into();
        assert_eq!(kv.kind(), &ErrorKind::EncodingError);
    }
}
