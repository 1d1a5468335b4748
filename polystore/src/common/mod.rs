pub mod key_codec;

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

/// A key in the store.
///
/// Keys carry a total order so every backend can expose range queries with
/// identical semantics: all integers order before all text, all text before
/// all raw bytes, and values within a variant compare naturally. The same
/// order is reproduced byte-wise by [`key_codec`] for backends that sort by
/// encoded bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    /// A signed 64-bit integer key
    Integer(i64),
    /// A UTF-8 text key
    Text(String),
    /// A raw byte key
    Bytes(Vec<u8>),
}

impl Key {
    /// Returns the variant rank used for cross-variant ordering.
    fn rank(&self) -> u8 {
        match self {
            Key::Integer(_) => 0,
            Key::Text(_) => 1,
            Key::Bytes(_) => 2,
        }
    }
}

impl Ord for Key {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Key::Integer(a), Key::Integer(b)) => a.cmp(b),
            (Key::Text(a), Key::Text(b)) => a.cmp(b),
            (Key::Bytes(a), Key::Bytes(b)) => a.cmp(b),
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }
}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Display for Key {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Key::Integer(i) => write!(f, "{}", i),
            Key::Text(s) => write!(f, "{}", s),
            Key::Bytes(b) => write!(f, "0x{}", hex_string(b)),
        }
    }
}

fn hex_string(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

impl From<i64> for Key {
    fn from(value: i64) -> Self {
        Key::Integer(value)
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Key::Text(value.to_string())
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Key::Text(value)
    }
}

impl From<Vec<u8>> for Key {
    fn from(value: Vec<u8>) -> Self {
        Key::Bytes(value)
    }
}

/// A value stored against a [`Key`].
///
/// Values are opaque to ordering and querying; only keys (primary or
/// extracted index keys) participate in ranges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Value {
    Integer(i64),
    Text(String),
    Bytes(Vec<u8>),
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Bytes(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_ordering_within_variants() {
        assert!(Key::Integer(1) < Key::Integer(2));
        assert!(Key::Integer(-5) < Key::Integer(0));
        assert!(Key::Text("a".into()) < Key::Text("b".into()));
        assert!(Key::Text("a".into()) < Key::Text("aa".into()));
        assert!(Key::Bytes(vec![0x01]) < Key::Bytes(vec![0x02]));
        assert!(Key::Bytes(vec![0x01]) < Key::Bytes(vec![0x01, 0x00]));
    }

    #[test]
    fn test_key_ordering_across_variants() {
        assert!(Key::Integer(i64::MAX) < Key::Text(String::new()));
        assert!(Key::Text("zzz".into()) < Key::Bytes(vec![]));
        assert!(Key::Integer(0) < Key::Bytes(vec![0x00]));
    }

    #[test]
    fn test_key_from_conversions() {
        assert_eq!(Key::from(42i64), Key::Integer(42));
        assert_eq!(Key::from("hello"), Key::Text("hello".to_string()));
        assert_eq!(Key::from("owned".to_string()), Key::Text("owned".into()));
        assert_eq!(Key::from(vec![1u8, 2, 3]), Key::Bytes(vec![1, 2, 3]));
    }

    #[test]
    fn test_key_display() {
        assert_eq!(format!("{}", Key::Integer(7)), "7");
        assert_eq!(format!("{}", Key::Text("user:1".into())), "user:1");
        assert_eq!(format!("{}", Key::Bytes(vec![0xde, 0xad])), "0xdead");
    }

    #[test]
    fn test_value_from_conversions() {
        assert_eq!(Value::from(1i64), Value::Integer(1));
        assert_eq!(Value::from("v"), Value::Text("v".to_string()));
        assert_eq!(Value::from(vec![9u8]), Value::Bytes(vec![9]));
    }

    #[test]
    fn test_key_serde_round_trip() {
        let key = Key::Text("serde".into());
        let json = serde_json::to_string(&key).unwrap();
        let back: Key = serde_json::from_str(&json).unwrap();
        assert_eq!(key, back);
    }
}
