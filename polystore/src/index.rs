use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use crate::common::{Key, Value};
use crate::errors::{ErrorKind, KvError, KvResult};

/// The reserved index name addressing the primary keyspace itself.
pub const PRIMARY_INDEX: &str = "primary";

/// Internal map-name prefix for index maps.
///
/// The `#` character is rejected by [`validate_index_name`], so an index
/// map can never collide with a user-visible name in backends that store
/// one partition per map.
pub(crate) const INDEX_MAP_PREFIX: &str = "index#";

/// Extracts an index key from a primary entry.
///
/// Returning `None` excludes the entry from the index. An extractor must be
/// a pure function of its arguments; it is re-applied whenever an entry
/// changes.
pub type KeyExtractor = Arc<dyn Fn(&Key, &Value) -> Option<Key> + Send + Sync>;

/// A named secondary index over the primary keyspace.
///
/// The index map stores `extracted key -> encoded primary key`, kept in
/// sync at commit time. Extracted keys are unique: a later entry mapping to
/// an already-used index key overwrites the earlier association.
#[derive(Clone)]
pub struct IndexDescriptor {
    name: String,
    map_name: String,
    extractor: KeyExtractor,
}

impl IndexDescriptor {
    pub(crate) fn new(name: &str, extractor: KeyExtractor) -> Self {
        IndexDescriptor {
            name: name.to_string(),
            map_name: format!("{}{}", INDEX_MAP_PREFIX, name),
            extractor,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The internal name of the backing index map.
    pub(crate) fn map_name(&self) -> &str {
        &self.map_name
    }

    /// Applies the extractor to a primary entry.
    pub fn extract(&self, key: &Key, value: &Value) -> Option<Key> {
        (self.extractor)(key, value)
    }
}

impl Debug for IndexDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexDescriptor")
            .field("name", &self.name)
            .field("map_name", &self.map_name)
            .finish()
    }
}

/// Validates a user-supplied index name.
///
/// Names are limited to alphanumerics, `_` and `-`, must be non-empty, and
/// may not be the reserved name `"primary"`.
pub(crate) fn validate_index_name(name: &str) -> KvResult<()> {
    if name.is_empty() {
        return Err(KvError::new(
            "index name must not be empty",
            ErrorKind::InvalidOperation,
        ));
    }
    if name == PRIMARY_INDEX {
        return Err(KvError::new(
            &format!("index name '{}' is reserved", PRIMARY_INDEX),
            ErrorKind::InvalidOperation,
        ));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(KvError::new(
            &format!("index name '{}' contains invalid characters", name),
            ErrorKind::InvalidOperation,
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_extracts_through_closure() {
        let descriptor = IndexDescriptor::new(
            "by-length",
            Arc::new(|_k, v| match v {
                Value::Text(s) => Some(Key::Integer(s.len() as i64)),
                _ => None,
            }),
        );
        assert_eq!(descriptor.name(), "by-length");
        assert_eq!(descriptor.map_name(), "index#by-length");
        assert_eq!(
            descriptor.extract(&Key::Integer(1), &Value::Text("abc".into())),
            Some(Key::Integer(3))
        );
        assert_eq!(
            descriptor.extract(&Key::Integer(1), &Value::Integer(5)),
            None
        );
    }

    #[test]
    fn test_validate_index_name() {
        assert!(validate_index_name("by_age").is_ok());
        assert!(validate_index_name("by-name-2").is_ok());
        assert!(validate_index_name("").is_err());
        assert!(validate_index_name("primary").is_err());
        assert!(validate_index_name("bad#name").is_err());
        assert!(validate_index_name("with space").is_err());
    }

    #[test]
    fn test_reserved_name_error_kind() {
        let err = validate_index_name("primary").unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidOperation);
    }
}
