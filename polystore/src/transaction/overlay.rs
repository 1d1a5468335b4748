use std::collections::BTreeMap;

use crate::common::{Key, Value};

/// A staged change to one key.
///
/// `Removed` is a tombstone: it hides the committed entry from the staging
/// transaction and shadows any earlier staged `Put` of the same key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum StagedEntry {
    Put(Value),
    Removed,
}

/// The private write buffer of one transaction.
///
/// A single ordered map holds both staged puts and tombstones, so the last
/// staged operation on a key is the one that counts: a `remove` after a
/// `put` leaves a tombstone, a `put` after a `remove` leaves the new value.
/// Nothing here is visible outside the owning transaction until commit.
#[derive(Debug, Default)]
pub(crate) struct Overlay {
    entries: BTreeMap<Key, StagedEntry>,
}

impl Overlay {
    pub(crate) fn new() -> Self {
        Overlay {
            entries: BTreeMap::new(),
        }
    }

    pub(crate) fn stage_put(&mut self, key: Key, value: Value) {
        self.entries.insert(key, StagedEntry::Put(value));
    }

    pub(crate) fn stage_remove(&mut self, key: Key) {
        self.entries.insert(key, StagedEntry::Removed);
    }

    /// Returns the staged effect for a key, if any.
    pub(crate) fn effect(&self, key: &Key) -> Option<&StagedEntry> {
        self.entries.get(key)
    }

    /// Clones the current staged state, ordered by key.
    pub(crate) fn snapshot(&self) -> BTreeMap<Key, StagedEntry> {
        self.entries.clone()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_then_remove_leaves_tombstone() {
        let mut overlay = Overlay::new();
        let key = Key::from("k");
        overlay.stage_put(key.clone(), Value::Integer(1));
        overlay.stage_remove(key.clone());
        assert_eq!(overlay.effect(&key), Some(&StagedEntry::Removed));
    }

    #[test]
    fn test_remove_then_put_leaves_value() {
        let mut overlay = Overlay::new();
        let key = Key::from("k");
        overlay.stage_remove(key.clone());
        overlay.stage_put(key.clone(), Value::Integer(2));
        assert_eq!(
            overlay.effect(&key),
            Some(&StagedEntry::Put(Value::Integer(2)))
        );
    }

    #[test]
    fn test_snapshot_is_ordered_and_independent() {
        let mut overlay = Overlay::new();
        overlay.stage_put(Key::Integer(3), Value::Integer(3));
        overlay.stage_put(Key::Integer(1), Value::Integer(1));
        overlay.stage_remove(Key::Integer(2));

        let snapshot = overlay.snapshot();
        let keys: Vec<&Key> = snapshot.keys().collect();
        assert_eq!(keys, vec![&Key::Integer(1), &Key::Integer(2), &Key::Integer(3)]);

        overlay.clear();
        assert!(overlay.is_empty());
        assert_eq!(snapshot.len(), 3);
    }
}
