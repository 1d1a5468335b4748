use std::ops::Bound;

use crossbeam_skiplist::SkipMap;

use crate::common::{Key, Value};
use crate::errors::KvResult;
use crate::store::map::MapProvider;

/// In-memory map backed by a lock-free skip list.
///
/// The skip list keeps entries sorted by [`Key`] order, which makes every
/// navigation method a direct bound lookup. All operations are infallible
/// in practice; the `KvResult` return types exist to satisfy the shared
/// provider contract.
pub struct InMemoryMap {
    name: String,
    data: SkipMap<Key, Value>,
}

impl InMemoryMap {
    pub fn new(name: &str) -> Self {
        InMemoryMap {
            name: name.to_string(),
            data: SkipMap::new(),
        }
    }
}

impl MapProvider for InMemoryMap {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn contains_key(&self, key: &Key) -> KvResult<bool> {
        Ok(self.data.contains_key(key))
    }

    fn get(&self, key: &Key) -> KvResult<Option<Value>> {
        Ok(self.data.get(key).map(|entry| entry.value().clone()))
    }

    fn put(&self, key: Key, value: Value) -> KvResult<Option<Value>> {
        let previous = self.data.get(&key).map(|entry| entry.value().clone());
        self.data.insert(key, value);
        Ok(previous)
    }

    fn remove(&self, key: &Key) -> KvResult<Option<Value>> {
        Ok(self.data.remove(key).map(|entry| entry.value().clone()))
    }

    fn size(&self) -> KvResult<u64> {
        Ok(self.data.len() as u64)
    }

    fn clear(&self) -> KvResult<()> {
        self.data.clear();
        Ok(())
    }

    fn first_entry(&self) -> KvResult<Option<(Key, Value)>> {
        Ok(self
            .data
            .front()
            .map(|entry| (entry.key().clone(), entry.value().clone())))
    }

    fn last_entry(&self) -> KvResult<Option<(Key, Value)>> {
        Ok(self
            .data
            .back()
            .map(|entry| (entry.key().clone(), entry.value().clone())))
    }

    fn ceiling_entry(&self, key: &Key) -> KvResult<Option<(Key, Value)>> {
        Ok(self
            .data
            .lower_bound(Bound::Included(key))
            .map(|entry| (entry.key().clone(), entry.value().clone())))
    }

    fn higher_entry(&self, key: &Key) -> KvResult<Option<(Key, Value)>> {
        Ok(self
            .data
            .lower_bound(Bound::Excluded(key))
            .map(|entry| (entry.key().clone(), entry.value().clone())))
    }

    fn floor_entry(&self, key: &Key) -> KvResult<Option<(Key, Value)>> {
        Ok(self
            .data
            .upper_bound(Bound::Included(key))
            .map(|entry| (entry.key().clone(), entry.value().clone())))
    }

    fn lower_entry(&self, key: &Key) -> KvResult<Option<(Key, Value)>> {
        Ok(self
            .data
            .upper_bound(Bound::Excluded(key))
            .map(|entry| (entry.key().clone(), entry.value().clone())))
    }
}
