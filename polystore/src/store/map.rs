use std::ops::Deref;
use std::sync::Arc;

use crate::common::{Key, Value};
use crate::errors::KvResult;
use crate::range::{KeyBounds, KeyRange, MemoryRangeTranslator, Range, RangeTranslator};
use crate::store::iters::{EntryCursor, MapRangeCursor};

/// Low-level interface for ordered key-value map backends.
///
/// # Purpose
/// Defines the contract every map backend must implement. Implementers
/// provide concrete storage for one named keyspace, such as the in-memory
/// skip-list map or a persistent partition in the fjall adapter.
///
/// # Key Methods
/// - **Basic Operations**: `put()`, `get()`, `remove()`, `contains_key()`
/// - **Navigation**: `first_entry()`, `last_entry()`, `ceiling_entry()`,
///   `higher_entry()`, `floor_entry()`, `lower_entry()`
/// - **State**: `size()`, `is_empty()`, `clear()`
///
/// Navigation methods are the primitive ranged scans are built from: the
/// generic [`Map::range`] cursor walks a map entirely through
/// `ceiling_entry` / `higher_entry` probes, so a backend that implements
/// navigation gets lazy range queries for free.
///
/// # Thread Safety
/// Implementers must be `Send + Sync` for safe use in concurrent contexts.
pub trait MapProvider: Send + Sync {
    /// Returns the name of this map.
    fn name(&self) -> String;

    /// Checks whether the map contains a key.
    fn contains_key(&self, key: &Key) -> KvResult<bool>;

    /// Retrieves the value associated with a key.
    ///
    /// # Returns
    /// * `Ok(Some(value))` if the key exists
    /// * `Ok(None)` if the key does not exist
    /// * `Err(KvError)` if the operation fails
    fn get(&self, key: &Key) -> KvResult<Option<Value>>;

    /// Inserts or updates a key-value pair.
    ///
    /// # Returns
    /// * `Ok(Some(previous))` if the key was already present
    /// * `Ok(None)` if the key was newly inserted
    /// * `Err(KvError)` if the operation fails
    fn put(&self, key: Key, value: Value) -> KvResult<Option<Value>>;

    /// Removes a key-value pair.
    ///
    /// # Returns
    /// * `Ok(Some(value))` with the removed value if the key existed
    /// * `Ok(None)` if the key did not exist
    /// * `Err(KvError)` if the operation fails
    fn remove(&self, key: &Key) -> KvResult<Option<Value>>;

    /// Returns the number of entries in the map.
    fn size(&self) -> KvResult<u64>;

    /// Checks if the map has no entries.
    fn is_empty(&self) -> KvResult<bool> {
        Ok(self.size()? == 0)
    }

    /// Removes all entries from the map.
    fn clear(&self) -> KvResult<()>;

    /// Returns the entry with the smallest key, or `None` if the map is
    /// empty.
    fn first_entry(&self) -> KvResult<Option<(Key, Value)>>;

    /// Returns the entry with the largest key, or `None` if the map is
    /// empty.
    fn last_entry(&self) -> KvResult<Option<(Key, Value)>>;

    /// Returns the entry with the smallest key greater than or equal to
    /// `key`.
    fn ceiling_entry(&self, key: &Key) -> KvResult<Option<(Key, Value)>>;

    /// Returns the entry with the smallest key strictly greater than `key`.
    fn higher_entry(&self, key: &Key) -> KvResult<Option<(Key, Value)>>;

    /// Returns the entry with the largest key less than or equal to `key`.
    fn floor_entry(&self, key: &Key) -> KvResult<Option<(Key, Value)>>;

    /// Returns the entry with the largest key strictly less than `key`.
    fn lower_entry(&self, key: &Key) -> KvResult<Option<(Key, Value)>>;

    /// Backend-native range scan.
    ///
    /// A backend whose storage has a specialized scan form implements this
    /// by running `range` through its own
    /// [`RangeTranslator`](crate::range::RangeTranslator) and returning a
    /// cursor over the translated bounds. The default `None` makes
    /// [`Map::range`] fall back to the generic probe cursor built on the
    /// navigation methods.
    fn native_scan(&self, _range: &KeyRange) -> KvResult<Option<EntryCursor>> {
        Ok(None)
    }
}

/// A facade over a [`MapProvider`] implementation.
///
/// `Map` is the handle the rest of the system works with. It is cheaply
/// cloneable; clones share the underlying provider. `Deref` forwards all
/// provider methods, and [`Map::range`] adds the generic lazy range scan.
#[derive(Clone)]
pub struct Map {
    inner: Arc<dyn MapProvider>,
}

impl std::fmt::Debug for Map {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Map").finish_non_exhaustive()
    }
}

impl Map {
    /// Creates a new map facade over the given provider.
    pub fn new<T: MapProvider + 'static>(provider: T) -> Self {
        Map {
            inner: Arc::new(provider),
        }
    }

    /// Returns a lazy ascending cursor over the entries selected by
    /// `range`.
    ///
    /// An abstract range is first offered to the provider's
    /// [`native_scan`](MapProvider::native_scan), so a backend with its own
    /// translator answers in its native form. Otherwise the range is
    /// translated to `Key` bounds through [`MemoryRangeTranslator`] and
    /// served by the generic probe cursor; a native form passes through to
    /// that path unchanged. Either way the cursor steps the live map one
    /// entry at a time, so nothing is materialized up front.
    pub fn range(&self, range: Range<KeyBounds>) -> KvResult<EntryCursor> {
        if let Range::Abstract(key_range) = &range {
            if let Some(cursor) = self.inner.native_scan(key_range)? {
                return Ok(cursor);
            }
        }
        let bounds = MemoryRangeTranslator.to_native(range)?;
        Ok(EntryCursor::new(MapRangeCursor::new(self.clone(), bounds)))
    }
}

impl Deref for Map {
    type Target = dyn MapProvider;

    fn deref(&self) -> &Self::Target {
        self.inner.as_ref()
    }
}
