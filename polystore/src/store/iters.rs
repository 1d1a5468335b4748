use std::ops::Bound;
use std::sync::Arc;

use crate::common::{Key, Value};
use crate::errors::KvResult;
use crate::range::{bounds_contain, KeyBounds};
use crate::store::Map;

/// Trait for implementing lazy ascending entry cursors.
///
/// # Purpose
///
/// `EntryCursorProvider` defines the contract for any cursor that walks
/// (Key, Value) entries in ascending key order. Implementations maintain
/// their own position and produce the next entry only when asked, so a
/// caller that consumes three entries of a large scan pays for three
/// entries.
///
/// # Characteristics
///
/// - **Stateful**: Maintains the current position between steps
/// - **Lazy**: Each step performs at most one backend probe
/// - **Thread-Safe**: Requires `Send + Sync` for safe concurrent access
/// - **Error Handling**: Each produced entry is a `KvResult`, so a backend
///   failure mid-scan surfaces at the failing step instead of up front
///
/// # Implementations
///
/// - `MapRangeCursor`: Walks a single map within native bounds
/// - `OverlayCursor` (transaction layer): Merges staged and committed
///   entries
pub trait EntryCursorProvider: Send + Sync {
    /// Produces the next entry in ascending key order, or `None` when the
    /// cursor is exhausted.
    fn next_entry(&mut self) -> Option<KvResult<(Key, Value)>>;
}

/// A unified facade for lazy ascending iteration over (Key, Value) entries.
///
/// Wraps any [`EntryCursorProvider`] and exposes the standard `Iterator`
/// interface. Clones share iteration state through the inner `Arc`.
pub struct EntryCursor {
    provider: Arc<parking_lot::Mutex<Box<dyn EntryCursorProvider>>>,
}

impl std::fmt::Debug for EntryCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryCursor").finish_non_exhaustive()
    }
}

impl EntryCursor {
    /// Creates a new entry cursor wrapping the given provider.
    pub fn new<T: EntryCursorProvider + 'static>(provider: T) -> Self {
        EntryCursor {
            provider: Arc::new(parking_lot::Mutex::new(Box::new(provider))),
        }
    }

    /// Creates a cursor that yields nothing.
    pub fn empty() -> Self {
        EntryCursor::new(EmptyCursor)
    }
}

impl Clone for EntryCursor {
    fn clone(&self) -> Self {
        EntryCursor {
            provider: Arc::clone(&self.provider),
        }
    }
}

impl Iterator for EntryCursor {
    type Item = KvResult<(Key, Value)>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut provider = self.provider.lock();
        provider.next_entry()
    }
}

struct EmptyCursor;

impl EntryCursorProvider for EmptyCursor {
    fn next_entry(&mut self) -> Option<KvResult<(Key, Value)>> {
        None
    }
}

/// Cursor over a single map, constrained to a pair of native key bounds.
///
/// Steps by navigation probes (`ceiling_entry` / `higher_entry`) against the
/// live map rather than holding a backend iterator, so each step sees the
/// map as it is at that moment and the cursor owns all of its state.
pub struct MapRangeCursor {
    map: Map,
    bounds: KeyBounds,
    position: Option<Key>,
    done: bool,
}

impl MapRangeCursor {
    pub fn new(map: Map, bounds: KeyBounds) -> Self {
        MapRangeCursor {
            map,
            bounds,
            position: None,
            done: false,
        }
    }

    fn probe(&self) -> KvResult<Option<(Key, Value)>> {
        match &self.position {
            Some(last) => self.map.higher_entry(last),
            None => match &self.bounds.0 {
                Bound::Included(lower) => self.map.ceiling_entry(lower),
                Bound::Excluded(lower) => self.map.higher_entry(lower),
                Bound::Unbounded => self.map.first_entry(),
            },
        }
    }
}

impl EntryCursorProvider for MapRangeCursor {
    fn next_entry(&mut self) -> Option<KvResult<(Key, Value)>> {
        if self.done {
            return None;
        }
        match self.probe() {
            Ok(Some((key, value))) => {
                if bounds_contain(&self.bounds, &key) {
                    self.position = Some(key.clone());
                    Some(Ok((key, value)))
                } else {
                    self.done = true;
                    None
                }
            }
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
