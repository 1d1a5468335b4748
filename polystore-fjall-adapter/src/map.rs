use std::ops::Bound::{Excluded, Included, Unbounded};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use fjall::Partition;
use polystore::common::{key_codec, Key, Value};
use polystore::errors::{ErrorKind, KvError, KvResult};
use polystore::range::{KeyRange, Range, RangeTranslator};
use polystore::store::{EntryCursor, EntryCursorProvider, MapProvider};

use crate::translator::{ByteBounds, FjallRangeTranslator};
use crate::wrapper::{to_kv_error, FjallValue};

/// Fjall-based map implementation.
///
/// A persistent ordered map backed by one Fjall partition. Keys are stored
/// in their order-preserving encoded form so partition byte order equals
/// abstract key order, which lets every navigation method resolve to a
/// single bounded range probe. Values are bincode-serialized through
/// [`FjallValue`].
///
/// Thread-safe and cheaply cloneable via the inner `Arc`.
#[derive(Clone)]
pub struct FjallMap {
    inner: Arc<FjallMapInner>,
}

impl FjallMap {
    pub(crate) fn new(name: String, partition: Partition) -> FjallMap {
        FjallMap {
            inner: Arc::new(FjallMapInner {
                name,
                partition,
                closed: AtomicBool::new(false),
            }),
        }
    }

    pub(crate) fn mark_closed(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
    }
}

struct FjallMapInner {
    name: String,
    partition: Partition,
    closed: AtomicBool,
}

impl FjallMapInner {
    fn check_opened(&self) -> KvResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            log::error!("operation attempted on closed fjall map '{}'", self.name);
            return Err(KvError::new(
                &format!("map '{}' is closed", self.name),
                ErrorKind::StoreClosed,
            ));
        }
        Ok(())
    }

    fn decode_entry(&self, key_bytes: &[u8], value_bytes: &[u8]) -> KvResult<(Key, Value)> {
        let key = key_codec::decode(key_bytes)?;
        let value = FjallValue::from_bytes(value_bytes).try_into_value()?;
        Ok((key, value))
    }

    /// Resolves the first entry of a bounded probe over the partition.
    fn probe_front(
        &self,
        bounds: (std::ops::Bound<Vec<u8>>, std::ops::Bound<Vec<u8>>),
    ) -> KvResult<Option<(Key, Value)>> {
        let mut range = self.partition.range(bounds);
        match range.next() {
            Some(Ok((key, value))) => Ok(Some(self.decode_entry(&key, &value)?)),
            Some(Err(err)) => {
                log::error!("range probe failed on fjall map '{}': {}", self.name, err);
                Err(to_kv_error(err))
            }
            None => Ok(None),
        }
    }

    /// Resolves the last entry of a bounded probe over the partition.
    fn probe_back(
        &self,
        bounds: (std::ops::Bound<Vec<u8>>, std::ops::Bound<Vec<u8>>),
    ) -> KvResult<Option<(Key, Value)>> {
        let mut range = self.partition.range(bounds);
        match range.next_back() {
            Some(Ok((key, value))) => Ok(Some(self.decode_entry(&key, &value)?)),
            Some(Err(err)) => {
                log::error!("range probe failed on fjall map '{}': {}", self.name, err);
                Err(to_kv_error(err))
            }
            None => Ok(None),
        }
    }
}

/// Cursor over one partition, constrained to translated byte bounds.
///
/// Built by [`FjallMap::native_scan`] from the [`FjallRangeTranslator`]
/// output. Steps by bounded probes against the live partition; the position
/// tracks the last yielded encoded key so every step is one range lookup
/// and entries written mid-scan past the position are still seen.
struct FjallRangeCursor {
    inner: Arc<FjallMapInner>,
    bounds: ByteBounds,
    position: Option<Vec<u8>>,
    done: bool,
}

impl EntryCursorProvider for FjallRangeCursor {
    fn next_entry(&mut self) -> Option<KvResult<(Key, Value)>> {
        if self.done {
            return None;
        }
        if let Err(e) = self.inner.check_opened() {
            self.done = true;
            return Some(Err(e));
        }
        let lower = match &self.position {
            Some(last) => Excluded(last.clone()),
            None => self.bounds.0.clone(),
        };
        let mut range = self.inner.partition.range((lower, self.bounds.1.clone()));
        match range.next() {
            Some(Ok((key_bytes, value_bytes))) => {
                let raw = key_bytes.to_vec();
                match self.inner.decode_entry(&key_bytes, &value_bytes) {
                    Ok(entry) => {
                        self.position = Some(raw);
                        Some(Ok(entry))
                    }
                    Err(e) => {
                        self.done = true;
                        Some(Err(e))
                    }
                }
            }
            Some(Err(err)) => {
                self.done = true;
                log::error!(
                    "range scan failed on fjall map '{}': {}",
                    self.inner.name,
                    err
                );
                Some(Err(to_kv_error(err)))
            }
            None => {
                self.done = true;
                None
            }
        }
    }
}

impl MapProvider for FjallMap {
    fn name(&self) -> String {
        self.inner.name.clone()
    }

    fn contains_key(&self, key: &Key) -> KvResult<bool> {
        self.inner.check_opened()?;
        self.inner
            .partition
            .contains_key(key_codec::encode(key))
            .map_err(|err| {
                log::error!("contains_key failed on fjall map '{}': {}", self.inner.name, err);
                to_kv_error(err)
            })
    }

    fn get(&self, key: &Key) -> KvResult<Option<Value>> {
        self.inner.check_opened()?;
        let result = self
            .inner
            .partition
            .get(key_codec::encode(key))
            .map_err(|err| {
                log::error!("get failed on fjall map '{}': {}", self.inner.name, err);
                to_kv_error(err)
            })?;
        match result {
            Some(bytes) => Ok(Some(FjallValue::from_bytes(&bytes).try_into_value()?)),
            None => Ok(None),
        }
    }

    fn put(&self, key: Key, value: Value) -> KvResult<Option<Value>> {
        self.inner.check_opened()?;
        let previous = self.get(&key)?;
        let encoded_value = FjallValue::try_from_value(&value)?;
        self.inner
            .partition
            .insert(key_codec::encode(&key), encoded_value)
            .map_err(|err| {
                log::error!("put failed on fjall map '{}': {}", self.inner.name, err);
                to_kv_error(err)
            })?;
        Ok(previous)
    }

    fn remove(&self, key: &Key) -> KvResult<Option<Value>> {
        self.inner.check_opened()?;
        let previous = self.get(key)?;
        self.inner
            .partition
            .remove(key_codec::encode(key))
            .map_err(|err| {
                log::error!("remove failed on fjall map '{}': {}", self.inner.name, err);
                to_kv_error(err)
            })?;
        Ok(previous)
    }

    fn size(&self) -> KvResult<u64> {
        self.inner.check_opened()?;
        self.inner
            .partition
            .len()
            .map(|len| len as u64)
            .map_err(|err| {
                log::error!("size failed on fjall map '{}': {}", self.inner.name, err);
                to_kv_error(err)
            })
    }

    fn clear(&self) -> KvResult<()> {
        self.inner.check_opened()?;
        for result in self.inner.partition.range::<Vec<u8>, _>(..) {
            let (key, _) = result.map_err(to_kv_error)?;
            self.inner.partition.remove(&*key).map_err(|err| {
                log::error!("clear failed on fjall map '{}': {}", self.inner.name, err);
                to_kv_error(err)
            })?;
        }
        Ok(())
    }

    fn first_entry(&self) -> KvResult<Option<(Key, Value)>> {
        self.inner.check_opened()?;
        self.inner.probe_front((Unbounded, Unbounded))
    }

    fn last_entry(&self) -> KvResult<Option<(Key, Value)>> {
        self.inner.check_opened()?;
        self.inner.probe_back((Unbounded, Unbounded))
    }

    fn ceiling_entry(&self, key: &Key) -> KvResult<Option<(Key, Value)>> {
        self.inner.check_opened()?;
        self.inner
            .probe_front((Included(key_codec::encode(key)), Unbounded))
    }

    fn higher_entry(&self, key: &Key) -> KvResult<Option<(Key, Value)>> {
        self.inner.check_opened()?;
        self.inner
            .probe_front((Excluded(key_codec::encode(key)), Unbounded))
    }

    fn floor_entry(&self, key: &Key) -> KvResult<Option<(Key, Value)>> {
        self.inner.check_opened()?;
        self.inner
            .probe_back((Unbounded, Included(key_codec::encode(key))))
    }

    fn lower_entry(&self, key: &Key) -> KvResult<Option<(Key, Value)>> {
        self.inner.check_opened()?;
        self.inner
            .probe_back((Unbounded, Excluded(key_codec::encode(key))))
    }

    /// Serves abstract range scans in the partition's native form: the range
    /// goes through [`FjallRangeTranslator`] once, and the cursor walks the
    /// resulting byte bounds directly instead of re-encoding a key per
    /// navigation probe.
    fn native_scan(&self, range: &KeyRange) -> KvResult<Option<EntryCursor>> {
        self.inner.check_opened()?;
        let bounds = FjallRangeTranslator.to_native(Range::Abstract(range.clone()))?;
        Ok(Some(EntryCursor::new(FjallRangeCursor {
            inner: Arc::clone(&self.inner),
            bounds,
            position: None,
            done: false,
        })))
    }
}
