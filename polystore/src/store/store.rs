use std::collections::HashMap;
use std::ops::Deref;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};

use crate::common::{key_codec, Key, Value};
use crate::errors::{ErrorKind, KvError, KvResult};
use crate::index::{validate_index_name, IndexDescriptor, KeyExtractor, PRIMARY_INDEX};
use crate::range::{KeyRange, Range};
use crate::store::Map;
use crate::transaction::Transaction;

/// The name of the primary keyspace map inside a store.
pub const PRIMARY_MAP: &str = "primary";

/// Low-level interface for store backends.
///
/// # Purpose
/// Defines the contract that all storage backends must implement. A store
/// provider owns a set of named maps and the backend's lifecycle; everything
/// above it (transactions, indexes, version tracking) is backend-agnostic
/// and lives in [`Store`].
///
/// # Implementations
/// - `InMemoryStoreProvider`: volatile skip-list backed storage
/// - `FjallStoreProvider` (adapter crate): persistent LSM storage
///
/// # Thread Safety
/// Implementers must be `Send + Sync` for safe use in concurrent contexts.
pub trait StoreProvider: Send + Sync {
    /// Opens the named map, creating it if it does not exist.
    fn open_or_create(&self, name: &str) -> KvResult<Map>;

    /// Checks whether a map with the given name exists.
    fn has_map(&self, name: &str) -> KvResult<bool>;

    /// Removes the named map and all of its data.
    fn remove_map(&self, name: &str) -> KvResult<()>;

    /// Flushes pending writes to durable storage.
    ///
    /// A no-op for purely volatile backends.
    fn flush(&self) -> KvResult<()>;

    /// Checks if the store has been closed.
    fn is_closed(&self) -> bool;

    /// Closes the store and releases backend resources.
    fn close(&self) -> KvResult<()>;

    /// Returns the backend version string.
    fn store_version(&self) -> String;

    /// Returns the backend name, e.g. `"in-memory"` or `"fjall"`.
    fn backend_name(&self) -> String;
}

struct StoreInner {
    provider: Arc<dyn StoreProvider>,
    // serializes commit validation and apply across transactions
    commit_lock: Mutex<()>,
    // per-key committed version, bumped on every applied write
    versions: DashMap<Key, u64>,
    indexes: RwLock<HashMap<String, IndexDescriptor>>,
}

/// A facade over a [`StoreProvider`] with the backend-agnostic
/// coordination state layered on top.
///
/// # Purpose
/// `Store` is the handle applications hold. Beyond forwarding provider
/// operations it owns:
///
/// - the primary keyspace ([`Store::primary`])
/// - the secondary index registry ([`Store::define_index`])
/// - transaction creation ([`Store::begin_transaction`]) and the optimistic
///   commit coordination state (commit lock + per-key version registry)
///
/// Clones share all state through the inner `Arc`.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

impl Store {
    /// Creates a store facade over the given provider.
    pub fn new<T: StoreProvider + 'static>(provider: T) -> Self {
        Store {
            inner: Arc::new(StoreInner {
                provider: Arc::new(provider),
                commit_lock: Mutex::new(()),
                versions: DashMap::new(),
                indexes: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Opens the primary keyspace map.
    pub fn primary(&self) -> KvResult<Map> {
        self.check_opened()?;
        self.inner.provider.open_or_create(PRIMARY_MAP)
    }

    /// Begins a new transaction over this store.
    pub fn begin_transaction(&self) -> KvResult<Transaction> {
        self.check_opened()?;
        Transaction::new(self.clone())
    }

    /// Defines a secondary index over the primary keyspace.
    ///
    /// The extractor derives at most one index key per primary entry;
    /// entries for which it returns `None` are excluded. Existing primary
    /// data is backfilled immediately. Redefining an existing index name
    /// fails with `ErrorKind::InvalidOperation`.
    pub fn define_index(&self, name: &str, extractor: KeyExtractor) -> KvResult<()> {
        self.check_opened()?;
        validate_index_name(name)?;

        // held through the duplicate check, backfill, and registration:
        // a commit's apply either completes before the backfill scan or
        // starts after the descriptor is registered, so no committed entry
        // can miss the index. It also serializes concurrent definitions of
        // the same name.
        let _guard = self.inner.commit_lock.lock();
        {
            let indexes = self.inner.indexes.read();
            if indexes.contains_key(name) {
                return Err(KvError::new(
                    &format!("index '{}' is already defined", name),
                    ErrorKind::InvalidOperation,
                ));
            }
        }

        let descriptor = IndexDescriptor::new(name, extractor);
        let index_map = self.inner.provider.open_or_create(descriptor.map_name())?;

        // backfill from existing primary data
        let primary = self.primary()?;
        let cursor = primary.range(Range::Abstract(KeyRange::all()))?;
        for entry in cursor {
            let (key, value) = entry?;
            if let Some(index_key) = descriptor.extract(&key, &value) {
                index_map.put(index_key, Value::Bytes(key_codec::encode(&key)))?;
            }
        }

        log::debug!("defined index '{}' on store", name);
        self.inner.indexes.write().insert(name.to_string(), descriptor);
        Ok(())
    }

    /// Checks whether an index with the given name is defined.
    ///
    /// The reserved name `"primary"` is always defined.
    pub fn has_index(&self, name: &str) -> bool {
        name == PRIMARY_INDEX || self.inner.indexes.read().contains_key(name)
    }

    /// Looks up a defined index descriptor.
    pub(crate) fn index_descriptor(&self, name: &str) -> KvResult<IndexDescriptor> {
        self.inner.indexes.read().get(name).cloned().ok_or_else(|| {
            KvError::new(
                &format!("unknown index: '{}'", name),
                ErrorKind::UnknownIndex,
            )
        })
    }

    /// Opens the backing map of a defined index.
    pub(crate) fn index_map(&self, descriptor: &IndexDescriptor) -> KvResult<Map> {
        self.inner.provider.open_or_create(descriptor.map_name())
    }

    /// Returns all currently defined index descriptors.
    pub(crate) fn index_descriptors(&self) -> Vec<IndexDescriptor> {
        self.inner.indexes.read().values().cloned().collect()
    }

    /// The lock serializing transaction commits against this store.
    pub(crate) fn commit_lock(&self) -> &Mutex<()> {
        &self.inner.commit_lock
    }

    /// Returns the committed version of a key (0 if never written).
    pub(crate) fn key_version(&self, key: &Key) -> u64 {
        self.inner.versions.get(key).map(|v| *v).unwrap_or(0)
    }

    /// Bumps the committed version of a key after an applied write.
    pub(crate) fn bump_version(&self, key: &Key) {
        *self.inner.versions.entry(key.clone()).or_insert(0) += 1;
    }

    fn check_opened(&self) -> KvResult<()> {
        if self.inner.provider.is_closed() {
            log::error!("operation attempted on a closed store");
            return Err(KvError::new("store is closed", ErrorKind::StoreClosed));
        }
        Ok(())
    }
}

impl Deref for Store {
    type Target = dyn StoreProvider;

    fn deref(&self) -> &Self::Target {
        self.inner.provider.as_ref()
    }
}
