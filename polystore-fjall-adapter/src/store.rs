use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use fjall::{Keyspace, PersistMode};
use parking_lot::Mutex;
use polystore::errors::{ErrorKind, KvError, KvResult};
use polystore::store::{Map, StoreProvider};

use crate::config::FjallConfig;
use crate::map::FjallMap;
use crate::wrapper::to_kv_error;

/// Fjall-based store implementation.
///
/// A persistent store backend over the Fjall LSM engine. Each map lives in
/// its own partition inside one keyspace; the keyspace is opened lazily on
/// first map access. Cheaply cloneable via the inner `Arc`; all clones
/// share the keyspace and the open-map registry.
///
/// Usage: `Store::new(FjallStore::new(config))`.
#[derive(Clone)]
pub struct FjallStore {
    inner: Arc<FjallStoreInner>,
}

impl FjallStore {
    pub fn new(config: FjallConfig) -> FjallStore {
        FjallStore {
            inner: Arc::new(FjallStoreInner {
                keyspace: OnceLock::new(),
                init_lock: Mutex::new(()),
                closed: AtomicBool::new(false),
                config,
                map_registry: DashMap::new(),
            }),
        }
    }
}

struct FjallStoreInner {
    keyspace: OnceLock<Keyspace>,
    // serializes lazy keyspace initialization
    init_lock: Mutex<()>,
    closed: AtomicBool,
    config: FjallConfig,
    map_registry: DashMap<String, FjallMap>,
}

impl FjallStoreInner {
    fn check_opened(&self) -> KvResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            log::error!("operation attempted on a closed fjall store");
            return Err(KvError::new("store is closed", ErrorKind::StoreClosed));
        }
        Ok(())
    }

    fn keyspace(&self) -> KvResult<Keyspace> {
        if let Some(ks) = self.keyspace.get() {
            return Ok(ks.clone());
        }
        let _guard = self.init_lock.lock();
        if let Some(ks) = self.keyspace.get() {
            return Ok(ks.clone());
        }
        let keyspace = Keyspace::open(self.config.keyspace_config()).map_err(|err| {
            log::error!("failed to open fjall keyspace: {}", err);
            to_kv_error(err)
        })?;
        let _ = self.keyspace.set(keyspace.clone());
        Ok(keyspace)
    }
}

/// Fjall partition names only allow a restricted character set; map names
/// arriving here are validated rather than re-encoded, since the core layer
/// already constrains index map names.
fn validate_partition_name(name: &str) -> KvResult<()> {
    let valid = !name.is_empty()
        && name.chars().all(|c| {
            c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '#' | '$')
        });
    if !valid {
        return Err(KvError::new(
            &format!("'{}' is not a valid fjall partition name", name),
            ErrorKind::InvalidOperation,
        ));
    }
    Ok(())
}

impl StoreProvider for FjallStore {
    fn open_or_create(&self, name: &str) -> KvResult<Map> {
        self.inner.check_opened()?;
        validate_partition_name(name)?;

        if let Some(map) = self.inner.map_registry.get(name) {
            return Ok(Map::new(map.clone()));
        }

        let keyspace = self.inner.keyspace()?;
        let partition = keyspace
            .open_partition(name, self.inner.config.partition_config())
            .map_err(|err| {
                log::error!("failed to open partition '{}': {}", name, err);
                to_kv_error(err)
            })?;
        let map = FjallMap::new(name.to_string(), partition);
        self.inner.map_registry.insert(name.to_string(), map.clone());
        Ok(Map::new(map))
    }

    fn has_map(&self, name: &str) -> KvResult<bool> {
        self.inner.check_opened()?;
        match self.inner.keyspace.get() {
            Some(keyspace) => Ok(keyspace.partition_exists(name)),
            None => Ok(false),
        }
    }

    fn remove_map(&self, name: &str) -> KvResult<()> {
        self.inner.check_opened()?;
        if let Some((_, map)) = self.inner.map_registry.remove(name) {
            map.mark_closed();
        }
        let keyspace = self.inner.keyspace()?;
        if keyspace.partition_exists(name) {
            let partition = keyspace
                .open_partition(name, self.inner.config.partition_config())
                .map_err(to_kv_error)?;
            keyspace.delete_partition(partition).map_err(|err| {
                log::error!("failed to delete partition '{}': {}", name, err);
                to_kv_error(err)
            })?;
        }
        Ok(())
    }

    fn flush(&self) -> KvResult<()> {
        self.inner.check_opened()?;
        if let Some(keyspace) = self.inner.keyspace.get() {
            let mode = if self.inner.config.persist_on_commit() {
                PersistMode::SyncAll
            } else {
                PersistMode::Buffer
            };
            keyspace.persist(mode).map_err(|err| {
                log::error!("failed to persist fjall keyspace: {}", err);
                to_kv_error(err)
            })?;
        }
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    fn close(&self) -> KvResult<()> {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        for map in self.inner.map_registry.iter() {
            map.mark_closed();
        }
        self.inner.map_registry.clear();
        if let Some(keyspace) = self.inner.keyspace.get() {
            keyspace.persist(PersistMode::SyncAll).map_err(|err| {
                log::error!("failed to persist fjall keyspace on close: {}", err);
                to_kv_error(err)
            })?;
        }
        Ok(())
    }

    fn store_version(&self) -> String {
        env!("CARGO_PKG_VERSION").to_string()
    }

    fn backend_name(&self) -> String {
        "fjall".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polystore::common::{Key, Value};
    use polystore::range::KeyRange;
    use polystore::store::Store;
    use polystore::transaction::QueryOp;
    use polystore::Range;
    use std::path::PathBuf;
    use uuid::Uuid;

    #[ctor::ctor]
    fn init() {
        colog::init();
    }

    struct TempDb {
        path: PathBuf,
    }

    impl TempDb {
        fn new() -> Self {
            let path =
                std::env::temp_dir().join(format!("polystore-fjall-test-{}", Uuid::new_v4()));
            TempDb { path }
        }

        fn config(&self) -> FjallConfig {
            FjallConfig::new().with_db_path(self.path.to_str().unwrap())
        }
    }

    impl Drop for TempDb {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.path);
        }
    }

    #[test]
    fn test_open_map_put_get_remove() {
        let db = TempDb::new();
        let store = FjallStore::new(db.config());
        let map = store.open_or_create("primary").unwrap();

        assert_eq!(map.put(Key::Integer(1), Value::Integer(10)).unwrap(), None);
        assert_eq!(
            map.put(Key::Integer(1), Value::Integer(11)).unwrap(),
            Some(Value::Integer(10))
        );
        assert_eq!(map.get(&Key::Integer(1)).unwrap(), Some(Value::Integer(11)));
        assert!(map.contains_key(&Key::Integer(1)).unwrap());
        assert_eq!(
            map.remove(&Key::Integer(1)).unwrap(),
            Some(Value::Integer(11))
        );
        assert_eq!(map.get(&Key::Integer(1)).unwrap(), None);
        store.close().unwrap();
    }

    #[test]
    fn test_navigation_follows_key_order() {
        let db = TempDb::new();
        let store = FjallStore::new(db.config());
        let map = store.open_or_create("primary").unwrap();
        for i in [-5i64, 0, 5] {
            map.put(Key::Integer(i), Value::Integer(i)).unwrap();
        }
        map.put(Key::Text("t".into()), Value::Integer(99)).unwrap();

        // negative integers order first, text after all integers
        assert_eq!(map.first_entry().unwrap().unwrap().0, Key::Integer(-5));
        assert_eq!(map.last_entry().unwrap().unwrap().0, Key::Text("t".into()));
        assert_eq!(
            map.ceiling_entry(&Key::Integer(1)).unwrap().unwrap().0,
            Key::Integer(5)
        );
        assert_eq!(
            map.higher_entry(&Key::Integer(5)).unwrap().unwrap().0,
            Key::Text("t".into())
        );
        assert_eq!(
            map.floor_entry(&Key::Integer(-1)).unwrap().unwrap().0,
            Key::Integer(-5)
        );
        store.close().unwrap();
    }

    #[test]
    fn test_range_scan_through_translated_bounds() {
        let db = TempDb::new();
        let store = FjallStore::new(db.config());
        let map = store.open_or_create("primary").unwrap();
        for i in 0..10i64 {
            map.put(Key::Integer(i), Value::Integer(i * 10)).unwrap();
        }

        let range = KeyRange::bound(2i64, 6i64, false, true).unwrap();
        let keys: Vec<Key> = map
            .range(Range::Abstract(range))
            .unwrap()
            .map(|e| e.unwrap().0)
            .collect();
        assert_eq!(
            keys,
            (2..6).map(Key::Integer).collect::<Vec<_>>()
        );
        store.close().unwrap();
    }

    #[test]
    fn test_native_scan_serves_abstract_ranges() {
        let db = TempDb::new();
        let store = FjallStore::new(db.config());
        let map = store.open_or_create("primary").unwrap();
        for i in [-3i64, 0, 4, 8] {
            map.put(Key::Integer(i), Value::Integer(i)).unwrap();
        }
        map.put(Key::Text("t".into()), Value::Integer(99)).unwrap();

        // the provider answers abstract ranges itself, in byte-bound form
        let ranges = vec![
            KeyRange::all(),
            KeyRange::only(4i64),
            KeyRange::lower_bound(0i64, true),
            KeyRange::upper_bound(4i64, false),
            KeyRange::bound(-3i64, 8i64, true, true).unwrap(),
        ];
        for range in ranges {
            let cursor = map
                .native_scan(&range)
                .unwrap()
                .expect("fjall maps answer native scans");
            let scanned: Vec<Key> = cursor.map(|e| e.unwrap().0).collect();
            let expected: Vec<Key> = map
                .range(Range::Abstract(KeyRange::all()))
                .unwrap()
                .map(|e| e.unwrap().0)
                .filter(|k| range.contains(k))
                .collect();
            assert_eq!(scanned, expected, "disagreement for {:?}", range);
        }
        store.close().unwrap();
    }

    #[test]
    fn test_native_scan_is_lazy() {
        let db = TempDb::new();
        let store = FjallStore::new(db.config());
        let map = store.open_or_create("primary").unwrap();
        for i in [1i64, 3, 5] {
            map.put(Key::Integer(i), Value::Integer(i)).unwrap();
        }

        let mut cursor = map.range(Range::Abstract(KeyRange::all())).unwrap();
        assert_eq!(cursor.next().unwrap().unwrap().0, Key::Integer(1));
        // an entry written mid-scan past the position is still seen
        map.put(Key::Integer(2), Value::Integer(2)).unwrap();
        assert_eq!(cursor.next().unwrap().unwrap().0, Key::Integer(2));
        assert_eq!(cursor.next().unwrap().unwrap().0, Key::Integer(3));
        store.close().unwrap();
    }

    #[test]
    fn test_transactions_against_fjall_backend() {
        let db = TempDb::new();
        let store = Store::new(FjallStore::new(db.config()));

        let tx = store.begin_transaction().unwrap();
        tx.put("user:1", "alice").unwrap();
        tx.put("user:2", "bob").unwrap();
        assert!(tx.commit().unwrap());

        let tx1 = store.begin_transaction().unwrap();
        let tx2 = store.begin_transaction().unwrap();
        tx1.put("user:1", "carol").unwrap();
        tx2.put("user:1", "dave").unwrap();
        assert!(tx1.commit().unwrap());
        assert!(!tx2.commit().unwrap());

        let tx = store.begin_transaction().unwrap();
        let entries: Vec<(Key, Value)> = tx
            .query("primary", QueryOp::GreaterOrEqual("user:1".into()))
            .unwrap()
            .map(|e| e.unwrap())
            .collect();
        assert_eq!(
            entries,
            vec![
                (Key::from("user:1"), Value::from("carol")),
                (Key::from("user:2"), Value::from("bob")),
            ]
        );
        tx.abort().unwrap();
        store.close().unwrap();
    }

    #[test]
    fn test_has_and_remove_map() {
        let db = TempDb::new();
        let store = FjallStore::new(db.config());
        assert!(!store.has_map("m").unwrap());
        store.open_or_create("m").unwrap();
        assert!(store.has_map("m").unwrap());
        store.remove_map("m").unwrap();
        assert!(!store.has_map("m").unwrap());
        store.close().unwrap();
    }

    #[test]
    fn test_invalid_partition_name_rejected() {
        let db = TempDb::new();
        let store = FjallStore::new(db.config());
        let err = store.open_or_create("bad|name").unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidOperation);
        store.close().unwrap();
    }

    #[test]
    fn test_close_rejects_further_operations() {
        let db = TempDb::new();
        let store = FjallStore::new(db.config());
        store.open_or_create("m").unwrap();
        store.close().unwrap();
        assert!(store.is_closed());
        let err = store.open_or_create("m").unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::StoreClosed);
        // closing twice is harmless
        store.close().unwrap();
    }

    #[test]
    fn test_index_maps_on_fjall() {
        let db = TempDb::new();
        let store = Store::new(FjallStore::new(db.config()));
        store
            .define_index(
                "by-int",
                std::sync::Arc::new(|_k, v| match v {
                    Value::Integer(i) => Some(Key::Integer(*i)),
                    _ => None,
                }),
            )
            .unwrap();

        let tx = store.begin_transaction().unwrap();
        tx.put("a", 7i64).unwrap();
        assert!(tx.commit().unwrap());

        let tx = store.begin_transaction().unwrap();
        let entries: Vec<(Key, Value)> = tx
            .query("by-int", QueryOp::Equals(Key::Integer(7)))
            .unwrap()
            .map(|e| e.unwrap())
            .collect();
        assert_eq!(entries, vec![(Key::Integer(7), Value::Integer(7))]);
        tx.abort().unwrap();
        store.close().unwrap();
    }
}
