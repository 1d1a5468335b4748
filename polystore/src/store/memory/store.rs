use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;

use crate::errors::{ErrorKind, KvError, KvResult};
use crate::store::memory::map::InMemoryMap;
use crate::store::store::StoreProvider;
use crate::store::Map;

/// Volatile store backend keeping all maps in process memory.
///
/// Useful as the zero-setup backend for tests and as the baseline in
/// benchmark comparisons. Data does not survive the process; `flush` is a
/// no-op.
pub struct InMemoryStoreProvider {
    maps: DashMap<String, Map>,
    closed: AtomicBool,
}

impl InMemoryStoreProvider {
    pub fn new() -> Self {
        InMemoryStoreProvider {
            maps: DashMap::new(),
            closed: AtomicBool::new(false),
        }
    }

    fn check_opened(&self) -> KvResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            log::error!("operation attempted on a closed in-memory store");
            return Err(KvError::new("store is closed", ErrorKind::StoreClosed));
        }
        Ok(())
    }
}

impl Default for InMemoryStoreProvider {
    fn default() -> Self {
        InMemoryStoreProvider::new()
    }
}

impl StoreProvider for InMemoryStoreProvider {
    fn open_or_create(&self, name: &str) -> KvResult<Map> {
        self.check_opened()?;
        let map = self
            .maps
            .entry(name.to_string())
            .or_insert_with(|| Map::new(InMemoryMap::new(name)));
        Ok(map.clone())
    }

    fn has_map(&self, name: &str) -> KvResult<bool> {
        self.check_opened()?;
        Ok(self.maps.contains_key(name))
    }

    fn remove_map(&self, name: &str) -> KvResult<()> {
        self.check_opened()?;
        self.maps.remove(name);
        Ok(())
    }

    fn flush(&self) -> KvResult<()> {
        self.check_opened()
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn close(&self) -> KvResult<()> {
        self.closed.store(true, Ordering::SeqCst);
        self.maps.clear();
        Ok(())
    }

    fn store_version(&self) -> String {
        env!("CARGO_PKG_VERSION").to_string()
    }

    fn backend_name(&self) -> String {
        "in-memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{Key, Value};

    #[test]
    fn test_open_or_create_returns_shared_map() {
        let provider = InMemoryStoreProvider::new();
        let a = provider.open_or_create("m").unwrap();
        a.put(Key::Integer(1), Value::Integer(1)).unwrap();
        let b = provider.open_or_create("m").unwrap();
        assert_eq!(b.get(&Key::Integer(1)).unwrap(), Some(Value::Integer(1)));
    }

    #[test]
    fn test_has_and_remove_map() {
        let provider = InMemoryStoreProvider::new();
        assert!(!provider.has_map("m").unwrap());
        provider.open_or_create("m").unwrap();
        assert!(provider.has_map("m").unwrap());
        provider.remove_map("m").unwrap();
        assert!(!provider.has_map("m").unwrap());
    }

    #[test]
    fn test_close_rejects_further_operations() {
        let provider = InMemoryStoreProvider::new();
        provider.open_or_create("m").unwrap();
        provider.close().unwrap();
        assert!(provider.is_closed());
        let err = provider.open_or_create("m").unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::StoreClosed);
        let err = provider.flush().unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::StoreClosed);
    }
}
