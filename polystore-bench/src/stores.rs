//! Store factory functions for benchmarks

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use polystore::bench::StoreFactory;
use polystore::store::memory::InMemoryStoreProvider;
use polystore::store::Store;
use polystore_fjall_adapter::{FjallConfig, FjallStore};
use uuid::Uuid;

/// Counter for unique database paths within a run
static DB_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Get the test-data directory path at the project root
fn get_test_data_dir() -> PathBuf {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(manifest_dir)
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
        .join("test-data")
}

/// Create a unique database path within the test-data directory
fn create_unique_db_path() -> PathBuf {
    let test_data_dir = get_test_data_dir();
    std::fs::create_dir_all(&test_data_dir).ok();

    let counter = DB_COUNTER.fetch_add(1, Ordering::SeqCst);
    let unique_id = Uuid::new_v4();
    test_data_dir.join(format!("bench_{}_{}", counter, unique_id))
}

/// Clean up all benchmark data in the test-data directory
pub fn cleanup_all_bench_data() {
    let test_data_dir = get_test_data_dir();
    if test_data_dir.exists() {
        if let Ok(entries) = std::fs::read_dir(&test_data_dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_dir() {
                    let _ = std::fs::remove_dir_all(&path);
                } else {
                    let _ = std::fs::remove_file(&path);
                }
            }
        }
    }
}

/// Factory opening fresh in-memory stores.
pub fn memory_store_factory() -> StoreFactory {
    StoreFactory::new("memory", || Ok(Store::new(InMemoryStoreProvider::new())))
}

/// Factory opening fresh fjall stores, each in its own unique directory
/// under test-data. Directories are reclaimed by
/// [`cleanup_all_bench_data`] at the end of a run.
pub fn fjall_store_factory() -> StoreFactory {
    StoreFactory::new("fjall", || {
        let path = create_unique_db_path();
        let config = FjallConfig::new()
            .with_db_path(&path.to_string_lossy())
            .with_persist_on_commit(false);
        Ok(Store::new(FjallStore::new(config)))
    })
}
