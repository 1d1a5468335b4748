use fjall::{Config, PartitionCreateOptions};

/// Fjall database configuration.
///
/// A small builder over the Fjall tuning parameters the adapter exposes.
/// Defaults are suitable for typical workloads; only `db_path` usually
/// needs setting.
///
/// Usage: create via `FjallConfig::new()`, chain builder methods, then pass
/// to [`FjallStore::new`](crate::store::FjallStore::new).
#[derive(Debug, Clone)]
pub struct FjallConfig {
    db_path: String,
    persist_on_commit: bool,
    cache_size_bytes: u64,
    max_write_buffer_size: u64,
}

impl FjallConfig {
    /// Creates a configuration with default values:
    /// - db path: `./polystore-db`
    /// - persist on commit: true (fsync on every store flush)
    /// - cache: 64 MB
    /// - write buffer: 128 MB
    pub fn new() -> FjallConfig {
        FjallConfig {
            db_path: "./polystore-db".to_string(),
            persist_on_commit: true,
            cache_size_bytes: 64 * 1024 * 1024,
            max_write_buffer_size: 128 * 1024 * 1024,
        }
    }

    /// Sets the directory the keyspace lives in.
    pub fn with_db_path(mut self, db_path: &str) -> Self {
        self.db_path = db_path.to_string();
        self
    }

    /// Controls whether a store flush syncs to disk (`true`) or only
    /// writes to the OS buffer (`false`).
    pub fn with_persist_on_commit(mut self, persist: bool) -> Self {
        self.persist_on_commit = persist;
        self
    }

    pub fn with_cache_size(mut self, bytes: u64) -> Self {
        self.cache_size_bytes = bytes;
        self
    }

    pub fn with_max_write_buffer_size(mut self, bytes: u64) -> Self {
        self.max_write_buffer_size = bytes;
        self
    }

    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    pub fn persist_on_commit(&self) -> bool {
        self.persist_on_commit
    }

    /// Builds the Fjall keyspace configuration from this config.
    pub(crate) fn keyspace_config(&self) -> Config {
        Config::new(&self.db_path)
            .cache_size(self.cache_size_bytes)
            .max_write_buffer_size(self.max_write_buffer_size)
    }

    /// Builds the partition options used for every map.
    pub(crate) fn partition_config(&self) -> PartitionCreateOptions {
        PartitionCreateOptions::default()
    }
}

impl Default for FjallConfig {
    fn default() -> Self {
        FjallConfig::new()
    }
}
