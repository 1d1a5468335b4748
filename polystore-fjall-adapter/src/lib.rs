//! # Polystore Fjall Adapter
//!
//! Persistent storage backend for polystore built on the
//! [Fjall](https://github.com/fjall-rs/fjall) LSM engine.
//!
//! Each polystore map is stored in its own partition. Keys are written in
//! polystore's order-preserving encoding, so partition byte order matches
//! abstract key order and ranged queries translate directly to partition
//! range scans. Values are bincode-serialized.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use polystore::store::Store;
//! use polystore_fjall_adapter::{FjallConfig, FjallStore};
//!
//! let config = FjallConfig::new().with_db_path("/var/data/mydb");
//! let store = Store::new(FjallStore::new(config));
//!
//! let tx = store.begin_transaction()?;
//! tx.put("key", "value")?;
//! tx.commit()?;
//! store.close()?;
//! ```

pub mod config;
pub mod map;
pub mod store;
pub mod translator;
pub mod wrapper;

pub use config::FjallConfig;
pub use map::FjallMap;
pub use store::FjallStore;
pub use translator::{ByteBounds, FjallRangeTranslator};
pub use wrapper::{FjallValue, FjallValueError};
