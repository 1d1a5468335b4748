//! # Polystore - Transactional Key-Value Abstraction
//!
//! Polystore is a backend-agnostic transactional key-value layer with a
//! pluggable benchmark harness. It gives every storage backend the same
//! semantics for ranged queries, optimistic transactions, and secondary
//! indexes, so workloads written once run identically against the bundled
//! in-memory backend or a persistent adapter.
//!
//! ## Key Features
//!
//! - **Abstract Key Ranges**: [`KeyRange`](range::KeyRange) describes spans
//!   of keys independently of any engine; per-backend
//!   [`RangeTranslator`](range::RangeTranslator)s map them to native forms
//! - **Transactions**: optimistic, overlay-based transactions with
//!   read-your-own-writes and conflict detection at commit
//! - **Secondary Indexes**: extractor-function indexes maintained at commit
//!   and queryable inside transactions
//! - **Benchmark Harness**: a matrix runner with per-cell failure isolation
//!   and pluggable result sinks
//! - **Pluggable Backends**: implement
//!   [`StoreProvider`](store::StoreProvider) and
//!   [`MapProvider`](store::MapProvider) to add an engine
//!
//! ## Quick Start
//!
//! ```rust
//! use polystore::store::memory::InMemoryStoreProvider;
//! use polystore::store::Store;
//! use polystore::transaction::QueryOp;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Store::new(InMemoryStoreProvider::new());
//!
//! let tx = store.begin_transaction()?;
//! tx.put("user:1", "alice")?;
//! tx.put("user:2", "bob")?;
//! assert!(tx.commit()?);
//!
//! let tx = store.begin_transaction()?;
//! for entry in tx.query("primary", QueryOp::GreaterOrEqual("user:1".into()))? {
//!     let (key, value) = entry?;
//!     println!("{key} -> {value:?}");
//! }
//! tx.abort()?;
//!
//! store.close()?;
//! # Ok(())
//! # }
//! ```

pub mod bench;
pub mod common;
pub mod errors;
pub mod index;
pub mod range;
pub mod store;
pub mod transaction;

pub use common::{Key, Value};
pub use errors::{ErrorKind, KvError, KvResult};
pub use index::{IndexDescriptor, KeyExtractor, PRIMARY_INDEX};
pub use range::{KeyRange, Range, RangeTranslator};
pub use store::{Map, MapProvider, Store, StoreProvider};
pub use transaction::{QueryOp, Transaction, TransactionState};
