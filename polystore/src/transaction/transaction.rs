use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use uuid::Uuid;

use crate::common::{key_codec, Key, Value};
use crate::errors::{ErrorKind, KvError, KvResult};
use crate::index::PRIMARY_INDEX;
use crate::range::Range;
use crate::store::iters::EntryCursor;
use crate::store::{Map, Store};
use crate::transaction::cursor::{IndexOverlayCursor, PrimaryOverlayCursor, QueryCursor};
use crate::transaction::overlay::{Overlay, StagedEntry};
use crate::transaction::{QueryOp, TransactionState};

struct TransactionInner {
    id: Uuid,
    store: Store,
    primary: Map,
    state: RwLock<TransactionState>,
    overlay: Mutex<Overlay>,
    // committed version of each written key when this transaction first
    // touched it; validated at commit
    first_versions: Mutex<HashMap<Key, u64>>,
}

/// An isolated unit of work against a [`Store`].
///
/// # Purpose
/// A transaction buffers writes in a private overlay and exposes a
/// consistent view: reads and queries see the committed state with the
/// transaction's own staged changes layered on top (read-your-own-writes),
/// and never see other transactions' uncommitted work.
///
/// # Lifecycle
/// Created via [`Store::begin_transaction`]. The transaction is `Active`
/// until [`commit`](Transaction::commit) or
/// [`abort`](Transaction::abort) moves it to a terminal state; every
/// operation on a terminal transaction fails with
/// `ErrorKind::InvalidState`.
///
/// # Concurrency
/// Conflict handling is optimistic. Writes record the committed version of
/// each touched key at first touch; commit re-validates those versions
/// under the store's commit lock and reports a conflict by returning
/// `Ok(false)` — a retryable outcome, not an error. Of two transactions
/// racing conflicting writes, at most one commits successfully.
#[derive(Clone)]
pub struct Transaction {
    inner: Arc<TransactionInner>,
}

impl std::fmt::Debug for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("id", &self.inner.id)
            .finish_non_exhaustive()
    }
}

impl Transaction {
    pub(crate) fn new(store: Store) -> KvResult<Self> {
        let primary = store.primary()?;
        let id = Uuid::new_v4();
        log::debug!("transaction {} started", id);
        Ok(Transaction {
            inner: Arc::new(TransactionInner {
                id,
                store,
                primary,
                state: RwLock::new(TransactionState::Active),
                overlay: Mutex::new(Overlay::new()),
                first_versions: Mutex::new(HashMap::new()),
            }),
        })
    }

    /// Returns the unique id of this transaction.
    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    /// Returns the current lifecycle state.
    pub fn state(&self) -> TransactionState {
        *self.inner.state.read()
    }

    /// Retrieves the value of a key as seen by this transaction.
    ///
    /// A staged put is returned in place of the committed value; a staged
    /// remove hides the committed value.
    pub fn get(&self, key: &Key) -> KvResult<Option<Value>> {
        self.check_active()?;
        let overlay = self.inner.overlay.lock();
        match overlay.effect(key) {
            Some(StagedEntry::Put(value)) => Ok(Some(value.clone())),
            Some(StagedEntry::Removed) => Ok(None),
            None => self.inner.primary.get(key),
        }
    }

    /// Stages a put of `key` to `value`.
    ///
    /// Not visible outside this transaction until commit.
    pub fn put(&self, key: impl Into<Key>, value: impl Into<Value>) -> KvResult<()> {
        self.check_active()?;
        let key = key.into();
        self.record_first_version(&key);
        self.inner.overlay.lock().stage_put(key, value.into());
        Ok(())
    }

    /// Stages a removal of `key`.
    ///
    /// Shadows any earlier staged put of the same key. Removing a key that
    /// does not exist is not an error; the tombstone simply has no effect
    /// at commit.
    pub fn remove(&self, key: impl Into<Key>) -> KvResult<()> {
        self.check_active()?;
        let key = key.into();
        self.record_first_version(&key);
        self.inner.overlay.lock().stage_remove(key);
        Ok(())
    }

    /// Runs a range query against the named index, `"primary"` addressing
    /// the primary keyspace itself.
    ///
    /// Returns a lazy ascending cursor over the transaction's view:
    /// committed entries merged with this transaction's staged changes,
    /// staged side winning. The staged state is snapshotted when the cursor
    /// is created; the committed side is probed lazily.
    ///
    /// # Errors
    /// * `ErrorKind::UnknownIndex` if `index` is not defined
    /// * `ErrorKind::InvalidRange` if `op` carries inverted bounds
    /// * `ErrorKind::InvalidState` if the transaction is terminal
    pub fn query(&self, index: &str, op: QueryOp) -> KvResult<QueryCursor> {
        self.check_active()?;
        let range = op.to_range()?;
        let staged = self.inner.overlay.lock().snapshot();

        if index == PRIMARY_INDEX {
            let committed = self.inner.primary.range(Range::Abstract(range.clone()))?;
            return Ok(EntryCursor::new(PrimaryOverlayCursor::new(
                committed, staged, &range,
            )));
        }

        let descriptor = self.inner.store.index_descriptor(index)?;
        let index_map = self.inner.store.index_map(&descriptor)?;
        let committed = index_map.range(Range::Abstract(range.clone()))?;
        Ok(EntryCursor::new(IndexOverlayCursor::new(
            self.inner.primary.clone(),
            descriptor,
            staged,
            committed,
            &range,
        )))
    }

    /// Attempts to commit this transaction.
    ///
    /// Under the store's commit lock, the committed version of every
    /// written key is compared against the version recorded at first
    /// touch. If any differ another transaction won the race:
    /// `Ok(false)` is returned, nothing is applied, and the transaction
    /// ends `Aborted`. Otherwise all staged changes are applied to the
    /// primary map, every defined index is maintained, versions are
    /// bumped, the backend is flushed, and `Ok(true)` is returned with the
    /// transaction ending `Committed`.
    ///
    /// # Errors
    /// `ErrorKind::InvalidState` if the transaction is already terminal.
    /// Backend failures during apply propagate and leave the transaction
    /// `Aborted`.
    pub fn commit(&self) -> KvResult<bool> {
        let mut state = self.inner.state.write();
        if *state != TransactionState::Active {
            return Err(self.terminal_error(*state));
        }

        let _guard = self.inner.store.commit_lock().lock();

        // validate first-observed versions
        {
            let first_versions = self.inner.first_versions.lock();
            for (key, first_version) in first_versions.iter() {
                let current = self.inner.store.key_version(key);
                if current != *first_version {
                    log::debug!(
                        "transaction {} conflicts on key {} (observed v{}, now v{})",
                        self.inner.id,
                        key,
                        first_version,
                        current
                    );
                    *state = TransactionState::Aborted;
                    return Ok(false);
                }
            }
        }

        if let Err(e) = self.apply() {
            *state = TransactionState::Aborted;
            return Err(KvError::new_with_cause(
                &format!("transaction {} failed to apply", self.inner.id),
                ErrorKind::BackendError,
                e,
            ));
        }

        *state = TransactionState::Committed;
        log::debug!("transaction {} committed", self.inner.id);
        Ok(true)
    }

    /// Aborts this transaction and discards all staged changes.
    ///
    /// # Errors
    /// `ErrorKind::InvalidState` if the transaction is already terminal.
    pub fn abort(&self) -> KvResult<()> {
        let mut state = self.inner.state.write();
        if *state != TransactionState::Active {
            return Err(self.terminal_error(*state));
        }
        self.inner.overlay.lock().clear();
        self.inner.first_versions.lock().clear();
        *state = TransactionState::Aborted;
        log::debug!("transaction {} aborted", self.inner.id);
        Ok(())
    }

    fn apply(&self) -> KvResult<()> {
        let staged = self.inner.overlay.lock().snapshot();
        if staged.is_empty() {
            return Ok(());
        }
        let indexes = self.inner.store.index_descriptors();

        for (key, entry) in staged {
            let previous = match &entry {
                StagedEntry::Put(value) => {
                    self.inner.primary.put(key.clone(), value.clone())?
                }
                StagedEntry::Removed => self.inner.primary.remove(&key)?,
            };

            for descriptor in &indexes {
                let index_map = self.inner.store.index_map(descriptor)?;
                let encoded = Value::Bytes(key_codec::encode(&key));

                // drop the stale association, but only if it still points
                // at this primary key
                if let Some(previous) = &previous {
                    if let Some(old_index_key) = descriptor.extract(&key, previous) {
                        if index_map.get(&old_index_key)? == Some(encoded.clone()) {
                            index_map.remove(&old_index_key)?;
                        }
                    }
                }
                if let StagedEntry::Put(value) = &entry {
                    if let Some(index_key) = descriptor.extract(&key, value) {
                        index_map.put(index_key, encoded)?;
                    }
                }
            }

            self.inner.store.bump_version(&key);
        }
        self.inner.store.flush()
    }

    fn record_first_version(&self, key: &Key) {
        let mut first_versions = self.inner.first_versions.lock();
        if !first_versions.contains_key(key) {
            first_versions.insert(key.clone(), self.inner.store.key_version(key));
        }
    }

    fn check_active(&self) -> KvResult<()> {
        let state = *self.inner.state.read();
        if state != TransactionState::Active {
            return Err(self.terminal_error(state));
        }
        Ok(())
    }

    fn terminal_error(&self, state: TransactionState) -> KvError {
        KvError::new(
            &format!(
                "transaction {} is {:?} and cannot accept further operations",
                self.inner.id, state
            ),
            ErrorKind::InvalidState,
        )
    }
}
