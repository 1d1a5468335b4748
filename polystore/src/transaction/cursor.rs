use std::collections::BTreeMap;

use crate::common::{key_codec, Key, Value};
use crate::errors::{ErrorKind, KvError, KvResult};
use crate::index::IndexDescriptor;
use crate::range::KeyRange;
use crate::store::iters::{EntryCursor, EntryCursorProvider};
use crate::store::Map;
use crate::transaction::overlay::StagedEntry;

/// The cursor type returned by transactional queries.
///
/// Yields `(Key, Value)` entries in ascending key order: for the primary
/// keyspace the primary key and its value, for a secondary index the index
/// key and the indexed entry's value. Entries are produced lazily; the
/// committed side is probed one entry per step.
pub type QueryCursor = EntryCursor;

/// Merges the committed primary scan with the transaction's staged changes.
///
/// Both inputs are ascending streams over the same key domain. On equal
/// keys the staged side wins: a staged `Put` replaces the committed value
/// and a tombstone hides the committed entry entirely. Staged keys absent
/// from the committed stream are surfaced in order.
pub(crate) struct PrimaryOverlayCursor {
    committed: EntryCursor,
    committed_peek: Option<(Key, Value)>,
    staged: std::collections::btree_map::IntoIter<Key, StagedEntry>,
    staged_peek: Option<(Key, StagedEntry)>,
    done: bool,
}

impl PrimaryOverlayCursor {
    pub(crate) fn new(committed: EntryCursor, staged: BTreeMap<Key, StagedEntry>, range: &KeyRange) -> Self {
        let in_range: BTreeMap<Key, StagedEntry> = staged
            .into_iter()
            .filter(|(key, _)| range.contains(key))
            .collect();
        PrimaryOverlayCursor {
            committed,
            committed_peek: None,
            staged: in_range.into_iter(),
            staged_peek: None,
            done: false,
        }
    }

    fn fill_committed(&mut self) -> KvResult<()> {
        if self.committed_peek.is_none() {
            match self.committed.next() {
                Some(Ok(entry)) => self.committed_peek = Some(entry),
                Some(Err(e)) => return Err(e),
                None => {}
            }
        }
        Ok(())
    }

    fn fill_staged(&mut self) {
        if self.staged_peek.is_none() {
            self.staged_peek = self.staged.next();
        }
    }
}

impl EntryCursorProvider for PrimaryOverlayCursor {
    fn next_entry(&mut self) -> Option<KvResult<(Key, Value)>> {
        if self.done {
            return None;
        }
        loop {
            if let Err(e) = self.fill_committed() {
                self.done = true;
                return Some(Err(e));
            }
            self.fill_staged();

            match (&self.staged_peek, &self.committed_peek) {
                (None, None) => {
                    self.done = true;
                    return None;
                }
                (Some(_), None) => {
                    let (key, entry) = self.staged_peek.take().unwrap();
                    match entry {
                        StagedEntry::Put(value) => return Some(Ok((key, value))),
                        StagedEntry::Removed => continue,
                    }
                }
                (None, Some(_)) => {
                    return Some(Ok(self.committed_peek.take().unwrap()));
                }
                (Some((staged_key, _)), Some((committed_key, _))) => {
                    match staged_key.cmp(committed_key) {
                        std::cmp::Ordering::Less => {
                            let (key, entry) = self.staged_peek.take().unwrap();
                            match entry {
                                StagedEntry::Put(value) => return Some(Ok((key, value))),
                                StagedEntry::Removed => continue,
                            }
                        }
                        std::cmp::Ordering::Greater => {
                            return Some(Ok(self.committed_peek.take().unwrap()));
                        }
                        std::cmp::Ordering::Equal => {
                            // staged side wins; committed entry is consumed
                            self.committed_peek = None;
                            let (key, entry) = self.staged_peek.take().unwrap();
                            match entry {
                                StagedEntry::Put(value) => return Some(Ok((key, value))),
                                StagedEntry::Removed => continue,
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Merges a committed index scan with index entries computed from the
/// transaction's staged changes.
///
/// Committed index entries are associations `index key -> encoded primary
/// key` and may be stale with respect to this transaction's overlay, so
/// each one is revalidated before being surfaced: the primary key must not
/// be tombstoned, and re-extracting from the entry's current value must
/// reproduce the index key. Staged entries win ties on the index key.
pub(crate) struct IndexOverlayCursor {
    primary: Map,
    descriptor: IndexDescriptor,
    overlay: BTreeMap<Key, StagedEntry>,
    committed: EntryCursor,
    committed_peek: Option<(Key, Value)>,
    staged: std::collections::btree_map::IntoIter<Key, Value>,
    staged_peek: Option<(Key, Value)>,
    done: bool,
}

impl IndexOverlayCursor {
    pub(crate) fn new(
        primary: Map,
        descriptor: IndexDescriptor,
        overlay: BTreeMap<Key, StagedEntry>,
        committed: EntryCursor,
        range: &KeyRange,
    ) -> Self {
        // staged puts contribute index entries computed up front; later
        // primary keys overwrite earlier ones on the same index key, the
        // same way the commit apply would
        let mut staged: BTreeMap<Key, Value> = BTreeMap::new();
        for (key, entry) in &overlay {
            if let StagedEntry::Put(value) = entry {
                if let Some(index_key) = descriptor.extract(key, value) {
                    if range.contains(&index_key) {
                        staged.insert(index_key, value.clone());
                    }
                }
            }
        }
        IndexOverlayCursor {
            primary,
            descriptor,
            overlay,
            committed,
            committed_peek: None,
            staged: staged.into_iter(),
            staged_peek: None,
            done: false,
        }
    }

    /// Pulls committed index entries until one survives revalidation.
    fn fill_committed(&mut self) -> KvResult<()> {
        while self.committed_peek.is_none() {
            let (index_key, stored) = match self.committed.next() {
                Some(Ok(entry)) => entry,
                Some(Err(e)) => return Err(e),
                None => return Ok(()),
            };
            let encoded = match stored {
                Value::Bytes(bytes) => bytes,
                other => {
                    return Err(KvError::new(
                        &format!(
                            "index map '{}' holds a non-bytes value: {:?}",
                            self.descriptor.name(),
                            other
                        ),
                        ErrorKind::InternalError,
                    ))
                }
            };
            let primary_key = key_codec::decode(&encoded)?;

            let current = match self.overlay.get(&primary_key) {
                // tombstoned in this transaction
                Some(StagedEntry::Removed) => continue,
                // restaged; the staged stream already carries its entry
                Some(StagedEntry::Put(_)) => continue,
                None => match self.primary.get(&primary_key)? {
                    Some(value) => value,
                    // stale association, entry no longer exists
                    None => continue,
                },
            };
            if self.descriptor.extract(&primary_key, &current) == Some(index_key.clone()) {
                self.committed_peek = Some((index_key, current));
            }
        }
        Ok(())
    }

    fn fill_staged(&mut self) {
        if self.staged_peek.is_none() {
            self.staged_peek = self.staged.next();
        }
    }
}

impl EntryCursorProvider for IndexOverlayCursor {
    fn next_entry(&mut self) -> Option<KvResult<(Key, Value)>> {
        if self.done {
            return None;
        }
        if let Err(e) = self.fill_committed() {
            self.done = true;
            return Some(Err(e));
        }
        self.fill_staged();

        match (&self.staged_peek, &self.committed_peek) {
            (None, None) => {
                self.done = true;
                None
            }
            (Some(_), None) => Some(Ok(self.staged_peek.take().unwrap())),
            (None, Some(_)) => Some(Ok(self.committed_peek.take().unwrap())),
            (Some((staged_key, _)), Some((committed_key, _))) => {
                match staged_key.cmp(committed_key) {
                    std::cmp::Ordering::Less => Some(Ok(self.staged_peek.take().unwrap())),
                    std::cmp::Ordering::Greater => Some(Ok(self.committed_peek.take().unwrap())),
                    std::cmp::Ordering::Equal => {
                        self.committed_peek = None;
                        Some(Ok(self.staged_peek.take().unwrap()))
                    }
                }
            }
        }
    }
}
