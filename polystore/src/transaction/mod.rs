mod cursor;
mod overlay;
#[allow(clippy::module_inception)]
mod transaction;

pub use cursor::QueryCursor;
pub use transaction::Transaction;

use crate::common::Key;
use crate::errors::KvResult;
use crate::range::KeyRange;

/// Lifecycle states of a [`Transaction`].
///
/// `Active` is the only state in which data operations are permitted.
/// `Committed` and `Aborted` are terminal; any operation on a terminal
/// transaction fails with `ErrorKind::InvalidState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    /// The transaction accepts reads and staged writes
    Active,
    /// The transaction committed successfully and applied its writes
    Committed,
    /// The transaction was aborted (explicitly, or by a commit conflict)
    /// and its staged writes were discarded
    Aborted,
}

/// A comparison operation against an index, resolved into a [`KeyRange`]
/// at query time.
#[derive(Debug, Clone)]
pub enum QueryOp {
    /// Exactly the given key
    Equals(Key),
    /// Strictly less than the given key
    LessThan(Key),
    /// Less than or equal to the given key
    LessOrEqual(Key),
    /// Strictly greater than the given key
    GreaterThan(Key),
    /// Greater than or equal to the given key
    GreaterOrEqual(Key),
    /// Between the two keys, both ends inclusive
    Between(Key, Key),
    /// An arbitrary pre-built range
    Range(KeyRange),
}

impl QueryOp {
    /// Resolves this operation into its range form.
    ///
    /// `Between` with inverted keys fails with `ErrorKind::InvalidRange`,
    /// same as building the range directly.
    pub fn to_range(&self) -> KvResult<KeyRange> {
        match self {
            QueryOp::Equals(key) => Ok(KeyRange::only(key.clone())),
            QueryOp::LessThan(key) => Ok(KeyRange::upper_bound(key.clone(), true)),
            QueryOp::LessOrEqual(key) => Ok(KeyRange::upper_bound(key.clone(), false)),
            QueryOp::GreaterThan(key) => Ok(KeyRange::lower_bound(key.clone(), true)),
            QueryOp::GreaterOrEqual(key) => Ok(KeyRange::lower_bound(key.clone(), false)),
            QueryOp::Between(lower, upper) => {
                KeyRange::bound(lower.clone(), upper.clone(), false, false)
            }
            QueryOp::Range(range) => Ok(range.clone()),
        }
    }
}
