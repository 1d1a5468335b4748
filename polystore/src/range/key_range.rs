use crate::common::Key;
use crate::errors::{ErrorKind, KvError, KvResult};

/// An immutable, backend-independent description of a contiguous span of
/// keys.
///
/// A `KeyRange` is a pure value object: it never touches storage and only
/// describes which keys fall inside the span. Backends obtain their native
/// query form through a
/// [`RangeTranslator`](crate::range::translator::RangeTranslator).
///
/// # Construction
///
/// Ranges are built through factories, never field-by-field:
///
/// - [`KeyRange::only`] — exact match on a single key
/// - [`KeyRange::lower_bound`] — everything at or above (or strictly above)
///   a key
/// - [`KeyRange::upper_bound`] — everything at or below (or strictly below)
///   a key
/// - [`KeyRange::bound`] — both ends, with independent openness flags
/// - [`KeyRange::all`] — the unbounded range
///
/// [`KeyRange::bound`] rejects inverted bounds (`lower > upper`) with
/// `ErrorKind::InvalidRange` at construction time, so an instance that
/// exists is always well-formed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRange {
    lower: Option<Key>,
    upper: Option<Key>,
    lower_open: bool,
    upper_open: bool,
    exact: bool,
}

impl KeyRange {
    /// Creates an exact-match range selecting only `key`.
    ///
    /// Equivalent to a closed `bound(key, key)`, but tagged so translators
    /// and backends can take the point-lookup path.
    pub fn only(key: impl Into<Key>) -> Self {
        let key = key.into();
        KeyRange {
            lower: Some(key.clone()),
            upper: Some(key),
            lower_open: false,
            upper_open: false,
            exact: true,
        }
    }

    /// Creates a range of all keys at or above `key` (or strictly above it
    /// when `open` is true).
    pub fn lower_bound(key: impl Into<Key>, open: bool) -> Self {
        KeyRange {
            lower: Some(key.into()),
            upper: None,
            lower_open: open,
            upper_open: false,
            exact: false,
        }
    }

    /// Creates a range of all keys at or below `key` (or strictly below it
    /// when `open` is true).
    pub fn upper_bound(key: impl Into<Key>, open: bool) -> Self {
        KeyRange {
            lower: None,
            upper: Some(key.into()),
            lower_open: false,
            upper_open: open,
            exact: false,
        }
    }

    /// Creates a range between `lower` and `upper` with independent openness
    /// flags.
    ///
    /// # Errors
    ///
    /// Fails with `ErrorKind::InvalidRange` when `lower` orders after
    /// `upper`. Equal bounds are permitted regardless of openness; an
    /// open/open range over a single key is valid and simply empty.
    pub fn bound(
        lower: impl Into<Key>,
        upper: impl Into<Key>,
        lower_open: bool,
        upper_open: bool,
    ) -> KvResult<Self> {
        let lower = lower.into();
        let upper = upper.into();
        if lower > upper {
            return Err(KvError::new(
                &format!("invalid range: lower bound {} is greater than upper bound {}", lower, upper),
                ErrorKind::InvalidRange,
            ));
        }
        Ok(KeyRange {
            lower: Some(lower),
            upper: Some(upper),
            lower_open,
            upper_open,
            exact: false,
        })
    }

    /// Creates the unbounded range covering every key.
    pub fn all() -> Self {
        KeyRange {
            lower: None,
            upper: None,
            lower_open: false,
            upper_open: false,
            exact: false,
        }
    }

    pub fn lower(&self) -> Option<&Key> {
        self.lower.as_ref()
    }

    pub fn upper(&self) -> Option<&Key> {
        self.upper.as_ref()
    }

    pub fn is_lower_open(&self) -> bool {
        self.lower_open
    }

    pub fn is_upper_open(&self) -> bool {
        self.upper_open
    }

    /// Returns true when this range was built by [`KeyRange::only`].
    pub fn is_exact(&self) -> bool {
        self.exact
    }

    /// Tests whether `key` falls inside this range.
    ///
    /// Membership is the ground truth the translated native forms must
    /// agree with, which makes this the reference predicate for
    /// linear-scan verification in tests.
    pub fn contains(&self, key: &Key) -> bool {
        if let Some(lower) = &self.lower {
            match key.cmp(lower) {
                std::cmp::Ordering::Less => return false,
                std::cmp::Ordering::Equal if self.lower_open => return false,
                _ => {}
            }
        }
        if let Some(upper) = &self.upper {
            match key.cmp(upper) {
                std::cmp::Ordering::Greater => return false,
                std::cmp::Ordering::Equal if self.upper_open => return false,
                _ => {}
            }
        }
        true
    }
}
