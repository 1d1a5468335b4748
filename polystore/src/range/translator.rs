use std::ops::Bound;

use crate::common::Key;
use crate::errors::KvResult;
use crate::range::key_range::KeyRange;

/// A range argument as accepted by backend query surfaces.
///
/// Callers may hand a backend either the abstract [`KeyRange`] form or a
/// value already in the backend's native form. The tagged variant removes
/// any guessing about which one was passed: translators match on the tag
/// and pass `Native` through untouched, so translating an already-native
/// range is the identity and never double-wraps.
#[derive(Debug, Clone)]
pub enum Range<N> {
    /// A backend-independent range description
    Abstract(KeyRange),
    /// A range already in the backend's native form
    Native(N),
}

impl<N> From<KeyRange> for Range<N> {
    fn from(range: KeyRange) -> Self {
        Range::Abstract(range)
    }
}

/// Translates abstract key ranges into one backend's native query form.
///
/// Each backend implements this exactly once and registers the translator
/// at store construction; no backend-conditional branching exists anywhere
/// else. The mapping must be total over all valid [`KeyRange`] shapes:
/// exact-match becomes the backend's point form, one-sided bounds become
/// directional scans, two-sided bounds carry both ends, and openness flags
/// are forwarded unchanged.
pub trait RangeTranslator {
    /// The backend's native range representation.
    type Native;

    /// Translates `range` into the native form.
    ///
    /// `Range::Native` input is returned as-is.
    fn to_native(&self, range: Range<Self::Native>) -> KvResult<Self::Native>;
}

/// Native range form of the in-memory backend: a pair of std `Bound`s over
/// [`Key`], suitable for ordered-map range scans.
pub type KeyBounds = (Bound<Key>, Bound<Key>);

/// Range translator for the in-memory backend.
///
/// Openness maps directly onto `Bound::Excluded` / `Bound::Included`, a
/// missing side onto `Bound::Unbounded`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryRangeTranslator;

impl RangeTranslator for MemoryRangeTranslator {
    type Native = KeyBounds;

    fn to_native(&self, range: Range<KeyBounds>) -> KvResult<KeyBounds> {
        let key_range = match range {
            Range::Native(native) => return Ok(native),
            Range::Abstract(key_range) => key_range,
        };

        let lower = match key_range.lower() {
            Some(key) if key_range.is_lower_open() => Bound::Excluded(key.clone()),
            Some(key) => Bound::Included(key.clone()),
            None => Bound::Unbounded,
        };
        let upper = match key_range.upper() {
            Some(key) if key_range.is_upper_open() => Bound::Excluded(key.clone()),
            Some(key) => Bound::Included(key.clone()),
            None => Bound::Unbounded,
        };
        Ok((lower, upper))
    }
}

/// Tests a key against a pair of native bounds.
///
/// Used by map implementations to decide whether a probed entry still falls
/// inside the scan window.
pub fn bounds_contain(bounds: &KeyBounds, key: &Key) -> bool {
    let lower_ok = match &bounds.0 {
        Bound::Included(lower) => key >= lower,
        Bound::Excluded(lower) => key > lower,
        Bound::Unbounded => true,
    };
    let upper_ok = match &bounds.1 {
        Bound::Included(upper) => key <= upper,
        Bound::Excluded(upper) => key < upper,
        Bound::Unbounded => true,
    };
    lower_ok && upper_ok
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check_agreement(range: &KeyRange, candidates: &[Key]) {
        let translator = MemoryRangeTranslator;
        let bounds = translator
            .to_native(Range::Abstract(range.clone()))
            .unwrap();
        for key in candidates {
            assert_eq!(
                range.contains(key),
                bounds_contain(&bounds, key),
                "native bounds disagree with {:?} for key {:?}",
                range,
                key
            );
        }
    }

    fn candidates() -> Vec<Key> {
        vec![
            Key::Integer(i64::MIN),
            Key::Integer(-1),
            Key::Integer(0),
            Key::Integer(1),
            Key::Integer(5),
            Key::Integer(9),
            Key::Integer(10),
            Key::Integer(11),
            Key::Integer(i64::MAX),
            Key::Text("a".into()),
            Key::Bytes(vec![0x00]),
        ]
    }

    #[test]
    fn test_translated_bounds_agree_with_contains() {
        let keys = candidates();
        let ranges = vec![
            KeyRange::all(),
            KeyRange::only(5i64),
            KeyRange::lower_bound(5i64, false),
            KeyRange::lower_bound(5i64, true),
            KeyRange::upper_bound(10i64, false),
            KeyRange::upper_bound(10i64, true),
            KeyRange::bound(1i64, 10i64, false, false).unwrap(),
            KeyRange::bound(1i64, 10i64, true, false).unwrap(),
            KeyRange::bound(1i64, 10i64, false, true).unwrap(),
            KeyRange::bound(1i64, 10i64, true, true).unwrap(),
        ];
        for range in &ranges {
            check_agreement(range, &keys);
        }
    }

    #[test]
    fn test_exact_range_translates_to_point_bounds() {
        let translator = MemoryRangeTranslator;
        let bounds = translator
            .to_native(Range::Abstract(KeyRange::only(7i64)))
            .unwrap();
        assert_eq!(bounds.0, Bound::Included(Key::Integer(7)));
        assert_eq!(bounds.1, Bound::Included(Key::Integer(7)));
    }

    #[test]
    fn test_native_pass_through_is_identity() {
        let translator = MemoryRangeTranslator;
        let native: KeyBounds = (
            Bound::Included(Key::Integer(1)),
            Bound::Excluded(Key::Integer(9)),
        );
        let once = translator.to_native(Range::Native(native.clone())).unwrap();
        assert_eq!(once, native);

        // translating the result again changes nothing
        let twice = translator.to_native(Range::Native(once.clone())).unwrap();
        assert_eq!(twice, once);
    }

    #[test]
    fn test_unbounded_sides_map_to_unbounded() {
        let translator = MemoryRangeTranslator;
        let bounds = translator
            .to_native(Range::Abstract(KeyRange::lower_bound(3i64, true)))
            .unwrap();
        assert_eq!(bounds.0, Bound::Excluded(Key::Integer(3)));
        assert_eq!(bounds.1, Bound::Unbounded);

        let bounds = translator
            .to_native(Range::Abstract(KeyRange::all()))
            .unwrap();
        assert_eq!(bounds.0, Bound::Unbounded);
        assert_eq!(bounds.1, Bound::Unbounded);
    }

    #[test]
    fn test_range_from_key_range() {
        let range: Range<KeyBounds> = KeyRange::only(1i64).into();
        assert!(matches!(range, Range::Abstract(_)));
    }
}
