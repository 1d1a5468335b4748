use std::ops::Bound;

use polystore::common::key_codec;
use polystore::errors::KvResult;
use polystore::range::{Range, RangeTranslator};

/// Native range form of the Fjall backend: a pair of bounds over encoded
/// key bytes, directly usable with `Partition::range`.
pub type ByteBounds = (Bound<Vec<u8>>, Bound<Vec<u8>>);

/// Range translator for the Fjall backend.
///
/// Keys are stored in their order-preserving encoded form, so translating
/// an abstract range is a matter of encoding each bound; byte-wise
/// partition order then matches abstract key order exactly. Openness maps
/// onto `Excluded`/`Included`, missing sides onto `Unbounded`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FjallRangeTranslator;

impl RangeTranslator for FjallRangeTranslator {
    type Native = ByteBounds;

    fn to_native(&self, range: Range<ByteBounds>) -> KvResult<ByteBounds> {
        let key_range = match range {
            Range::Native(native) => return Ok(native),
            Range::Abstract(key_range) => key_range,
        };

        let lower = match key_range.lower() {
            Some(key) if key_range.is_lower_open() => Bound::Excluded(key_codec::encode(key)),
            Some(key) => Bound::Included(key_codec::encode(key)),
            None => Bound::Unbounded,
        };
        let upper = match key_range.upper() {
            Some(key) if key_range.is_upper_open() => Bound::Excluded(key_codec::encode(key)),
            Some(key) => Bound::Included(key_codec::encode(key)),
            None => Bound::Unbounded,
        };
        Ok((lower, upper))
    }
}
