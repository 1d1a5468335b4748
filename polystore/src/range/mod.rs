pub mod key_range;
pub mod translator;

pub use key_range::KeyRange;
pub use translator::{bounds_contain, KeyBounds, MemoryRangeTranslator, Range, RangeTranslator};
