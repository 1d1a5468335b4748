pub mod iters;
pub mod map;
pub mod memory;
#[allow(clippy::module_inception)]
pub mod store;

pub use iters::{EntryCursor, EntryCursorProvider, MapRangeCursor};
pub use map::{Map, MapProvider};
pub use store::{Store, StoreProvider, PRIMARY_MAP};
