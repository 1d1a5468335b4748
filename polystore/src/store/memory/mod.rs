pub mod map;
pub mod store;

pub use map::InMemoryMap;
pub use store::InMemoryStoreProvider;
