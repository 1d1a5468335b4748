//! Deterministic data generation for benchmark workloads

use polystore::common::{Key, Value};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Generates `count` sequential integer keys starting at 0.
pub fn sequential_keys(count: u64) -> Vec<Key> {
    (0..count as i64).map(Key::Integer).collect()
}

/// Generates `count` integer keys in a shuffled order determined by `seed`.
pub fn shuffled_keys(count: u64, seed: u64) -> Vec<Key> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut keys = sequential_keys(count);
    keys.shuffle(&mut rng);
    keys
}

/// Generates a deterministic text value of roughly `size` bytes for a key.
pub fn text_value(rng: &mut StdRng, size: usize) -> Value {
    let text: String = (0..size)
        .map(|_| rng.gen_range(b'a'..=b'z') as char)
        .collect();
    Value::Text(text)
}

/// Generates `count` key/value pairs with sequential integer keys and
/// random text payloads, deterministic for a given seed.
pub fn generate_entries(count: u64, value_size: usize, seed: u64) -> Vec<(Key, Value)> {
    let mut rng = StdRng::seed_from_u64(seed);
    sequential_keys(count)
        .into_iter()
        .map(|key| {
            let value = text_value(&mut rng, value_size);
            (key, value)
        })
        .collect()
}
