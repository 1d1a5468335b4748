//! Standard benchmark workloads exercising transactional operations

use std::sync::Arc;

use polystore::bench::BenchmarkDefinition;
use polystore::common::Key;
use polystore::transaction::QueryOp;
use polystore::{ErrorKind, KvError, PRIMARY_INDEX};

use crate::data_gen::{generate_entries, shuffled_keys};

const KEY_COUNT: u64 = 1000;
const VALUE_SIZE: usize = 64;

/// Writes 1000 entries in one transaction and commits.
pub fn put_1000(seed: u64) -> BenchmarkDefinition {
    BenchmarkDefinition::new(
        "put-1000",
        "sequential put of 1000 keys in a single transaction",
        Arc::new(move |store| {
            let tx = store.begin_transaction()?;
            for (key, value) in generate_entries(KEY_COUNT, VALUE_SIZE, seed) {
                tx.put(key, value)?;
            }
            expect_committed(tx.commit()?)
        }),
    )
    .with_parameter_key("keyCount")
    .with_ops(KEY_COUNT)
}

/// Reads 1000 pre-seeded entries in a shuffled order and aborts.
pub fn get_1000(seed: u64) -> BenchmarkDefinition {
    BenchmarkDefinition::new(
        "get-1000",
        "random-order get of 1000 pre-seeded keys",
        Arc::new(move |store| {
            let tx = store.begin_transaction()?;
            for key in shuffled_keys(KEY_COUNT, seed) {
                if tx.get(&key)?.is_none() {
                    return Err(KvError::new(
                        &format!("seeded key {} missing during read workload", key),
                        ErrorKind::InternalError,
                    ));
                }
            }
            tx.abort()
        }),
    )
    .with_parameter_key("keyCount")
    .with_ops(KEY_COUNT)
    .with_setup(seed_entries(seed))
}

/// Scans a closed range over pre-seeded entries and consumes the cursor.
pub fn range_scan_1000(seed: u64) -> BenchmarkDefinition {
    BenchmarkDefinition::new(
        "range-scan-1000",
        "bounded range scan over 1000 pre-seeded keys",
        Arc::new(move |store| {
            let tx = store.begin_transaction()?;
            let cursor = tx.query(
                PRIMARY_INDEX,
                QueryOp::Between(Key::Integer(0), Key::Integer(KEY_COUNT as i64 - 1)),
            )?;
            let mut scanned = 0u64;
            for entry in cursor {
                entry?;
                scanned += 1;
            }
            if scanned != KEY_COUNT {
                return Err(KvError::new(
                    &format!("range scan returned {} of {} entries", scanned, KEY_COUNT),
                    ErrorKind::InternalError,
                ));
            }
            tx.abort()
        }),
    )
    .with_parameter_key("keyCount")
    .with_ops(KEY_COUNT)
    .with_setup(seed_entries(seed))
}

/// Commits two transactions touching the same key, retrying the loser.
pub fn commit_retry(seed: u64) -> BenchmarkDefinition {
    BenchmarkDefinition::new(
        "commit-retry",
        "conflicting commit followed by a retry on a fresh transaction",
        Arc::new(move |store| {
            let contended = Key::Integer(0);
            let first = store.begin_transaction()?;
            let second = store.begin_transaction()?;
            first.get(&contended)?;
            second.get(&contended)?;
            first.put(contended.clone(), 1i64)?;
            second.put(contended.clone(), 2i64)?;
            expect_committed(first.commit()?)?;
            if second.commit()? {
                return Err(KvError::new(
                    "conflicting transaction committed unexpectedly",
                    ErrorKind::InternalError,
                ));
            }
            let retry = store.begin_transaction()?;
            retry.put(contended, 2i64)?;
            expect_committed(retry.commit()?)
        }),
    )
    .with_setup(seed_entries(seed))
}

/// All standard workloads, deterministic for the given seed.
pub fn standard_workloads(seed: u64) -> Vec<BenchmarkDefinition> {
    vec![
        put_1000(seed),
        get_1000(seed),
        range_scan_1000(seed),
        commit_retry(seed),
    ]
}

fn seed_entries(seed: u64) -> polystore::bench::BenchmarkSetup {
    Arc::new(move |store| {
        let tx = store.begin_transaction()?;
        for (key, value) in generate_entries(KEY_COUNT, VALUE_SIZE, seed) {
            tx.put(key, value)?;
        }
        expect_committed(tx.commit()?)
    })
}

fn expect_committed(committed: bool) -> polystore::KvResult<()> {
    if committed {
        Ok(())
    } else {
        Err(KvError::new(
            "uncontended commit reported a conflict",
            ErrorKind::InternalError,
        ))
    }
}

#[cfg(test)]
mod tests {
    use polystore::bench::{BenchmarkRunner, MemorySink, RunnerConfig};

    use super::*;
    use crate::stores::memory_store_factory;

    #[test]
    fn test_standard_workloads_run_against_memory() {
        let mut runner = BenchmarkRunner::new(RunnerConfig {
            warmup_runs: 0,
            sample_runs: 1,
            seed: 42,
        });
        for definition in standard_workloads(42) {
            runner.add_benchmark(definition);
        }
        runner.add_store_factory(memory_store_factory());

        let sink = MemorySink::new();
        runner.run(&sink).unwrap();

        assert_eq!(sink.types().len(), 4);
        for (id, result) in sink.results() {
            assert!(!result.failed, "workload '{}' failed: {:?}", id, result.error);
        }
    }

    #[test]
    fn test_put_workload_is_deterministic() {
        let definition = put_1000(42);
        assert_eq!(definition.id(), "put-1000");
        assert_eq!(definition.ops(), Some(KEY_COUNT));
    }
}
