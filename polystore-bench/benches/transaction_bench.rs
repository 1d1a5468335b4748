//! Transaction benchmarks - commit, abort, and range scans across backends

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use polystore::common::Key;
use polystore::store::Store;
use polystore::transaction::QueryOp;
use polystore::PRIMARY_INDEX;
use polystore_bench::data_gen::generate_entries;
use polystore_bench::stores::{cleanup_all_bench_data, fjall_store_factory, memory_store_factory};
use std::hint::black_box;

fn backends() -> Vec<polystore::bench::StoreFactory> {
    vec![memory_store_factory(), fjall_store_factory()]
}

fn bench_transaction_commit(c: &mut Criterion) {
    let mut group = c.benchmark_group("Transaction/Commit");
    group.sample_size(20);

    for factory in backends() {
        for &key_count in [100u64, 1000].iter() {
            group.bench_with_input(
                BenchmarkId::new(factory.label().to_string(), key_count),
                &key_count,
                |b, &key_count| {
                    b.iter_with_setup(
                        || factory.open().unwrap(),
                        |store| {
                            let tx = store.begin_transaction().unwrap();
                            for (key, value) in generate_entries(key_count, 64, 42) {
                                tx.put(key, value).unwrap();
                            }
                            let committed = tx.commit().unwrap();
                            store.close().unwrap();
                            black_box(committed)
                        },
                    );
                },
            );
        }
    }

    group.finish();
    cleanup_all_bench_data();
}

fn bench_transaction_abort(c: &mut Criterion) {
    let mut group = c.benchmark_group("Transaction/Abort");
    group.sample_size(20);

    for factory in backends() {
        group.bench_with_input(
            BenchmarkId::new(factory.label().to_string(), 1000u64),
            &1000u64,
            |b, &key_count| {
                b.iter_with_setup(
                    || factory.open().unwrap(),
                    |store| {
                        let tx = store.begin_transaction().unwrap();
                        for (key, value) in generate_entries(key_count, 64, 42) {
                            tx.put(key, value).unwrap();
                        }
                        tx.abort().unwrap();
                        store.close().unwrap();
                        black_box(key_count)
                    },
                );
            },
        );
    }

    group.finish();
    cleanup_all_bench_data();
}

fn bench_range_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("Transaction/RangeScan");
    group.sample_size(20);

    for factory in backends() {
        group.bench_with_input(
            BenchmarkId::new(factory.label().to_string(), 1000u64),
            &1000u64,
            |b, &key_count| {
                b.iter_with_setup(
                    || {
                        let store = factory.open().unwrap();
                        let tx = store.begin_transaction().unwrap();
                        for (key, value) in generate_entries(key_count, 64, 42) {
                            tx.put(key, value).unwrap();
                        }
                        assert!(tx.commit().unwrap());
                        store
                    },
                    |store| {
                        let tx = store.begin_transaction().unwrap();
                        let cursor = tx
                            .query(
                                PRIMARY_INDEX,
                                QueryOp::Between(
                                    Key::Integer(0),
                                    Key::Integer(key_count as i64 - 1),
                                ),
                            )
                            .unwrap();
                        let scanned = cursor.filter(|entry| entry.is_ok()).count();
                        tx.abort().unwrap();
                        store.close().unwrap();
                        black_box(scanned)
                    },
                );
            },
        );
    }

    group.finish();
    cleanup_all_bench_data();
}

fn memory_only() -> Store {
    memory_store_factory().open().unwrap()
}

fn bench_commit_conflict(c: &mut Criterion) {
    let mut group = c.benchmark_group("Transaction/Conflict");
    group.sample_size(20);

    group.bench_function(BenchmarkId::new("memory", "retry"), |b| {
        b.iter_with_setup(memory_only, |store| {
            let contended = Key::Integer(0);
            let first = store.begin_transaction().unwrap();
            let second = store.begin_transaction().unwrap();
            first.get(&contended).unwrap();
            second.get(&contended).unwrap();
            first.put(contended.clone(), 1i64).unwrap();
            second.put(contended.clone(), 2i64).unwrap();
            assert!(first.commit().unwrap());
            assert!(!second.commit().unwrap());
            let retry = store.begin_transaction().unwrap();
            retry.put(contended, 2i64).unwrap();
            let committed = retry.commit().unwrap();
            black_box(committed)
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_transaction_commit,
    bench_transaction_abort,
    bench_range_scan,
    bench_commit_conflict
);
criterion_main!(benches);
