//! Benchmark workloads and drivers for polystore backends.
//!
//! This crate pairs the matrix runner from `polystore::bench` with a set
//! of standard transactional workloads and concrete store factories for
//! the in-memory and fjall backends. The `polystore-bench` binary runs
//! the full matrix and writes results to the log and a JSONL file;
//! `benches/transaction_bench.rs` covers the same ground under criterion.

pub mod data_gen;
pub mod sink;
pub mod stores;
pub mod workloads;
