use std::collections::{HashMap, HashSet};

use parking_lot::Mutex;

use crate::bench::definition::{BenchmarkResult, BenchmarkType};
use crate::errors::{ErrorKind, KvError, KvResult};

/// Consumer of benchmark outcomes.
///
/// # Contract
/// A benchmark type must be registered through
/// [`add_benchmark_type`](ResultSink::add_benchmark_type) before any result
/// referencing its id is reported; sinks reject results for unknown ids
/// with `ErrorKind::InvalidOperation`. How results are rendered or stored
/// is entirely up to the sink, which keeps the runner output-agnostic.
pub trait ResultSink: Send + Sync {
    /// Registers a benchmark type prior to result reporting.
    fn add_benchmark_type(&self, benchmark_type: &BenchmarkType) -> KvResult<()>;

    /// Reports one cell result for a previously registered type.
    fn add_benchmark_result(&self, type_id: &str, result: &BenchmarkResult) -> KvResult<()>;
}

/// Sink that retains everything in memory.
///
/// The headless choice for tests and programmatic consumption of a run's
/// outcome.
#[derive(Default)]
pub struct MemorySink {
    types: Mutex<HashMap<String, BenchmarkType>>,
    results: Mutex<Vec<(String, BenchmarkResult)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        MemorySink::default()
    }

    pub fn types(&self) -> Vec<BenchmarkType> {
        self.types.lock().values().cloned().collect()
    }

    /// All reported results as `(type id, result)` pairs, in report order.
    pub fn results(&self) -> Vec<(String, BenchmarkResult)> {
        self.results.lock().clone()
    }

    /// Results reported for one benchmark type.
    pub fn results_for(&self, type_id: &str) -> Vec<BenchmarkResult> {
        self.results
            .lock()
            .iter()
            .filter(|(id, _)| id == type_id)
            .map(|(_, result)| result.clone())
            .collect()
    }
}

impl ResultSink for MemorySink {
    fn add_benchmark_type(&self, benchmark_type: &BenchmarkType) -> KvResult<()> {
        self.types
            .lock()
            .insert(benchmark_type.id.clone(), benchmark_type.clone());
        Ok(())
    }

    fn add_benchmark_result(&self, type_id: &str, result: &BenchmarkResult) -> KvResult<()> {
        if !self.types.lock().contains_key(type_id) {
            return Err(unregistered(type_id));
        }
        self.results
            .lock()
            .push((type_id.to_string(), result.clone()));
        Ok(())
    }
}

/// Sink that writes results through the `log` facade.
#[derive(Default)]
pub struct LogSink {
    registered: Mutex<HashSet<String>>,
}

impl LogSink {
    pub fn new() -> Self {
        LogSink::default()
    }
}

impl ResultSink for LogSink {
    fn add_benchmark_type(&self, benchmark_type: &BenchmarkType) -> KvResult<()> {
        log::info!(
            "benchmark '{}': {} (parameters: {:?})",
            benchmark_type.id,
            benchmark_type.description,
            benchmark_type.parameter_keys
        );
        self.registered.lock().insert(benchmark_type.id.clone());
        Ok(())
    }

    fn add_benchmark_result(&self, type_id: &str, result: &BenchmarkResult) -> KvResult<()> {
        if !self.registered.lock().contains(type_id) {
            return Err(unregistered(type_id));
        }
        if result.failed {
            log::warn!(
                "benchmark '{}' on {}: FAILED ({})",
                type_id,
                result.label,
                result.error.as_deref().unwrap_or("unknown error")
            );
        } else {
            match result.ops_per_sec {
                Some(ops) => log::info!(
                    "benchmark '{}' on {}: median {:.3} ms, mean {:.3} ms, {:.0} ops/s",
                    type_id,
                    result.label,
                    result.median_ms,
                    result.mean_ms,
                    ops
                ),
                None => log::info!(
                    "benchmark '{}' on {}: median {:.3} ms, mean {:.3} ms",
                    type_id,
                    result.label,
                    result.median_ms,
                    result.mean_ms
                ),
            }
        }
        Ok(())
    }
}

fn unregistered(type_id: &str) -> KvError {
    KvError::new(
        &format!(
            "benchmark type '{}' was not registered before reporting",
            type_id
        ),
        ErrorKind::InvalidOperation,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_type(id: &str) -> BenchmarkType {
        BenchmarkType {
            id: id.to_string(),
            description: "sample".to_string(),
            parameter_keys: vec!["keyCount".to_string()],
        }
    }

    fn sample_result(label: &str) -> BenchmarkResult {
        BenchmarkResult {
            label: label.to_string(),
            samples_ms: vec![1.0, 2.0, 3.0],
            median_ms: 2.0,
            mean_ms: 2.0,
            ops_per_sec: Some(500.0),
            failed: false,
            error: None,
        }
    }

    #[test]
    fn test_memory_sink_retains_results() {
        let sink = MemorySink::new();
        sink.add_benchmark_type(&sample_type("b1")).unwrap();
        sink.add_benchmark_result("b1", &sample_result("memory"))
            .unwrap();
        sink.add_benchmark_result("b1", &sample_result("fjall"))
            .unwrap();

        assert_eq!(sink.types().len(), 1);
        assert_eq!(sink.results().len(), 2);
        assert_eq!(sink.results_for("b1").len(), 2);
        assert!(sink.results_for("b2").is_empty());
    }

    #[test]
    fn test_memory_sink_rejects_unregistered_type() {
        let sink = MemorySink::new();
        let err = sink
            .add_benchmark_result("ghost", &sample_result("memory"))
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidOperation);
    }

    #[test]
    fn test_log_sink_enforces_registration() {
        let sink = LogSink::new();
        let err = sink
            .add_benchmark_result("ghost", &sample_result("memory"))
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidOperation);

        sink.add_benchmark_type(&sample_type("b1")).unwrap();
        sink.add_benchmark_result("b1", &sample_result("memory"))
            .unwrap();
        sink.add_benchmark_result("b1", &BenchmarkResult::failure("fjall", "boom"))
            .unwrap();
    }
}
