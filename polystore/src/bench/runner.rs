use std::time::Instant;

use crate::bench::definition::{BenchmarkDefinition, BenchmarkResult, StoreFactory};
use crate::bench::sink::ResultSink;
use crate::errors::KvResult;

/// Runner configuration.
///
/// `warmup_runs` executions are discarded before `sample_runs` timed
/// executions per cell. `seed` is recorded so workloads using seeded data
/// generation produce identical inputs across runs; given the same
/// configuration and workloads, a run's shape (cells executed, samples
/// taken, aggregation) is fully deterministic.
#[derive(Debug, Clone, Copy)]
pub struct RunnerConfig {
    pub warmup_runs: u32,
    pub sample_runs: u32,
    pub seed: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        RunnerConfig {
            warmup_runs: 2,
            sample_runs: 5,
            seed: 42,
        }
    }
}

/// Executes a matrix of benchmarks against a set of store factories.
///
/// # Purpose
/// For every (definition, factory) cell the runner opens a fresh store,
/// runs the untimed setup, warms up, times the configured number of
/// samples, aggregates (median over samples), and reports the result to
/// the sink.
///
/// # Failure isolation
/// Any failure inside one cell (opening the store, setup, or a unit
/// execution) is caught and reported as a failed result for that cell; the
/// rest of the matrix always runs. Only failures of the runner's own
/// machinery, such as a sink rejecting a report, propagate as errors.
pub struct BenchmarkRunner {
    config: RunnerConfig,
    definitions: Vec<BenchmarkDefinition>,
    factories: Vec<StoreFactory>,
}

impl BenchmarkRunner {
    pub fn new(config: RunnerConfig) -> Self {
        BenchmarkRunner {
            config,
            definitions: Vec::new(),
            factories: Vec::new(),
        }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    pub fn add_benchmark(&mut self, definition: BenchmarkDefinition) -> &mut Self {
        self.definitions.push(definition);
        self
    }

    pub fn add_store_factory(&mut self, factory: StoreFactory) -> &mut Self {
        self.factories.push(factory);
        self
    }

    /// Runs the full matrix, reporting through `sink`.
    pub fn run(&self, sink: &dyn ResultSink) -> KvResult<()> {
        for definition in &self.definitions {
            sink.add_benchmark_type(&definition.benchmark_type())?;
            for factory in &self.factories {
                let result = match self.run_cell(definition, factory) {
                    Ok(result) => result,
                    Err(e) => {
                        log::warn!(
                            "benchmark '{}' on {} failed: {}",
                            definition.id(),
                            factory.label(),
                            e
                        );
                        BenchmarkResult::failure(factory.label(), e.message())
                    }
                };
                sink.add_benchmark_result(definition.id(), &result)?;
            }
        }
        Ok(())
    }

    fn run_cell(
        &self,
        definition: &BenchmarkDefinition,
        factory: &StoreFactory,
    ) -> KvResult<BenchmarkResult> {
        let store = factory.open()?;
        // the store must be closed on the failure path too, otherwise a
        // failed cell leaks a live backend into the rest of the matrix
        let samples_ms = match self.collect_samples(definition, &store) {
            Ok(samples) => samples,
            Err(e) => {
                if let Err(close_err) = store.close() {
                    log::warn!("closing store after failed cell: {}", close_err);
                }
                return Err(e);
            }
        };
        store.close()?;

        let median_ms = median(&samples_ms);
        let mean_ms = samples_ms.iter().sum::<f64>() / samples_ms.len() as f64;
        let ops_per_sec = definition
            .ops()
            .map(|ops| ops as f64 / (median_ms / 1000.0));

        Ok(BenchmarkResult {
            label: factory.label().to_string(),
            samples_ms,
            median_ms,
            mean_ms,
            ops_per_sec,
            failed: false,
            error: None,
        })
    }

    /// Setup, warmups, then the timed samples for one cell.
    fn collect_samples(
        &self,
        definition: &BenchmarkDefinition,
        store: &crate::store::Store,
    ) -> KvResult<Vec<f64>> {
        definition.run_setup(store)?;

        for _ in 0..self.config.warmup_runs {
            definition.run_unit(store)?;
        }

        let mut samples_ms = Vec::with_capacity(self.config.sample_runs as usize);
        for _ in 0..self.config.sample_runs {
            let start = Instant::now();
            definition.run_unit(store)?;
            samples_ms.push(start.elapsed().as_secs_f64() * 1000.0);
        }
        Ok(samples_ms)
    }
}

fn median(samples: &[f64]) -> f64 {
    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}
