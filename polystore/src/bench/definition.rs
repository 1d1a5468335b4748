use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use serde::Serialize;

use crate::errors::KvResult;
use crate::store::Store;

/// The timed body of a benchmark: one full execution against a store.
pub type BenchmarkUnit = Arc<dyn Fn(&Store) -> KvResult<()> + Send + Sync>;

/// Untimed preparation run once per cell before warmup, e.g. seeding data
/// a read workload will fetch.
pub type BenchmarkSetup = Arc<dyn Fn(&Store) -> KvResult<()> + Send + Sync>;

/// Descriptive metadata of a benchmark, registered with sinks before any
/// result referencing it is reported.
#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkType {
    pub id: String,
    pub description: String,
    pub parameter_keys: Vec<String>,
}

/// A benchmark: metadata plus the code it times.
///
/// The `unit` closure is executed once per warmup run and once per timed
/// sample, each time against a store freshly opened by the cell's factory.
#[derive(Clone)]
pub struct BenchmarkDefinition {
    id: String,
    description: String,
    parameter_keys: Vec<String>,
    ops: Option<u64>,
    setup: Option<BenchmarkSetup>,
    unit: BenchmarkUnit,
}

impl BenchmarkDefinition {
    pub fn new(id: &str, description: &str, unit: BenchmarkUnit) -> Self {
        BenchmarkDefinition {
            id: id.to_string(),
            description: description.to_string(),
            parameter_keys: Vec::new(),
            ops: None,
            setup: None,
            unit,
        }
    }

    /// Declares a parameter key this benchmark is characterized by,
    /// e.g. `"keyCount"`.
    pub fn with_parameter_key(mut self, key: &str) -> Self {
        self.parameter_keys.push(key.to_string());
        self
    }

    /// Declares how many logical operations one unit execution performs,
    /// enabling the throughput metric in results.
    pub fn with_ops(mut self, ops: u64) -> Self {
        self.ops = Some(ops);
        self
    }

    /// Attaches an untimed per-cell setup step.
    pub fn with_setup(mut self, setup: BenchmarkSetup) -> Self {
        self.setup = Some(setup);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn ops(&self) -> Option<u64> {
        self.ops
    }

    /// The registration form of this definition.
    pub fn benchmark_type(&self) -> BenchmarkType {
        BenchmarkType {
            id: self.id.clone(),
            description: self.description.clone(),
            parameter_keys: self.parameter_keys.clone(),
        }
    }

    pub(crate) fn run_setup(&self, store: &Store) -> KvResult<()> {
        match &self.setup {
            Some(setup) => setup(store),
            None => Ok(()),
        }
    }

    pub(crate) fn run_unit(&self, store: &Store) -> KvResult<()> {
        (self.unit)(store)
    }
}

impl Debug for BenchmarkDefinition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BenchmarkDefinition")
            .field("id", &self.id)
            .field("description", &self.description)
            .field("parameter_keys", &self.parameter_keys)
            .field("ops", &self.ops)
            .finish()
    }
}

/// Opens fresh, independent store instances for benchmark cells.
///
/// Every call to `open` must produce a store sharing no mutable state with
/// previously opened ones, so one cell can never contaminate another.
#[derive(Clone)]
pub struct StoreFactory {
    label: String,
    open: Arc<dyn Fn() -> KvResult<Store> + Send + Sync>,
}

impl StoreFactory {
    pub fn new<F>(label: &str, open: F) -> Self
    where
        F: Fn() -> KvResult<Store> + Send + Sync + 'static,
    {
        StoreFactory {
            label: label.to_string(),
            open: Arc::new(open),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn open(&self) -> KvResult<Store> {
        (self.open)()
    }
}

impl Debug for StoreFactory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreFactory")
            .field("label", &self.label)
            .finish()
    }
}

/// One cell's outcome: a benchmark executed against one store factory.
///
/// For successful cells `samples` holds the per-run wall time in
/// milliseconds and the aggregates are strictly positive. Failed cells
/// carry `failed: true` and the error message, with no timing data.
#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkResult {
    pub label: String,
    pub samples_ms: Vec<f64>,
    pub median_ms: f64,
    pub mean_ms: f64,
    pub ops_per_sec: Option<f64>,
    pub failed: bool,
    pub error: Option<String>,
}

impl BenchmarkResult {
    pub(crate) fn failure(label: &str, error: &str) -> Self {
        BenchmarkResult {
            label: label.to_string(),
            samples_ms: Vec::new(),
            median_ms: 0.0,
            mean_ms: 0.0,
            ops_per_sec: None,
            failed: true,
            error: Some(error.to_string()),
        }
    }
}
