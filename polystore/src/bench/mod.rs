pub mod definition;
pub mod runner;
pub mod sink;

pub use definition::{
    BenchmarkDefinition, BenchmarkResult, BenchmarkSetup, BenchmarkType, BenchmarkUnit,
    StoreFactory,
};
pub use runner::{BenchmarkRunner, RunnerConfig};
pub use sink::{LogSink, MemorySink, ResultSink};
