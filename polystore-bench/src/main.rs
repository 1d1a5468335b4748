use polystore::bench::{BenchmarkRunner, LogSink, RunnerConfig};
use polystore_bench::sink::{JsonlSink, TeeSink};
use polystore_bench::stores::{cleanup_all_bench_data, fjall_store_factory, memory_store_factory};
use polystore_bench::workloads::standard_workloads;

const RESULT_FILE: &str = "bench-results.jsonl";

fn main() {
    env_logger::init();
    cleanup_all_bench_data();

    let config = RunnerConfig::default();
    let mut runner = BenchmarkRunner::new(config);
    for definition in standard_workloads(config.seed) {
        runner.add_benchmark(definition);
    }
    runner.add_store_factory(memory_store_factory());
    runner.add_store_factory(fjall_store_factory());

    let jsonl = match JsonlSink::create(RESULT_FILE) {
        Ok(sink) => sink,
        Err(e) => {
            log::error!("could not open result file '{}': {}", RESULT_FILE, e);
            std::process::exit(1);
        }
    };
    let sink = TeeSink::new(vec![Box::new(LogSink::new()), Box::new(jsonl)]);

    if let Err(e) = runner.run(&sink) {
        log::error!("benchmark run aborted: {}", e);
        cleanup_all_bench_data();
        std::process::exit(1);
    }

    cleanup_all_bench_data();
    log::info!("benchmark run complete, results written to {}", RESULT_FILE);
}
