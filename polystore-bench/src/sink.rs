//! Result sinks for persisting and fanning out benchmark output

use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use chrono::Utc;
use parking_lot::Mutex;
use polystore::bench::{BenchmarkResult, BenchmarkType, ResultSink};
use polystore::errors::{ErrorKind, KvError, KvResult};
use serde::Serialize;

#[derive(Serialize)]
struct TypeRecord<'a> {
    record: &'static str,
    timestamp: String,
    #[serde(flatten)]
    benchmark_type: &'a BenchmarkType,
}

#[derive(Serialize)]
struct ResultRecord<'a> {
    record: &'static str,
    timestamp: String,
    type_id: &'a str,
    #[serde(flatten)]
    result: &'a BenchmarkResult,
}

/// Sink appending one JSON object per line to a file.
///
/// Type registrations are written as `"record": "type"` lines, results as
/// `"record": "result"` lines, each stamped with the UTC time of writing.
/// The file format is append-only, so successive runs against the same
/// path accumulate.
pub struct JsonlSink {
    file: Mutex<File>,
    registered: Mutex<HashSet<String>>,
}

impl JsonlSink {
    pub fn create<P: AsRef<Path>>(path: P) -> KvResult<JsonlSink> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path.as_ref())
            .map_err(|err| {
                log::error!(
                    "failed to open result file '{}': {}",
                    path.as_ref().display(),
                    err
                );
                KvError::from(err)
            })?;
        Ok(JsonlSink {
            file: Mutex::new(file),
            registered: Mutex::new(HashSet::new()),
        })
    }

    fn write_line<T: Serialize>(&self, record: &T) -> KvResult<()> {
        let line = serde_json::to_string(record).map_err(|err| {
            KvError::new(
                &format!("failed to serialize benchmark record: {}", err),
                ErrorKind::EncodingError,
            )
        })?;
        let mut file = self.file.lock();
        writeln!(file, "{}", line).map_err(KvError::from)
    }
}

impl ResultSink for JsonlSink {
    fn add_benchmark_type(&self, benchmark_type: &BenchmarkType) -> KvResult<()> {
        self.write_line(&TypeRecord {
            record: "type",
            timestamp: Utc::now().to_rfc3339(),
            benchmark_type,
        })?;
        self.registered.lock().insert(benchmark_type.id.clone());
        Ok(())
    }

    fn add_benchmark_result(&self, type_id: &str, result: &BenchmarkResult) -> KvResult<()> {
        if !self.registered.lock().contains(type_id) {
            return Err(KvError::new(
                &format!(
                    "benchmark type '{}' was not registered before reporting",
                    type_id
                ),
                ErrorKind::InvalidOperation,
            ));
        }
        self.write_line(&ResultRecord {
            record: "result",
            timestamp: Utc::now().to_rfc3339(),
            type_id,
            result,
        })
    }
}

/// Sink fanning every report out to a set of inner sinks, in order.
pub struct TeeSink {
    sinks: Vec<Box<dyn ResultSink>>,
}

impl TeeSink {
    pub fn new(sinks: Vec<Box<dyn ResultSink>>) -> TeeSink {
        TeeSink { sinks }
    }
}

impl ResultSink for TeeSink {
    fn add_benchmark_type(&self, benchmark_type: &BenchmarkType) -> KvResult<()> {
        for sink in &self.sinks {
            sink.add_benchmark_type(benchmark_type)?;
        }
        Ok(())
    }

    fn add_benchmark_result(&self, type_id: &str, result: &BenchmarkResult) -> KvResult<()> {
        for sink in &self.sinks {
            sink.add_benchmark_result(type_id, result)?;
        }
        Ok(())
    }
}
