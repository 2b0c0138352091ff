//! Drives a backend through its insert and read phases and times each.

use std::time::{Duration, Instant};

use bench_core::batch::Batches;
use log::{debug, info};

use crate::backend::Backend;
use crate::config::Workload;
use crate::error::Result;
use crate::report::{self, BackendReport, Phase};

/// Run `f` and measure its wall-clock time.
pub fn timed<T>(f: impl FnOnce() -> T) -> (T, Duration) {
    let start = Instant::now();
    let value = f();
    (value, start.elapsed())
}

/// prepare → insert phase → read phase → teardown, printing one line per
/// phase. The first error ends the run.
pub fn run_backend(backend: &mut dyn Backend, workload: &Workload) -> Result<BackendReport> {
    let name = backend.name();
    println!("{}", report::header_line(name));

    backend.prepare(workload)?;
    let batch_size = backend.batch_size(workload);
    let batches = Batches::total(workload.count, batch_size);
    info!(
        "{name}: {} records in {batches} requests of at most {batch_size}",
        workload.count
    );

    let (inserted, insert) = timed(|| -> Result<()> {
        for range in Batches::new(workload.count, batch_size) {
            debug!("{name}: insert {range:?}");
            backend.insert_batch(range)?;
        }
        Ok(())
    });
    inserted?;
    report::print_phase(Phase::Insert, workload.count, insert);

    let (found, read) = timed(|| -> Result<usize> {
        let mut found = 0;
        for range in Batches::new(workload.count, batch_size) {
            debug!("{name}: lookup {range:?}");
            found += backend.lookup_batch(range)?.len();
        }
        Ok(found)
    });
    let found = found?;
    report::print_phase(Phase::Read, workload.count, read);

    backend.teardown()?;

    Ok(BackendReport {
        backend: name,
        count: workload.count,
        batches,
        insert,
        read,
        found,
    })
}

/// Run every backend in order. Stops at the first failure.
pub fn run_all(backends: &mut [Box<dyn Backend>], workload: &Workload) -> Result<Vec<BackendReport>> {
    let mut reports = Vec::with_capacity(backends.len());
    for backend in backends.iter_mut() {
        reports.push(run_backend(backend.as_mut(), workload)?);
    }
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ops::Range;

    use bench_core::types::{AccountRow, Record};

    use crate::error::BenchError;

    /// Records every call; optionally fails the nth insert batch.
    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
        fail_insert_at: Option<usize>,
        inserts: usize,
    }

    impl Backend for Recorder {
        fn name(&self) -> &'static str {
            "recorder"
        }

        fn batch_size(&self, workload: &Workload) -> usize {
            workload.batch_size
        }

        fn prepare(&mut self, workload: &Workload) -> Result<()> {
            self.calls.push(format!("prepare {}", workload.count));
            Ok(())
        }

        fn insert_batch(&mut self, offsets: Range<u64>) -> Result<()> {
            self.inserts += 1;
            if self.fail_insert_at == Some(self.inserts) {
                return Err(BenchError::write("recorder", "insert", "refused"));
            }
            self.calls.push(format!("insert {offsets:?}"));
            Ok(())
        }

        fn lookup_batch(&mut self, offsets: Range<u64>) -> Result<Vec<Record>> {
            self.calls.push(format!("lookup {offsets:?}"));
            Ok(offsets
                .map(|o| Record::Row(AccountRow::for_offset(o, 0)))
                .collect())
        }

        fn teardown(&mut self) -> Result<()> {
            self.calls.push("teardown".into());
            Ok(())
        }
    }

    #[test]
    fn phases_run_in_order() {
        let mut backend = Recorder::default();
        let workload = Workload::new(5, 2).unwrap();
        let report = run_backend(&mut backend, &workload).unwrap();

        assert_eq!(
            backend.calls,
            vec![
                "prepare 5",
                "insert 0..2",
                "insert 2..4",
                "insert 4..5",
                "lookup 0..2",
                "lookup 2..4",
                "lookup 4..5",
                "teardown",
            ]
        );
        assert_eq!(report.batches, 3);
        assert_eq!(report.found, 5);
    }

    #[test]
    fn failed_batch_stops_the_run() {
        let mut backend = Recorder {
            fail_insert_at: Some(2),
            ..Recorder::default()
        };
        let workload = Workload::new(10, 3).unwrap();
        assert!(run_backend(&mut backend, &workload).is_err());
        assert_eq!(backend.calls, vec!["prepare 10", "insert 0..3"]);
    }

    #[test]
    fn empty_workload_only_prepares_and_tears_down() {
        let mut backend = Recorder::default();
        let workload = Workload::new(0, 60).unwrap();
        let report = run_backend(&mut backend, &workload).unwrap();
        assert_eq!(backend.calls, vec!["prepare 0", "teardown"]);
        assert_eq!(report.found, 0);
        assert_eq!(report.batches, 0);
    }

    #[test]
    fn run_all_stops_at_first_failing_backend() {
        let mut backends: Vec<Box<dyn Backend>> = vec![
            Box::new(Recorder::default()),
            Box::new(Recorder {
                fail_insert_at: Some(1),
                ..Recorder::default()
            }),
            Box::new(Recorder::default()),
        ];
        let workload = Workload::new(4, 4).unwrap();
        assert!(run_all(&mut backends, &workload).is_err());
    }

    #[test]
    fn timed_returns_value() {
        let (v, elapsed) = timed(|| 41 + 1);
        assert_eq!(v, 42);
        assert!(elapsed >= Duration::ZERO);
    }
}
