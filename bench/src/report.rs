//! Report module: per-phase duration lines and the closing summary table.

use std::fmt;
use std::time::Duration;

/// The two timed phases of every benchmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Insert,
    Read,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Insert => "Insert",
            Phase::Read => "Read",
        })
    }
}

/// Results of one backend's run.
#[derive(Debug, Clone)]
pub struct BackendReport {
    pub backend: &'static str,
    pub count: u64,
    /// Number of requests each phase was split into.
    pub batches: u64,
    pub insert: Duration,
    pub read: Duration,
    /// Records the read phase returned.
    pub found: usize,
}

impl BackendReport {
    pub fn duration(&self, phase: Phase) -> Duration {
        match phase {
            Phase::Insert => self.insert,
            Phase::Read => self.read,
        }
    }

    /// Mean time per record in microseconds (total / count).
    pub fn per_record_us(&self, phase: Phase) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.duration(phase).as_secs_f64() * 1e6 / self.count as f64
    }
}

pub fn header_line(backend: &str) -> String {
    format!(" --- {backend} Benchmark --- ")
}

/// `Insert 1000 accounts: 1.23s`
pub fn phase_line(phase: Phase, count: u64, elapsed: Duration) -> String {
    format!("{phase} {count} accounts: {elapsed:.2?}")
}

pub fn print_phase(phase: Phase, count: u64, elapsed: Duration) {
    println!("{}", phase_line(phase, count, elapsed));
}

/// Render the comparison table printed after all backends have run.
pub fn summary_table(reports: &[BackendReport]) -> String {
    let mut out = String::new();
    out.push_str(&format!("\n{}\n", "=".repeat(80)));
    out.push_str("  Summary\n");
    out.push_str(&format!("{}\n", "=".repeat(80)));
    out.push_str(&format!(
        "  {:14} {:>8} {:>8} {:>12} {:>12} {:>10} {:>10} {:>6}\n",
        "Backend", "Records", "Batches", "Insert", "Read", "µs/insert", "µs/read", "Found"
    ));
    out.push_str(&format!("  {}\n", "-".repeat(88)));
    for r in reports {
        out.push_str(&format!(
            "  {:14} {:>8} {:>8} {:>12} {:>12} {:>10.1} {:>10.1} {:>6}\n",
            r.backend,
            r.count,
            r.batches,
            format!("{:.2?}", r.insert),
            format!("{:.2?}", r.read),
            r.per_record_us(Phase::Insert),
            r.per_record_us(Phase::Read),
            r.found,
        ));
    }
    out
}

pub fn print_summary(reports: &[BackendReport]) {
    if reports.is_empty() {
        return;
    }
    println!("{}", summary_table(reports));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> BackendReport {
        BackendReport {
            backend: "SQLite",
            count: 1000,
            batches: 1000,
            insert: Duration::from_millis(250),
            read: Duration::from_millis(50),
            found: 1000,
        }
    }

    #[test]
    fn phase_line_names_phase_and_count() {
        assert_eq!(
            phase_line(Phase::Insert, 1000, Duration::from_millis(1500)),
            "Insert 1000 accounts: 1.50s"
        );
        assert_eq!(
            phase_line(Phase::Read, 7, Duration::from_micros(12)),
            "Read 7 accounts: 12.00µs"
        );
    }

    #[test]
    fn per_record_mean_divides_total() {
        let r = report();
        assert!((r.per_record_us(Phase::Insert) - 250.0).abs() < 1e-9);
        assert!((r.per_record_us(Phase::Read) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn empty_run_has_zero_mean() {
        let r = BackendReport {
            count: 0,
            ..report()
        };
        assert_eq!(r.per_record_us(Phase::Insert), 0.0);
    }

    #[test]
    fn summary_lists_every_backend() {
        let mut other = report();
        other.backend = "TigerBeetle";
        other.batches = 17;
        let table = summary_table(&[report(), other]);
        assert!(table.contains("SQLite"));
        assert!(table.contains("TigerBeetle"));
        assert!(table.contains("250.00ms"));
        assert!(table.contains("17"));
    }
}
