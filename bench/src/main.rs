//! Benchmark runner. Configuration comes from `BENCH_*` environment
//! variables (a `.env` file in the working directory is loaded first).
//!
//! Usage:
//!   cargo run --release --features tigerbeetle     # PostgreSQL, immudb, TigerBeetle
//!   cargo run --release                            # PostgreSQL, immudb
//!   BENCH_BACKENDS=sqlite cargo run --release

use std::process;

use anyhow::Context;
use ledger_bench::bootstrap;
use ledger_bench::config::{BackendKind, BenchConfig};
use ledger_bench::report::print_summary;
use ledger_bench::runner::run_all;
use log::{error, info, warn};

fn run(config: &BenchConfig) -> anyhow::Result<()> {
    let mut session = bootstrap::connect(config).context("bootstrap failed")?;

    println!("\nRunning benchmarks...");
    let reports =
        run_all(&mut session.backends, &config.workload).context("benchmark aborted")?;
    print_summary(&reports);
    Ok(())
}

fn main() {
    let dotenv = dotenvy::dotenv();

    let config = BenchConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Failed to read configuration: {e}. Exiting.");
        process::exit(1);
    });

    bench_core::initialize_logger(config.log_level, config.log_file.as_deref()).unwrap_or_else(
        |e| {
            eprintln!("Failed to initialize logger: {e}. Exiting.");
            process::exit(1);
        },
    );

    if let Ok(path) = dotenv {
        info!("Loaded environment from {}", path.display());
    }
    info!(
        "Benchmark starting (records={}, batch={}, backends={:?})",
        config.workload.count, config.workload.batch_size, config.backends
    );

    if !BackendKind::Accounting.is_compiled_in() {
        warn!("Built without the `tigerbeetle` feature; the TigerBeetle benchmark is unavailable");
    }

    // `run` owns every connection and the engine process, so they are
    // released before the exit code is set.
    if let Err(e) = run(&config) {
        error!("{e:#}");
        process::exit(1);
    }
    info!("Benchmark finished");
}
