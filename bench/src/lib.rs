//! Insert and point-lookup latency benchmark
//!
//! Writes a fixed number of records to each backend one batch at a time,
//! reads them back by id, and reports the wall-clock time of both phases.
//!
//! Backends:
//! - **PostgreSQL**: one row per round trip, conflict-tolerant inserts
//! - **immudb**: one row per round trip over the PostgreSQL wire protocol
//! - **TigerBeetle**: batched account creation and lookup (`tigerbeetle` feature)
//! - **SQLite**: the PostgreSQL contract run in-process
//!
//! Run all three server backends: `cargo run --release --features tigerbeetle`.
//! Without the feature the default run covers PostgreSQL and immudb only.
//! Run tests: `cargo test`

pub mod backend;
pub mod bootstrap;
pub mod config;
pub mod engine;
pub mod error;
pub mod report;
pub mod runner;
