//! Run configuration resolved from the environment.
//!
//! Every setting has a default that reproduces the fixed workload (1000
//! records, batches of 60) against the local default endpoints. Variables
//! are read through a lookup function so tests never touch the process
//! environment.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use bench_core::constants::{DEFAULT_BATCH_SIZE, DEFAULT_INSERT_COUNT};
use log::LevelFilter;

use crate::error::{BenchError, Result};

pub const DEFAULT_POSTGRES_URL: &str =
    "host=localhost port=5432 user=test password=test dbname=ledger sslmode=disable";
pub const DEFAULT_IMMUDB_URL: &str =
    "host=127.0.0.1 port=5433 user=immudb password=immudb dbname=defaultdb sslmode=disable";
pub const DEFAULT_SQLITE_PATH: &str = ":memory:";
pub const DEFAULT_ENGINE_BINARY: &str = "./tigerbeetle";
pub const DEFAULT_ENGINE_DATA_FILE: &str = "0_0.tigerbeetle";
pub const DEFAULT_ENGINE_ADDRESS: &str = "3000";
pub const DEFAULT_READY_ATTEMPTS: u32 = 10;
pub const DEFAULT_READY_BACKOFF: Duration = Duration::from_millis(100);
pub const DEFAULT_LOG_FILE: &str = "ledger-bench.log";

/// How many records each backend receives and how many go in one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Workload {
    pub count: u64,
    pub batch_size: usize,
}

impl Workload {
    pub fn new(count: u64, batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(BenchError::Config("batch size must be at least 1".into()));
        }
        Ok(Self { count, batch_size })
    }
}

impl Default for Workload {
    fn default() -> Self {
        Self {
            count: DEFAULT_INSERT_COUNT,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// The backends the harness knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    Relational,
    Ledger,
    Accounting,
    Embedded,
}

impl BackendKind {
    /// Order used when `BENCH_BACKENDS` is unset.
    pub const DEFAULT_ORDER: [BackendKind; 3] = [
        BackendKind::Relational,
        BackendKind::Ledger,
        BackendKind::Accounting,
    ];

    /// Whether this build can drive the backend. The accounting engine needs
    /// the `tigerbeetle` feature.
    pub fn is_compiled_in(self) -> bool {
        match self {
            BackendKind::Accounting => cfg!(feature = "tigerbeetle"),
            _ => true,
        }
    }

    /// [`Self::DEFAULT_ORDER`] minus backends this build cannot drive.
    pub fn default_backends() -> Vec<BackendKind> {
        Self::DEFAULT_ORDER
            .into_iter()
            .filter(|kind| kind.is_compiled_in())
            .collect()
    }

    pub fn label(self) -> &'static str {
        match self {
            BackendKind::Relational => "PostgreSQL",
            BackendKind::Ledger => "immudb",
            BackendKind::Accounting => "TigerBeetle",
            BackendKind::Embedded => "SQLite",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for BackendKind {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "relational" | "postgres" | "postgresql" => Ok(BackendKind::Relational),
            "ledger" | "immudb" => Ok(BackendKind::Ledger),
            "accounting" | "tigerbeetle" => Ok(BackendKind::Accounting),
            "embedded" | "sqlite" => Ok(BackendKind::Embedded),
            other => Err(BenchError::Config(format!("unknown backend {other:?}"))),
        }
    }
}

/// Accounting engine process settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub binary: PathBuf,
    pub data_file: PathBuf,
    pub cluster_id: u128,
    pub replica: u8,
    pub replica_count: u8,
    pub address: String,
    /// Remove a data file left behind by an earlier run before formatting.
    pub fresh_data_file: bool,
    pub ready_attempts: u32,
    pub ready_initial_backoff: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from(DEFAULT_ENGINE_BINARY),
            data_file: PathBuf::from(DEFAULT_ENGINE_DATA_FILE),
            cluster_id: 0,
            replica: 0,
            replica_count: 1,
            address: DEFAULT_ENGINE_ADDRESS.to_string(),
            fresh_data_file: true,
            ready_attempts: DEFAULT_READY_ATTEMPTS,
            ready_initial_backoff: DEFAULT_READY_BACKOFF,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BenchConfig {
    pub workload: Workload,
    pub backends: Vec<BackendKind>,
    pub postgres_url: String,
    pub immudb_url: String,
    pub sqlite_path: String,
    pub engine: EngineConfig,
    pub log_level: LevelFilter,
    pub log_file: Option<String>,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            workload: Workload::default(),
            backends: BackendKind::default_backends(),
            postgres_url: DEFAULT_POSTGRES_URL.to_string(),
            immudb_url: DEFAULT_IMMUDB_URL.to_string(),
            sqlite_path: DEFAULT_SQLITE_PATH.to_string(),
            engine: EngineConfig::default(),
            log_level: LevelFilter::Info,
            log_file: Some(DEFAULT_LOG_FILE.to_string()),
        }
    }
}

impl BenchConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from `BENCH_*` variables supplied by `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let count = parse_or(get("BENCH_COUNT"), "BENCH_COUNT", defaults.workload.count)?;
        let batch_size = parse_or(
            get("BENCH_BATCH_SIZE"),
            "BENCH_BATCH_SIZE",
            defaults.workload.batch_size,
        )?;

        let backends = match get("BENCH_BACKENDS") {
            Some(list) => parse_backends(&list)?,
            None => defaults.backends,
        };

        let engine_defaults = defaults.engine;
        let engine = EngineConfig {
            binary: get("BENCH_ENGINE_BINARY")
                .map(PathBuf::from)
                .unwrap_or(engine_defaults.binary),
            data_file: get("BENCH_ENGINE_DATA_FILE")
                .map(PathBuf::from)
                .unwrap_or(engine_defaults.data_file),
            cluster_id: parse_or(
                get("BENCH_ENGINE_CLUSTER"),
                "BENCH_ENGINE_CLUSTER",
                engine_defaults.cluster_id,
            )?,
            address: get("BENCH_ENGINE_ADDRESS").unwrap_or(engine_defaults.address),
            fresh_data_file: match get("BENCH_ENGINE_FRESH_DATA_FILE") {
                Some(v) => parse_bool(&v, "BENCH_ENGINE_FRESH_DATA_FILE")?,
                None => engine_defaults.fresh_data_file,
            },
            ready_attempts: parse_or(
                get("BENCH_ENGINE_READY_ATTEMPTS"),
                "BENCH_ENGINE_READY_ATTEMPTS",
                engine_defaults.ready_attempts,
            )?,
            ..engine_defaults
        };

        let log_level = match get("BENCH_LOG_LEVEL") {
            Some(v) => parse_log_level(&v)
                .ok_or_else(|| BenchError::Config(format!("BENCH_LOG_LEVEL: unknown level {v:?}")))?,
            None => defaults.log_level,
        };

        let log_file = match lookup("BENCH_LOG_FILE") {
            Some(value) => {
                let trimmed = value.trim();
                if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
            None => defaults.log_file,
        };

        Ok(Self {
            workload: Workload::new(count, batch_size)?,
            backends,
            postgres_url: get("BENCH_POSTGRES_URL").unwrap_or(defaults.postgres_url),
            immudb_url: get("BENCH_IMMUDB_URL").unwrap_or(defaults.immudb_url),
            sqlite_path: get("BENCH_SQLITE_PATH").unwrap_or(defaults.sqlite_path),
            engine,
            log_level,
            log_file,
        })
    }
}

fn parse_or<T>(value: Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match value {
        Some(v) => v
            .parse()
            .map_err(|e| BenchError::Config(format!("{key}: {v:?}: {e}"))),
        None => Ok(default),
    }
}

fn parse_bool(value: &str, key: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(BenchError::Config(format!("{key}: expected a boolean, got {value:?}"))),
    }
}

fn parse_backends(list: &str) -> Result<Vec<BackendKind>> {
    let mut kinds = Vec::new();
    for name in list.split(',').filter(|s| !s.trim().is_empty()) {
        let kind: BackendKind = name.parse()?;
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    if kinds.is_empty() {
        return Err(BenchError::Config("BENCH_BACKENDS selects no backend".into()));
    }
    Ok(kinds)
}

pub fn parse_log_level(value: &str) -> Option<LevelFilter> {
    match value.to_lowercase().as_str() {
        "off" => Some(LevelFilter::Off),
        "error" => Some(LevelFilter::Error),
        "warn" | "warning" => Some(LevelFilter::Warn),
        "info" => Some(LevelFilter::Info),
        "debug" => Some(LevelFilter::Debug),
        "trace" => Some(LevelFilter::Trace),
        _ => None,
    }
}
