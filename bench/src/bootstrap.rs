//! Opens one handle per selected backend before any benchmark runs.

use log::info;

use crate::backend::embedded::SqliteBackend;
use crate::backend::ledger::ImmudbBackend;
use crate::backend::relational::PostgresBackend;
use crate::backend::Backend;
use crate::config::{BackendKind, BenchConfig, EngineConfig};
use crate::engine::EngineProcess;
use crate::error::Result;

/// Everything the run needs, in the order it was selected.
///
/// `backends` is declared before `engine` so clients are dropped before the
/// engine process they talk to is stopped.
pub struct Session {
    pub backends: Vec<Box<dyn Backend>>,
    engine: Option<EngineProcess>,
}

impl Session {
    pub fn engine(&self) -> Option<&EngineProcess> {
        self.engine.as_ref()
    }
}

/// Connect to every backend in `config.backends`. Any failure aborts and
/// releases whatever was already opened.
pub fn connect(config: &BenchConfig) -> Result<Session> {
    let mut backends: Vec<Box<dyn Backend>> = Vec::with_capacity(config.backends.len());
    let mut engine = None;

    for kind in &config.backends {
        println!(" --> Connecting to {kind}...");
        match kind {
            BackendKind::Relational => {
                backends.push(Box::new(PostgresBackend::connect(&config.postgres_url)?));
            }
            BackendKind::Ledger => {
                backends.push(Box::new(ImmudbBackend::connect(&config.immudb_url)?));
            }
            BackendKind::Embedded => {
                backends.push(Box::new(SqliteBackend::open(&config.sqlite_path)?));
            }
            BackendKind::Accounting => {
                let (process, backend) = connect_accounting(&config.engine)?;
                engine = Some(process);
                backends.push(backend);
            }
        }
        info!("Connected to {kind}");
    }

    Ok(Session { backends, engine })
}

#[cfg(feature = "tigerbeetle")]
fn connect_accounting(config: &EngineConfig) -> Result<(EngineProcess, Box<dyn Backend>)> {
    use crate::backend::accounting::AccountingBackend;
    use crate::backend::tigerbeetle::TigerBeetleClient;

    let process = EngineProcess::launch(config)?;
    let client = TigerBeetleClient::connect(config.cluster_id, process.address())?;
    Ok((process, Box::new(AccountingBackend::new(client))))
}

#[cfg(not(feature = "tigerbeetle"))]
fn connect_accounting(_config: &EngineConfig) -> Result<(EngineProcess, Box<dyn Backend>)> {
    Err(crate::error::BenchError::FeatureDisabled {
        backend: BackendKind::Accounting.label(),
        feature: "tigerbeetle",
    })
}
