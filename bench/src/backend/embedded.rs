//! SQLite backend: the relational contract run in-process.
//!
//! Same semantics as the PostgreSQL backend (conflict-tolerant inserts,
//! missing or undecodable rows skipped on lookup) without needing a server.

use std::ops::Range;

use bench_core::clock;
use bench_core::constants::SINGLE_ROW_BATCH;
use bench_core::types::{AccountRow, Record};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension};

use super::Backend;
use crate::config::Workload;
use crate::error::{BenchError, Result};

const NAME: &str = "SQLite";

const SETUP: &str = "CREATE TABLE IF NOT EXISTS accounts (
    id INTEGER PRIMARY KEY,
    user_data BIGINT NOT NULL,
    timestamp BIGINT NOT NULL
);
DELETE FROM accounts;";
const INSERT_ROW: &str =
    "INSERT INTO accounts (id, user_data, timestamp) VALUES (?1, ?2, ?3) ON CONFLICT DO NOTHING";
const SELECT_ROW: &str = "SELECT id, user_data, timestamp FROM accounts WHERE id = ?1";

pub struct SqliteBackend {
    conn: Connection,
}

impl SqliteBackend {
    /// Open `path`, or a private in-memory database for `":memory:"`.
    pub fn open(path: &str) -> Result<Self> {
        let conn = if path == ":memory:" {
            Connection::open_in_memory()
        } else {
            Connection::open(path)
        }
        .map_err(|e| BenchError::connect(NAME, e))?;
        configure_connection(&conn).map_err(|e| BenchError::connect(NAME, e))?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::open(":memory:")
    }

    /// The underlying connection, for inspection in tests.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

/// Per-connection tuning. The benchmark measures round trips, not durability.
pub fn configure_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA synchronous = OFF;
         PRAGMA temp_store = MEMORY;",
    )
}

fn is_decode_error(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::InvalidColumnType(..)
            | rusqlite::Error::FromSqlConversionFailure(..)
            | rusqlite::Error::IntegralValueOutOfRange(..)
    )
}

impl Backend for SqliteBackend {
    fn name(&self) -> &'static str {
        NAME
    }

    fn batch_size(&self, _workload: &Workload) -> usize {
        SINGLE_ROW_BATCH
    }

    fn prepare(&mut self, _workload: &Workload) -> Result<()> {
        self.conn
            .execute_batch(SETUP)
            .map_err(|e| BenchError::write(NAME, "create and clear table", e))
    }

    fn insert_batch(&mut self, offsets: Range<u64>) -> Result<()> {
        let mut stmt = self
            .conn
            .prepare_cached(INSERT_ROW)
            .map_err(|e| BenchError::write(NAME, "prepare insert", e))?;
        for offset in offsets {
            let row = AccountRow::for_offset(offset, clock::unix_seconds());
            stmt.execute(params![row.id, row.user_data, row.timestamp])
                .map_err(|e| BenchError::write(NAME, "insert", e))?;
        }
        Ok(())
    }

    fn lookup_batch(&mut self, offsets: Range<u64>) -> Result<Vec<Record>> {
        let mut stmt = self
            .conn
            .prepare_cached(SELECT_ROW)
            .map_err(|e| BenchError::read(NAME, "prepare select", e))?;
        let mut found = Vec::with_capacity((offsets.end - offsets.start) as usize);
        for offset in offsets {
            let id = offset as i64;
            let row = stmt
                .query_row(params![id], |r| {
                    Ok(AccountRow {
                        id: r.get(0)?,
                        user_data: r.get(1)?,
                        timestamp: r.get(2)?,
                    })
                })
                .optional();
            match row {
                Ok(Some(row)) => found.push(Record::Row(row)),
                Ok(None) => debug!("{NAME}: row {id} not found"),
                Err(e) if is_decode_error(&e) => {
                    debug!("{NAME}: row {id} could not be decoded: {e}")
                }
                Err(e) => return Err(BenchError::read(NAME, "select", e)),
            }
        }
        Ok(found)
    }
}
