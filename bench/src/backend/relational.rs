//! PostgreSQL backend.
//!
//! Inserts are conflict-tolerant (`ON CONFLICT DO NOTHING`) so a re-run over a
//! table that was not cleared still succeeds. Lookups tolerate a missing or
//! undecodable row; every other error ends the run.
//!
//! An existing `accounts` table must use `BIGINT` for `id`, `user_data` and
//! `timestamp`; `prepare` refuses any other column type.

use std::ops::Range;

use bench_core::clock;
use bench_core::constants::SINGLE_ROW_BATCH;
use bench_core::types::{AccountRow, Record};
use log::debug;
use postgres::{Client, NoTls, Row, Statement};

use super::Backend;
use crate::config::Workload;
use crate::error::{BenchError, Result};

const NAME: &str = "PostgreSQL";

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS accounts (
    id BIGINT PRIMARY KEY,
    user_data BIGINT NOT NULL,
    timestamp BIGINT NOT NULL
)";
const COLUMN_TYPES: &str = "SELECT column_name::text, data_type::text
    FROM information_schema.columns
    WHERE table_schema = current_schema() AND table_name = 'accounts'";
const REQUIRED_COLUMNS: [&str; 3] = ["id", "user_data", "timestamp"];
const CLEAR_TABLE: &str = "DELETE FROM accounts";
const INSERT_ROW: &str =
    "INSERT INTO accounts (id, user_data, timestamp) VALUES ($1, $2, $3) ON CONFLICT DO NOTHING";
const SELECT_ROW: &str = "SELECT id, user_data, timestamp FROM accounts WHERE id = $1";

struct Statements {
    insert: Statement,
    select: Statement,
}

pub struct PostgresBackend {
    client: Client,
    statements: Option<Statements>,
}

impl PostgresBackend {
    /// Connect with a libpq-style connection string.
    pub fn connect(url: &str) -> Result<Self> {
        let client = Client::connect(url, NoTls).map_err(|e| BenchError::connect(NAME, e))?;
        Ok(Self::from_client(client))
    }

    pub fn from_client(client: Client) -> Self {
        Self {
            client,
            statements: None,
        }
    }

    fn statements(&self) -> Result<&Statements> {
        self.statements.as_ref().ok_or_else(|| {
            BenchError::write(NAME, "statement lookup", "backend used before prepare")
        })
    }
}

fn decode_row(row: &Row) -> std::result::Result<AccountRow, postgres::Error> {
    Ok(AccountRow {
        id: row.try_get(0)?,
        user_data: row.try_get(1)?,
        timestamp: row.try_get(2)?,
    })
}

/// Every column the benchmark binds `i64` values to must be `bigint`.
fn check_column_types(columns: &[(String, String)]) -> Result<()> {
    for required in REQUIRED_COLUMNS {
        match columns.iter().find(|(name, _)| name == required) {
            Some((_, data_type)) if data_type == "bigint" => {}
            Some((_, data_type)) => {
                return Err(BenchError::write(
                    NAME,
                    "check schema",
                    format!("accounts.{required} is {data_type}, expected bigint"),
                ))
            }
            None => {
                return Err(BenchError::write(
                    NAME,
                    "check schema",
                    format!("accounts has no {required} column"),
                ))
            }
        }
    }
    Ok(())
}

impl Backend for PostgresBackend {
    fn name(&self) -> &'static str {
        NAME
    }

    fn batch_size(&self, _workload: &Workload) -> usize {
        SINGLE_ROW_BATCH
    }

    fn prepare(&mut self, _workload: &Workload) -> Result<()> {
        self.client
            .batch_execute(CREATE_TABLE)
            .map_err(|e| BenchError::write(NAME, "create table", e))?;
        let columns: Vec<(String, String)> = self
            .client
            .query(COLUMN_TYPES, &[])
            .map_err(|e| BenchError::write(NAME, "check schema", e))?
            .iter()
            .map(|row| (row.get(0), row.get(1)))
            .collect();
        check_column_types(&columns)?;
        self.client
            .execute(CLEAR_TABLE, &[])
            .map_err(|e| BenchError::write(NAME, "clear table", e))?;

        let insert = self
            .client
            .prepare(INSERT_ROW)
            .map_err(|e| BenchError::write(NAME, "prepare insert", e))?;
        let select = self
            .client
            .prepare(SELECT_ROW)
            .map_err(|e| BenchError::read(NAME, "prepare select", e))?;
        self.statements = Some(Statements { insert, select });
        Ok(())
    }

    fn insert_batch(&mut self, offsets: Range<u64>) -> Result<()> {
        let insert = self.statements()?.insert.clone();
        for offset in offsets {
            let row = AccountRow::for_offset(offset, clock::unix_seconds());
            self.client
                .execute(&insert, &[&row.id, &row.user_data, &row.timestamp])
                .map_err(|e| BenchError::write(NAME, "insert", e))?;
        }
        Ok(())
    }

    fn lookup_batch(&mut self, offsets: Range<u64>) -> Result<Vec<Record>> {
        let select = self.statements()?.select.clone();
        let mut found = Vec::with_capacity((offsets.end - offsets.start) as usize);
        for offset in offsets {
            let id = offset as i64;
            let row = self
                .client
                .query_opt(&select, &[&id])
                .map_err(|e| BenchError::read(NAME, "select", e))?;
            match row.as_ref().map(decode_row) {
                Some(Ok(row)) => found.push(Record::Row(row)),
                Some(Err(e)) => debug!("{NAME}: row {id} could not be decoded: {e}"),
                None => debug!("{NAME}: row {id} not found"),
            }
        }
        Ok(found)
    }

    fn teardown(&mut self) -> Result<()> {
        self.statements = None;
        Ok(())
    }
}
