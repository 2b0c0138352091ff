//! immudb backend, reached through immudb's PostgreSQL wire endpoint
//! (`immudb --pgsql-server --pgsql-server-port 5433`).
//!
//! Values are always bound as statement parameters. Unlike the relational
//! backend, any statement or decode error ends the run.

use std::ops::Range;

use bench_core::clock;
use bench_core::constants::SINGLE_ROW_BATCH;
use bench_core::types::{AccountRow, Record};
use postgres::{Client, NoTls, Statement};

use super::Backend;
use crate::config::Workload;
use crate::error::{BenchError, Result};

const NAME: &str = "immudb";

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS accounts (
    id INTEGER,
    user_data INTEGER,
    data_hora INTEGER,
    PRIMARY KEY id
)";
const CLEAR_TABLE: &str = "DELETE FROM accounts";
const INSERT_ROW: &str = "INSERT INTO accounts (id, user_data, data_hora) VALUES ($1, $2, $3)";
const SELECT_ROW: &str = "SELECT id, user_data, data_hora FROM accounts WHERE id = $1";

pub struct ImmudbBackend {
    client: Client,
    insert: Option<Statement>,
    select: Option<Statement>,
}

impl ImmudbBackend {
    pub fn connect(url: &str) -> Result<Self> {
        let client = Client::connect(url, NoTls).map_err(|e| BenchError::connect(NAME, e))?;
        Ok(Self::from_client(client))
    }

    pub fn from_client(client: Client) -> Self {
        Self {
            client,
            insert: None,
            select: None,
        }
    }
}

fn unprepared() -> BenchError {
    BenchError::write(NAME, "statement lookup", "backend used before prepare")
}

impl Backend for ImmudbBackend {
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
        self.client
            .batch_execute(CLEAR_TABLE)
            .map_err(|e| BenchError::write(NAME, "clear table", e))?;

        self.insert = Some(
            self.client
                .prepare(INSERT_ROW)
                .map_err(|e| BenchError::write(NAME, "prepare insert", e))?,
        );
        self.select = Some(
            self.client
                .prepare(SELECT_ROW)
                .map_err(|e| BenchError::read(NAME, "prepare select", e))?,
        );
        Ok(())
    }

    fn insert_batch(&mut self, offsets: Range<u64>) -> Result<()> {
        let insert = self.insert.clone().ok_or_else(unprepared)?;
        for offset in offsets {
            let row = AccountRow::for_offset(offset, clock::unix_seconds());
            self.client
                .execute(&insert, &[&row.id, &row.user_data, &row.timestamp])
                .map_err(|e| BenchError::write(NAME, "insert", e))?;
        }
        Ok(())
    }

    fn lookup_batch(&mut self, offsets: Range<u64>) -> Result<Vec<Record>> {
        let select = self.select.clone().ok_or_else(unprepared)?;
        let mut found = Vec::with_capacity((offsets.end - offsets.start) as usize);
        for offset in offsets {
            let id = offset as i64;
            let rows = self
                .client
                .query(&select, &[&id])
                .map_err(|e| BenchError::read(NAME, "select", e))?;
            for row in rows {
                let row = AccountRow {
                    id: row.try_get(0).map_err(|e| BenchError::read(NAME, "decode", e))?,
                    user_data: row.try_get(1).map_err(|e| BenchError::read(NAME, "decode", e))?,
                    timestamp: row.try_get(2).map_err(|e| BenchError::read(NAME, "decode", e))?,
                };
                found.push(Record::Row(row));
            }
        }
        Ok(found)
    }

    fn teardown(&mut self) -> Result<()> {
        self.insert = None;
        self.select = None;
        Ok(())
    }
}
