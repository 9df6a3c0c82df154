//! SQLite record sink
//!
//! This module provides a SQLite-based implementation of the RecordSink
//! trait. Participant rows and status rows go to two databases, mirroring
//! the two CSV files of the default output.

use crate::config::RunContext;
use crate::output::{OutputResult, OutputRow, RecordSink, StatusRow};
use crate::storage::schema::initialize_schema;
use crate::storage::{RunRecord, RunStatus, StorageError, StorageResult};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// Hash recorded for runs that used the built-in defaults
const DEFAULT_CONFIG_HASH: &str = "defaults";

/// One open database with the run registered in it
struct RunDatabase {
    conn: Connection,
    run_id: i64,
}

impl RunDatabase {
    fn open(path: &Path, context: &RunContext) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        // Configure SQLite for better performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        Self::start(conn, context)
    }

    fn open_in_memory(context: &RunContext) -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Self::start(conn, context)
    }

    fn start(conn: Connection, context: &RunContext) -> StorageResult<Self> {
        initialize_schema(&conn)?;

        let now = Utc::now().to_rfc3339();
        let config_hash = context
            .config_hash
            .as_deref()
            .unwrap_or(DEFAULT_CONFIG_HASH);
        conn.execute(
            "INSERT INTO runs (started_at, config_hash, year, status) VALUES (?1, ?2, ?3, ?4)",
            params![now, config_hash, context.year, RunStatus::Running.to_db_string()],
        )?;
        let run_id = conn.last_insert_rowid();

        Ok(Self { conn, run_id })
    }

    fn complete_run(&self) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2 WHERE id = ?3",
            params![RunStatus::Completed.to_db_string(), now, self.run_id],
        )?;
        if updated == 0 {
            return Err(StorageError::RunNotFound(self.run_id));
        }
        Ok(())
    }

    fn get_run(&self) -> StorageResult<RunRecord> {
        self.conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, year, status FROM runs WHERE id = ?1",
                params![self.run_id],
                |row| {
                    Ok(RunRecord {
                        id: row.get(0)?,
                        started_at: row.get(1)?,
                        finished_at: row.get(2)?,
                        config_hash: row.get(3)?,
                        year: row.get(4)?,
                        status: RunStatus::from_db_string(&row.get::<_, String>(5)?)
                            .unwrap_or(RunStatus::Running),
                    })
                },
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(self.run_id))
    }
}

/// SQLite output backend
pub struct SqliteSink {
    rows: RunDatabase,
    statuses: RunDatabase,
}

impl SqliteSink {
    /// Opens (creating if needed) both databases and registers the run
    ///
    /// # Arguments
    ///
    /// * `rows_path` - Database receiving `lot_participants`
    /// * `status_path` - Database receiving `link_status`
    /// * `context` - Year and configuration hash recorded with the run
    pub fn open(rows_path: &Path, status_path: &Path, context: &RunContext) -> StorageResult<Self> {
        Ok(Self {
            rows: RunDatabase::open(rows_path, context)?,
            statuses: RunDatabase::open(status_path, context)?,
        })
    }

    /// Creates a sink over two in-memory databases
    pub fn in_memory(context: &RunContext) -> StorageResult<Self> {
        Ok(Self {
            rows: RunDatabase::open_in_memory(context)?,
            statuses: RunDatabase::open_in_memory(context)?,
        })
    }

    /// Participant rows written by this run
    #[cfg(test)]
    fn count_rows(&self) -> StorageResult<u64> {
        let count: i64 = self.rows.conn.query_row(
            "SELECT COUNT(*) FROM lot_participants WHERE run_id = ?1",
            params![self.rows.run_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// URL and return code of every status row of this run, in write order
    #[cfg(test)]
    fn status_codes(&self) -> StorageResult<Vec<(String, Option<u8>)>> {
        let mut stmt = self.statuses.conn.prepare(
            "SELECT url, return_code FROM link_status WHERE run_id = ?1 ORDER BY id",
        )?;
        let codes = stmt
            .query_map(params![self.statuses.run_id], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(codes)
    }

    /// The run as recorded in the status database
    pub fn run(&self) -> StorageResult<RunRecord> {
        self.statuses.get_run()
    }

    fn insert_rows(&mut self, rows: &[OutputRow]) -> StorageResult<()> {
        let run_id = self.rows.run_id;
        let tx = self.rows.conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO lot_participants
                 (run_id, entity_name, entity_tax_id, award_id, participant_id, is_winner)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for row in rows {
                stmt.execute(params![
                    run_id,
                    row.entity_name,
                    row.entity_tax_id,
                    row.award_id,
                    row.participant_id,
                    row.is_winner
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn insert_status(&mut self, status: &StatusRow) -> StorageResult<()> {
        self.statuses.conn.execute(
            "INSERT INTO link_status
             (run_id, year, entity_tax_id, entity_name, url, return_code, outcome)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                self.statuses.run_id,
                status.year,
                status.entity_tax_id,
                status.entity_name,
                status.url,
                status.outcome.return_code(),
                status.outcome.as_str()
            ],
        )?;
        Ok(())
    }
}

impl RecordSink for SqliteSink {
    fn append_rows(&mut self, rows: &[OutputRow]) -> OutputResult<()> {
        Ok(self.insert_rows(rows)?)
    }

    fn append_status(&mut self, status: &StatusRow) -> OutputResult<()> {
        Ok(self.insert_status(status)?)
    }

    fn finish(&mut self) -> OutputResult<()> {
        self.rows.complete_run()?;
        self.statuses.complete_run()?;
        Ok(())
    }
}
