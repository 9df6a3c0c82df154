//! In-memory record sink

use crate::output::{OutputResult, OutputRow, RecordSink, StatusRow};
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct Tables {
    rows: Vec<OutputRow>,
    statuses: Vec<StatusRow>,
    finished: bool,
}

/// Keeps both tables in memory
///
/// Clones share the same tables, so a handle kept by the caller observes
/// everything written through the clone handed to the run.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    tables: Arc<Mutex<Tables>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> Vec<OutputRow> {
        self.lock().rows.clone()
    }

    pub fn statuses(&self) -> Vec<StatusRow> {
        self.lock().statuses.clone()
    }

    /// True once the run has closed the sink
    pub fn is_finished(&self) -> bool {
        self.lock().finished
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl RecordSink for MemorySink {
    fn append_rows(&mut self, rows: &[OutputRow]) -> OutputResult<()> {
        self.lock().rows.extend_from_slice(rows);
        Ok(())
    }

    fn append_status(&mut self, status: &StatusRow) -> OutputResult<()> {
        self.lock().statuses.push(status.clone());
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        self.lock().finished = true;
        Ok(())
    }
}
