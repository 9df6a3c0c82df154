//! CSV record sink
//!
//! Both tables are opened in append mode and never truncated; the decision
//! to start from empty files is taken before the run starts. No header row
//! is written, so repeated runs can keep appending to the same files.

use crate::output::{OutputResult, OutputRow, RecordSink, StatusRow};
use csv::{Writer, WriterBuilder};
use std::fs::{File, OpenOptions};
use std::path::Path;

/// Appends rows and statuses to two CSV files
pub struct CsvSink {
    rows: Writer<File>,
    statuses: Writer<File>,
}

impl CsvSink {
    /// Opens (creating if needed) both tables for appending
    pub fn open(rows_path: &Path, status_path: &Path) -> OutputResult<Self> {
        Ok(Self {
            rows: open_append(rows_path)?,
            statuses: open_append(status_path)?,
        })
    }
}

fn open_append(path: &Path) -> OutputResult<Writer<File>> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    Ok(WriterBuilder::new().has_headers(false).from_writer(file))
}

impl RecordSink for CsvSink {
    fn append_rows(&mut self, rows: &[OutputRow]) -> OutputResult<()> {
        for row in rows {
            self.rows.serialize(row)?;
        }
        self.rows.flush()?;
        Ok(())
    }

    fn append_status(&mut self, status: &StatusRow) -> OutputResult<()> {
        self.statuses.write_record([
            status.year.as_str(),
            status.entity_tax_id.as_str(),
            status.entity_name.as_str(),
            status.url.as_str(),
            status.return_code_field().as_str(),
        ])?;
        self.statuses.flush()?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        self.rows.flush()?;
        self.statuses.flush()?;
        Ok(())
    }
}
