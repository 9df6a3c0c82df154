//! Record sink trait and row types
//!
//! This module defines the trait interface for the tables a run appends to,
//! and the two row shapes written to them.

use crate::state::Outcome;
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Output writer has shut down")]
    WriterClosed,
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// One participant of one lot
///
/// Field order is the column order of the output table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputRow {
    pub entity_name: String,
    pub entity_tax_id: String,
    /// CIG of the lot
    pub award_id: String,
    /// Written as an empty field when no identifier was found
    pub participant_id: Option<String>,
    /// 1 when the participant is among the awardees, else 0
    pub is_winner: u8,
}

/// Outcome of one catalog seed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRow {
    /// Year taken from the catalog file name
    pub year: String,
    pub entity_tax_id: String,
    pub entity_name: String,
    pub url: String,
    pub outcome: Outcome,
}

impl StatusRow {
    /// Return code column; empty for an unrecognized document
    pub fn return_code_field(&self) -> String {
        self.outcome
            .return_code()
            .map(|code| code.to_string())
            .unwrap_or_default()
    }
}

/// Trait for output table implementations
///
/// A sink owns both tables of a run. Appends are made from a single writer
/// task, so implementations need not be shareable, only sendable.
pub trait RecordSink: Send {
    /// Appends participant rows
    fn append_rows(&mut self, rows: &[OutputRow]) -> OutputResult<()>;

    /// Appends one status row
    fn append_status(&mut self, status: &StatusRow) -> OutputResult<()>;

    /// Flushes and closes the tables at the end of the run
    fn finish(&mut self) -> OutputResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(outcome: Outcome) -> StatusRow {
        StatusRow {
            year: "2023".to_string(),
            entity_tax_id: "80012345678".to_string(),
            entity_name: "Comune di Esempio".to_string(),
            url: "http://example.it/l190.xml".to_string(),
            outcome,
        }
    }

    #[test]
    fn test_return_code_field() {
        assert_eq!(status(Outcome::Success).return_code_field(), "0");
        assert_eq!(status(Outcome::FetchFailed).return_code_field(), "1");
        assert_eq!(status(Outcome::ProcessingFailed).return_code_field(), "2");
        assert_eq!(status(Outcome::Unrecognized).return_code_field(), "");
    }
}
