//! Per-seed processing outcome

use crate::{CrawlError, DocumentError};
use std::fmt;

/// Final result of resolving one seed URL
///
/// Written to the status table as an integer code, except `Unrecognized`
/// which has no code and must stay distinguishable from success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// Resolved; rows appended (possibly none)
    Success,
    /// Network failure after retries
    FetchFailed,
    /// Malformed document or any other processing failure
    ProcessingFailed,
    /// Well-formed document matching no known schema
    Unrecognized,
}

impl Outcome {
    /// Status-table return code; `None` for an unrecognized schema
    pub fn return_code(&self) -> Option<u8> {
        match self {
            Self::Success => Some(0),
            Self::FetchFailed => Some(1),
            Self::ProcessingFailed => Some(2),
            Self::Unrecognized => None,
        }
    }

    /// Maps a resolution error onto the outcome it produces
    pub fn from_error(error: &CrawlError) -> Self {
        match error {
            CrawlError::Fetch(_) => Self::FetchFailed,
            CrawlError::Document(DocumentError::UnrecognizedSchema) => Self::Unrecognized,
            _ => Self::ProcessingFailed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::FetchFailed => "fetch_failed",
            Self::ProcessingFailed => "processing_failed",
            Self::Unrecognized => "unrecognized",
        }
    }

    pub fn all() -> [Self; 4] {
        [
            Self::Success,
            Self::FetchFailed,
            Self::ProcessingFailed,
            Self::Unrecognized,
        ]
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
