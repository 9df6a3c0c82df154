//! L190 Crawler: procurement disclosure resolver
//!
//! This crate resolves the resource links published in an L.190 root catalog
//! into a flat table of lot participants and awardees. Links may point at lot
//! documents or at dataset documents that list further links; datasets are
//! expanded recursively until every lot has been reached.

pub mod config;
pub mod crawler;
pub mod document;
pub mod output;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for crawl operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Network error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::ResourceState,
        to: state::ResourceState,
    },

    #[error("Task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CrawlError {
    /// Short, stable label for the error kind, used in log lines
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "configuration",
            Self::Fetch(_) => "network",
            Self::Document(DocumentError::Malformed(_)) => "malformed_document",
            Self::Document(DocumentError::MissingField { .. }) => "missing_field",
            Self::Document(DocumentError::UnrecognizedSchema) => "unrecognized_schema",
            Self::UrlError(_) => "url",
            Self::Output(_) | Self::Storage(_) => "sink",
            Self::InvalidTransition { .. } => "state",
            Self::Join(_) => "task",
            Self::Io(_) => "io",
        }
    }
}

/// Configuration-specific errors
///
/// These are fatal: they abort the run before any fetching starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("No year found in catalog path '{0}' (expected a name like l190-2023.xml)")]
    MissingYear(String),
}

/// Network errors raised by the fetcher
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("HTTP status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Gave up on {url} after {attempts} attempts: {last}")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        last: Box<FetchError>,
    },

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

/// Errors raised while interpreting a fetched document
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Malformed XML: {0}")]
    Malformed(#[from] roxmltree::Error),

    #[error("Lot {lot} is missing mandatory field '{field}'")]
    MissingField { lot: usize, field: &'static str },

    #[error("Document matches neither the lot nor the dataset schema")]
    UnrecognizedSchema,
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for crawl operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::{Config, RunContext};
pub use crawler::{run_catalog, Crawler};
pub use document::{AttributeVocabulary, DocumentKind, LotRecord};
pub use output::{build_rows, OutputRow, RecordSink, StatusRow};
pub use state::{Outcome, ResourceState};
