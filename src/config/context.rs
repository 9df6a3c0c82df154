//! Run-scoped context
//!
//! Values derived once per run from the command line and shared by every
//! component, instead of living in ambient global state.

use crate::ConfigError;
use regex::Regex;
use std::path::{Path, PathBuf};

/// Marker literal followed by the publication year in catalog file names
const YEAR_PATTERN: &str = r"l190-(\d{4})\.xml";

/// Context for a single crawl run
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Publication year written to every status row
    pub year: String,

    /// Path of the root catalog being processed
    pub catalog_path: PathBuf,

    /// Hash of the configuration file, when one was loaded
    pub config_hash: Option<String>,

    /// Destination of participant rows
    pub output_path: Option<PathBuf>,

    /// Destination of status rows
    pub status_path: Option<PathBuf>,
}

impl RunContext {
    /// Builds the context for the given catalog
    ///
    /// Fails with `ConfigError::MissingYear` when the catalog path carries no
    /// year, before anything is fetched or written.
    pub fn new(catalog_path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let catalog_path = catalog_path.into();
        let year = extract_year(&catalog_path)?;
        Ok(Self {
            year,
            catalog_path,
            config_hash: None,
            output_path: None,
            status_path: None,
        })
    }

    pub fn with_config_hash(mut self, hash: impl Into<String>) -> Self {
        self.config_hash = Some(hash.into());
        self
    }

    /// Sets where participant rows and status rows are written
    pub fn with_outputs(mut self, output: impl Into<PathBuf>, status: impl Into<PathBuf>) -> Self {
        self.output_path = Some(output.into());
        self.status_path = Some(status.into());
        self
    }

    /// Output destinations that already exist on disk
    pub fn existing_outputs(&self) -> Vec<&Path> {
        [self.output_path.as_deref(), self.status_path.as_deref()]
            .into_iter()
            .flatten()
            .filter(|p| p.exists())
            .collect()
    }
}

/// Extracts the four-digit year from a catalog path like `.../l190-2023.xml`
pub fn extract_year(path: &Path) -> Result<String, ConfigError> {
    let text = path.to_string_lossy();
    let pattern = Regex::new(YEAR_PATTERN)
        .map_err(|e| ConfigError::Validation(format!("Invalid year pattern: {}", e)))?;

    pattern
        .captures(&text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| ConfigError::MissingYear(text.into_owned()))
}
