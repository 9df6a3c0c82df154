//! Configuration module
//!
//! This module handles loading, parsing, and validating the optional TOML
//! configuration file, and the run-scoped context derived from the command
//! line.
//!
//! # Example
//!
//! ```no_run
//! use l190_crawler::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("crawler.toml")).unwrap();
//! println!("Fetch timeout: {}s", config.fetcher.timeout_secs);
//! ```

mod context;
mod parser;
mod types;
mod validation;

pub use context::{extract_year, RunContext};
pub use types::{Config, CrawlerConfig, DedupScope, FetcherConfig, UserAgentConfig};

pub use parser::{
    compute_config_hash, hash_bytes, load_config, load_config_with_hash, parse_config,
};
pub use validation::validate;
