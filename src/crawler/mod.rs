//! Crawler module for fetching and resolving published resources
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with a fixed-delay retry policy
//! - Per-seed deduplication of visited URLs
//! - Recursive resolution of dataset documents
//! - The catalog driver writing one status row per seed

mod coordinator;
mod fetcher;
mod retry;
mod visited;

pub use coordinator::{run_catalog, Crawler, Resolution};
pub use fetcher::{build_http_client, Fetcher, RawDocument};
pub use retry::{RetryPolicy, DEFAULT_MAX_ATTEMPTS};
pub use visited::{Admission, VisitedSet};
