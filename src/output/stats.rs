//! Run statistics
//!
//! Counters are updated concurrently by resolution tasks through a shared
//! [`StatsRecorder`] and frozen into a [`RunStats`] when the run ends.

use crate::output::SinkReport;
use crate::state::Outcome;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
struct Counters {
    success: AtomicU64,
    fetch_failed: AtomicU64,
    processing_failed: AtomicU64,
    unrecognized: AtomicU64,
    entries_skipped: AtomicU64,
    lots_skipped: AtomicU64,
    links_failed: AtomicU64,
}

/// Shared, cloneable counter set
#[derive(Debug, Clone, Default)]
pub struct StatsRecorder {
    counters: Arc<Counters>,
}

impl StatsRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts the outcome of one seed
    pub fn record_outcome(&self, outcome: Outcome) {
        let counter = match outcome {
            Outcome::Success => &self.counters.success,
            Outcome::FetchFailed => &self.counters.fetch_failed,
            Outcome::ProcessingFailed => &self.counters.processing_failed,
            Outcome::Unrecognized => &self.counters.unrecognized,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts a catalog entry dropped for a missing field
    pub fn record_entry_skipped(&self) {
        self.counters.entries_skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts a lot dropped for a missing mandatory field
    pub fn record_lot_skipped(&self) {
        self.counters.lots_skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts a nested link that failed to resolve
    pub fn record_link_failed(&self) {
        self.counters.links_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Freezes the counters, adding the sink's totals
    pub fn snapshot(&self, report: SinkReport) -> RunStats {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        RunStats {
            seeds_succeeded: load(&self.counters.success),
            seeds_fetch_failed: load(&self.counters.fetch_failed),
            seeds_processing_failed: load(&self.counters.processing_failed),
            seeds_unrecognized: load(&self.counters.unrecognized),
            entries_skipped: load(&self.counters.entries_skipped),
            lots_skipped: load(&self.counters.lots_skipped),
            links_failed: load(&self.counters.links_failed),
            rows_written: report.rows_written,
            statuses_written: report.statuses_written,
        }
    }
}

/// Totals of a completed run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub seeds_succeeded: u64,
    pub seeds_fetch_failed: u64,
    pub seeds_processing_failed: u64,
    pub seeds_unrecognized: u64,
    /// Catalog entries without a tax id, name or url
    pub entries_skipped: u64,
    pub lots_skipped: u64,
    /// Links below a seed that failed without failing the seed
    pub links_failed: u64,
    pub rows_written: u64,
    pub statuses_written: u64,
}

impl RunStats {
    /// Seeds that were attempted
    pub fn seeds_total(&self) -> u64 {
        self.seeds_succeeded
            + self.seeds_fetch_failed
            + self.seeds_processing_failed
            + self.seeds_unrecognized
    }

    /// Number of seeds that ended with `outcome`
    pub fn count(&self, outcome: Outcome) -> u64 {
        match outcome {
            Outcome::Success => self.seeds_succeeded,
            Outcome::FetchFailed => self.seeds_fetch_failed,
            Outcome::ProcessingFailed => self.seeds_processing_failed,
            Outcome::Unrecognized => self.seeds_unrecognized,
        }
    }

    /// Writes the totals to the log
    pub fn log(&self) {
        tracing::info!(
            seeds = self.seeds_total(),
            succeeded = self.seeds_succeeded,
            fetch_failed = self.seeds_fetch_failed,
            processing_failed = self.seeds_processing_failed,
            unrecognized = self.seeds_unrecognized,
            rows = self.rows_written,
            "Run finished"
        );
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &RunStats) {
    println!("=== Run Statistics ===\n");

    println!("Seeds: {}", stats.seeds_total());
    for outcome in Outcome::all() {
        let count = stats.count(outcome);
        let percentage = if stats.seeds_total() > 0 {
            (count as f64 / stats.seeds_total() as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", outcome, count, percentage);
    }
    println!();

    println!("Rows written: {}", stats.rows_written);
    println!("Status rows written: {}", stats.statuses_written);

    if stats.entries_skipped + stats.lots_skipped + stats.links_failed > 0 {
        println!();
        println!("Skipped:");
        println!("  Catalog entries: {}", stats.entries_skipped);
        println!("  Lots: {}", stats.lots_skipped);
        println!("  Nested links: {}", stats.links_failed);
    }
}
