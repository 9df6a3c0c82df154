//! Output module for the run's tables
//!
//! This module handles:
//! - Building participant rows from extracted lots
//! - Appending rows and statuses to CSV, SQLite, or memory
//! - Serializing all appends through a single writer task
//! - Recording run statistics

mod builder;
mod csv_sink;
mod memory;
pub mod stats;
mod traits;
mod writer;

pub use builder::build_rows;
pub use csv_sink::CsvSink;
pub use memory::MemorySink;
pub use stats::{print_statistics, RunStats, StatsRecorder};
pub use traits::{OutputError, OutputResult, OutputRow, RecordSink, StatusRow};
pub use writer::{spawn_writer, SinkReport, SinkWriter, WriterTask};
