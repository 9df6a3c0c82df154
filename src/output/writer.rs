//! Single writer task for record sinks
//!
//! Resolution tasks never touch a sink directly. They send rows and status
//! rows over a bounded channel to one blocking task that owns the sink, so
//! appends are serialized and rows of one lot are never interleaved with
//! rows of another.

use crate::output::{OutputError, OutputResult, OutputRow, RecordSink, StatusRow};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Pending messages before senders wait on the writer
const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug)]
enum SinkMessage {
    Rows(Vec<OutputRow>),
    Status(StatusRow),
}

/// Totals reported by the writer task once the sink is closed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SinkReport {
    pub rows_written: u64,
    pub statuses_written: u64,
}

/// Cloneable handle used to append to the sink
#[derive(Debug, Clone)]
pub struct SinkWriter {
    tx: mpsc::Sender<SinkMessage>,
}

impl SinkWriter {
    /// Queues a batch of rows, appended as one contiguous block
    pub async fn append_rows(&self, rows: Vec<OutputRow>) -> OutputResult<()> {
        self.tx
            .send(SinkMessage::Rows(rows))
            .await
            .map_err(|_| OutputError::WriterClosed)
    }

    pub async fn append_status(&self, status: StatusRow) -> OutputResult<()> {
        self.tx
            .send(SinkMessage::Status(status))
            .await
            .map_err(|_| OutputError::WriterClosed)
    }
}

/// Handle on the running writer task
#[derive(Debug)]
pub struct WriterTask {
    handle: JoinHandle<OutputResult<SinkReport>>,
}

impl WriterTask {
    /// Waits for the sink to be drained and closed
    ///
    /// Every [`SinkWriter`] clone must have been dropped first, otherwise
    /// this waits forever.
    pub async fn finish(self) -> OutputResult<SinkReport> {
        self.handle
            .await
            .map_err(|e| OutputError::Write(format!("writer task failed: {}", e)))?
    }
}

/// Spawns the writer task that owns `sink`
pub fn spawn_writer(mut sink: Box<dyn RecordSink>) -> (SinkWriter, WriterTask) {
    let (tx, mut rx) = mpsc::channel(CHANNEL_CAPACITY);

    let handle = tokio::task::spawn_blocking(move || {
        let mut report = SinkReport::default();

        while let Some(message) = rx.blocking_recv() {
            match message {
                SinkMessage::Rows(rows) => {
                    sink.append_rows(&rows)?;
                    report.rows_written += rows.len() as u64;
                }
                SinkMessage::Status(status) => {
                    sink.append_status(&status)?;
                    report.statuses_written += 1;
                }
            }
        }

        sink.finish()?;
        tracing::debug!(
            "Output closed: {} rows, {} status rows",
            report.rows_written,
            report.statuses_written
        );
        Ok(report)
    });

    (SinkWriter { tx }, WriterTask { handle })
}
