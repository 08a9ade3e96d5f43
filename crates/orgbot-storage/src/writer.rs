//! Background writer that keeps sink appends off the conversation path

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info};

use orgbot_core::Record;

use crate::sink::RecordSink;

/// Cheap, clonable handle for submitting finalized records.
#[derive(Clone)]
pub struct SinkHandle {
    tx: mpsc::UnboundedSender<Record>,
}

impl SinkHandle {
    /// Queues a record for appending. Never blocks and never fails the
    /// caller; a dead writer is logged and the record is lost.
    pub fn submit(&self, record: Record) {
        if let Err(err) = self.tx.send(record) {
            error!(user_id = err.0.user_id, "record writer is gone, record dropped");
        }
    }
}

pub struct SinkWriter;

impl SinkWriter {
    /// Spawns the writer task. The task drains submitted records one at
    /// a time, appends them to the sink and logs each outcome; there is
    /// no retry and no dedup. It exits when every handle is dropped.
    pub fn spawn(sink: Arc<dyn RecordSink>) -> (SinkHandle, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<Record>();
        let worker = tokio::spawn(async move {
            while let Some(record) = rx.recv().await {
                match sink.append(&record).await {
                    Ok(()) => info!(user_id = record.user_id, "record appended"),
                    Err(err) => {
                        error!(user_id = record.user_id, error = %err, "record append failed")
                    }
                }
            }
        });
        (SinkHandle { tx }, worker)
    }
}
