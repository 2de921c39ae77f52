use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::progress::{ProgressService, ProgressSnapshot, ProgressUpdate};

/// Fire-and-forget delivery of progress snapshots.
///
/// Snapshots are written one at a time, in submission order, by a background
/// task. Failed writes are logged and dropped. Dropping the sink lets the
/// task drain what is already queued and exit.
pub struct ProgressSink {
    tx: mpsc::UnboundedSender<ProgressSnapshot>,
    task: JoinHandle<()>,
}

impl ProgressSink {
    pub fn spawn(service: Arc<dyn ProgressService>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<ProgressSnapshot>();

        let task = tokio::spawn(async move {
            while let Some(snapshot) = rx.recv().await {
                let update = ProgressUpdate::from(&snapshot);
                debug!(
                    lesson_id = %update.lesson_id,
                    progress = update.progress,
                    position = update.last_watched_position,
                    completed = update.completed,
                    "Persisting progress"
                );
                if let Err(e) = service.update_progress(update).await {
                    warn!(
                        lesson_id = %snapshot.lesson_id,
                        error = %e,
                        "Failed to persist progress, dropping update"
                    );
                }
            }
        });

        Self { tx, task }
    }

    pub fn submit(&self, snapshot: ProgressSnapshot) {
        if self.tx.send(snapshot).is_err() {
            warn!("Progress writer is gone, dropping update");
        }
    }

    /// Stop accepting snapshots and wait for queued ones to be written.
    pub async fn flush(self) {
        let Self { tx, task } = self;
        drop(tx);
        if let Err(e) = task.await {
            warn!(error = %e, "Progress writer task failed");
        }
    }
}
