use async_trait::async_trait;
use lectern_engine::{ProgressPersistError, ProgressService, ProgressUpdate};
use parking_lot::Mutex;
use tracing::info;

/// Writes progress updates to the log and remembers the latest one.
#[derive(Default)]
pub struct LogProgressService {
    last: Mutex<Option<ProgressUpdate>>,
}

impl LogProgressService {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn last(&self) -> Option<ProgressUpdate> {
        self.last.lock().clone()
    }
}

#[async_trait]
impl ProgressService for LogProgressService {
    async fn update_progress(&self, update: ProgressUpdate) -> Result<(), ProgressPersistError> {
        info!(
            lesson_id = %update.lesson_id,
            progress = update.progress,
            position = update.last_watched_position,
            completed = update.completed,
            "Progress recorded"
        );
        *self.last.lock() = Some(update);
        Ok(())
    }
}
