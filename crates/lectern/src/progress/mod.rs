//! # Watch-progress bookkeeping
//!
//! [`ProgressRecorder`] decides which unified events are worth persisting and
//! [`ProgressSink`] delivers the resulting snapshots to a [`ProgressService`]
//! in order, off the playback path.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod http;
pub mod recorder;
pub mod sink;

pub use http::HttpProgressService;
pub use recorder::ProgressRecorder;
pub use sink::ProgressSink;

/// Progress of one lesson at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSnapshot {
    pub lesson_id: String,
    pub current_time: f64,
    pub duration: f64,
    /// 0-99 while watching, 100 once completed.
    pub percent: u8,
    pub completed: bool,
}

/// Payload accepted by the progress collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdate {
    pub lesson_id: String,
    pub progress: u8,
    pub last_watched_position: f64,
    pub completed: bool,
}

impl From<&ProgressSnapshot> for ProgressUpdate {
    fn from(snapshot: &ProgressSnapshot) -> Self {
        Self {
            lesson_id: snapshot.lesson_id.clone(),
            progress: snapshot.percent,
            last_watched_position: snapshot.current_time,
            completed: snapshot.completed,
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ProgressPersistError {
    #[error("Network error: {source}")]
    Network {
        #[from]
        source: Arc<reqwest::Error>,
    },
    #[error("Progress endpoint answered HTTP {status}")]
    Status { status: u16 },
    #[error("Progress update rejected: {0}")]
    Rejected(String),
}

// Manual implementation because of the Arc wrapping.
impl From<reqwest::Error> for ProgressPersistError {
    fn from(err: reqwest::Error) -> Self {
        ProgressPersistError::Network {
            source: Arc::new(err),
        }
    }
}

/// The collaborator that stores watch progress.
#[async_trait]
pub trait ProgressService: Send + Sync {
    async fn update_progress(&self, update: ProgressUpdate) -> Result<(), ProgressPersistError>;
}
