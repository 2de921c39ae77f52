use std::sync::Arc;

use crate::error::AdapterFailure;

#[derive(Debug, thiserror::Error, Clone)]
pub enum ManifestError {
    #[error("Network error: {source}")]
    Network {
        #[from]
        source: Arc<reqwest::Error>,
    },
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("HTTP {status} fetching {url}")]
    Status { status: u16, url: String },
    #[error("Invalid playlist URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("Playlist error: {0}")]
    Parse(String),
    #[error("Master playlist has no playable variants")]
    NoVariants,
}

// Manual implementation because of the Arc wrapping.
impl From<reqwest::Error> for ManifestError {
    fn from(err: reqwest::Error) -> Self {
        ManifestError::Network {
            source: Arc::new(err),
        }
    }
}

impl ManifestError {
    /// Transport and HTTP status failures may succeed on a reload.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            ManifestError::Network { .. }
                | ManifestError::Transport(_)
                | ManifestError::Status { .. }
        )
    }
}

impl From<ManifestError> for AdapterFailure {
    fn from(err: ManifestError) -> Self {
        if err.is_network() {
            AdapterFailure::network(err.to_string())
        } else {
            AdapterFailure::fatal(err.to_string())
        }
    }
}
