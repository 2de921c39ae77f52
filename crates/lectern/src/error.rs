use std::sync::Arc;

use crate::media::MediaError;

/// Failure class reported by a provider adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Manifest or segment transport failed.
    Network,
    /// The media pipeline could not decode what it was given.
    Media,
    /// Anything the recovery policy does not know how to repair.
    Other,
}

/// A failure as reported by an adapter, before the recovery policy has
/// decided what to do with it.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{kind:?} failure (fatal: {fatal}): {message}")]
pub struct AdapterFailure {
    pub kind: FailureKind,
    pub fatal: bool,
    pub message: String,
}

impl AdapterFailure {
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Network,
            fatal: false,
            message: message.into(),
        }
    }

    pub fn media(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Media,
            fatal: false,
            message: message.into(),
        }
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Other,
            fatal: true,
            message: message.into(),
        }
    }
}

// Custom error type for playback operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum PlayerError {
    #[error("Unsupported playback configuration: {0}")]
    UnsupportedConfig(String),

    #[error("Manifest load error: {0}")]
    ManifestLoad(String),

    #[error("Media decode error: {0}")]
    MediaDecode(String),

    #[error("Fatal playback error: {0}")]
    UnknownFatal(String),

    #[error("No active playback session")]
    NoActiveSession,

    #[error("The active session has no controllable media element")]
    NoController,

    #[error("Media element error: {0}")]
    Element(#[from] MediaError),

    #[error("HTTP client error: {source}")]
    Http {
        #[from]
        source: Arc<reqwest::Error>,
    },
}

// Manual implementation because of the Arc wrapping.
impl From<reqwest::Error> for PlayerError {
    fn from(err: reqwest::Error) -> Self {
        PlayerError::Http {
            source: Arc::new(err),
        }
    }
}

impl From<AdapterFailure> for PlayerError {
    fn from(failure: AdapterFailure) -> Self {
        match failure.kind {
            FailureKind::Network => PlayerError::ManifestLoad(failure.message),
            FailureKind::Media => PlayerError::MediaDecode(failure.message),
            FailureKind::Other => PlayerError::UnknownFatal(failure.message),
        }
    }
}
