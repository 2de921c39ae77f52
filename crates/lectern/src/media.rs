//! # Media host traits
//!
//! The engine never touches a rendering toolkit directly. The host hands it a
//! [`MediaSurface`] (the slot a lesson video lives in) and the surface hands
//! out [`MediaElement`]s: objects with the usual source/transport/volume
//! properties that broadcast [`NativeEvent`]s as playback progresses.

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::events::PlaybackPosition;

/// MIME type checked for native adaptive streaming support.
pub const HLS_MIME_TYPE: &str = "application/vnd.apple.mpegurl";

/// Error codes carried by a native `error` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaErrorCode {
    Aborted,
    Network,
    Decode,
    SourceNotSupported,
}

impl MediaErrorCode {
    /// Map the numeric codes used by web media elements.
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            1 => Some(Self::Aborted),
            2 => Some(Self::Network),
            3 => Some(Self::Decode),
            4 => Some(Self::SourceNotSupported),
            _ => None,
        }
    }
}

/// Errors raised synchronously by element operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MediaError {
    #[error("Playback request rejected: {0}")]
    PlaybackRejected(String),
    #[error("Fullscreen request rejected: {0}")]
    FullscreenRejected(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeEventKind {
    LoadedMetadata,
    Play,
    Playing,
    Pause,
    Ended,
    TimeUpdate,
    Seeking,
    Seeked,
    VolumeChange,
    Error(MediaErrorCode),
}

/// An event as dispatched by a media element, with the element's position
/// captured at dispatch time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NativeEvent {
    pub kind: NativeEventKind,
    pub current_time: f64,
    pub duration: f64,
}

impl NativeEvent {
    pub fn new(kind: NativeEventKind, current_time: f64, duration: f64) -> Self {
        Self {
            kind,
            current_time,
            duration,
        }
    }

    pub fn position(&self) -> PlaybackPosition {
        PlaybackPosition::new(self.current_time, self.duration)
    }
}

/// A playable element hosted by a [`MediaSurface`].
///
/// Implementations are expected to be cheap, synchronous property accessors;
/// anything slow happens behind the element and is reported through
/// [`MediaElement::subscribe`].
pub trait MediaElement: Send + Sync {
    fn set_source(&self, url: &str);
    /// Detach the current source and stop any loading it started.
    fn clear_source(&self);
    fn source(&self) -> Option<String>;
    fn set_poster(&self, url: &str);
    fn set_attribute(&self, name: &str, value: &str);

    fn play(&self) -> Result<(), MediaError>;
    fn pause(&self);
    fn is_paused(&self) -> bool;
    fn current_time(&self) -> f64;
    fn seek(&self, time: f64);
    /// Media duration in seconds; zero or non-finite while unknown.
    fn duration(&self) -> f64;

    fn volume(&self) -> f64;
    fn set_volume(&self, volume: f64);
    fn is_muted(&self) -> bool;
    fn set_muted(&self, muted: bool);

    fn enter_fullscreen(&self) -> Result<(), MediaError>;
    fn exit_fullscreen(&self);
    fn is_fullscreen(&self) -> bool;

    fn can_play_type(&self, mime: &str) -> bool;
    fn subscribe(&self) -> broadcast::Receiver<NativeEvent>;
}

/// The UI slot a session attaches playback output to.
pub trait MediaSurface: Send + Sync {
    /// The element currently hosted by the slot.
    fn element(&self) -> Arc<dyn MediaElement>;

    /// Substitute the slot content with a vendor component element. The
    /// previous element is not restorable afterwards.
    fn replace_with_component(&self, tag: &str) -> Arc<dyn MediaElement>;
}

/// Runtime capability probing.
pub trait MediaCapabilities: Send + Sync {
    /// Whether media-source extensions are available for library-driven
    /// adaptive streaming.
    fn supports_media_source(&self) -> bool;
}

/// Capabilities fixed at construction time.
#[derive(Debug, Clone, Copy)]
pub struct StaticCapabilities {
    pub media_source: bool,
}

impl Default for StaticCapabilities {
    fn default() -> Self {
        Self { media_source: true }
    }
}

impl MediaCapabilities for StaticCapabilities {
    fn supports_media_source(&self) -> bool {
        self.media_source
    }
}
