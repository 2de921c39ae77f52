//! # Unified playback events
//!
//! Every adapter reports through its own mix of native events. The
//! [`EventTranslator`] folds them into the five-event vocabulary the rest of
//! the engine (and the host UI) understands, and [`SessionEvents`] delivers
//! them to the caller for as long as the session is live.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::Stream;
use parking_lot::RwLock;
use tokio::sync::mpsc;
use tracing::trace;

use crate::PlayerError;
use crate::media::{NativeEvent, NativeEventKind};

/// A `(current_time, duration)` pair sampled from the media element.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlaybackPosition {
    pub current_time: f64,
    pub duration: f64,
}

impl PlaybackPosition {
    pub fn new(current_time: f64, duration: f64) -> Self {
        Self {
            current_time,
            duration,
        }
    }

    /// Whether the duration is known and usable as a denominator.
    pub fn has_duration(&self) -> bool {
        self.duration.is_finite() && self.duration > 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackEvent {
    Playing,
    Paused,
    Ended,
    TimeUpdate { current_time: f64, duration: f64 },
    Seeked,
}

/// Items delivered on a session's event stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionEvent {
    /// The adapter attached its source and transport calls are now routed.
    Ready,
    Playback(PlaybackEvent),
}

/// Folds native element events into [`PlaybackEvent`]s.
#[derive(Debug, Default)]
pub struct EventTranslator {
    playing: bool,
}

impl EventTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn translate(&mut self, event: &NativeEvent) -> Option<PlaybackEvent> {
        let translated = match event.kind {
            // play and playing usually arrive back to back
            NativeEventKind::Play | NativeEventKind::Playing => {
                if self.playing {
                    None
                } else {
                    self.playing = true;
                    Some(PlaybackEvent::Playing)
                }
            }
            NativeEventKind::Pause => {
                self.playing = false;
                Some(PlaybackEvent::Paused)
            }
            NativeEventKind::Ended => {
                self.playing = false;
                Some(PlaybackEvent::Ended)
            }
            NativeEventKind::TimeUpdate => Some(PlaybackEvent::TimeUpdate {
                current_time: event.current_time,
                duration: event.duration,
            }),
            NativeEventKind::Seeked => Some(PlaybackEvent::Seeked),
            NativeEventKind::LoadedMetadata
            | NativeEventKind::Seeking
            | NativeEventKind::VolumeChange
            | NativeEventKind::Error(_) => None,
        };

        trace!(native = ?event.kind, translated = ?translated, "Translated native event");
        translated
    }

    /// Forget the collapse state, e.g. after the source was reattached.
    pub fn reset(&mut self) {
        self.playing = false;
    }
}

pub type ReadyHandler = Arc<dyn Fn() + Send + Sync>;
pub type EventHandler = Arc<dyn Fn() + Send + Sync>;
pub type ProgressHandler = Arc<dyn Fn(f64, f64) + Send + Sync>;
pub type ErrorHandler = Arc<dyn Fn(&PlayerError) + Send + Sync>;

#[derive(Default, Clone)]
struct HandlerSet {
    ready: Option<ReadyHandler>,
    playing: Option<EventHandler>,
    paused: Option<EventHandler>,
    ended: Option<EventHandler>,
    seeked: Option<EventHandler>,
    progress: Option<ProgressHandler>,
    error: Option<ErrorHandler>,
}

/// Host callbacks registered on the manager. They outlive individual
/// sessions; the session driver decides whether a dispatch is still allowed.
#[derive(Default)]
pub struct PlaybackHandlers {
    inner: RwLock<HandlerSet>,
}

impl PlaybackHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_ready(&self, handler: ReadyHandler) {
        self.inner.write().ready = Some(handler);
    }

    pub fn set_playing(&self, handler: EventHandler) {
        self.inner.write().playing = Some(handler);
    }

    pub fn set_paused(&self, handler: EventHandler) {
        self.inner.write().paused = Some(handler);
    }

    pub fn set_ended(&self, handler: EventHandler) {
        self.inner.write().ended = Some(handler);
    }

    pub fn set_seeked(&self, handler: EventHandler) {
        self.inner.write().seeked = Some(handler);
    }

    pub fn set_progress(&self, handler: ProgressHandler) {
        self.inner.write().progress = Some(handler);
    }

    pub fn set_error(&self, handler: ErrorHandler) {
        self.inner.write().error = Some(handler);
    }

    pub fn clear(&self) {
        *self.inner.write() = HandlerSet::default();
    }

    /// Invoke the handler matching `event`, if one is registered.
    pub fn dispatch(&self, event: &SessionEvent) {
        // Clone out of the lock so a handler may re-register handlers.
        let handlers = self.inner.read().clone();
        match event {
            SessionEvent::Ready => {
                if let Some(handler) = handlers.ready {
                    handler();
                }
            }
            SessionEvent::Playback(PlaybackEvent::Playing) => {
                if let Some(handler) = handlers.playing {
                    handler();
                }
            }
            SessionEvent::Playback(PlaybackEvent::Paused) => {
                if let Some(handler) = handlers.paused {
                    handler();
                }
            }
            SessionEvent::Playback(PlaybackEvent::Ended) => {
                if let Some(handler) = handlers.ended {
                    handler();
                }
            }
            SessionEvent::Playback(PlaybackEvent::Seeked) => {
                if let Some(handler) = handlers.seeked {
                    handler();
                }
            }
            SessionEvent::Playback(PlaybackEvent::TimeUpdate {
                current_time,
                duration,
            }) => {
                if let Some(handler) = handlers.progress {
                    handler(*current_time, *duration);
                }
            }
        }
    }

    pub fn dispatch_error(&self, error: &PlayerError) {
        let handler = self.inner.read().error.clone();
        if let Some(handler) = handler {
            handler(error);
        }
    }
}

pub(crate) type EventSender = mpsc::UnboundedSender<Result<SessionEvent, PlayerError>>;

/// The caller's view of one session's unified events.
///
/// The stream ends when the session is torn down or replaced, or right after
/// a terminal `Err` item reporting a fatal failure.
pub struct SessionEvents {
    lesson_id: String,
    revoked: Arc<AtomicBool>,
    rx: mpsc::UnboundedReceiver<Result<SessionEvent, PlayerError>>,
}

impl SessionEvents {
    pub(crate) fn channel(
        lesson_id: impl Into<String>,
        revoked: Arc<AtomicBool>,
    ) -> (EventSender, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            tx,
            Self {
                lesson_id: lesson_id.into(),
                revoked,
                rx,
            },
        )
    }

    pub fn lesson_id(&self) -> &str {
        &self.lesson_id
    }

    /// Wait for the next event. Returns `None` once the session is gone.
    pub async fn recv(&mut self) -> Option<Result<SessionEvent, PlayerError>> {
        if self.revoked.load(Ordering::Acquire) {
            return None;
        }
        let item = self.rx.recv().await?;
        // Anything still buffered when the session was revoked is dropped.
        if self.revoked.load(Ordering::Acquire) {
            return None;
        }
        Some(item)
    }

    pub fn into_stream(self) -> impl Stream<Item = Result<SessionEvent, PlayerError>> {
        futures::stream::unfold(self, |mut events| async move {
            events.recv().await.map(|item| (item, events))
        })
    }
}
