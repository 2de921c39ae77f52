//! Test doubles for the host-side traits and collaborators.
//!
//! - [`FakeMediaElement`] / [`FakeSurface`]: an in-memory media element whose
//!   native events are driven by hand
//! - [`RecordingProgressService`]: records every progress write
//! - [`ScriptedManifestLoader`]: serves canned playlists
//! - `init_test_tracing!()` - installs a test-writer subscriber (DEBUG default)

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{Notify, broadcast};
use url::Url;

use crate::hls::{ManifestError, ManifestLoader};
use crate::media::{
    HLS_MIME_TYPE, MediaElement, MediaError, MediaErrorCode, MediaSurface, NativeEvent,
    NativeEventKind,
};
use crate::progress::{ProgressPersistError, ProgressService, ProgressUpdate};

pub use crate::media::StaticCapabilities;
pub use crate::quality::FixedNetworkHint;

/// Macro to initialize tracing for tests
///
/// Usage:
/// - `init_test_tracing!()` - uses DEBUG level (default)
/// - `init_test_tracing!(INFO)` - uses specified level
#[macro_export]
macro_rules! init_test_tracing {
    () => {
        $crate::init_test_tracing!(DEBUG);
    };
    ($level:ident) => {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::$level)
            .with_test_writer()
            .try_init();
    };
}

const EVENT_CAPACITY: usize = 256;
const WAIT_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug)]
struct ElementState {
    source: Option<String>,
    source_history: Vec<String>,
    clear_count: usize,
    poster: Option<String>,
    attributes: HashMap<String, String>,
    paused: bool,
    current_time: f64,
    duration: f64,
    volume: f64,
    muted: bool,
    fullscreen: bool,
    playable_types: HashSet<String>,
    auto_metadata: bool,
    play_rejection: Option<String>,
}

impl Default for ElementState {
    fn default() -> Self {
        Self {
            source: None,
            source_history: Vec::new(),
            clear_count: 0,
            poster: None,
            attributes: HashMap::new(),
            paused: true,
            current_time: 0.0,
            duration: 0.0,
            volume: 1.0,
            muted: false,
            fullscreen: false,
            playable_types: HashSet::new(),
            auto_metadata: true,
            play_rejection: None,
        }
    }
}

/// An in-memory [`MediaElement`].
///
/// Setting a source emits `loadedmetadata` (unless disabled with
/// [`FakeMediaElement::set_auto_metadata`]); transport calls emit the events
/// a browser element would.
pub struct FakeMediaElement {
    state: Mutex<ElementState>,
    events: broadcast::Sender<NativeEvent>,
}

impl FakeMediaElement {
    pub fn new() -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Arc::new(Self {
            state: Mutex::new(ElementState::default()),
            events,
        })
    }

    /// An element that can play manifests natively.
    pub fn with_native_hls() -> Arc<Self> {
        let element = Self::new();
        element
            .state
            .lock()
            .playable_types
            .insert(HLS_MIME_TYPE.to_string());
        element
    }

    pub fn set_duration(&self, duration: f64) {
        self.state.lock().duration = duration;
    }

    pub fn set_auto_metadata(&self, enabled: bool) {
        self.state.lock().auto_metadata = enabled;
    }

    /// Make subsequent `play()` calls fail.
    pub fn reject_play(&self, reason: impl Into<String>) {
        self.state.lock().play_rejection = Some(reason.into());
    }

    /// Emit `kind` with the element's current position.
    pub fn emit(&self, kind: NativeEventKind) {
        let (current_time, duration) = {
            let state = self.state.lock();
            (state.current_time, state.duration)
        };
        // No receivers is fine.
        let _ = self
            .events
            .send(NativeEvent::new(kind, current_time, duration));
    }

    /// Move the playhead and emit `timeupdate`.
    pub fn advance_to(&self, time: f64) {
        self.state.lock().current_time = time;
        self.emit(NativeEventKind::TimeUpdate);
    }

    /// Play to the end: the playhead moves to the duration, then `pause`
    /// and `ended` fire.
    pub fn finish(&self) {
        {
            let mut state = self.state.lock();
            state.current_time = state.duration;
            state.paused = true;
        }
        self.emit(NativeEventKind::TimeUpdate);
        self.emit(NativeEventKind::Pause);
        self.emit(NativeEventKind::Ended);
    }

    pub fn fail(&self, code: MediaErrorCode) {
        self.emit(NativeEventKind::Error(code));
    }

    /// Live native event subscriptions.
    pub fn listener_count(&self) -> usize {
        self.events.receiver_count()
    }

    pub fn source_history(&self) -> Vec<String> {
        self.state.lock().source_history.clone()
    }

    pub fn clear_count(&self) -> usize {
        self.state.lock().clear_count
    }

    pub fn poster(&self) -> Option<String> {
        self.state.lock().poster.clone()
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.state.lock().attributes.get(name).cloned()
    }
}

impl MediaElement for FakeMediaElement {
    fn set_source(&self, url: &str) {
        let auto_metadata = {
            let mut state = self.state.lock();
            state.source = Some(url.to_string());
            state.source_history.push(url.to_string());
            state.current_time = 0.0;
            state.paused = true;
            state.auto_metadata
        };
        if auto_metadata {
            self.emit(NativeEventKind::LoadedMetadata);
        }
    }

    fn clear_source(&self) {
        let mut state = self.state.lock();
        state.source = None;
        state.paused = true;
        state.clear_count += 1;
    }

    fn source(&self) -> Option<String> {
        self.state.lock().source.clone()
    }

    fn set_poster(&self, url: &str) {
        self.state.lock().poster = Some(url.to_string());
    }

    fn set_attribute(&self, name: &str, value: &str) {
        self.state
            .lock()
            .attributes
            .insert(name.to_string(), value.to_string());
    }

    fn play(&self) -> Result<(), MediaError> {
        {
            let mut state = self.state.lock();
            if let Some(reason) = &state.play_rejection {
                return Err(MediaError::PlaybackRejected(reason.clone()));
            }
            state.paused = false;
        }
        self.emit(NativeEventKind::Play);
        self.emit(NativeEventKind::Playing);
        Ok(())
    }

    fn pause(&self) {
        let was_playing = {
            let mut state = self.state.lock();
            !std::mem::replace(&mut state.paused, true)
        };
        if was_playing {
            self.emit(NativeEventKind::Pause);
        }
    }

    fn is_paused(&self) -> bool {
        self.state.lock().paused
    }

    fn current_time(&self) -> f64 {
        self.state.lock().current_time
    }

    fn seek(&self, time: f64) {
        self.state.lock().current_time = time;
        self.emit(NativeEventKind::Seeking);
        self.emit(NativeEventKind::Seeked);
    }

    fn duration(&self) -> f64 {
        self.state.lock().duration
    }

    fn volume(&self) -> f64 {
        self.state.lock().volume
    }

    fn set_volume(&self, volume: f64) {
        self.state.lock().volume = volume;
        self.emit(NativeEventKind::VolumeChange);
    }

    fn is_muted(&self) -> bool {
        self.state.lock().muted
    }

    fn set_muted(&self, muted: bool) {
        self.state.lock().muted = muted;
        self.emit(NativeEventKind::VolumeChange);
    }

    fn enter_fullscreen(&self) -> Result<(), MediaError> {
        self.state.lock().fullscreen = true;
        Ok(())
    }

    fn exit_fullscreen(&self) {
        self.state.lock().fullscreen = false;
    }

    fn is_fullscreen(&self) -> bool {
        self.state.lock().fullscreen
    }

    fn can_play_type(&self, mime: &str) -> bool {
        self.state.lock().playable_types.contains(mime)
    }

    fn subscribe(&self) -> broadcast::Receiver<NativeEvent> {
        self.events.subscribe()
    }
}

/// A [`MediaSurface`] hosting a [`FakeMediaElement`].
pub struct FakeSurface {
    element: Mutex<Arc<FakeMediaElement>>,
    component_tag: Mutex<Option<String>>,
}

impl FakeSurface {
    pub fn new() -> Arc<Self> {
        Self::with_element(FakeMediaElement::new())
    }

    /// A surface whose element plays manifests natively.
    pub fn native_hls() -> Arc<Self> {
        Self::with_element(FakeMediaElement::with_native_hls())
    }

    pub fn with_element(element: Arc<FakeMediaElement>) -> Arc<Self> {
        Arc::new(Self {
            element: Mutex::new(element),
            component_tag: Mutex::new(None),
        })
    }

    /// The element currently in the slot, as the concrete fake.
    pub fn fake_element(&self) -> Arc<FakeMediaElement> {
        self.element.lock().clone()
    }

    /// Tag of the component that replaced the original element, if any.
    pub fn component_tag(&self) -> Option<String> {
        self.component_tag.lock().clone()
    }
}

impl MediaSurface for FakeSurface {
    fn element(&self) -> Arc<dyn MediaElement> {
        self.element.lock().clone()
    }

    fn replace_with_component(&self, tag: &str) -> Arc<dyn MediaElement> {
        let component = FakeMediaElement::new();
        *self.element.lock() = component.clone();
        *self.component_tag.lock() = Some(tag.to_string());
        component
    }
}

/// A [`ProgressService`] that records every call.
#[derive(Default)]
pub struct RecordingProgressService {
    calls: Mutex<Vec<ProgressUpdate>>,
    failing: AtomicBool,
    notify: Notify,
}

impl RecordingProgressService {
    pub fn new() -> Self {
        Self::default()
    }

    /// When set, calls are still recorded but answer with an error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<ProgressUpdate> {
        self.calls.lock().clone()
    }

    /// Wait (bounded) until at least `count` calls were made, then return
    /// everything recorded so far.
    pub async fn wait_for_calls(&self, count: usize) -> Vec<ProgressUpdate> {
        let wait = async {
            loop {
                let notified = self.notify.notified();
                if self.calls.lock().len() >= count {
                    return;
                }
                notified.await;
            }
        };
        let _ = tokio::time::timeout(WAIT_TIMEOUT, wait).await;
        self.calls()
    }
}

#[async_trait]
impl ProgressService for RecordingProgressService {
    async fn update_progress(&self, update: ProgressUpdate) -> Result<(), ProgressPersistError> {
        self.calls.lock().push(update);
        self.notify.notify_waiters();
        if self.failing.load(Ordering::SeqCst) {
            return Err(ProgressPersistError::Rejected("injected failure".to_string()));
        }
        Ok(())
    }
}

/// A [`ManifestLoader`] answering from per-URL response queues.
///
/// The last queued response for a URL is repeated; unscripted URLs fail with
/// a transport error as an unreachable host would.
#[derive(Default)]
pub struct ScriptedManifestLoader {
    responses: Mutex<HashMap<String, VecDeque<Result<String, ManifestError>>>>,
    requests: Mutex<Vec<String>>,
    delay: Option<Duration>,
}

impl ScriptedManifestLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, url: &str, body: &str) -> Self {
        self.push(url, Ok(body.to_string()));
        self
    }

    pub fn fail(self, url: &str, error: ManifestError) -> Self {
        self.push(url, Err(error));
        self
    }

    /// Delay every response.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn push(&self, url: &str, response: Result<String, ManifestError>) {
        self.responses
            .lock()
            .entry(url.to_string())
            .or_default()
            .push_back(response);
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl ManifestLoader for ScriptedManifestLoader {
    async fn load(&self, url: &Url) -> Result<String, ManifestError> {
        self.requests.lock().push(url.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let mut responses = self.responses.lock();
        let Some(queue) = responses.get_mut(url.as_str()) else {
            return Err(ManifestError::Transport(format!("no route to {url}")));
        };
        if queue.len() > 1 {
            queue
                .pop_front()
                .unwrap_or_else(|| Err(ManifestError::Transport("empty script".into())))
        } else {
            queue
                .front()
                .cloned()
                .unwrap_or_else(|| Err(ManifestError::Transport("empty script".into())))
        }
    }
}
