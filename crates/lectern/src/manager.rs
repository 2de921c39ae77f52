//! # Playback session manager
//!
//! [`PlaybackSessionManager`] is the entry point hosts talk to. It owns at
//! most one [`PlaybackSession`] at a time: `initialize` tears down whatever
//! was playing, picks an adapter for the new lesson and starts its driver;
//! `teardown` stops it. Transport calls are routed to the session's
//! [`UiController`] once the adapter is ready.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use lectern_engine::test_utils::{FakeSurface, RecordingProgressService};
//! use lectern_engine::{PlaybackConfig, PlaybackSessionManager, ProviderKind, SessionEvent};
//!
//! # async fn example() -> Result<(), lectern_engine::PlayerError> {
//! let manager = PlaybackSessionManager::builder(Arc::new(RecordingProgressService::new())).build()?;
//! let config = PlaybackConfig::builder("https://cdn.example.com/intro.mp4", ProviderKind::PlainFile).build();
//!
//! let mut events = manager.initialize(config, FakeSurface::new(), "lesson-1").await?;
//! while let Some(event) = events.recv().await {
//!     if let Ok(SessionEvent::Ready) = event {
//!         manager.play()?;
//!     }
//! }
//! manager.teardown().await;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::controller::UiController;
use crate::events::{EventTranslator, PlaybackHandlers, SessionEvents};
use crate::factory::AdapterFactory;
use crate::hls::{HttpManifestLoader, ManifestLoader};
use crate::media::{MediaCapabilities, MediaSurface, StaticCapabilities};
use crate::progress::{ProgressRecorder, ProgressService, ProgressSink};
use crate::quality::{NetworkQualityHint, UnknownNetwork, VideoQuality, recommend_quality};
use crate::recovery::ErrorRecoveryPolicy;
use crate::session::{PlaybackSession, SessionDriver, SessionShared, SessionSlot};
use crate::state::SessionState;
use crate::{EngineConfig, PlaybackConfig, PlayerError};

/// Builder for [`PlaybackSessionManager`].
pub struct PlaybackSessionManagerBuilder {
    progress: Arc<dyn ProgressService>,
    config: EngineConfig,
    capabilities: Option<Arc<dyn MediaCapabilities>>,
    network: Option<Arc<dyn NetworkQualityHint>>,
    loader: Option<Arc<dyn ManifestLoader>>,
}

impl PlaybackSessionManagerBuilder {
    pub fn new(progress: Arc<dyn ProgressService>) -> Self {
        Self {
            progress,
            config: EngineConfig::default(),
            capabilities: None,
            network: None,
            loader: None,
        }
    }

    pub fn engine_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn capabilities(mut self, capabilities: Arc<dyn MediaCapabilities>) -> Self {
        self.capabilities = Some(capabilities);
        self
    }

    pub fn network_hint(mut self, network: Arc<dyn NetworkQualityHint>) -> Self {
        self.network = Some(network);
        self
    }

    /// Replace the HTTP manifest loader.
    pub fn manifest_loader(mut self, loader: Arc<dyn ManifestLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    pub fn build(self) -> Result<PlaybackSessionManager, PlayerError> {
        let loader = match self.loader {
            Some(loader) => loader,
            None => Arc::new(HttpManifestLoader::from_config(&self.config.http)?),
        };
        let capabilities = self
            .capabilities
            .unwrap_or_else(|| Arc::new(StaticCapabilities::default()));

        Ok(PlaybackSessionManager {
            factory: AdapterFactory::new(capabilities, loader),
            network: self.network.unwrap_or_else(|| Arc::new(UnknownNetwork)),
            progress: self.progress,
            config: self.config,
            handlers: Arc::new(PlaybackHandlers::new()),
            session: Arc::new(Mutex::new(None)),
            lifecycle: tokio::sync::Mutex::new(()),
            generation: AtomicU64::new(0),
        })
    }
}

/// Orchestrates the single active lesson playback session.
pub struct PlaybackSessionManager {
    config: EngineConfig,
    factory: AdapterFactory,
    progress: Arc<dyn ProgressService>,
    network: Arc<dyn NetworkQualityHint>,
    handlers: Arc<PlaybackHandlers>,
    session: Arc<SessionSlot>,
    /// Serializes initialize and teardown.
    lifecycle: tokio::sync::Mutex<()>,
    generation: AtomicU64,
}

impl PlaybackSessionManager {
    pub fn builder(progress: Arc<dyn ProgressService>) -> PlaybackSessionManagerBuilder {
        PlaybackSessionManagerBuilder::new(progress)
    }

    /// Start playback of `lesson_id` on `surface`.
    ///
    /// Any existing session is torn down first, and that teardown completes
    /// before the new session is created. Returns as soon as the adapter is
    /// attaching; [`SessionEvent::Ready`](crate::SessionEvent::Ready) arrives
    /// on the returned stream once transport calls are routed.
    pub async fn initialize(
        &self,
        config: PlaybackConfig,
        surface: Arc<dyn MediaSurface>,
        lesson_id: impl Into<String>,
    ) -> Result<SessionEvents, PlayerError> {
        let lesson_id = lesson_id.into();
        let _lifecycle = self.lifecycle.lock().await;

        self.teardown_locked().await;

        config.validate()?;
        let quality = self.recommended_quality();
        let adapter = self.factory.create(&config, surface.as_ref(), quality)?;
        let adapter_kind = adapter.kind();

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let revoked = Arc::new(AtomicBool::new(false));
        let shared = Arc::new(SessionShared::new(
            lesson_id.clone(),
            generation,
            revoked.clone(),
        ));
        shared.transition(SessionState::Loading);

        let (events_tx, events) = SessionEvents::channel(lesson_id.clone(), revoked);
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let driver = SessionDriver {
            shared,
            recorder: ProgressRecorder::new(lesson_id.clone(), self.config.progress_interval),
            sink: ProgressSink::spawn(self.progress.clone()),
            policy: ErrorRecoveryPolicy::from_config(&self.config),
            translator: EventTranslator::new(),
            handlers: self.handlers.clone(),
            events: events_tx,
            shutdown_rx,
            slot: Arc::downgrade(&self.session),
            recovered: false,
            config,
            surface,
            adapter,
        };

        {
            // Hold the slot while spawning so a fast fatal failure cannot
            // look for the session before it is stored.
            let mut slot = self.session.lock();
            *slot = Some(PlaybackSession::start(driver, shutdown_tx));
        }

        info!(
            lesson_id = %lesson_id,
            adapter = %adapter_kind,
            quality = %quality,
            generation,
            "Playback session initialized"
        );
        Ok(events)
    }

    /// Tear down the active session, if any. Safe to call repeatedly.
    pub async fn teardown(&self) {
        let _lifecycle = self.lifecycle.lock().await;
        self.teardown_locked().await;
    }

    async fn teardown_locked(&self) {
        let session = self.session.lock().take();
        match session {
            Some(session) => {
                info!(lesson_id = %session.shared.lesson_id, "Tearing down playback session");
                session.shutdown().await;
            }
            None => debug!("No active session to tear down"),
        }
    }

    fn with_controller<T>(
        &self,
        f: impl FnOnce(&UiController) -> Result<T, PlayerError>,
    ) -> Result<T, PlayerError> {
        let slot = self.session.lock();
        let session = slot.as_ref().ok_or(PlayerError::NoActiveSession)?;
        let controller = session.shared.controller.lock();
        let controller = controller.as_ref().ok_or(PlayerError::NoController)?;
        f(controller)
    }

    pub fn play(&self) -> Result<(), PlayerError> {
        self.with_controller(|c| c.play())
    }

    pub fn pause(&self) -> Result<(), PlayerError> {
        self.with_controller(|c| c.pause())
    }

    pub fn stop(&self) -> Result<(), PlayerError> {
        self.with_controller(|c| c.stop())
    }

    pub fn toggle_play(&self) -> Result<(), PlayerError> {
        self.with_controller(|c| c.toggle_play())
    }

    pub fn seek(&self, time: f64) -> Result<(), PlayerError> {
        self.with_controller(|c| c.seek(time))
    }

    pub fn current_time(&self) -> Result<f64, PlayerError> {
        self.with_controller(|c| c.current_time())
    }

    pub fn video_duration(&self) -> Result<f64, PlayerError> {
        self.with_controller(|c| c.duration())
    }

    pub fn volume(&self) -> Result<f64, PlayerError> {
        self.with_controller(|c| c.volume())
    }

    pub fn set_volume(&self, volume: f64) -> Result<(), PlayerError> {
        self.with_controller(|c| c.set_volume(volume))
    }

    pub fn mute(&self) -> Result<(), PlayerError> {
        self.with_controller(|c| c.mute())
    }

    pub fn unmute(&self) -> Result<(), PlayerError> {
        self.with_controller(|c| c.unmute())
    }

    pub fn enter_fullscreen(&self) -> Result<(), PlayerError> {
        self.with_controller(|c| c.fullscreen().enter())
    }

    pub fn exit_fullscreen(&self) -> Result<(), PlayerError> {
        self.with_controller(|c| c.fullscreen().exit())
    }

    pub fn toggle_fullscreen(&self) -> Result<(), PlayerError> {
        self.with_controller(|c| c.fullscreen().toggle())
    }

    pub fn on_ready(&self, handler: impl Fn() + Send + Sync + 'static) {
        self.handlers.set_ready(Arc::new(handler));
    }

    pub fn on_playing(&self, handler: impl Fn() + Send + Sync + 'static) {
        self.handlers.set_playing(Arc::new(handler));
    }

    pub fn on_paused(&self, handler: impl Fn() + Send + Sync + 'static) {
        self.handlers.set_paused(Arc::new(handler));
    }

    pub fn on_ended(&self, handler: impl Fn() + Send + Sync + 'static) {
        self.handlers.set_ended(Arc::new(handler));
    }

    pub fn on_seeked(&self, handler: impl Fn() + Send + Sync + 'static) {
        self.handlers.set_seeked(Arc::new(handler));
    }

    /// Called with `(current_time, duration)` on every time update.
    pub fn on_progress(&self, handler: impl Fn(f64, f64) + Send + Sync + 'static) {
        self.handlers.set_progress(Arc::new(handler));
    }

    pub fn on_error(&self, handler: impl Fn(&PlayerError) + Send + Sync + 'static) {
        self.handlers.set_error(Arc::new(handler));
    }

    /// Whether library-driven adaptive streaming is available.
    pub fn is_adaptive_streaming_supported(&self) -> bool {
        self.factory.supports_media_source()
    }

    pub fn recommended_quality(&self) -> VideoQuality {
        recommend_quality(self.network.connection_type().as_deref())
    }

    pub fn state(&self) -> SessionState {
        match self.session.lock().as_ref() {
            Some(session) => session.shared.state(),
            None if self.generation.load(Ordering::SeqCst) == 0 => SessionState::Uninitialized,
            None => SessionState::Destroyed,
        }
    }

    pub fn active_lesson(&self) -> Option<String> {
        self.session
            .lock()
            .as_ref()
            .map(|session| session.shared.lesson_id.clone())
    }

    pub fn is_active(&self) -> bool {
        self.session.lock().is_some()
    }
}
