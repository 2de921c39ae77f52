//! # Playback session driver
//!
//! Each session runs one driver task that owns the adapter, the event
//! translator, the progress recorder and the progress sink. The driver
//! attaches the source, wires transport control once the adapter is ready,
//! then pumps adapter signals until it is shut down or hits a fatal failure.
//!
//! Shutdown is a broadcast signal raced against every await point, so a
//! teardown never waits on a slow manifest fetch or recovery.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::adapter::{AdapterSignal, ProviderAdapter};
use crate::controller::UiController;
use crate::error::AdapterFailure;
use crate::events::{EventSender, EventTranslator, PlaybackEvent, PlaybackHandlers, SessionEvent};
use crate::media::{MediaSurface, NativeEvent};
use crate::progress::{ProgressRecorder, ProgressSink};
use crate::recovery::{ErrorRecoveryPolicy, RecoveryDecision};
use crate::state::SessionState;
use crate::{PlaybackConfig, PlayerError};

pub(crate) type SessionSlot = Mutex<Option<PlaybackSession>>;

/// State shared between a session's driver and the manager.
pub(crate) struct SessionShared {
    pub lesson_id: String,
    pub generation: u64,
    state: Mutex<SessionState>,
    revoked: Arc<AtomicBool>,
    pub controller: Mutex<Option<UiController>>,
}

impl SessionShared {
    pub fn new(lesson_id: String, generation: u64, revoked: Arc<AtomicBool>) -> Self {
        Self {
            lesson_id,
            generation,
            state: Mutex::new(SessionState::Uninitialized),
            revoked,
            controller: Mutex::new(None),
        }
    }

    pub fn state(&self) -> SessionState {
        *self.state.lock()
    }

    /// Move to `next` if the state machine allows it.
    pub fn transition(&self, next: SessionState) -> bool {
        let mut state = self.state.lock();
        if *state == next {
            return true;
        }
        if !state.can_transition_to(next) {
            debug!(
                lesson_id = %self.lesson_id,
                from = %*state,
                to = %next,
                "Ignoring invalid session state transition"
            );
            return false;
        }
        debug!(lesson_id = %self.lesson_id, from = %*state, to = %next, "Session state changed");
        *state = next;
        true
    }

    pub fn is_revoked(&self) -> bool {
        self.revoked.load(Ordering::Acquire)
    }

    pub fn revoke(&self) {
        self.revoked.store(true, Ordering::Release);
    }

    fn take_controller(&self) {
        if let Some(mut controller) = self.controller.lock().take() {
            controller.destroy();
        }
    }
}

/// The active session as held by the manager.
pub(crate) struct PlaybackSession {
    pub shared: Arc<SessionShared>,
    shutdown_tx: broadcast::Sender<()>,
    driver: JoinHandle<()>,
}

impl PlaybackSession {
    /// Spawn the driver for `driver` and return the session handle.
    pub fn start(driver: SessionDriver, shutdown_tx: broadcast::Sender<()>) -> Self {
        let shared = driver.shared.clone();
        let handle = tokio::spawn(driver.run());
        Self {
            shared,
            shutdown_tx,
            driver: handle,
        }
    }

    /// Revoke event delivery, stop the driver and wait for it to release
    /// the adapter.
    pub async fn shutdown(self) {
        self.shared.revoke();
        self.shared.take_controller();

        // The driver may already have exited on its own.
        let _ = self.shutdown_tx.send(());
        if let Err(e) = self.driver.await {
            warn!(lesson_id = %self.shared.lesson_id, error = %e, "Session driver task failed");
        }
    }
}

enum DriverExit {
    Shutdown,
    SourceClosed,
    Fatal(PlayerError),
}

pub(crate) struct SessionDriver {
    pub shared: Arc<SessionShared>,
    pub config: PlaybackConfig,
    pub surface: Arc<dyn MediaSurface>,
    pub adapter: Box<dyn ProviderAdapter>,
    pub policy: ErrorRecoveryPolicy,
    pub translator: EventTranslator,
    pub recorder: ProgressRecorder,
    pub sink: ProgressSink,
    pub handlers: Arc<PlaybackHandlers>,
    pub events: EventSender,
    pub shutdown_rx: broadcast::Receiver<()>,
    pub slot: Weak<SessionSlot>,
    /// Set after a recovery until playback is seen again.
    pub recovered: bool,
}

impl SessionDriver {
    pub async fn run(mut self) {
        let exit = self.drive().await;
        self.finish(exit);
    }

    async fn drive(&mut self) -> DriverExit {
        let attached = tokio::select! {
            biased;
            _ = self.shutdown_rx.recv() => return DriverExit::Shutdown,
            result = self.adapter.attach(&self.config, self.surface.as_ref()) => result,
        };

        if let Err(failure) = attached {
            warn!(
                lesson_id = %self.shared.lesson_id,
                adapter = %self.adapter.kind(),
                error = %failure,
                "Attach failed"
            );
            if let Err(exit) = self.recover_from(failure).await {
                return exit;
            }
        }

        self.on_ready();
        self.pump().await
    }

    /// Spend recovery budget on `failure` until the adapter recovers or the
    /// policy gives up.
    async fn recover_from(&mut self, mut failure: AdapterFailure) -> Result<(), DriverExit> {
        loop {
            let action = match self.policy.decide(&failure) {
                RecoveryDecision::Retry(action) => action,
                RecoveryDecision::Fatal => return Err(DriverExit::Fatal(failure.into())),
            };

            self.shared.transition(SessionState::Recovering);
            let result = tokio::select! {
                biased;
                _ = self.shutdown_rx.recv() => return Err(DriverExit::Shutdown),
                result = self.adapter.recover(action) => result,
            };

            match result {
                Ok(()) => {
                    info!(lesson_id = %self.shared.lesson_id, ?action, "Recovered");
                    self.recovered = true;
                    return Ok(());
                }
                Err(next) => {
                    warn!(
                        lesson_id = %self.shared.lesson_id,
                        ?action,
                        error = %next,
                        "Recovery attempt failed"
                    );
                    failure = next;
                }
            }
        }
    }

    fn on_ready(&mut self) {
        self.shared.transition(SessionState::Ready);
        self.adapter.subscribe();

        if let Some(element) = self.adapter.controllable_element() {
            let mut controller = UiController::new(element);
            if let Err(e) = controller.resume_from(self.config.start_time.unwrap_or_default()) {
                warn!(lesson_id = %self.shared.lesson_id, error = %e, "Failed to resume position");
            }
            if self.config.autoplay {
                if let Err(e) = controller.play() {
                    warn!(lesson_id = %self.shared.lesson_id, error = %e, "Autoplay was rejected");
                }
            }

            let mut slot = self.shared.controller.lock();
            if self.shared.is_revoked() {
                controller.destroy();
            } else {
                *slot = Some(controller);
            }
        }

        info!(
            lesson_id = %self.shared.lesson_id,
            adapter = %self.adapter.kind(),
            "Session ready"
        );
        self.emit(SessionEvent::Ready);
    }

    async fn pump(&mut self) -> DriverExit {
        loop {
            let signal = tokio::select! {
                biased;
                _ = self.shutdown_rx.recv() => return DriverExit::Shutdown,
                signal = self.adapter.next_signal() => signal,
            };

            match signal {
                None => return DriverExit::SourceClosed,
                Some(AdapterSignal::Native(event)) => self.handle_native(event),
                Some(AdapterSignal::Failure(failure)) => {
                    warn!(
                        lesson_id = %self.shared.lesson_id,
                        error = %failure,
                        "Playback failure"
                    );
                    if let Err(exit) = self.recover_from(failure).await {
                        return exit;
                    }
                    self.translator.reset();
                    self.shared.transition(SessionState::Ready);
                }
            }
        }
    }

    fn handle_native(&mut self, native: NativeEvent) {
        let Some(event) = self.translator.translate(&native) else {
            return;
        };

        match event {
            PlaybackEvent::Playing => {
                self.shared.transition(SessionState::Playing);
            }
            PlaybackEvent::Paused => {
                self.shared.transition(SessionState::Paused);
            }
            PlaybackEvent::Ended => {
                self.shared.transition(SessionState::Ended);
            }
            PlaybackEvent::TimeUpdate { .. } | PlaybackEvent::Seeked => {}
        }

        let resumed = matches!(event, PlaybackEvent::Playing | PlaybackEvent::TimeUpdate { .. });
        if self.recovered && resumed {
            self.recovered = false;
            self.policy.reset();
        }

        if let Some(snapshot) = self.recorder.record(&event, native.position()) {
            self.sink.submit(snapshot);
        }
        self.emit(SessionEvent::Playback(event));
    }

    fn emit(&self, event: SessionEvent) {
        if self.shared.is_revoked() {
            return;
        }
        self.handlers.dispatch(&event);
        let _ = self.events.send(Ok(event));
    }

    fn finish(mut self, exit: DriverExit) {
        self.adapter.destroy();
        self.shared.take_controller();
        self.shared.transition(SessionState::Destroyed);

        match exit {
            DriverExit::Shutdown => {
                self.shared.revoke();
                info!(lesson_id = %self.shared.lesson_id, "Session torn down");
            }
            DriverExit::SourceClosed => {
                info!(lesson_id = %self.shared.lesson_id, "Media source closed, ending session");
                self.release_slot();
            }
            DriverExit::Fatal(err) => {
                error!(
                    lesson_id = %self.shared.lesson_id,
                    error = %err,
                    "Fatal playback error, destroying session"
                );
                self.release_slot();
                if !self.shared.is_revoked() {
                    self.handlers.dispatch_error(&err);
                    let _ = self.events.send(Err(err));
                }
            }
        }
        // Dropping the sink lets already queued progress writes drain.
    }

    /// Clear the manager's slot if it still holds this session.
    fn release_slot(&self) {
        let Some(slot) = self.slot.upgrade() else {
            return;
        };
        let released = {
            let mut slot = slot.lock();
            match slot.as_ref() {
                Some(session) if session.shared.generation == self.shared.generation => slot.take(),
                _ => None,
            }
        };
        // Dropping our own handle only detaches this task.
        drop(released);
    }
}
