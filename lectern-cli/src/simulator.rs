//! A media surface for headless playback.
//!
//! [`SimulatedElement`] behaves like a browser media element whose playhead is
//! driven by a wall-clock ticker: while playing it advances by
//! `tick * speed` per tick, emits `timeupdate`, and emits `pause` + `ended`
//! when it reaches the configured duration.

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use lectern_engine::media::{HLS_MIME_TYPE, MediaError};
use lectern_engine::{MediaElement, MediaSurface, NativeEvent, NativeEventKind};
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, trace};

const EVENT_CAPACITY: usize = 64;
const COMPONENT_SOURCE_PREFIX: &str = "packaged:";

/// Timing of the simulated playhead.
#[derive(Debug, Clone, Copy)]
pub struct SimulatedClock {
    pub tick: Duration,
    pub speed: f64,
    pub duration: f64,
}

impl Default for SimulatedClock {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(250),
            speed: 1.0,
            duration: 60.0,
        }
    }
}

#[derive(Debug)]
struct Playhead {
    source: Option<String>,
    paused: bool,
    current_time: f64,
    volume: f64,
    muted: bool,
    fullscreen: bool,
    attributes: HashMap<String, String>,
}

impl Default for Playhead {
    fn default() -> Self {
        Self {
            source: None,
            paused: true,
            current_time: 0.0,
            volume: 1.0,
            muted: false,
            fullscreen: false,
            attributes: HashMap::new(),
        }
    }
}

pub struct SimulatedElement {
    clock: SimulatedClock,
    native_hls: bool,
    state: Mutex<Playhead>,
    events: broadcast::Sender<NativeEvent>,
}

impl SimulatedElement {
    /// Create an element and start its ticker. The ticker stops once the
    /// element is dropped.
    pub fn new(clock: SimulatedClock, native_hls: bool) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let element = Arc::new(Self {
            clock,
            native_hls,
            state: Mutex::new(Playhead::default()),
            events,
        });
        tokio::spawn(run_clock(Arc::downgrade(&element), clock.tick));
        element
    }

    fn emit(&self, kind: NativeEventKind) {
        let current_time = self.state.lock().current_time;
        trace!(?kind, current_time, "Simulated element event");
        // Nobody listening is fine.
        let _ = self
            .events
            .send(NativeEvent::new(kind, current_time, self.duration()));
    }

    /// Advance the playhead by one tick.
    fn tick(&self) {
        let step = self.clock.tick.as_secs_f64() * self.clock.speed;
        let reached_end = {
            let mut state = self.state.lock();
            if state.paused || state.source.is_none() {
                return;
            }
            state.current_time = (state.current_time + step).min(self.clock.duration);
            let reached_end = state.current_time >= self.clock.duration;
            if reached_end {
                state.paused = true;
            }
            reached_end
        };

        self.emit(NativeEventKind::TimeUpdate);
        if reached_end {
            debug!("Simulated media reached its end");
            self.emit(NativeEventKind::Pause);
            self.emit(NativeEventKind::Ended);
        }
    }
}

async fn run_clock(element: Weak<SimulatedElement>, tick: Duration) {
    let mut interval = tokio::time::interval(tick);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        interval.tick().await;
        let Some(element) = element.upgrade() else {
            break;
        };
        element.tick();
    }
}

impl MediaElement for SimulatedElement {
    fn set_source(&self, url: &str) {
        {
            let mut state = self.state.lock();
            state.source = Some(url.to_string());
            state.current_time = 0.0;
            state.paused = true;
        }
        debug!(url, "Simulated element loading source");
        self.emit(NativeEventKind::LoadedMetadata);
    }

    fn clear_source(&self) {
        let mut state = self.state.lock();
        state.source = None;
        state.paused = true;
    }

    fn source(&self) -> Option<String> {
        self.state.lock().source.clone()
    }

    fn set_poster(&self, url: &str) {
        self.set_attribute("poster", url);
    }

    /// Components react to the attributes their vendor documents.
    fn set_attribute(&self, name: &str, value: &str) {
        self.state
            .lock()
            .attributes
            .insert(name.to_string(), value.to_string());

        match name {
            "playback-id" => self.set_source(&format!("{COMPONENT_SOURCE_PREFIX}{value}")),
            "autoplay" => {
                let _ = self.play();
            }
            "muted" => self.set_muted(true),
            "start-time" => {
                if let Ok(start) = value.parse::<f64>() {
                    self.seek(start);
                }
            }
            _ => {}
        }
    }

    fn play(&self) -> Result<(), MediaError> {
        {
            let mut state = self.state.lock();
            if state.source.is_none() {
                return Err(MediaError::PlaybackRejected("no source loaded".to_string()));
            }
            if !state.paused {
                return Ok(());
            }
            if state.current_time >= self.clock.duration {
                state.current_time = 0.0;
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
        self.state.lock().current_time = time.clamp(0.0, self.clock.duration);
        self.emit(NativeEventKind::Seeking);
        self.emit(NativeEventKind::Seeked);
    }

    fn duration(&self) -> f64 {
        if self.state.lock().source.is_some() {
            self.clock.duration
        } else {
            0.0
        }
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
        self.native_hls && mime == HLS_MIME_TYPE
    }

    fn subscribe(&self) -> broadcast::Receiver<NativeEvent> {
        self.events.subscribe()
    }
}

/// The slot the simulated element lives in.
pub struct SimulatedSurface {
    clock: SimulatedClock,
    element: Mutex<Arc<SimulatedElement>>,
}

impl SimulatedSurface {
    pub fn new(clock: SimulatedClock, native_hls: bool) -> Arc<Self> {
        Arc::new(Self {
            clock,
            element: Mutex::new(SimulatedElement::new(clock, native_hls)),
        })
    }
}

impl MediaSurface for SimulatedSurface {
    fn element(&self) -> Arc<dyn MediaElement> {
        self.element.lock().clone()
    }

    fn replace_with_component(&self, tag: &str) -> Arc<dyn MediaElement> {
        debug!(tag, "Replacing simulated element with a component");
        let component = SimulatedElement::new(self.clock, false);
        *self.element.lock() = component.clone();
        component
    }
}
