//! # Lectern
//!
//! Adaptive video playback and progress tracking for lesson content.
//! One playback session is active at a time; the engine picks a delivery
//! backend for the lesson's video, normalizes its events and records how far
//! the learner got.
//!
//! ## Features
//!
//! - Provider adapters for packaged players, manifest streaming (library
//!   driven or native) and plain media files
//! - A unified playback event vocabulary with host callbacks
//! - Throttled progress persistence with exactly-once completion
//! - Bounded recovery from network and decode failures
//! - Quality recommendation from the connection type

pub mod adapter;
pub mod builder;
pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod factory;
pub mod hls;
pub mod http;
pub mod manager;
pub mod media;
pub mod progress;
pub mod quality;
pub mod recovery;
mod session;
pub mod state;
pub mod test_utils;

pub use builder::{EngineConfigBuilder, PlaybackConfigBuilder};
pub use config::{EngineConfig, HttpConfig, PackagedComponentOptions, PlaybackConfig, ProviderKind};
pub use error::{AdapterFailure, FailureKind, PlayerError};

pub use adapter::{AdapterKind, ProviderAdapter};
pub use controller::UiController;
pub use events::{EventTranslator, PlaybackEvent, PlaybackPosition, SessionEvent, SessionEvents};
pub use factory::AdapterFactory;
pub use manager::{PlaybackSessionManager, PlaybackSessionManagerBuilder};
pub use state::SessionState;

// Host-side seams
pub use hls::{HttpManifestLoader, ManifestLoader};
pub use media::{MediaCapabilities, MediaElement, MediaSurface, NativeEvent, NativeEventKind};
pub use progress::{HttpProgressService, ProgressPersistError, ProgressService, ProgressUpdate};
pub use quality::{NetworkQualityHint, VideoQuality, recommend_quality};
pub use recovery::ErrorRecoveryPolicy;

pub use http::create_client;
