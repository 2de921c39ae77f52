//! # Builders for playback and engine configuration
//!
//! Fluent constructors for [`PlaybackConfig`] and [`EngineConfig`].
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use lectern_engine::{EngineConfig, PlaybackConfig, ProviderKind};
//!
//! let playback = PlaybackConfig::builder("https://cdn.example.com/intro.mp4", ProviderKind::PlainFile)
//!     .poster_url("https://cdn.example.com/intro.jpg")
//!     .start_time(95.0)
//!     .muted(true)
//!     .build();
//!
//! let engine = EngineConfig::builder()
//!     .with_progress_interval(Duration::from_secs(15))
//!     .with_max_network_reloads(2)
//!     .with_timeout(Duration::from_secs(20))
//!     .with_header("X-Client", "classroom")
//!     .build();
//! ```

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};

use crate::config::{
    EngineConfig, PackagedComponentOptions, PlaybackConfig, ProviderKind, default_controls,
    default_settings,
};

/// Builder for creating PlaybackConfig instances with a fluent API
#[derive(Debug, Clone)]
pub struct PlaybackConfigBuilder {
    config: PlaybackConfig,
}

impl PlaybackConfigBuilder {
    pub fn new(video_url: impl Into<String>, provider: ProviderKind) -> Self {
        Self {
            config: PlaybackConfig {
                video_url: video_url.into(),
                poster_url: None,
                provider,
                start_time: None,
                autoplay: false,
                muted: false,
                controls: default_controls(),
                settings: default_settings(),
                packaged: PackagedComponentOptions::default(),
            },
        }
    }

    pub fn poster_url(mut self, url: impl Into<String>) -> Self {
        self.config.poster_url = Some(url.into());
        self
    }

    pub fn start_time(mut self, seconds: f64) -> Self {
        self.config.start_time = Some(seconds);
        self
    }

    pub fn autoplay(mut self, autoplay: bool) -> Self {
        self.config.autoplay = autoplay;
        self
    }

    pub fn muted(mut self, muted: bool) -> Self {
        self.config.muted = muted;
        self
    }

    /// Replace the control list
    pub fn controls<I, S>(mut self, controls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.controls = controls.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the settings menu entries
    pub fn settings<I, S>(mut self, settings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.settings = settings.into_iter().map(Into::into).collect();
        self
    }

    pub fn playback_id(mut self, id: impl Into<String>) -> Self {
        self.config.packaged.playback_id = Some(id.into());
        self
    }

    pub fn accent_color(mut self, color: impl Into<String>) -> Self {
        self.config.packaged.accent_color = Some(color.into());
        self
    }

    pub fn metadata_video_title(mut self, title: impl Into<String>) -> Self {
        self.config.packaged.metadata_video_title = Some(title.into());
        self
    }

    pub fn metadata_viewer_user_id(mut self, viewer: impl Into<String>) -> Self {
        self.config.packaged.metadata_viewer_user_id = Some(viewer.into());
        self
    }

    pub fn build(self) -> PlaybackConfig {
        self.config
    }
}

/// Builder for creating EngineConfig instances with a fluent API
#[derive(Debug, Clone)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
        }
    }

    /// Set the media-time interval between throttled progress writes
    pub fn with_progress_interval(mut self, interval: Duration) -> Self {
        self.config.progress_interval = interval;
        self
    }

    /// Set how many reloads a session gets for network failures
    pub fn with_max_network_reloads(mut self, reloads: u32) -> Self {
        self.config.max_network_reloads = reloads;
        self
    }

    /// Set how many internal recoveries a session gets for decode failures
    pub fn with_max_media_recoveries(mut self, recoveries: u32) -> Self {
        self.config.max_media_recoveries = recoveries;
        self
    }

    /// Set the overall timeout for the entire HTTP request
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.http.timeout = timeout;
        self
    }

    /// Set the connection timeout (time to establish initial connection)
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.http.connect_timeout = timeout;
        self
    }

    /// Set whether to follow redirects
    pub fn with_follow_redirects(mut self, follow: bool) -> Self {
        self.config.http.follow_redirects = follow;
        self
    }

    /// Set the user agent string
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.http.user_agent = user_agent.into();
        self
    }

    /// Add a custom HTTP header
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        if let (Ok(name), Ok(value)) = (
            name.as_ref().parse::<reqwest::header::HeaderName>(),
            HeaderValue::from_str(value.as_ref()),
        ) {
            self.config.http.headers.insert(name, value);
        }
        self
    }

    /// Set all HTTP headers, replacing any existing headers
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.config.http.headers = headers;
        self
    }

    /// Build the EngineConfig instance
    pub fn build(self) -> EngineConfig {
        self.config
    }
}

impl Default for EngineConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
