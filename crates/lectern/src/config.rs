use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::PlayerError;

const DEFAULT_USER_AGENT: &str = concat!("lectern/", env!("CARGO_PKG_VERSION"));

/// Transport controls a host player skin may render.
pub const KNOWN_CONTROLS: &[&str] = &[
    "play-large",
    "restart",
    "rewind",
    "play",
    "fast-forward",
    "progress",
    "current-time",
    "duration",
    "mute",
    "volume",
    "captions",
    "settings",
    "pip",
    "airplay",
    "download",
    "fullscreen",
];

/// Entries a host player skin may show in its settings menu.
pub const KNOWN_SETTINGS: &[&str] = &["captions", "quality", "speed", "loop"];

pub(crate) fn default_controls() -> Vec<String> {
    [
        "play-large",
        "play",
        "progress",
        "current-time",
        "mute",
        "volume",
        "settings",
        "fullscreen",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

pub(crate) fn default_settings() -> Vec<String> {
    vec!["quality".to_string(), "speed".to_string()]
}

/// Delivery backend requested by the lesson content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderKind {
    /// A vendor's self-contained playback component.
    #[serde(rename = "packaged", alias = "mux")]
    PackagedComponent,
    /// Manifest-based adaptive streaming.
    #[serde(rename = "hls")]
    LibraryHls,
    /// Progressive download of a direct media file.
    #[serde(rename = "file", alias = "direct", alias = "mp4")]
    PlainFile,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PackagedComponent => "packaged",
            Self::LibraryHls => "hls",
            Self::PlainFile => "file",
        };
        f.write_str(name)
    }
}

impl FromStr for ProviderKind {
    type Err = PlayerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "packaged" | "mux" => Ok(Self::PackagedComponent),
            "hls" => Ok(Self::LibraryHls),
            "file" | "direct" | "mp4" => Ok(Self::PlainFile),
            other => Err(PlayerError::UnsupportedConfig(format!(
                "Unknown provider '{other}'"
            ))),
        }
    }
}

/// Fields only the packaged component understands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackagedComponentOptions {
    #[serde(default)]
    pub playback_id: Option<String>,
    #[serde(default)]
    pub accent_color: Option<String>,
    #[serde(default)]
    pub metadata_video_title: Option<String>,
    #[serde(default)]
    pub metadata_viewer_user_id: Option<String>,
}

/// Everything needed to start playback of one lesson video.
///
/// Treated as immutable once handed to
/// [`PlaybackSessionManager::initialize`](crate::PlaybackSessionManager::initialize).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackConfig {
    pub video_url: String,
    #[serde(default)]
    pub poster_url: Option<String>,
    pub provider: ProviderKind,
    #[serde(default)]
    pub start_time: Option<f64>,
    #[serde(default)]
    pub autoplay: bool,
    #[serde(default)]
    pub muted: bool,
    #[serde(default = "default_controls")]
    pub controls: Vec<String>,
    #[serde(default = "default_settings")]
    pub settings: Vec<String>,
    #[serde(default, flatten)]
    pub packaged: PackagedComponentOptions,
}

impl PlaybackConfig {
    pub fn builder(
        video_url: impl Into<String>,
        provider: ProviderKind,
    ) -> crate::builder::PlaybackConfigBuilder {
        crate::builder::PlaybackConfigBuilder::new(video_url, provider)
    }

    /// Parse a config as delivered by the lesson content service.
    pub fn from_json(json: &str) -> Result<Self, PlayerError> {
        serde_json::from_str(json)
            .map_err(|e| PlayerError::UnsupportedConfig(format!("Invalid playback config: {e}")))
    }

    /// Check the constraints `initialize` relies on.
    pub fn validate(&self) -> Result<(), PlayerError> {
        if self.video_url.trim().is_empty() {
            return Err(PlayerError::UnsupportedConfig(
                "videoUrl must not be empty".to_string(),
            ));
        }

        if let Some(start) = self.start_time {
            if !start.is_finite() || start < 0.0 {
                return Err(PlayerError::UnsupportedConfig(format!(
                    "startTime must be a non-negative number, got {start}"
                )));
            }
        }

        if self.provider == ProviderKind::PackagedComponent {
            let has_playback_id = self
                .packaged
                .playback_id
                .as_deref()
                .is_some_and(|id| !id.trim().is_empty());
            if !has_playback_id {
                return Err(PlayerError::UnsupportedConfig(
                    "packaged provider requires a playbackId".to_string(),
                ));
            }
        }

        for control in &self.controls {
            if !KNOWN_CONTROLS.contains(&control.as_str()) {
                warn!(control = %control, "Unknown player control requested");
            }
        }
        for setting in &self.settings {
            if !KNOWN_SETTINGS.contains(&setting.as_str()) {
                warn!(setting = %setting, "Unknown player setting requested");
            }
        }

        Ok(())
    }

    /// Start position to resume at, if any.
    pub fn resume_position(&self) -> Option<f64> {
        self.start_time.filter(|t| *t > 0.0)
    }
}

/// HTTP options shared by the manifest loader and the progress client.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Overall timeout for the entire HTTP request
    pub timeout: Duration,

    /// Connection timeout (time to establish initial connection)
    pub connect_timeout: Duration,

    /// Whether to follow redirects
    pub follow_redirects: bool,

    /// User agent string
    pub user_agent: String,

    /// Custom HTTP headers for requests
    pub headers: HeaderMap,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            follow_redirects: true,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            headers: HttpConfig::get_default_headers(),
        }
    }
}

impl HttpConfig {
    pub fn get_default_headers() -> HeaderMap {
        let mut default_headers = HeaderMap::new();

        default_headers.insert(
            reqwest::header::ACCEPT,
            HeaderValue::from_static(
                "application/vnd.apple.mpegurl,application/x-mpegurl,application/json;q=0.9,*/*;q=0.8",
            ),
        );

        default_headers.insert(
            reqwest::header::ACCEPT_ENCODING,
            HeaderValue::from_static("gzip, deflate"),
        );

        default_headers
    }
}

/// Engine-wide configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Media-time distance between throttled progress writes
    pub progress_interval: Duration,

    /// Reloads granted per session for non-fatal network failures
    pub max_network_reloads: u32,

    /// Internal recoveries granted per session for non-fatal decode failures
    pub max_media_recoveries: u32,

    /// HTTP client options
    pub http: HttpConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            progress_interval: Duration::from_secs(10),
            max_network_reloads: 1,
            max_media_recoveries: 1,
            http: HttpConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn builder() -> crate::builder::EngineConfigBuilder {
        crate::builder::EngineConfigBuilder::new()
    }
}
