//! Quality recommendation from a network-quality hint.

use std::fmt;

/// Playback quality suggested to the host UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VideoQuality {
    P1080,
    P720,
    P480,
    Auto,
}

impl VideoQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::P1080 => "1080p",
            Self::P720 => "720p",
            Self::P480 => "480p",
            Self::Auto => "auto",
        }
    }

    /// Vertical resolution this quality aims for, `None` for `auto`.
    pub fn target_height(&self) -> Option<u64> {
        match self {
            Self::P1080 => Some(1080),
            Self::P720 => Some(720),
            Self::P480 => Some(480),
            Self::Auto => None,
        }
    }
}

impl fmt::Display for VideoQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only source of the connection type (`"4g"`, `"3g"`, `"2g"`, ...).
pub trait NetworkQualityHint: Send + Sync {
    fn connection_type(&self) -> Option<String>;
}

/// A hint source that never knows anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnknownNetwork;

impl NetworkQualityHint for UnknownNetwork {
    fn connection_type(&self) -> Option<String> {
        None
    }
}

/// A hint fixed at construction time.
#[derive(Debug, Clone, Default)]
pub struct FixedNetworkHint(pub Option<String>);

impl FixedNetworkHint {
    pub fn new(connection_type: impl Into<String>) -> Self {
        Self(Some(connection_type.into()))
    }
}

impl NetworkQualityHint for FixedNetworkHint {
    fn connection_type(&self) -> Option<String> {
        self.0.clone()
    }
}

/// Map a connection type to a recommended quality. Only the exact
/// lowercase names are recognized.
pub fn recommend_quality(connection_type: Option<&str>) -> VideoQuality {
    match connection_type {
        Some("4g") => VideoQuality::P1080,
        Some("3g") => VideoQuality::P720,
        Some("2g") => VideoQuality::P480,
        _ => VideoQuality::Auto,
    }
}
