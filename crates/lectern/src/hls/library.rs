//! Playlist resolution for library-driven adaptive streaming.
//!
//! A master playlist is narrowed to one variant by a [`VariantSelectionPolicy`]
//! and that variant's media playlist is fetched and parsed; a media playlist
//! is used as-is. The result is a [`LoadedManifest`] the adapter can attach.

use std::cmp::Reverse;
use std::sync::Arc;

use m3u8_rs::{MasterPlaylist, MediaPlaylist, VariantStream, parse_playlist_res};
use tracing::{debug, info};
use url::Url;

use crate::hls::{ManifestError, ManifestLoader};
use crate::quality::VideoQuality;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VariantSelectionPolicy {
    #[default]
    HighestBitrate,
    LowestBitrate,
    /// Variant whose resolution height is closest to the target; ties go to
    /// the higher bandwidth.
    ClosestToHeight(u64),
}

impl VariantSelectionPolicy {
    pub fn for_quality(quality: VideoQuality) -> Self {
        match quality.target_height() {
            Some(height) => Self::ClosestToHeight(height),
            None => Self::HighestBitrate,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedVariant {
    pub uri: String,
    pub bandwidth: u64,
    pub resolution: Option<(u64, u64)>,
}

impl From<&VariantStream> for SelectedVariant {
    fn from(variant: &VariantStream) -> Self {
        Self {
            uri: variant.uri.clone(),
            bandwidth: variant.bandwidth,
            resolution: variant.resolution.map(|r| (r.width, r.height)),
        }
    }
}

/// A parsed media playlist ready to be attached to an element.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedManifest {
    pub manifest_url: Url,
    pub media_playlist_url: Url,
    /// `None` when the manifest URL already pointed at a media playlist.
    pub variant: Option<SelectedVariant>,
    /// Sum of segment durations, in seconds.
    pub duration: f64,
    pub is_live: bool,
    pub segment_count: usize,
}

impl LoadedManifest {
    fn from_media(
        manifest_url: Url,
        media_playlist_url: Url,
        variant: Option<SelectedVariant>,
        playlist: &MediaPlaylist,
    ) -> Self {
        Self {
            manifest_url,
            media_playlist_url,
            variant,
            duration: playlist.segments.iter().map(|s| s.duration as f64).sum(),
            is_live: !playlist.end_list,
            segment_count: playlist.segments.len(),
        }
    }
}

pub fn select_variant<'a>(
    master: &'a MasterPlaylist,
    policy: &VariantSelectionPolicy,
) -> Result<&'a VariantStream, ManifestError> {
    let candidates = master.variants.iter().filter(|v| !v.is_i_frame);

    let selected = match policy {
        VariantSelectionPolicy::HighestBitrate => candidates.max_by_key(|v| v.bandwidth),
        VariantSelectionPolicy::LowestBitrate => candidates.min_by_key(|v| v.bandwidth),
        VariantSelectionPolicy::ClosestToHeight(target) => candidates.min_by_key(|v| {
            let distance = v
                .resolution
                .map(|r| r.height.abs_diff(*target))
                .unwrap_or(u64::MAX);
            (distance, Reverse(v.bandwidth))
        }),
    };

    selected.ok_or(ManifestError::NoVariants)
}

/// The adaptive streaming library driven by the LibraryHLS adapter.
#[derive(Clone)]
pub struct HlsLibrary {
    loader: Arc<dyn ManifestLoader>,
    policy: VariantSelectionPolicy,
}

impl HlsLibrary {
    pub fn new(loader: Arc<dyn ManifestLoader>, policy: VariantSelectionPolicy) -> Self {
        Self { loader, policy }
    }

    pub fn policy(&self) -> VariantSelectionPolicy {
        self.policy
    }

    pub async fn load(&self, manifest_url: &str) -> Result<LoadedManifest, ManifestError> {
        let url = Url::parse(manifest_url).map_err(|e| ManifestError::InvalidUrl {
            url: manifest_url.to_string(),
            reason: e.to_string(),
        })?;

        let body = self.loader.load(&url).await?;
        match parse_playlist_res(body.as_bytes()) {
            Ok(m3u8_rs::Playlist::MasterPlaylist(master)) => {
                let variant = SelectedVariant::from(select_variant(&master, &self.policy)?);
                let media_url = url.join(&variant.uri).map_err(|e| ManifestError::InvalidUrl {
                    url: variant.uri.clone(),
                    reason: e.to_string(),
                })?;
                debug!(
                    variant = %variant.uri,
                    bandwidth = variant.bandwidth,
                    "Selected variant from master playlist"
                );

                let media_body = self.loader.load(&media_url).await?;
                let media = match parse_playlist_res(media_body.as_bytes()) {
                    Ok(m3u8_rs::Playlist::MediaPlaylist(pl)) => pl,
                    Ok(m3u8_rs::Playlist::MasterPlaylist(_)) => {
                        return Err(ManifestError::Parse(
                            "Expected Media Playlist, got Master".to_string(),
                        ));
                    }
                    Err(e) => {
                        return Err(ManifestError::Parse(format!(
                            "Failed to parse media playlist: {e}"
                        )));
                    }
                };

                let loaded = LoadedManifest::from_media(url, media_url, Some(variant), &media);
                info!(
                    playlist = %loaded.media_playlist_url,
                    segments = loaded.segment_count,
                    live = loaded.is_live,
                    "Manifest loaded"
                );
                Ok(loaded)
            }
            Ok(m3u8_rs::Playlist::MediaPlaylist(media)) => {
                let loaded = LoadedManifest::from_media(url.clone(), url, None, &media);
                info!(
                    playlist = %loaded.media_playlist_url,
                    segments = loaded.segment_count,
                    live = loaded.is_live,
                    "Manifest loaded"
                );
                Ok(loaded)
            }
            Err(e) => Err(ManifestError::Parse(format!(
                "Failed to parse fetched playlist: {e}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::ScriptedManifestLoader;

    const MASTER: &str = "#EXTM3U
#EXT-X-STREAM-INF:BANDWIDTH=800000,RESOLUTION=854x480
480p/index.m3u8
#EXT-X-STREAM-INF:BANDWIDTH=2800000,RESOLUTION=1280x720
720p/index.m3u8
#EXT-X-STREAM-INF:BANDWIDTH=5000000,RESOLUTION=1920x1080
1080p/index.m3u8
";

    const MEDIA: &str = "#EXTM3U
#EXT-X-VERSION:3
#EXT-X-TARGETDURATION:10
#EXT-X-MEDIA-SEQUENCE:0
#EXTINF:10.0,
seg0.ts
#EXTINF:10.0,
seg1.ts
#EXTINF:5.5,
seg2.ts
#EXT-X-ENDLIST
";

    fn master() -> MasterPlaylist {
        match parse_playlist_res(MASTER.as_bytes()) {
            Ok(m3u8_rs::Playlist::MasterPlaylist(pl)) => pl,
            other => panic!("expected master playlist, got {other:?}"),
        }
    }

    #[test]
    fn test_policy_for_quality() {
        assert_eq!(
            VariantSelectionPolicy::for_quality(VideoQuality::P720),
            VariantSelectionPolicy::ClosestToHeight(720)
        );
        assert_eq!(
            VariantSelectionPolicy::for_quality(VideoQuality::Auto),
            VariantSelectionPolicy::HighestBitrate
        );
    }

    #[test]
    fn test_select_variant() {
        let master = master();
        let pick = |policy| select_variant(&master, &policy).unwrap().uri.clone();

        assert_eq!(pick(VariantSelectionPolicy::HighestBitrate), "1080p/index.m3u8");
        assert_eq!(pick(VariantSelectionPolicy::LowestBitrate), "480p/index.m3u8");
        assert_eq!(
            pick(VariantSelectionPolicy::ClosestToHeight(720)),
            "720p/index.m3u8"
        );
        assert_eq!(
            pick(VariantSelectionPolicy::ClosestToHeight(560)),
            "480p/index.m3u8"
        );
    }

    #[test]
    fn test_select_variant_empty_master() {
        let master = MasterPlaylist::default();
        assert!(matches!(
            select_variant(&master, &VariantSelectionPolicy::HighestBitrate),
            Err(ManifestError::NoVariants)
        ));
    }

    #[tokio::test]
    async fn test_load_master_resolves_variant() {
        let loader = Arc::new(
            ScriptedManifestLoader::new()
                .respond("https://cdn.example.com/c1/master.m3u8", MASTER)
                .respond("https://cdn.example.com/c1/720p/index.m3u8", MEDIA),
        );
        let library = HlsLibrary::new(loader.clone(), VariantSelectionPolicy::ClosestToHeight(720));

        let loaded = library
            .load("https://cdn.example.com/c1/master.m3u8")
            .await
            .unwrap();

        assert_eq!(
            loaded.media_playlist_url.as_str(),
            "https://cdn.example.com/c1/720p/index.m3u8"
        );
        assert_eq!(loaded.variant.as_ref().unwrap().resolution, Some((1280, 720)));
        assert_eq!(loaded.segment_count, 3);
        assert!((loaded.duration - 25.5).abs() < 1e-6);
        assert!(!loaded.is_live);
        assert_eq!(loader.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_load_media_playlist_directly() {
        let loader = Arc::new(
            ScriptedManifestLoader::new().respond("https://cdn.example.com/v.m3u8", MEDIA),
        );
        let library = HlsLibrary::new(loader, VariantSelectionPolicy::default());

        let loaded = library.load("https://cdn.example.com/v.m3u8").await.unwrap();
        assert!(loaded.variant.is_none());
        assert_eq!(loaded.manifest_url, loaded.media_playlist_url);
    }

    #[tokio::test]
    async fn test_load_errors() {
        let loader = Arc::new(
            ScriptedManifestLoader::new().respond("https://cdn.example.com/bad.m3u8", "not a playlist"),
        );
        let library = HlsLibrary::new(loader, VariantSelectionPolicy::default());

        let err = library.load("https://cdn.example.com/bad.m3u8").await.unwrap_err();
        assert!(matches!(err, ManifestError::Parse(_)));

        let err = library.load("/relative.m3u8").await.unwrap_err();
        assert!(matches!(err, ManifestError::InvalidUrl { .. }));

        // unscripted URLs behave like an unreachable host
        let err = library.load("https://cdn.example.com/none.m3u8").await.unwrap_err();
        assert!(err.is_network());
    }
}
