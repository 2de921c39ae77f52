use std::sync::Arc;

use tracing::debug;
use url::Url;

use crate::adapter::{
    AdapterKind, LibraryHlsAdapter, NativeHlsAdapter, PackagedComponentAdapter, PlainFileAdapter,
    ProviderAdapter,
};
use crate::hls::{HlsLibrary, ManifestLoader, VariantSelectionPolicy};
use crate::media::{HLS_MIME_TYPE, MediaCapabilities, MediaElement, MediaSurface};
use crate::quality::VideoQuality;
use crate::{PlaybackConfig, PlayerError, ProviderKind};

/// Shape of a source URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceShape {
    /// An adaptive streaming manifest
    Manifest,
    /// A directly playable media file
    File,
}

const MEDIA_FILE_EXTENSIONS: &[&str] = &[
    ".mp4", ".m4v", ".webm", ".mov", ".mkv", ".ogg", ".ogv", ".mp3", ".m4a", ".aac", ".wav",
];
const MANIFEST_QUERY_KEYS: &[&str] = &["manifest", "playlist", "hls"];
const MANIFEST_QUERY_VALUES: &[&str] = &["hls", "m3u8", "m3u"];

/// Detect the source shape from a URL. Relative URLs are accepted.
pub fn detect_source(url: &str) -> SourceShape {
    let (path, query) = match Url::parse(url) {
        Ok(parsed) => (
            parsed.path().to_lowercase(),
            parsed.query().map(str::to_lowercase),
        ),
        Err(_) => {
            let without_fragment = url.split('#').next().unwrap_or(url);
            match without_fragment.split_once('?') {
                Some((path, query)) => (path.to_lowercase(), Some(query.to_lowercase())),
                None => (without_fragment.to_lowercase(), None),
            }
        }
    };

    if path.ends_with(".m3u8") || path.ends_with(".m3u") {
        return SourceShape::Manifest;
    }
    if MEDIA_FILE_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
        return SourceShape::File;
    }

    // Extensionless endpoints may name the format in a query parameter
    if let Some(query) = query {
        let hinted = query
            .split('&')
            .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
            .any(|(key, value)| {
                MANIFEST_QUERY_KEYS.contains(&key) || MANIFEST_QUERY_VALUES.contains(&value)
            });
        if hinted {
            return SourceShape::Manifest;
        }
    }

    SourceShape::File
}

/// Selects and builds the provider adapter for a playback config
#[derive(Clone)]
pub struct AdapterFactory {
    capabilities: Arc<dyn MediaCapabilities>,
    loader: Arc<dyn ManifestLoader>,
}

impl AdapterFactory {
    pub fn new(capabilities: Arc<dyn MediaCapabilities>, loader: Arc<dyn ManifestLoader>) -> Self {
        Self {
            capabilities,
            loader,
        }
    }

    pub fn supports_media_source(&self) -> bool {
        self.capabilities.supports_media_source()
    }

    /// Pick the adapter variant for `config`, asking `element` about native
    /// manifest playback when media-source extensions are unavailable.
    pub fn select(
        &self,
        config: &PlaybackConfig,
        element: &dyn MediaElement,
    ) -> Result<AdapterKind, PlayerError> {
        if config.provider == ProviderKind::PackagedComponent {
            return Ok(AdapterKind::PackagedComponent);
        }

        match detect_source(&config.video_url) {
            SourceShape::File => Ok(AdapterKind::PlainFile),
            SourceShape::Manifest if self.capabilities.supports_media_source() => {
                Ok(AdapterKind::LibraryHls)
            }
            SourceShape::Manifest if element.can_play_type(HLS_MIME_TYPE) => {
                Ok(AdapterKind::NativeHls)
            }
            SourceShape::Manifest => Err(PlayerError::UnsupportedConfig(format!(
                "No playable backend for manifest {}",
                config.video_url
            ))),
        }
    }

    pub fn create(
        &self,
        config: &PlaybackConfig,
        surface: &dyn MediaSurface,
        quality: VideoQuality,
    ) -> Result<Box<dyn ProviderAdapter>, PlayerError> {
        let kind = self.select(config, surface.element().as_ref())?;
        debug!(adapter = %kind, provider = %config.provider, "Selected provider adapter");

        let adapter: Box<dyn ProviderAdapter> = match kind {
            AdapterKind::PackagedComponent => Box::new(PackagedComponentAdapter::new()),
            AdapterKind::LibraryHls => {
                let library = HlsLibrary::new(
                    self.loader.clone(),
                    VariantSelectionPolicy::for_quality(quality),
                );
                Box::new(LibraryHlsAdapter::new(library))
            }
            AdapterKind::NativeHls => Box::new(NativeHlsAdapter::new()),
            AdapterKind::PlainFile => Box::new(PlainFileAdapter::new()),
        };
        Ok(adapter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::StaticCapabilities;
    use crate::test_utils::{FakeMediaElement, ScriptedManifestLoader};

    fn factory(media_source: bool) -> AdapterFactory {
        AdapterFactory::new(
            Arc::new(StaticCapabilities { media_source }),
            Arc::new(ScriptedManifestLoader::new()),
        )
    }

    fn config(url: &str, provider: ProviderKind) -> PlaybackConfig {
        PlaybackConfig::builder(url, provider).playback_id("pid").build()
    }

    #[test]
    fn test_detect_source() {
        assert_eq!(
            detect_source("https://cdn.example.com/a/master.m3u8"),
            SourceShape::Manifest
        );
        assert_eq!(detect_source("https://cdn.example.com/list.M3U"), SourceShape::Manifest);
        assert_eq!(
            detect_source("https://cdn.example.com/video?format=hls"),
            SourceShape::Manifest
        );
        assert_eq!(detect_source("https://cdn.example.com/a.mp4"), SourceShape::File);
        assert_eq!(detect_source("a.mp4"), SourceShape::File);
        assert_eq!(detect_source("videos/intro.m3u8?token=1"), SourceShape::Manifest);
        // a manifest-looking fragment does not count
        assert_eq!(detect_source("a.mp4#x.m3u8"), SourceShape::File);
        assert_eq!(detect_source("https://x/stream?type=m3u8&t=1"), SourceShape::Manifest);
        assert_eq!(detect_source("https://x/stream?playlist"), SourceShape::Manifest);
        assert_eq!(detect_source("https://x/stream?token=abc"), SourceShape::File);
    }

    #[test]
    fn test_signed_file_urls_stay_files() {
        assert_eq!(
            detect_source("https://cdn.example.com/lessons/intro.mp4?X-Amz-Signature=9fHlSa0"),
            SourceShape::File
        );
        assert_eq!(detect_source("https://x/a.webm?playlist=1"), SourceShape::File);
        assert_eq!(detect_source("https://x/a.mp4?format=hls"), SourceShape::File);
        // substrings inside opaque tokens are not hints
        assert_eq!(detect_source("https://x/video?sig=mhlsx"), SourceShape::File);

        let element = FakeMediaElement::new();
        let signed = config(
            "https://cdn.example.com/lessons/intro.mp4?X-Amz-Signature=9fHlSa0",
            ProviderKind::LibraryHls,
        );
        assert_eq!(
            factory(true).select(&signed, element.as_ref()).unwrap(),
            AdapterKind::PlainFile
        );
    }

    #[test]
    fn test_packaged_is_chosen_by_flag_only() {
        let element = FakeMediaElement::new();
        let factory = factory(true);

        assert_eq!(
            factory
                .select(&config("https://x/a.mp4", ProviderKind::PackagedComponent), element.as_ref())
                .unwrap(),
            AdapterKind::PackagedComponent
        );
        assert_eq!(
            factory
                .select(&config("https://x/a.mp4", ProviderKind::LibraryHls), element.as_ref())
                .unwrap(),
            AdapterKind::PlainFile
        );
    }

    #[test]
    fn test_manifest_backend_fallbacks() {
        let manifest = config("https://x/master.m3u8", ProviderKind::LibraryHls);

        let plain_element = FakeMediaElement::new();
        assert_eq!(
            factory(true).select(&manifest, plain_element.as_ref()).unwrap(),
            AdapterKind::LibraryHls
        );
        assert!(matches!(
            factory(false).select(&manifest, plain_element.as_ref()),
            Err(PlayerError::UnsupportedConfig(_))
        ));

        let native_element = FakeMediaElement::with_native_hls();
        assert_eq!(
            factory(false)
                .select(&manifest, native_element.as_ref())
                .unwrap(),
            AdapterKind::NativeHls
        );
    }

    #[test]
    fn test_create_builds_selected_variant() {
        let surface = crate::test_utils::FakeSurface::new();
        let adapter = factory(true)
            .create(
                &config("https://x/master.m3u8", ProviderKind::LibraryHls),
                surface.as_ref(),
                VideoQuality::P720,
            )
            .unwrap();
        assert_eq!(adapter.kind(), AdapterKind::LibraryHls);

        let adapter = factory(true)
            .create(
                &config("lesson.mp4", ProviderKind::PlainFile),
                surface.as_ref(),
                VideoQuality::Auto,
            )
            .unwrap();
        assert_eq!(adapter.kind(), AdapterKind::PlainFile);
    }
}
