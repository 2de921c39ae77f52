use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::PlaybackConfig;
use crate::adapter::listener::NativeListener;
use crate::adapter::{
    AdapterKind, AdapterSignal, ProviderAdapter, apply_element_options, reattach_source,
};
use crate::error::AdapterFailure;
use crate::hls::{HlsLibrary, LoadedManifest};
use crate::media::{MediaElement, MediaSurface};
use crate::recovery::RecoveryAction;

/// Adaptive streaming driven by [`HlsLibrary`].
pub struct LibraryHlsAdapter {
    library: HlsLibrary,
    element: Option<Arc<dyn MediaElement>>,
    manifest_url: Option<String>,
    loaded: Option<LoadedManifest>,
    listener: NativeListener,
}

impl LibraryHlsAdapter {
    pub fn new(library: HlsLibrary) -> Self {
        Self {
            library,
            element: None,
            manifest_url: None,
            loaded: None,
            listener: NativeListener::all(),
        }
    }

    pub fn loaded_manifest(&self) -> Option<&LoadedManifest> {
        self.loaded.as_ref()
    }

    /// Fetch the manifest and attach the selected media playlist.
    async fn load_and_attach(&mut self, resume_at: f64) -> Result<(), AdapterFailure> {
        let (Some(element), Some(manifest_url)) = (self.element.clone(), self.manifest_url.clone())
        else {
            return Err(AdapterFailure::fatal("Library adapter is not attached"));
        };

        let loaded = self.library.load(&manifest_url).await?;
        info!(
            manifest = %loaded.manifest_url,
            playlist = %loaded.media_playlist_url,
            duration = loaded.duration,
            "Attaching adaptive stream"
        );
        reattach_source(element.as_ref(), loaded.media_playlist_url.as_str(), resume_at);
        self.loaded = Some(loaded);
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for LibraryHlsAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::LibraryHls
    }

    async fn attach(
        &mut self,
        config: &PlaybackConfig,
        surface: &dyn MediaSurface,
    ) -> Result<(), AdapterFailure> {
        let element = surface.element();
        apply_element_options(element.as_ref(), config);
        self.element = Some(element);
        self.manifest_url = Some(config.video_url.clone());

        self.load_and_attach(0.0).await
    }

    fn controllable_element(&self) -> Option<Arc<dyn MediaElement>> {
        self.element.clone()
    }

    fn subscribe(&mut self) {
        if let Some(element) = &self.element {
            self.listener.attach(element.as_ref());
        }
    }

    async fn next_signal(&mut self) -> Option<AdapterSignal> {
        self.listener.next().await
    }

    async fn recover(&mut self, action: RecoveryAction) -> Result<(), AdapterFailure> {
        let resume_at = self
            .element
            .as_ref()
            .map(|element| element.current_time())
            .unwrap_or_default();

        if action == RecoveryAction::RecoverMediaError {
            if let (Some(loaded), Some(element)) = (&self.loaded, &self.element) {
                debug!(playlist = %loaded.media_playlist_url, "Recovering media pipeline");
                reattach_source(
                    element.as_ref(),
                    loaded.media_playlist_url.as_str(),
                    resume_at,
                );
                return Ok(());
            }
        }

        // Nothing loaded yet, or a transport failure: start over from the manifest.
        debug!(?action, "Reloading manifest");
        self.load_and_attach(resume_at).await
    }

    fn destroy(&mut self) {
        self.listener.detach();
        if let Some(element) = self.element.take() {
            element.clear_source();
        }
        self.loaded = None;
        self.manifest_url = None;
    }
}
