use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::PlaybackConfig;
use crate::adapter::listener::NativeListener;
use crate::adapter::{
    AdapterKind, AdapterSignal, ProviderAdapter, apply_element_options, reattach_source,
};
use crate::error::AdapterFailure;
use crate::media::{MediaElement, MediaSurface};
use crate::recovery::RecoveryAction;

/// Progressive download of a direct media file.
pub struct PlainFileAdapter {
    element: Option<Arc<dyn MediaElement>>,
    source: Option<String>,
    listener: NativeListener,
}

impl PlainFileAdapter {
    pub fn new() -> Self {
        Self {
            element: None,
            source: None,
            listener: NativeListener::all(),
        }
    }
}

impl Default for PlainFileAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProviderAdapter for PlainFileAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::PlainFile
    }

    async fn attach(
        &mut self,
        config: &PlaybackConfig,
        surface: &dyn MediaSurface,
    ) -> Result<(), AdapterFailure> {
        let element = surface.element();
        apply_element_options(element.as_ref(), config);
        element.set_source(&config.video_url);
        debug!(url = %config.video_url, "Attached file source");

        self.source = Some(config.video_url.clone());
        self.element = Some(element);
        Ok(())
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
        let (Some(element), Some(source)) = (&self.element, &self.source) else {
            return Err(AdapterFailure::fatal("No file source to recover"));
        };
        debug!(?action, url = %source, "Reattaching file source");
        reattach_source(element.as_ref(), source, element.current_time());
        Ok(())
    }

    fn destroy(&mut self) {
        self.listener.detach();
        if let Some(element) = self.element.take() {
            element.clear_source();
        }
        self.source = None;
    }
}
