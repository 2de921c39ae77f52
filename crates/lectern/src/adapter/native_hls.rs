use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, trace};

use crate::PlaybackConfig;
use crate::adapter::listener::NativeListener;
use crate::adapter::{
    AdapterKind, AdapterSignal, ProviderAdapter, apply_element_options, reattach_source,
};
use crate::error::AdapterFailure;
use crate::media::{MediaElement, MediaSurface, NativeEventKind};
use crate::recovery::RecoveryAction;

const PENDING_CAPACITY: usize = 32;

/// Adaptive streaming handled by the element itself.
pub struct NativeHlsAdapter {
    element: Option<Arc<dyn MediaElement>>,
    source: Option<String>,
    listener: NativeListener,
    /// Events seen while waiting for metadata, replayed by `next_signal`.
    pending: VecDeque<AdapterSignal>,
}

impl NativeHlsAdapter {
    pub fn new() -> Self {
        Self {
            element: None,
            source: None,
            listener: NativeListener::all(),
            pending: VecDeque::new(),
        }
    }

    /// Wait until the element reports metadata for the current source.
    async fn wait_for_metadata(&mut self) -> Result<(), AdapterFailure> {
        loop {
            match self.listener.next().await {
                Some(AdapterSignal::Native(event))
                    if event.kind == NativeEventKind::LoadedMetadata =>
                {
                    debug!(duration = event.duration, "Native stream metadata loaded");
                    return Ok(());
                }
                Some(signal @ AdapterSignal::Native(_)) => {
                    if self.pending.len() == PENDING_CAPACITY {
                        trace!("Pending native events full, dropping the oldest");
                        self.pending.pop_front();
                    }
                    self.pending.push_back(signal);
                }
                Some(AdapterSignal::Failure(failure)) => return Err(failure),
                None => {
                    return Err(AdapterFailure::fatal(
                        "Media element went away before metadata loaded",
                    ));
                }
            }
        }
    }
}

impl Default for NativeHlsAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProviderAdapter for NativeHlsAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::NativeHls
    }

    async fn attach(
        &mut self,
        config: &PlaybackConfig,
        surface: &dyn MediaSurface,
    ) -> Result<(), AdapterFailure> {
        let element = surface.element();
        // Subscribe before setting the source so loadedmetadata cannot be missed.
        self.listener.attach(element.as_ref());
        apply_element_options(element.as_ref(), config);
        element.set_source(&config.video_url);

        self.source = Some(config.video_url.clone());
        self.element = Some(element);
        self.wait_for_metadata().await
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
        if let Some(signal) = self.pending.pop_front() {
            return Some(signal);
        }
        self.listener.next().await
    }

    async fn recover(&mut self, action: RecoveryAction) -> Result<(), AdapterFailure> {
        let (Some(element), Some(source)) = (self.element.clone(), self.source.clone()) else {
            return Err(AdapterFailure::fatal("No native stream to recover"));
        };
        debug!(?action, url = %source, "Reattaching native stream");
        self.listener.attach(element.as_ref());
        reattach_source(element.as_ref(), &source, element.current_time());
        self.wait_for_metadata().await
    }

    fn destroy(&mut self) {
        self.listener.detach();
        self.pending.clear();
        if let Some(element) = self.element.take() {
            element.clear_source();
        }
        self.source = None;
    }
}
