use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::PlaybackConfig;
use crate::adapter::listener::NativeListener;
use crate::adapter::{AdapterKind, AdapterSignal, ProviderAdapter};
use crate::error::AdapterFailure;
use crate::media::{MediaElement, MediaSurface, NativeEventKind};
use crate::recovery::RecoveryAction;

/// Tag of the vendor component that replaces the surface element.
pub const PACKAGED_COMPONENT_TAG: &str = "packaged-player";

/// A vendor's self-contained playback component.
///
/// The component renders its own controls, so no element is exposed for
/// transport control and only the events the component documents are
/// forwarded.
pub struct PackagedComponentAdapter {
    component: Option<Arc<dyn MediaElement>>,
    attributes: Vec<(&'static str, String)>,
    listener: NativeListener,
}

fn is_component_event(kind: &NativeEventKind) -> bool {
    matches!(
        kind,
        NativeEventKind::Play
            | NativeEventKind::Pause
            | NativeEventKind::Ended
            | NativeEventKind::TimeUpdate
    )
}

impl PackagedComponentAdapter {
    pub fn new() -> Self {
        Self {
            component: None,
            attributes: Vec::new(),
            listener: NativeListener::filtered(is_component_event),
        }
    }

    fn component_attributes(
        config: &PlaybackConfig,
    ) -> Result<Vec<(&'static str, String)>, AdapterFailure> {
        let options = &config.packaged;
        let playback_id = options
            .playback_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| AdapterFailure::fatal("Packaged component requires a playback id"))?;

        let mut attributes = vec![("playback-id", playback_id.to_string())];
        if let Some(color) = &options.accent_color {
            attributes.push(("accent-color", color.clone()));
        }
        if config.autoplay {
            attributes.push(("autoplay", String::new()));
        }
        if config.muted {
            attributes.push(("muted", String::new()));
        }
        if let Some(start) = config.resume_position() {
            attributes.push(("start-time", start.to_string()));
        }
        if let Some(poster) = &config.poster_url {
            attributes.push(("poster", poster.clone()));
        }
        if let Some(title) = &options.metadata_video_title {
            attributes.push(("metadata-video-title", title.clone()));
        }
        if let Some(viewer) = &options.metadata_viewer_user_id {
            attributes.push(("metadata-viewer-user-id", viewer.clone()));
        }
        Ok(attributes)
    }

    fn apply_attributes(&self) {
        if let Some(component) = &self.component {
            for (name, value) in &self.attributes {
                component.set_attribute(name, value);
            }
        }
    }
}

impl Default for PackagedComponentAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProviderAdapter for PackagedComponentAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::PackagedComponent
    }

    async fn attach(
        &mut self,
        config: &PlaybackConfig,
        surface: &dyn MediaSurface,
    ) -> Result<(), AdapterFailure> {
        self.attributes = Self::component_attributes(config)?;
        self.component = Some(surface.replace_with_component(PACKAGED_COMPONENT_TAG));
        self.apply_attributes();
        info!(tag = PACKAGED_COMPONENT_TAG, "Packaged component attached");
        Ok(())
    }

    fn controllable_element(&self) -> Option<Arc<dyn MediaElement>> {
        None
    }

    fn subscribe(&mut self) {
        if let Some(component) = &self.component {
            self.listener.attach(component.as_ref());
        }
    }

    async fn next_signal(&mut self) -> Option<AdapterSignal> {
        self.listener.next().await
    }

    async fn recover(&mut self, action: RecoveryAction) -> Result<(), AdapterFailure> {
        if self.component.is_none() {
            return Err(AdapterFailure::fatal("Packaged component is not attached"));
        }
        // The component reloads itself when its playback id is set again.
        debug!(?action, "Re-applying packaged component attributes");
        self.apply_attributes();
        Ok(())
    }

    fn destroy(&mut self) {
        self.listener.detach();
        if let Some(component) = self.component.take() {
            component.clear_source();
        }
        self.attributes.clear();
    }
}
