//! # Provider adapters
//!
//! One [`ProviderAdapter`] per delivery backend. An adapter owns everything
//! that attaches a source to the media surface for its backend: the element
//! reference, the native event subscription and, for library-driven
//! streaming, the manifest state. [`crate::factory::AdapterFactory`] picks the
//! variant for a given config.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::PlaybackConfig;
use crate::error::AdapterFailure;
use crate::media::{MediaElement, MediaSurface, NativeEvent};
use crate::recovery::RecoveryAction;

mod listener;
pub mod library_hls;
pub mod native_hls;
pub mod packaged;
pub mod plain_file;

pub use library_hls::LibraryHlsAdapter;
pub use native_hls::NativeHlsAdapter;
pub use packaged::PackagedComponentAdapter;
pub use plain_file::PlainFileAdapter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdapterKind {
    PackagedComponent,
    LibraryHls,
    NativeHls,
    PlainFile,
}

impl fmt::Display for AdapterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AdapterKind::PackagedComponent => "packaged",
            AdapterKind::LibraryHls => "library-hls",
            AdapterKind::NativeHls => "native-hls",
            AdapterKind::PlainFile => "file",
        };
        f.write_str(name)
    }
}

/// Something an attached adapter wants the session to know about.
#[derive(Debug, Clone, PartialEq)]
pub enum AdapterSignal {
    Native(NativeEvent),
    Failure(AdapterFailure),
}

#[async_trait]
pub trait ProviderAdapter: Send {
    fn kind(&self) -> AdapterKind;

    /// Attach the configured source to `surface`. Resolves once the adapter
    /// is ready for playback.
    async fn attach(
        &mut self,
        config: &PlaybackConfig,
        surface: &dyn MediaSurface,
    ) -> Result<(), AdapterFailure>;

    /// The element transport controls should drive, if the backend exposes one.
    fn controllable_element(&self) -> Option<Arc<dyn MediaElement>>;

    /// Start listening for native events. Idempotent.
    fn subscribe(&mut self);

    /// Next native event or failure. `None` once the subscription is gone.
    async fn next_signal(&mut self) -> Option<AdapterSignal>;

    async fn recover(&mut self, action: RecoveryAction) -> Result<(), AdapterFailure>;

    /// Release the element, the subscription and any loader state.
    fn destroy(&mut self);
}

/// Apply the settings every element-backed adapter shares.
pub(crate) fn apply_element_options(element: &dyn MediaElement, config: &PlaybackConfig) {
    if let Some(poster) = &config.poster_url {
        element.set_poster(poster);
    }
    element.set_muted(config.muted);
}

/// Swap the element source for `url` and return to `resume_at`.
pub(crate) fn reattach_source(element: &dyn MediaElement, url: &str, resume_at: f64) {
    element.clear_source();
    element.set_source(url);
    if resume_at > 0.0 {
        element.seek(resume_at);
    }
}
