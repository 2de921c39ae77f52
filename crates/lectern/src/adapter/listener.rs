use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::{trace, warn};

use crate::adapter::AdapterSignal;
use crate::error::AdapterFailure;
use crate::media::{MediaElement, MediaErrorCode, NativeEvent, NativeEventKind};

/// A native event subscription owned by an adapter.
pub(crate) struct NativeListener {
    rx: Option<broadcast::Receiver<NativeEvent>>,
    accept: fn(&NativeEventKind) -> bool,
}

impl NativeListener {
    /// Listener forwarding every event kind.
    pub fn all() -> Self {
        Self::filtered(|_| true)
    }

    pub fn filtered(accept: fn(&NativeEventKind) -> bool) -> Self {
        Self { rx: None, accept }
    }

    pub fn attach(&mut self, element: &dyn MediaElement) {
        if self.rx.is_none() {
            self.rx = Some(element.subscribe());
        }
    }

    pub async fn next(&mut self) -> Option<AdapterSignal> {
        let rx = self.rx.as_mut()?;
        loop {
            match rx.recv().await {
                Ok(event) => {
                    if let NativeEventKind::Error(code) = event.kind {
                        match classify_media_error(code) {
                            Some(failure) => return Some(AdapterSignal::Failure(failure)),
                            None => continue,
                        }
                    }
                    if (self.accept)(&event.kind) {
                        return Some(AdapterSignal::Native(event));
                    }
                    trace!(kind = ?event.kind, "Ignoring native event");
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Native event listener lagged, events dropped");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    pub fn detach(&mut self) {
        self.rx = None;
    }
}

/// Failure class of a native element error. Aborted loads are not failures.
pub(crate) fn classify_media_error(code: MediaErrorCode) -> Option<AdapterFailure> {
    match code {
        MediaErrorCode::Aborted => None,
        MediaErrorCode::Network => Some(AdapterFailure::network("Media element network error")),
        MediaErrorCode::Decode => Some(AdapterFailure::media("Media element decode error")),
        MediaErrorCode::SourceNotSupported => Some(AdapterFailure::fatal(
            "Media source not supported by the element",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use crate::test_utils::FakeMediaElement;

    #[tokio::test]
    async fn test_filters_and_classifies() {
        let element = FakeMediaElement::new();
        let mut listener = NativeListener::filtered(|kind| matches!(kind, NativeEventKind::Pause));
        listener.attach(element.as_ref());
        assert_eq!(element.listener_count(), 1);

        element.emit(NativeEventKind::Seeking);
        element.emit(NativeEventKind::Error(MediaErrorCode::Aborted));
        element.emit(NativeEventKind::Pause);
        element.emit(NativeEventKind::Error(MediaErrorCode::Decode));

        match listener.next().await {
            Some(AdapterSignal::Native(event)) => assert_eq!(event.kind, NativeEventKind::Pause),
            other => panic!("unexpected signal {other:?}"),
        }
        match listener.next().await {
            Some(AdapterSignal::Failure(failure)) => {
                assert_eq!(failure.kind, FailureKind::Media);
                assert!(!failure.fatal);
            }
            other => panic!("unexpected signal {other:?}"),
        }

        listener.detach();
        assert_eq!(element.listener_count(), 0);
        assert!(listener.next().await.is_none());
    }

    #[test]
    fn test_error_classes() {
        assert!(classify_media_error(MediaErrorCode::Aborted).is_none());
        assert_eq!(
            classify_media_error(MediaErrorCode::Network).unwrap().kind,
            FailureKind::Network
        );
        assert!(
            classify_media_error(MediaErrorCode::SourceNotSupported)
                .unwrap()
                .fatal
        );
    }
}
