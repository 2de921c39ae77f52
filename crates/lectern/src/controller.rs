//! Transport controls over an attached media element.

use std::sync::Arc;

use tracing::debug;

use crate::PlayerError;
use crate::media::MediaElement;

/// Stable control surface handed out once a session is ready.
pub struct UiController {
    element: Option<Arc<dyn MediaElement>>,
    resumed: bool,
}

impl UiController {
    pub fn new(element: Arc<dyn MediaElement>) -> Self {
        Self {
            element: Some(element),
            resumed: false,
        }
    }

    fn element(&self) -> Result<&Arc<dyn MediaElement>, PlayerError> {
        self.element.as_ref().ok_or(PlayerError::NoController)
    }

    /// Seek to the resume point. Only the first call has any effect.
    pub fn resume_from(&mut self, start_time: f64) -> Result<(), PlayerError> {
        if self.resumed {
            return Ok(());
        }
        self.resumed = true;
        if start_time > 0.0 {
            debug!(start_time, "Resuming playback position");
            self.seek(start_time)?;
        }
        Ok(())
    }

    pub fn play(&self) -> Result<(), PlayerError> {
        self.element()?.play()?;
        Ok(())
    }

    pub fn pause(&self) -> Result<(), PlayerError> {
        self.element()?.pause();
        Ok(())
    }

    /// Pause and rewind to the start.
    pub fn stop(&self) -> Result<(), PlayerError> {
        let element = self.element()?;
        element.pause();
        element.seek(0.0);
        Ok(())
    }

    pub fn toggle_play(&self) -> Result<(), PlayerError> {
        let element = self.element()?;
        if element.is_paused() {
            element.play()?;
        } else {
            element.pause();
        }
        Ok(())
    }

    /// Seek to `time`, clamped to the known media range.
    pub fn seek(&self, time: f64) -> Result<(), PlayerError> {
        let element = self.element()?;
        let mut target = if time.is_finite() { time.max(0.0) } else { 0.0 };
        let duration = element.duration();
        if duration.is_finite() && duration > 0.0 {
            target = target.min(duration);
        }
        element.seek(target);
        Ok(())
    }

    pub fn current_time(&self) -> Result<f64, PlayerError> {
        Ok(self.element()?.current_time())
    }

    pub fn duration(&self) -> Result<f64, PlayerError> {
        Ok(self.element()?.duration())
    }

    pub fn volume(&self) -> Result<f64, PlayerError> {
        Ok(self.element()?.volume())
    }

    pub fn set_volume(&self, volume: f64) -> Result<(), PlayerError> {
        let volume = if volume.is_finite() {
            volume.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.element()?.set_volume(volume);
        Ok(())
    }

    pub fn mute(&self) -> Result<(), PlayerError> {
        self.element()?.set_muted(true);
        Ok(())
    }

    pub fn unmute(&self) -> Result<(), PlayerError> {
        self.element()?.set_muted(false);
        Ok(())
    }

    pub fn is_muted(&self) -> Result<bool, PlayerError> {
        Ok(self.element()?.is_muted())
    }

    pub fn fullscreen(&self) -> Fullscreen<'_> {
        Fullscreen { controller: self }
    }

    /// Drop the element reference. Later calls fail with
    /// [`PlayerError::NoController`].
    pub fn destroy(&mut self) {
        self.element = None;
    }

    pub fn is_destroyed(&self) -> bool {
        self.element.is_none()
    }
}

/// Fullscreen sub-controls, see [`UiController::fullscreen`].
pub struct Fullscreen<'a> {
    controller: &'a UiController,
}

impl Fullscreen<'_> {
    pub fn enter(&self) -> Result<(), PlayerError> {
        self.controller.element()?.enter_fullscreen()?;
        Ok(())
    }

    pub fn exit(&self) -> Result<(), PlayerError> {
        self.controller.element()?.exit_fullscreen();
        Ok(())
    }

    pub fn toggle(&self) -> Result<(), PlayerError> {
        if self.is_active()? {
            self.exit()
        } else {
            self.enter()
        }
    }

    pub fn is_active(&self) -> Result<bool, PlayerError> {
        Ok(self.controller.element()?.is_fullscreen())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::FakeMediaElement;

    fn controller() -> (Arc<FakeMediaElement>, UiController) {
        let element = FakeMediaElement::new();
        element.set_duration(120.0);
        let controller = UiController::new(element.clone());
        (element, controller)
    }

    #[test]
    fn test_transport_calls_reach_element() {
        let (element, controller) = controller();

        controller.play().unwrap();
        assert!(!element.is_paused());
        controller.toggle_play().unwrap();
        assert!(element.is_paused());
        controller.toggle_play().unwrap();
        assert!(!element.is_paused());

        controller.seek(30.0).unwrap();
        assert_eq!(controller.current_time().unwrap(), 30.0);

        controller.stop().unwrap();
        assert!(element.is_paused());
        assert_eq!(controller.current_time().unwrap(), 0.0);
        assert_eq!(controller.duration().unwrap(), 120.0);
    }

    #[test]
    fn test_seek_and_volume_are_clamped() {
        let (element, controller) = controller();

        controller.seek(500.0).unwrap();
        assert_eq!(element.current_time(), 120.0);
        controller.seek(-5.0).unwrap();
        assert_eq!(element.current_time(), 0.0);

        controller.set_volume(1.7).unwrap();
        assert_eq!(controller.volume().unwrap(), 1.0);
        controller.set_volume(-0.2).unwrap();
        assert_eq!(controller.volume().unwrap(), 0.0);
    }

    #[test]
    fn test_resume_happens_once() {
        let (element, mut controller) = controller();

        controller.resume_from(42.0).unwrap();
        assert_eq!(element.current_time(), 42.0);

        element.seek(10.0);
        controller.resume_from(42.0).unwrap();
        assert_eq!(element.current_time(), 10.0);
    }

    #[test]
    fn test_mute_and_fullscreen() {
        let (element, controller) = controller();

        controller.mute().unwrap();
        assert!(element.is_muted());
        controller.unmute().unwrap();
        assert!(!controller.is_muted().unwrap());

        controller.fullscreen().toggle().unwrap();
        assert!(element.is_fullscreen());
        controller.fullscreen().toggle().unwrap();
        assert!(!element.is_fullscreen());
    }

    #[test]
    fn test_destroyed_controller_rejects_calls() {
        let (_element, mut controller) = controller();
        controller.destroy();

        assert!(controller.is_destroyed());
        assert!(matches!(controller.play(), Err(PlayerError::NoController)));
        assert!(matches!(
            controller.current_time(),
            Err(PlayerError::NoController)
        ));
        assert!(matches!(
            controller.fullscreen().enter(),
            Err(PlayerError::NoController)
        ));
    }

    #[test]
    fn test_rejected_play_surfaces_error() {
        let (element, controller) = controller();
        element.reject_play("autoplay blocked");
        assert!(matches!(controller.play(), Err(PlayerError::Element(_))));
    }
}
