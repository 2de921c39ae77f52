use std::time::Duration;

use tracing::debug;

use crate::events::{PlaybackEvent, PlaybackPosition};
use crate::progress::ProgressSnapshot;

/// Throttled, exactly-once-completion persistence decisions for one session.
#[derive(Debug)]
pub struct ProgressRecorder {
    lesson_id: String,
    interval: f64,
    bucket: Option<i64>,
    completed: bool,
}

impl ProgressRecorder {
    pub fn new(lesson_id: impl Into<String>, interval: Duration) -> Self {
        // A zero interval would divide by zero; fall back to millisecond buckets.
        let interval = interval.max(Duration::from_millis(1)).as_secs_f64();
        Self {
            lesson_id: lesson_id.into(),
            interval,
            bucket: None,
            completed: false,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Returns the snapshot to persist for `event`, if any.
    pub fn record(
        &mut self,
        event: &PlaybackEvent,
        position: PlaybackPosition,
    ) -> Option<ProgressSnapshot> {
        if self.completed {
            return None;
        }

        match event {
            PlaybackEvent::Playing => None,
            PlaybackEvent::Paused => Some(self.snapshot(position)),
            PlaybackEvent::Seeked => {
                self.bucket = Some(self.bucket_of(position.current_time));
                Some(self.snapshot(position))
            }
            PlaybackEvent::TimeUpdate {
                current_time,
                duration,
            } => {
                let bucket = self.bucket_of(*current_time);
                match self.bucket.replace(bucket) {
                    Some(previous) if previous != bucket => {
                        debug!(
                            lesson_id = %self.lesson_id,
                            current_time,
                            "Progress interval crossed"
                        );
                        Some(self.snapshot(PlaybackPosition::new(*current_time, *duration)))
                    }
                    _ => None,
                }
            }
            PlaybackEvent::Ended => {
                self.completed = true;
                Some(ProgressSnapshot {
                    lesson_id: self.lesson_id.clone(),
                    current_time: position.current_time,
                    duration: position.duration,
                    percent: 100,
                    completed: true,
                })
            }
        }
    }

    fn bucket_of(&self, time: f64) -> i64 {
        (time / self.interval).floor() as i64
    }

    fn snapshot(&self, position: PlaybackPosition) -> ProgressSnapshot {
        ProgressSnapshot {
            lesson_id: self.lesson_id.clone(),
            current_time: position.current_time,
            duration: position.duration,
            percent: percent_of(position),
            completed: false,
        }
    }
}

/// Watched percentage, capped at 99 so only completion reports 100.
pub fn percent_of(position: PlaybackPosition) -> u8 {
    if !position.has_duration() || !position.current_time.is_finite() {
        return 0;
    }
    (position.current_time / position.duration * 100.0)
        .floor()
        .clamp(0.0, 99.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder() -> ProgressRecorder {
        ProgressRecorder::new("lesson-1", Duration::from_secs(10))
    }

    fn tick(recorder: &mut ProgressRecorder, t: f64) -> Option<ProgressSnapshot> {
        let event = PlaybackEvent::TimeUpdate {
            current_time: t,
            duration: 100.0,
        };
        recorder.record(&event, PlaybackPosition::new(t, 100.0))
    }

    #[test]
    fn test_time_updates_are_throttled_by_bucket() {
        let mut recorder = recorder();

        // first observation only seeds the bucket
        assert!(tick(&mut recorder, 0.25).is_none());
        assert!(tick(&mut recorder, 4.0).is_none());
        assert!(tick(&mut recorder, 9.9).is_none());

        let snapshot = tick(&mut recorder, 10.1).unwrap();
        assert_eq!(snapshot.percent, 10);
        assert!(!snapshot.completed);

        assert!(tick(&mut recorder, 15.0).is_none());
        assert!(tick(&mut recorder, 20.0).is_some());
    }

    #[test]
    fn test_first_update_seeds_even_mid_video() {
        let mut recorder = recorder();
        assert!(tick(&mut recorder, 42.0).is_none());
        assert!(tick(&mut recorder, 49.0).is_none());
        assert!(tick(&mut recorder, 50.0).is_some());
    }

    #[test]
    fn test_pause_and_seek_persist_immediately() {
        let mut recorder = recorder();

        let paused = recorder
            .record(&PlaybackEvent::Paused, PlaybackPosition::new(33.0, 100.0))
            .unwrap();
        assert_eq!(paused.current_time, 33.0);
        assert_eq!(paused.percent, 33);

        let seeked = recorder
            .record(&PlaybackEvent::Seeked, PlaybackPosition::new(71.0, 100.0))
            .unwrap();
        assert_eq!(seeked.current_time, 71.0);

        // seek moved the bucket, staying inside it stays quiet
        assert!(tick(&mut recorder, 72.0).is_none());
        assert!(tick(&mut recorder, 80.0).is_some());
    }

    #[test]
    fn test_percent_is_capped_until_completion() {
        let mut recorder = recorder();
        tick(&mut recorder, 85.0);
        let snapshot = tick(&mut recorder, 99.9).unwrap();
        assert_eq!(snapshot.percent, 99);

        let snapshot = tick(&mut recorder, 100.0).unwrap();
        assert_eq!(snapshot.percent, 99);
        assert!(!snapshot.completed);
    }

    #[test]
    fn test_completion_is_exactly_once() {
        let mut recorder = recorder();
        let position = PlaybackPosition::new(100.0, 100.0);

        let done = recorder.record(&PlaybackEvent::Ended, position).unwrap();
        assert_eq!(done.percent, 100);
        assert!(done.completed);
        assert!(recorder.is_completed());

        assert!(recorder.record(&PlaybackEvent::Ended, position).is_none());
        assert!(recorder.record(&PlaybackEvent::Paused, position).is_none());
        assert!(recorder.record(&PlaybackEvent::Seeked, position).is_none());
    }

    #[test]
    fn test_playing_never_persists() {
        let mut recorder = recorder();
        assert!(
            recorder
                .record(&PlaybackEvent::Playing, PlaybackPosition::new(5.0, 100.0))
                .is_none()
        );
    }

    #[test]
    fn test_percent_with_unknown_duration() {
        assert_eq!(percent_of(PlaybackPosition::new(10.0, 0.0)), 0);
        assert_eq!(percent_of(PlaybackPosition::new(10.0, f64::NAN)), 0);
        assert_eq!(percent_of(PlaybackPosition::new(10.0, f64::INFINITY)), 0);
        assert_eq!(percent_of(PlaybackPosition::new(25.0, 50.0)), 50);
    }
}
