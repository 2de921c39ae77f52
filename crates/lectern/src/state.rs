use std::fmt;

/// Lifecycle state of a playback session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Uninitialized,
    Loading,
    Ready,
    Playing,
    Paused,
    Ended,
    Recovering,
    Destroyed,
}

impl SessionState {
    pub fn can_transition_to(self, next: SessionState) -> bool {
        use SessionState::*;

        match (self, next) {
            (Destroyed, _) => false,
            (_, Destroyed) => true,
            (Uninitialized, Loading) => true,
            (Loading, Ready) => true,
            (Ready, Playing | Paused) => true,
            (Playing, Paused | Ended) => true,
            (Paused, Playing | Ended) => true,
            (Ended, Playing) => true,
            (Loading | Ready | Playing | Paused | Ended, Recovering) => true,
            (Recovering, Ready) => true,
            _ => false,
        }
    }

    /// Whether the session has left the loading phase for good.
    pub fn is_attached(self) -> bool {
        matches!(
            self,
            SessionState::Ready | SessionState::Playing | SessionState::Paused | SessionState::Ended
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Uninitialized => "uninitialized",
            SessionState::Loading => "loading",
            SessionState::Ready => "ready",
            SessionState::Playing => "playing",
            SessionState::Paused => "paused",
            SessionState::Ended => "ended",
            SessionState::Recovering => "recovering",
            SessionState::Destroyed => "destroyed",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::SessionState::*;
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        let path = [Uninitialized, Loading, Ready, Playing, Paused, Playing, Ended, Destroyed];
        for pair in path.windows(2) {
            assert!(
                pair[0].can_transition_to(pair[1]),
                "{} -> {} should be allowed",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_recovery_transitions() {
        for from in [Loading, Ready, Playing, Paused] {
            assert!(from.can_transition_to(Recovering));
        }
        assert!(Recovering.can_transition_to(Ready));
        assert!(Recovering.can_transition_to(Destroyed));
        assert!(!Uninitialized.can_transition_to(Recovering));
        assert!(!Recovering.can_transition_to(Playing));
    }

    #[test]
    fn test_failure_after_end_is_recoverable() {
        let path = [Playing, Ended, Recovering, Ready, Playing];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_invalid_transitions() {
        assert!(!Uninitialized.can_transition_to(Playing));
        assert!(!Loading.can_transition_to(Playing));
        assert!(!Destroyed.can_transition_to(Loading));
        assert!(!Destroyed.can_transition_to(Destroyed));
        assert!(!Ended.can_transition_to(Paused));
    }

    #[test]
    fn test_is_attached() {
        assert!(Ready.is_attached());
        assert!(Ended.is_attached());
        assert!(!Loading.is_attached());
        assert!(!Recovering.is_attached());
    }
}
