use tracing::{debug, warn};

use crate::EngineConfig;
use crate::error::{AdapterFailure, FailureKind};

/// Repair an adapter can attempt without tearing the session down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    /// Reload the in-flight source from scratch.
    ReloadSource,
    /// Ask the media pipeline to recover from a decode error in place.
    RecoverMediaError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryDecision {
    Retry(RecoveryAction),
    Fatal,
}

/// Bounded recovery budget for one failure episode. [`reset`](Self::reset)
/// starts a new episode once playback has resumed.
#[derive(Debug, Clone)]
pub struct ErrorRecoveryPolicy {
    max_network_reloads: u32,
    max_media_recoveries: u32,
    network_reloads: u32,
    media_recoveries: u32,
}

impl ErrorRecoveryPolicy {
    pub fn new(max_network_reloads: u32, max_media_recoveries: u32) -> Self {
        Self {
            max_network_reloads,
            max_media_recoveries,
            network_reloads: 0,
            media_recoveries: 0,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.max_network_reloads, config.max_media_recoveries)
    }

    /// Decide what to do about `failure`, spending budget on a retry.
    pub fn decide(&mut self, failure: &AdapterFailure) -> RecoveryDecision {
        if failure.fatal {
            debug!(kind = ?failure.kind, "Adapter reported a fatal failure");
            return RecoveryDecision::Fatal;
        }

        match failure.kind {
            FailureKind::Network if self.network_reloads < self.max_network_reloads => {
                self.network_reloads += 1;
                warn!(
                    attempt = self.network_reloads,
                    max = self.max_network_reloads,
                    error = %failure.message,
                    "Network failure, reloading source"
                );
                RecoveryDecision::Retry(RecoveryAction::ReloadSource)
            }
            FailureKind::Media if self.media_recoveries < self.max_media_recoveries => {
                self.media_recoveries += 1;
                warn!(
                    attempt = self.media_recoveries,
                    max = self.max_media_recoveries,
                    error = %failure.message,
                    "Media failure, attempting recovery"
                );
                RecoveryDecision::Retry(RecoveryAction::RecoverMediaError)
            }
            _ => RecoveryDecision::Fatal,
        }
    }

    /// Restore the full budget.
    pub fn reset(&mut self) {
        if self.network_reloads > 0 || self.media_recoveries > 0 {
            debug!(
                network_reloads = self.network_reloads,
                media_recoveries = self.media_recoveries,
                "Playback resumed, resetting recovery budget"
            );
        }
        self.network_reloads = 0;
        self.media_recoveries = 0;
    }

    pub fn network_reloads(&self) -> u32 {
        self.network_reloads
    }

    pub fn media_recoveries(&self) -> u32 {
        self.media_recoveries
    }
}

impl Default for ErrorRecoveryPolicy {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_failure_reloads_once() {
        let mut policy = ErrorRecoveryPolicy::default();
        let failure = AdapterFailure::network("connection refused");

        assert_eq!(
            policy.decide(&failure),
            RecoveryDecision::Retry(RecoveryAction::ReloadSource)
        );
        assert_eq!(policy.decide(&failure), RecoveryDecision::Fatal);
        assert_eq!(policy.network_reloads(), 1);
    }

    #[test]
    fn test_media_failure_recovers_once() {
        let mut policy = ErrorRecoveryPolicy::default();
        let failure = AdapterFailure::media("bad frame");

        assert_eq!(
            policy.decide(&failure),
            RecoveryDecision::Retry(RecoveryAction::RecoverMediaError)
        );
        assert_eq!(policy.decide(&failure), RecoveryDecision::Fatal);
    }

    #[test]
    fn test_reset_starts_a_new_episode() {
        let mut policy = ErrorRecoveryPolicy::default();
        let network = AdapterFailure::network("connection reset");
        let media = AdapterFailure::media("bad frame");

        assert!(matches!(policy.decide(&network), RecoveryDecision::Retry(_)));
        assert!(matches!(policy.decide(&media), RecoveryDecision::Retry(_)));
        policy.reset();
        assert_eq!(policy.network_reloads(), 0);
        assert_eq!(policy.media_recoveries(), 0);

        assert_eq!(
            policy.decide(&network),
            RecoveryDecision::Retry(RecoveryAction::ReloadSource)
        );
        assert_eq!(policy.decide(&network), RecoveryDecision::Fatal);
    }

    #[test]
    fn test_budgets_are_independent() {
        let mut policy = ErrorRecoveryPolicy::new(1, 1);
        assert!(matches!(
            policy.decide(&AdapterFailure::media("x")),
            RecoveryDecision::Retry(_)
        ));
        assert!(matches!(
            policy.decide(&AdapterFailure::network("x")),
            RecoveryDecision::Retry(_)
        ));
        assert_eq!(policy.media_recoveries(), 1);
        assert_eq!(policy.network_reloads(), 1);
    }

    #[test]
    fn test_fatal_and_unclassified_never_retry() {
        let mut policy = ErrorRecoveryPolicy::new(5, 5);
        assert_eq!(
            policy.decide(&AdapterFailure::fatal("parse")),
            RecoveryDecision::Fatal
        );

        let unclassified = AdapterFailure {
            kind: FailureKind::Other,
            fatal: false,
            message: "?".into(),
        };
        assert_eq!(policy.decide(&unclassified), RecoveryDecision::Fatal);

        let fatal_network = AdapterFailure {
            fatal: true,
            ..AdapterFailure::network("gone")
        };
        assert_eq!(policy.decide(&fatal_network), RecoveryDecision::Fatal);
        assert_eq!(policy.network_reloads(), 0);
    }

    #[test]
    fn test_zero_budget_is_immediately_fatal() {
        let mut policy = ErrorRecoveryPolicy::new(0, 0);
        assert_eq!(
            policy.decide(&AdapterFailure::network("x")),
            RecoveryDecision::Fatal
        );
    }
}
