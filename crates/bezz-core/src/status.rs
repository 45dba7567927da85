//! Brief lifecycle status and its transition table.
//!
//! The happy path is `processing -> strategy_completed -> ads_completed ->
//! completed`. Each generating stage has its own failure status, and the three
//! failure statuses are the only ones a retry may leave.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BriefStatus {
    Processing,
    StrategyCompleted,
    AdsCompleted,
    Completed,
    /// Strategy generation exhausted every fallback model.
    Failed,
    AdsFailed,
    ImagesFailed,
}

impl BriefStatus {
    pub const ALL: [BriefStatus; 7] = [
        BriefStatus::Processing,
        BriefStatus::StrategyCompleted,
        BriefStatus::AdsCompleted,
        BriefStatus::Completed,
        BriefStatus::Failed,
        BriefStatus::AdsFailed,
        BriefStatus::ImagesFailed,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            BriefStatus::Processing => "processing",
            BriefStatus::StrategyCompleted => "strategy_completed",
            BriefStatus::AdsCompleted => "ads_completed",
            BriefStatus::Completed => "completed",
            BriefStatus::Failed => "failed",
            BriefStatus::AdsFailed => "ads_failed",
            BriefStatus::ImagesFailed => "images_failed",
        }
    }

    /// No run is in flight once a brief reaches one of these.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            BriefStatus::Completed
                | BriefStatus::Failed
                | BriefStatus::AdsFailed
                | BriefStatus::ImagesFailed
        )
    }

    #[must_use]
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            BriefStatus::Failed | BriefStatus::AdsFailed | BriefStatus::ImagesFailed
        )
    }

    /// Returns `true` when `next` is a legal successor of `self`.
    #[must_use]
    pub fn can_transition_to(self, next: BriefStatus) -> bool {
        use BriefStatus::{
            AdsCompleted, AdsFailed, Completed, Failed, ImagesFailed, Processing,
            StrategyCompleted,
        };

        matches!(
            (self, next),
            (Processing, StrategyCompleted | Failed)
                | (StrategyCompleted, AdsCompleted | AdsFailed | ImagesFailed)
                | (AdsCompleted, Completed)
                | (Failed | AdsFailed | ImagesFailed, Processing)
        )
    }

    /// Validates `self -> next` against the transition table.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidTransition`] when the table has no such edge.
    pub fn transition(self, next: BriefStatus) -> Result<BriefStatus, CoreError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(CoreError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    /// Where an abandoned, non-terminal run is parked so it becomes retryable
    /// (or, for `ads_completed`, finished). `None` for terminal statuses.
    #[must_use]
    pub fn stale_resolution(self) -> Option<BriefStatus> {
        match self {
            BriefStatus::Processing => Some(BriefStatus::Failed),
            BriefStatus::StrategyCompleted => Some(BriefStatus::AdsFailed),
            BriefStatus::AdsCompleted => Some(BriefStatus::Completed),
            _ => None,
        }
    }
}

impl fmt::Display for BriefStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BriefStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BriefStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| CoreError::UnknownStatus(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_is_legal() {
        let path = [
            BriefStatus::Processing,
            BriefStatus::StrategyCompleted,
            BriefStatus::AdsCompleted,
            BriefStatus::Completed,
        ];
        for pair in path.windows(2) {
            assert!(
                pair[0].can_transition_to(pair[1]),
                "{} -> {} should be legal",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn completed_has_no_successor() {
        for next in BriefStatus::ALL {
            assert!(!BriefStatus::Completed.can_transition_to(next));
        }
    }

    #[test]
    fn only_failure_statuses_reenter_processing() {
        for status in BriefStatus::ALL {
            assert_eq!(
                status.can_transition_to(BriefStatus::Processing),
                status.is_retryable(),
                "{status}"
            );
        }
    }

    #[test]
    fn skipping_a_stage_is_rejected() {
        let err = BriefStatus::Processing
            .transition(BriefStatus::AdsCompleted)
            .unwrap_err();
        assert_eq!(
            err,
            CoreError::InvalidTransition {
                from: BriefStatus::Processing,
                to: BriefStatus::AdsCompleted,
            }
        );
    }

    #[test]
    fn image_failure_only_follows_strategy_completed() {
        assert!(BriefStatus::StrategyCompleted.can_transition_to(BriefStatus::ImagesFailed));
        assert!(!BriefStatus::Processing.can_transition_to(BriefStatus::ImagesFailed));
        assert!(!BriefStatus::AdsCompleted.can_transition_to(BriefStatus::ImagesFailed));
    }

    #[test]
    fn wire_names_round_trip_through_from_str() {
        for status in BriefStatus::ALL {
            assert_eq!(status.as_str().parse::<BriefStatus>(), Ok(status));
        }
        assert!("done".parse::<BriefStatus>().is_err());
    }

    #[test]
    fn serde_uses_snake_case_wire_names() {
        let json = serde_json::to_string(&BriefStatus::ImagesFailed).expect("serialize");
        assert_eq!(json, "\"images_failed\"");
    }

    #[test]
    fn stale_resolution_lands_on_a_legal_successor() {
        for status in BriefStatus::ALL {
            match status.stale_resolution() {
                Some(next) => assert!(status.can_transition_to(next), "{status} -> {next}"),
                None => assert!(status.is_terminal()),
            }
        }
    }
}
