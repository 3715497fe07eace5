// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a build request.
///
/// Stages only move forward (`pending -> scheduled -> running -> terminal`);
/// stages may be skipped but never revisited, and a terminal status is final.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildRequestStatus {
    Pending,
    Scheduled,
    Running,
    Failed,
    Completed,
    Canceled,
}

impl BuildRequestStatus {
    pub const ALL: [BuildRequestStatus; 6] = [
        Self::Pending,
        Self::Scheduled,
        Self::Running,
        Self::Failed,
        Self::Completed,
        Self::Canceled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Scheduled => "scheduled",
            Self::Running => "running",
            Self::Failed => "failed",
            Self::Completed => "completed",
            Self::Canceled => "canceled",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == raw)
    }

    /// User-facing label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "Waiting",
            Self::Scheduled => "Scheduled",
            Self::Running => "Running",
            Self::Failed => "Failed",
            Self::Completed => "Completed",
            Self::Canceled => "Canceled",
        }
    }

    fn rank(self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Scheduled => 1,
            Self::Running => 2,
            Self::Failed | Self::Completed | Self::Canceled => 3,
        }
    }

    pub fn has_finished(self) -> bool {
        self.rank() == 3
    }

    pub fn has_started(self) -> bool {
        self != Self::Pending
    }

    pub fn is_pending(self) -> bool {
        self == Self::Pending
    }

    pub fn is_scheduled(self) -> bool {
        self == Self::Scheduled
    }

    /// Whether a request in `self` may move to `next`. Staying put is allowed.
    pub fn can_transition_to(self, next: BuildRequestStatus) -> bool {
        if self == next {
            return true;
        }
        !self.has_finished() && next.rank() > self.rank()
    }
}

impl fmt::Display for BuildRequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::BuildRequestStatus::{self, *};

    #[test]
    fn predicates_agree_with_the_lifecycle() {
        for status in BuildRequestStatus::ALL {
            let finished = matches!(status, Failed | Completed | Canceled);
            assert_eq!(status.has_finished(), finished, "{status}");
            assert_eq!(status.has_started(), status != Pending, "{status}");
            assert_eq!(status.is_pending(), status == Pending, "{status}");
            assert_eq!(status.is_scheduled(), status == Scheduled, "{status}");
            if status.is_pending() {
                assert!(!status.has_started() && !status.has_finished());
            }
            if status.has_finished() {
                assert!(status.has_started());
            }
        }
    }

    #[test]
    fn transitions_only_move_forward() {
        assert!(Pending.can_transition_to(Scheduled));
        assert!(Pending.can_transition_to(Completed));
        assert!(Scheduled.can_transition_to(Running));
        assert!(Running.can_transition_to(Canceled));
        assert!(Running.can_transition_to(Running));

        assert!(!Running.can_transition_to(Pending));
        assert!(!Scheduled.can_transition_to(Pending));
        assert!(!Failed.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(Running));
    }

    #[test]
    fn labels_and_wire_names() {
        assert_eq!(Pending.label(), "Waiting");
        assert_eq!(Canceled.label(), "Canceled");
        assert_eq!(BuildRequestStatus::parse("running"), Some(Running));
        assert_eq!(BuildRequestStatus::parse("Running"), None);
        let json = serde_json::to_string(&Scheduled).expect("serialize");
        assert_eq!(json, "\"scheduled\"");
    }
}
