use std::fmt;

use serde::{Deserialize, Serialize};

use super::{LifecycleState, TransitionTable};

/// Status vocabulary for the generic application lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationStatus {
    Draft,
    Submitted,
    UnderReview,
    Accepted,
    Rejected,
    Waitlisted,
}

impl ApplicationStatus {
    const ALL: [ApplicationStatus; 6] = [
        ApplicationStatus::Draft,
        ApplicationStatus::Submitted,
        ApplicationStatus::UnderReview,
        ApplicationStatus::Accepted,
        ApplicationStatus::Rejected,
        ApplicationStatus::Waitlisted,
    ];
}

impl LifecycleState for ApplicationStatus {
    const LIFECYCLE: &'static str = "application";

    fn all() -> &'static [Self] {
        &Self::ALL
    }

    fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Draft => "DRAFT",
            ApplicationStatus::Submitted => "SUBMITTED",
            ApplicationStatus::UnderReview => "UNDER_REVIEW",
            ApplicationStatus::Accepted => "ACCEPTED",
            ApplicationStatus::Rejected => "REJECTED",
            ApplicationStatus::Waitlisted => "WAITLISTED",
        }
    }

    fn standard_table() -> TransitionTable<Self> {
        use ApplicationStatus::*;

        TransitionTable::new(Draft)
            .allow(Draft, &[Submitted])
            .allow(Submitted, &[UnderReview])
            .allow(UnderReview, &[Accepted, Rejected, Waitlisted])
            .allow(Waitlisted, &[Accepted, Rejected])
            .decision_worthy(&[UnderReview, Accepted, Rejected, Waitlisted])
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
