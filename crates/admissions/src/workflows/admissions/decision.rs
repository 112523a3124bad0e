use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::SubmissionId;
use super::lifecycle::{LifecycleState, TransitionTable};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DecisionId(pub String);

/// Governance record naming who moved a submission into a decision-worthy state, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "S: LifecycleState")]
pub struct Decision<S: LifecycleState> {
    pub id: DecisionId,
    pub submission_id: SubmissionId,
    pub decided_by: String,
    pub state: S,
    #[serde(default)]
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

static DECISION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_decision_id() -> DecisionId {
    let id = DECISION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    DecisionId(format!("dec-{id:06}"))
}

/// Drafts decision records for the targets the lifecycle table marks as decision-worthy.
#[derive(Debug, Clone)]
pub struct DecisionRecorder<S: LifecycleState> {
    table: Arc<TransitionTable<S>>,
}

impl<S: LifecycleState> DecisionRecorder<S> {
    pub fn new(table: Arc<TransitionTable<S>>) -> Self {
        Self { table }
    }

    /// Returns `None` when `state` is a mechanical step that needs no decision.
    pub fn record(
        &self,
        submission_id: &SubmissionId,
        state: S,
        decided_by: &str,
        comment: Option<&str>,
        at: DateTime<Utc>,
    ) -> Option<Decision<S>> {
        if !self.table.requires_decision(state) {
            return None;
        }

        Some(Decision {
            id: next_decision_id(),
            submission_id: submission_id.clone(),
            decided_by: decided_by.to_string(),
            state,
            comment: comment.map(str::trim).unwrap_or_default().to_string(),
            created_at: at,
        })
    }
}
