use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::SubmissionId;
use super::lifecycle::{LifecycleState, TransitionTable};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryEntryId(pub String);

/// One immutable audit record per committed transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "S: LifecycleState")]
pub struct HistoryEntry<S: LifecycleState> {
    pub id: HistoryEntryId,
    pub submission_id: SubmissionId,
    pub old_state: S,
    pub new_state: S,
    pub changed_by: String,
    pub created_at: DateTime<Utc>,
}

static HISTORY_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_history_id() -> HistoryEntryId {
    let id = HISTORY_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    HistoryEntryId(format!("hist-{id:06}"))
}

/// Drafts audit entries; every transition gets exactly one.
#[derive(Debug, Clone, Copy, Default)]
pub struct HistoryRecorder;

impl HistoryRecorder {
    pub fn record<S: LifecycleState>(
        &self,
        submission_id: &SubmissionId,
        old_state: S,
        new_state: S,
        changed_by: &str,
        at: DateTime<Utc>,
    ) -> HistoryEntry<S> {
        HistoryEntry {
            id: next_history_id(),
            submission_id: submission_id.clone(),
            old_state,
            new_state,
            changed_by: changed_by.to_string(),
            created_at: at,
        }
    }
}

/// Ways an audit trail can fail to describe a legal walk through the table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrailError<S: LifecycleState> {
    #[error("history entry {position} starts at {found} but the trail was at {expected}")]
    BrokenChain {
        position: usize,
        expected: S,
        found: S,
    },
    #[error("history entry {position} records forbidden transition {from} -> {to}")]
    ForbiddenEdge { position: usize, from: S, to: S },
    #[error("trail ends at {replayed} but the submission is persisted as {persisted}")]
    Diverged { replayed: S, persisted: S },
}

/// Fold `entries` from the table's initial state, returning the state the trail ends in.
pub fn replay<S: LifecycleState>(
    table: &TransitionTable<S>,
    entries: &[HistoryEntry<S>],
) -> Result<S, TrailError<S>> {
    entries
        .iter()
        .enumerate()
        .try_fold(table.initial(), |current, (position, entry)| {
            if entry.old_state != current {
                return Err(TrailError::BrokenChain {
                    position,
                    expected: current,
                    found: entry.old_state,
                });
            }
            if !table.can_transition(entry.old_state, entry.new_state) {
                return Err(TrailError::ForbiddenEdge {
                    position,
                    from: entry.old_state,
                    to: entry.new_state,
                });
            }
            Ok(entry.new_state)
        })
}
