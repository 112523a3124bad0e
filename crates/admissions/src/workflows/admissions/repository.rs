use chrono::{DateTime, Utc};
use serde::Serialize;

use super::decision::Decision;
use super::domain::{Submission, SubmissionFilter, SubmissionId};
use super::history::HistoryEntry;
use super::lifecycle::LifecycleState;

/// Everything one transition writes. Stores apply it atomically or not at all.
#[derive(Debug, Clone)]
pub struct TransitionCommit<S: LifecycleState> {
    /// Submission as it should look after the transition, still carrying the loaded version.
    pub submission: Submission<S>,
    pub expected_version: u64,
    pub decision: Option<Decision<S>>,
    pub history: HistoryEntry<S>,
}

/// Storage port for submissions.
///
/// `commit_transition` and `soft_delete` compare `expected_version` with the stored version and
/// fail with [`RepositoryError::VersionConflict`] when another writer got there first. On
/// success the stored version is incremented.
pub trait SubmissionRepository<S: LifecycleState>: Send + Sync {
    fn insert(&self, submission: Submission<S>) -> Result<Submission<S>, RepositoryError>;
    /// Returns soft-deleted records as well; callers decide how to treat them.
    fn fetch(&self, id: &SubmissionId) -> Result<Option<Submission<S>>, RepositoryError>;
    /// Submission, decisions and history as of one committed version, soft-deleted included.
    fn snapshot(
        &self,
        id: &SubmissionId,
    ) -> Result<Option<SubmissionDossier<S>>, RepositoryError>;
    /// Live (not soft-deleted) records matching `filter`, oldest first.
    fn list(&self, filter: &SubmissionFilter) -> Result<Vec<Submission<S>>, RepositoryError>;
    fn commit_transition(
        &self,
        commit: TransitionCommit<S>,
    ) -> Result<Submission<S>, RepositoryError>;
    fn soft_delete(
        &self,
        id: &SubmissionId,
        expected_version: u64,
        deleted_by: &str,
        at: DateTime<Utc>,
    ) -> Result<Submission<S>, RepositoryError>;
}

/// Read port over decision records, in append order.
pub trait DecisionLog<S: LifecycleState>: Send + Sync {
    fn decisions_for(&self, id: &SubmissionId) -> Result<Vec<Decision<S>>, RepositoryError>;
}

/// Read port over the audit trail, in append order.
pub trait HistoryLog<S: LifecycleState>: Send + Sync {
    fn history_for(&self, id: &SubmissionId) -> Result<Vec<HistoryEntry<S>>, RepositoryError>;
}

/// A store able to back the whole admissions service.
pub trait AdmissionsStore<S: LifecycleState>:
    SubmissionRepository<S> + DecisionLog<S> + HistoryLog<S>
{
}

impl<S, T> AdmissionsStore<S> for T
where
    S: LifecycleState,
    T: SubmissionRepository<S> + DecisionLog<S> + HistoryLog<S>,
{
}

/// Error enumeration for repository failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("record changed concurrently (expected version {expected}, found {actual})")]
    VersionConflict { expected: u64, actual: u64 },
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// A submission together with its decisions and audit trail.
#[derive(Debug, Clone, Serialize)]
#[serde(bound = "S: LifecycleState")]
pub struct SubmissionDossier<S: LifecycleState> {
    #[serde(flatten)]
    pub submission: Submission<S>,
    pub decisions: Vec<Decision<S>>,
    pub history: Vec<HistoryEntry<S>>,
}
