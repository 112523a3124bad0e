use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use super::decision::DecisionRecorder;
use super::domain::{NewSubmission, Submission, SubmissionFilter, SubmissionId, ValidationError};
use super::history::{replay, HistoryEntry, HistoryRecorder, TrailError};
use super::lifecycle::{LifecycleDescription, LifecycleState, TransitionTable};
use super::repository::{AdmissionsStore, RepositoryError, SubmissionDossier, TransitionCommit};

/// A requested move for one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionRequest<S: LifecycleState> {
    pub target: S,
    /// Identity already authenticated and authorized by the caller.
    pub actor: String,
    pub comment: Option<String>,
}

impl<S: LifecycleState> TransitionRequest<S> {
    pub fn new(target: S, actor: impl Into<String>) -> Self {
        Self {
            target,
            actor: actor.into(),
            comment: None,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// Service orchestrating lifecycle transitions and their decision and history records.
pub struct AdmissionsService<S: LifecycleState, R> {
    table: Arc<TransitionTable<S>>,
    store: Arc<R>,
    decisions: DecisionRecorder<S>,
    history: HistoryRecorder,
}

static SUBMISSION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_submission_id() -> SubmissionId {
    let id = SUBMISSION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    SubmissionId(format!("sub-{id:06}"))
}

impl<S, R> AdmissionsService<S, R>
where
    S: LifecycleState,
    R: AdmissionsStore<S> + 'static,
{
    pub fn new(store: Arc<R>, table: TransitionTable<S>) -> Self {
        let table = Arc::new(table);
        Self {
            decisions: DecisionRecorder::new(table.clone()),
            history: HistoryRecorder,
            table,
            store,
        }
    }

    /// Service wired to the lifecycle's shipped transition table.
    pub fn standard(store: Arc<R>) -> Self {
        Self::new(store, S::standard_table())
    }

    pub fn table(&self) -> &TransitionTable<S> {
        &self.table
    }

    pub fn describe(&self) -> LifecycleDescription<S> {
        self.table.describe()
    }

    /// Register a new submission in the lifecycle's initial state.
    pub fn create(&self, intake: NewSubmission) -> Result<Submission<S>, ServiceError<S>> {
        intake.validate()?;

        let submission = Submission::draft(
            next_submission_id(),
            intake,
            self.table.initial(),
            Utc::now(),
        );
        let stored = self.store.insert(submission)?;

        info!(
            lifecycle = S::LIFECYCLE,
            submission_id = %stored.id,
            candidate_id = %stored.candidate_id,
            program_id = stored.program_id,
            "submission created"
        );
        Ok(stored)
    }

    /// Fetch a live submission.
    pub fn get(&self, id: &SubmissionId) -> Result<Submission<S>, ServiceError<S>> {
        self.store
            .fetch(id)?
            .filter(|submission| !submission.is_deleted())
            .ok_or_else(|| ServiceError::NotFound(id.clone()))
    }

    /// Submission plus its decisions and audit trail.
    pub fn dossier(&self, id: &SubmissionId) -> Result<SubmissionDossier<S>, ServiceError<S>> {
        self.snapshot(id)?
            .filter(|dossier| !dossier.submission.is_deleted())
            .ok_or_else(|| ServiceError::NotFound(id.clone()))
    }

    fn snapshot(
        &self,
        id: &SubmissionId,
    ) -> Result<Option<SubmissionDossier<S>>, ServiceError<S>> {
        Ok(self.store.snapshot(id)?)
    }

    pub fn list(&self, filter: &SubmissionFilter) -> Result<Vec<Submission<S>>, ServiceError<S>> {
        Ok(self.store.list(filter)?)
    }

    /// Move a submission to `request.target`.
    ///
    /// The new state, the decision (when the target is decision-worthy) and the history entry
    /// are committed together against the version observed at load. A concurrent writer that
    /// committed first turns this call into [`ServiceError::Conflict`] with nothing written.
    pub fn transition(
        &self,
        id: &SubmissionId,
        request: TransitionRequest<S>,
    ) -> Result<Submission<S>, ServiceError<S>> {
        let TransitionRequest {
            target,
            actor,
            comment,
        } = request;
        let actor = actor.trim();
        if actor.is_empty() {
            return Err(ValidationError::MissingField { field: "actor" }.into());
        }

        let current = self.get(id)?;
        let prior = current.state;

        if !self.table.can_transition(prior, target) {
            let allowed = self.table.allowed_from(prior).to_vec();
            warn!(
                lifecycle = S::LIFECYCLE,
                submission_id = %id,
                current_state = %prior,
                target_state = %target,
                actor,
                "transition rejected"
            );
            return Err(ServiceError::InvalidTransition {
                current: prior,
                target,
                allowed,
            });
        }

        let now = Utc::now();
        let expected_version = current.version;
        let mut updated = current;
        updated.state = target;
        updated.updated_at = now;

        let commit = TransitionCommit {
            decision: self
                .decisions
                .record(id, target, actor, comment.as_deref(), now),
            history: self.history.record(id, prior, target, actor, now),
            submission: updated,
            expected_version,
        };
        let recorded_decision = commit.decision.is_some();

        let committed = self
            .store
            .commit_transition(commit)
            .map_err(|err| self.commit_error(id, err))?;

        info!(
            lifecycle = S::LIFECYCLE,
            submission_id = %id,
            old_state = %prior,
            new_state = %target,
            actor,
            decision = recorded_decision,
            version = committed.version,
            "transition committed"
        );
        Ok(committed)
    }

    /// Soft-delete a submission. Its decisions and history stay readable.
    pub fn delete(&self, id: &SubmissionId, actor: &str) -> Result<Submission<S>, ServiceError<S>> {
        let actor = actor.trim();
        if actor.is_empty() {
            return Err(ValidationError::MissingField { field: "actor" }.into());
        }

        let current = self.get(id)?;
        let deleted = self
            .store
            .soft_delete(id, current.version, actor, Utc::now())
            .map_err(|err| self.commit_error(id, err))?;

        info!(
            lifecycle = S::LIFECYCLE,
            submission_id = %id,
            actor,
            "submission soft-deleted"
        );
        Ok(deleted)
    }

    /// The audit trail, retained even after the submission is soft-deleted.
    pub fn audit_trail(&self, id: &SubmissionId) -> Result<Vec<HistoryEntry<S>>, ServiceError<S>> {
        self.snapshot(id)?
            .map(|dossier| dossier.history)
            .ok_or_else(|| ServiceError::NotFound(id.clone()))
    }

    /// Replay the audit trail through the table and check it lands on the persisted state.
    pub fn verify_trail(&self, id: &SubmissionId) -> Result<S, ServiceError<S>> {
        self.verified_trail(id).map(|(_, replayed)| replayed)
    }

    /// The audit trail together with the state it replays to, both read from one commit.
    pub fn verified_trail(
        &self,
        id: &SubmissionId,
    ) -> Result<(Vec<HistoryEntry<S>>, S), ServiceError<S>> {
        let SubmissionDossier {
            submission,
            history,
            ..
        } = self
            .snapshot(id)?
            .ok_or_else(|| ServiceError::NotFound(id.clone()))?;
        let replayed = replay(&*self.table, &history)?;

        if replayed != submission.state {
            return Err(TrailError::Diverged {
                replayed,
                persisted: submission.state,
            }
            .into());
        }
        Ok((history, replayed))
    }

    fn commit_error(&self, id: &SubmissionId, err: RepositoryError) -> ServiceError<S> {
        match err {
            RepositoryError::NotFound => ServiceError::NotFound(id.clone()),
            RepositoryError::VersionConflict { expected, actual } => {
                warn!(
                    lifecycle = S::LIFECYCLE,
                    submission_id = %id,
                    expected,
                    actual,
                    "concurrent modification detected"
                );
                ServiceError::Conflict { id: id.clone() }
            }
            other => ServiceError::Persistence(other),
        }
    }
}

/// Error raised by the admissions service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError<S: LifecycleState> {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("submission {0} not found")]
    NotFound(SubmissionId),
    #[error("invalid status transition from {current} to {target}")]
    InvalidTransition {
        current: S,
        target: S,
        allowed: Vec<S>,
    },
    #[error("submission {id} was modified concurrently; reload and retry")]
    Conflict { id: SubmissionId },
    #[error(transparent)]
    Trail(#[from] TrailError<S>),
    #[error(transparent)]
    Persistence(#[from] RepositoryError),
}
