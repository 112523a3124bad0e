use std::sync::Arc;

use axum::response::Response;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::workflows::admissions::decision::Decision;
use crate::workflows::admissions::domain::{
    CandidateProfile, NewSubmission, Submission, SubmissionFilter, SubmissionId,
};
use crate::workflows::admissions::history::HistoryEntry;
use crate::workflows::admissions::lifecycle::{
    ApplicationStatus, InscriptionStatus, LifecycleState,
};
use crate::workflows::admissions::memory::InMemoryAdmissionsStore;
use crate::workflows::admissions::repository::{
    DecisionLog, HistoryLog, RepositoryError, SubmissionDossier, SubmissionRepository,
    TransitionCommit,
};
use crate::workflows::admissions::service::{AdmissionsService, TransitionRequest};

pub(super) type ApplicationStore = InMemoryAdmissionsStore<ApplicationStatus>;
pub(super) type ApplicationService = AdmissionsService<ApplicationStatus, ApplicationStore>;
pub(super) type InscriptionStore = InMemoryAdmissionsStore<InscriptionStatus>;
pub(super) type InscriptionService = AdmissionsService<InscriptionStatus, InscriptionStore>;

pub(super) fn intake() -> NewSubmission {
    NewSubmission {
        candidate_id: "cand-001".to_string(),
        program_id: 12,
        institution_id: Some("fst-settat".to_string()),
        profile: CandidateProfile {
            full_name: "Salma Benali".to_string(),
            email: "salma.benali@example.org".to_string(),
            phone: Some("+212600112233".to_string()),
            notes: None,
        },
    }
}

pub(super) fn intake_for(candidate_id: &str, program_id: u64) -> NewSubmission {
    let mut intake = intake();
    intake.candidate_id = candidate_id.to_string();
    intake.program_id = program_id;
    intake
}

pub(super) fn application_service() -> (ApplicationService, Arc<ApplicationStore>) {
    let store = Arc::new(ApplicationStore::default());
    (AdmissionsService::standard(store.clone()), store)
}

pub(super) fn inscription_service() -> (InscriptionService, Arc<InscriptionStore>) {
    let store = Arc::new(InscriptionStore::default());
    (AdmissionsService::standard(store.clone()), store)
}

/// Drive a fresh submission along `path`, one registrar transition per step.
pub(super) fn submission_at<S, R>(
    service: &AdmissionsService<S, R>,
    path: &[S],
) -> Submission<S>
where
    S: LifecycleState,
    R: crate::workflows::admissions::repository::AdmissionsStore<S> + 'static,
{
    let mut submission = service.create(intake()).expect("intake is valid");
    for step in path {
        submission = service
            .transition(&submission.id, TransitionRequest::new(*step, "registrar"))
            .expect("path follows the lifecycle table");
    }
    submission
}

/// Store whose backend is down.
pub(super) struct UnavailableStore;

impl<S: LifecycleState> SubmissionRepository<S> for UnavailableStore {
    fn insert(&self, _submission: Submission<S>) -> Result<Submission<S>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &SubmissionId) -> Result<Option<Submission<S>>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn snapshot(
        &self,
        _id: &SubmissionId,
    ) -> Result<Option<SubmissionDossier<S>>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list(&self, _filter: &SubmissionFilter) -> Result<Vec<Submission<S>>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn commit_transition(
        &self,
        _commit: TransitionCommit<S>,
    ) -> Result<Submission<S>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn soft_delete(
        &self,
        _id: &SubmissionId,
        _expected_version: u64,
        _deleted_by: &str,
        _at: DateTime<Utc>,
    ) -> Result<Submission<S>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

impl<S: LifecycleState> DecisionLog<S> for UnavailableStore {
    fn decisions_for(&self, _id: &SubmissionId) -> Result<Vec<Decision<S>>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

impl<S: LifecycleState> HistoryLog<S> for UnavailableStore {
    fn history_for(&self, _id: &SubmissionId) -> Result<Vec<HistoryEntry<S>>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

/// Store that reads fine but whose audit writes fail, so every commit is refused.
#[derive(Default)]
pub(super) struct FailingAuditStore {
    pub(super) inner: ApplicationStore,
}

impl SubmissionRepository<ApplicationStatus> for FailingAuditStore {
    fn insert(
        &self,
        submission: Submission<ApplicationStatus>,
    ) -> Result<Submission<ApplicationStatus>, RepositoryError> {
        self.inner.insert(submission)
    }

    fn fetch(
        &self,
        id: &SubmissionId,
    ) -> Result<Option<Submission<ApplicationStatus>>, RepositoryError> {
        self.inner.fetch(id)
    }

    fn snapshot(
        &self,
        id: &SubmissionId,
    ) -> Result<Option<SubmissionDossier<ApplicationStatus>>, RepositoryError> {
        self.inner.snapshot(id)
    }

    fn list(
        &self,
        filter: &SubmissionFilter,
    ) -> Result<Vec<Submission<ApplicationStatus>>, RepositoryError> {
        self.inner.list(filter)
    }

    fn commit_transition(
        &self,
        _commit: TransitionCommit<ApplicationStatus>,
    ) -> Result<Submission<ApplicationStatus>, RepositoryError> {
        Err(RepositoryError::Unavailable(
            "history table rejected write".to_string(),
        ))
    }

    fn soft_delete(
        &self,
        id: &SubmissionId,
        expected_version: u64,
        deleted_by: &str,
        at: DateTime<Utc>,
    ) -> Result<Submission<ApplicationStatus>, RepositoryError> {
        self.inner.soft_delete(id, expected_version, deleted_by, at)
    }
}

impl DecisionLog<ApplicationStatus> for FailingAuditStore {
    fn decisions_for(
        &self,
        id: &SubmissionId,
    ) -> Result<Vec<Decision<ApplicationStatus>>, RepositoryError> {
        self.inner.decisions_for(id)
    }
}

impl HistoryLog<ApplicationStatus> for FailingAuditStore {
    fn history_for(
        &self,
        id: &SubmissionId,
    ) -> Result<Vec<HistoryEntry<ApplicationStatus>>, RepositoryError> {
        self.inner.history_for(id)
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
