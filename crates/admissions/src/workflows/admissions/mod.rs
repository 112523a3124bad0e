//! Admissions lifecycle engine: legal-transition enforcement with coupled decision and audit
//! recording.
//!
//! The same engine drives the generic application vocabulary and the French inscription
//! vocabulary; each is a [`LifecycleState`] enumeration paired with a [`TransitionTable`].

pub mod decision;
pub mod domain;
pub mod history;
pub mod lifecycle;
pub mod memory;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use decision::{Decision, DecisionId, DecisionRecorder};
pub use domain::{
    CandidateProfile, NewSubmission, Submission, SubmissionFilter, SubmissionId, ValidationError,
};
pub use history::{replay, HistoryEntry, HistoryEntryId, HistoryRecorder, TrailError};
pub use lifecycle::{
    ApplicationStatus, InscriptionStatus, LifecycleDescription, LifecycleState, TransitionRule,
    TransitionTable,
};
pub use memory::InMemoryAdmissionsStore;
pub use repository::{
    AdmissionsStore, DecisionLog, HistoryLog, RepositoryError, SubmissionDossier,
    SubmissionRepository, TransitionCommit,
};
pub use router::{admissions_router, DeletePayload, TransitionPayload};
pub use service::{AdmissionsService, ServiceError, TransitionRequest};
