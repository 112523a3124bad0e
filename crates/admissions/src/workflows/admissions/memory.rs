use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, Utc};

use super::decision::Decision;
use super::domain::{Submission, SubmissionFilter, SubmissionId};
use super::history::HistoryEntry;
use super::lifecycle::LifecycleState;
use super::repository::{
    DecisionLog, HistoryLog, RepositoryError, SubmissionDossier, SubmissionRepository,
    TransitionCommit,
};

/// Everything stored for one submission, guarded by its own lock.
#[derive(Debug)]
struct Ledger<S: LifecycleState> {
    submission: Submission<S>,
    decisions: Vec<Decision<S>>,
    history: Vec<HistoryEntry<S>>,
}

/// In-process store with one lock per submission.
///
/// The outer map lock is only held to find or add a ledger, so writers on different
/// submissions never wait on each other. A commit holds the ledger lock while it checks the
/// version and writes state, decision and history, which makes the three writes atomic.
#[derive(Debug)]
pub struct InMemoryAdmissionsStore<S: LifecycleState> {
    ledgers: RwLock<HashMap<SubmissionId, Arc<Mutex<Ledger<S>>>>>,
}

impl<S: LifecycleState> Default for InMemoryAdmissionsStore<S> {
    fn default() -> Self {
        Self {
            ledgers: RwLock::new(HashMap::new()),
        }
    }
}

fn poisoned<T>(_: T) -> RepositoryError {
    RepositoryError::Unavailable("store lock poisoned".to_string())
}

impl<S: LifecycleState> InMemoryAdmissionsStore<S> {
    fn ledger(&self, id: &SubmissionId) -> Result<Option<Arc<Mutex<Ledger<S>>>>, RepositoryError> {
        let guard = self.ledgers.read().map_err(poisoned)?;
        Ok(guard.get(id).cloned())
    }

    fn with_ledger<T>(
        &self,
        id: &SubmissionId,
        apply: impl FnOnce(&mut Ledger<S>) -> Result<T, RepositoryError>,
    ) -> Result<T, RepositoryError> {
        let ledger = self.ledger(id)?.ok_or(RepositoryError::NotFound)?;
        let mut guard = ledger.lock().map_err(poisoned)?;
        apply(&mut *guard)
    }
}

fn check_version<S: LifecycleState>(
    ledger: &Ledger<S>,
    expected: u64,
) -> Result<(), RepositoryError> {
    if ledger.submission.is_deleted() {
        return Err(RepositoryError::NotFound);
    }
    if ledger.submission.version != expected {
        return Err(RepositoryError::VersionConflict {
            expected,
            actual: ledger.submission.version,
        });
    }
    Ok(())
}

impl<S: LifecycleState> SubmissionRepository<S> for InMemoryAdmissionsStore<S> {
    fn insert(&self, submission: Submission<S>) -> Result<Submission<S>, RepositoryError> {
        let mut guard = self.ledgers.write().map_err(poisoned)?;
        if guard.contains_key(&submission.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(
            submission.id.clone(),
            Arc::new(Mutex::new(Ledger {
                submission: submission.clone(),
                decisions: Vec::new(),
                history: Vec::new(),
            })),
        );
        Ok(submission)
    }

    fn fetch(&self, id: &SubmissionId) -> Result<Option<Submission<S>>, RepositoryError> {
        match self.ledger(id)? {
            Some(ledger) => {
                let guard = ledger.lock().map_err(poisoned)?;
                Ok(Some(guard.submission.clone()))
            }
            None => Ok(None),
        }
    }

    fn snapshot(
        &self,
        id: &SubmissionId,
    ) -> Result<Option<SubmissionDossier<S>>, RepositoryError> {
        match self.ledger(id)? {
            Some(ledger) => {
                let guard = ledger.lock().map_err(poisoned)?;
                Ok(Some(SubmissionDossier {
                    submission: guard.submission.clone(),
                    decisions: guard.decisions.clone(),
                    history: guard.history.clone(),
                }))
            }
            None => Ok(None),
        }
    }

    fn list(&self, filter: &SubmissionFilter) -> Result<Vec<Submission<S>>, RepositoryError> {
        let ledgers: Vec<_> = {
            let guard = self.ledgers.read().map_err(poisoned)?;
            guard.values().cloned().collect()
        };

        let mut matches = Vec::new();
        for ledger in ledgers {
            let guard = ledger.lock().map_err(poisoned)?;
            if !guard.submission.is_deleted() && filter.matches(&guard.submission) {
                matches.push(guard.submission.clone());
            }
        }
        matches.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(matches)
    }

    fn commit_transition(
        &self,
        commit: TransitionCommit<S>,
    ) -> Result<Submission<S>, RepositoryError> {
        let TransitionCommit {
            mut submission,
            expected_version,
            decision,
            history,
        } = commit;

        self.with_ledger(&submission.id.clone(), move |ledger| {
            check_version(ledger, expected_version)?;
            submission.version = expected_version + 1;
            ledger.submission = submission.clone();
            ledger.decisions.extend(decision);
            ledger.history.push(history);
            Ok(submission)
        })
    }

    fn soft_delete(
        &self,
        id: &SubmissionId,
        expected_version: u64,
        deleted_by: &str,
        at: DateTime<Utc>,
    ) -> Result<Submission<S>, RepositoryError> {
        self.with_ledger(id, |ledger| {
            check_version(ledger, expected_version)?;
            ledger.submission.deleted_at = Some(at);
            ledger.submission.deleted_by = Some(deleted_by.to_string());
            ledger.submission.updated_at = at;
            ledger.submission.version += 1;
            Ok(ledger.submission.clone())
        })
    }
}

impl<S: LifecycleState> DecisionLog<S> for InMemoryAdmissionsStore<S> {
    fn decisions_for(&self, id: &SubmissionId) -> Result<Vec<Decision<S>>, RepositoryError> {
        match self.ledger(id)? {
            Some(ledger) => {
                let guard = ledger.lock().map_err(poisoned)?;
                Ok(guard.decisions.clone())
            }
            None => Ok(Vec::new()),
        }
    }
}

impl<S: LifecycleState> HistoryLog<S> for InMemoryAdmissionsStore<S> {
    fn history_for(&self, id: &SubmissionId) -> Result<Vec<HistoryEntry<S>>, RepositoryError> {
        match self.ledger(id)? {
            Some(ledger) => {
                let guard = ledger.lock().map_err(poisoned)?;
                Ok(guard.history.clone())
            }
            None => Ok(Vec::new()),
        }
    }
}
