use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::lifecycle::LifecycleState;

/// Identifier wrapper for submissions (applications or inscriptions).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionId(pub String);

impl std::fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Contact details captured from the candidate at intake.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateProfile {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Intake payload for a new submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSubmission {
    #[serde(default)]
    pub candidate_id: String,
    #[serde(default)]
    pub program_id: u64,
    /// Owning institution, carried through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub institution_id: Option<String>,
    #[serde(flatten)]
    pub profile: CandidateProfile,
}

impl NewSubmission {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.candidate_id.trim().is_empty() {
            return Err(ValidationError::MissingField {
                field: "candidate_id",
            });
        }
        if self.program_id == 0 {
            return Err(ValidationError::MissingField {
                field: "program_id",
            });
        }
        if self.profile.full_name.trim().is_empty() {
            return Err(ValidationError::MissingField { field: "full_name" });
        }
        let email = self.profile.email.trim();
        if email.is_empty() {
            return Err(ValidationError::MissingField { field: "email" });
        }
        if !plausible_email(email) {
            return Err(ValidationError::InvalidEmail(email.to_string()));
        }
        Ok(())
    }
}

fn plausible_email(raw: &str) -> bool {
    let Some((local, domain)) = raw.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !raw.chars().any(char::is_whitespace)
        && domain
            .split_once('.')
            .map(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
            .unwrap_or(false)
}

/// A candidate's submission and the lifecycle state it currently occupies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "S: LifecycleState")]
pub struct Submission<S: LifecycleState> {
    pub id: SubmissionId,
    pub candidate_id: String,
    pub program_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub institution_id: Option<String>,
    pub state: S,
    #[serde(flatten)]
    pub profile: CandidateProfile,
    /// Bumped on every committed write; compared on save to detect concurrent edits.
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_by: Option<String>,
}

impl<S: LifecycleState> Submission<S> {
    pub(crate) fn draft(
        id: SubmissionId,
        intake: NewSubmission,
        initial: S,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            candidate_id: intake.candidate_id.trim().to_string(),
            program_id: intake.program_id,
            institution_id: intake.institution_id,
            state: initial,
            profile: intake.profile,
            version: 0,
            created_at: now,
            updated_at: now,
            deleted_at: None,
            deleted_by: None,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Listing criteria; unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SubmissionFilter {
    #[serde(default)]
    pub candidate_id: Option<String>,
    #[serde(default)]
    pub program_id: Option<u64>,
}

impl SubmissionFilter {
    pub fn for_candidate(candidate_id: impl Into<String>) -> Self {
        Self {
            candidate_id: Some(candidate_id.into()),
            program_id: None,
        }
    }

    pub fn for_program(program_id: u64) -> Self {
        Self {
            candidate_id: None,
            program_id: Some(program_id),
        }
    }

    pub fn matches<S: LifecycleState>(&self, submission: &Submission<S>) -> bool {
        let candidate = self
            .candidate_id
            .as_deref()
            .map(|id| submission.candidate_id == id)
            .unwrap_or(true);
        let program = self
            .program_id
            .map(|id| submission.program_id == id)
            .unwrap_or(true);
        candidate && program
    }
}

/// Malformed or missing input, reported before any lookup happens.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    MissingField { field: &'static str },
    #[error("'{0}' is not a valid email address")]
    InvalidEmail(String),
    #[error("unknown {lifecycle} state '{value}'")]
    UnknownState {
        lifecycle: &'static str,
        value: String,
    },
    #[error("malformed request body: {0}")]
    MalformedBody(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intake() -> NewSubmission {
        NewSubmission {
            candidate_id: "cand-42".to_string(),
            program_id: 7,
            institution_id: Some("fst".to_string()),
            profile: CandidateProfile {
                full_name: "Amina Idrissi".to_string(),
                email: "amina@example.org".to_string(),
                phone: None,
                notes: None,
            },
        }
    }

    #[test]
    fn validate_accepts_complete_intake() {
        assert_eq!(intake().validate(), Ok(()));
    }

    #[test]
    fn validate_reports_first_missing_field() {
        let mut missing = intake();
        missing.candidate_id = "  ".to_string();
        assert_eq!(
            missing.validate(),
            Err(ValidationError::MissingField {
                field: "candidate_id"
            })
        );

        let mut missing = intake();
        missing.program_id = 0;
        assert_eq!(
            missing.validate(),
            Err(ValidationError::MissingField {
                field: "program_id"
            })
        );
    }

    #[test]
    fn validate_rejects_malformed_email() {
        for raw in ["amina", "amina@", "@example.org", "amina@example", "a b@example.org"] {
            let mut bad = intake();
            bad.profile.email = raw.to_string();
            assert!(
                matches!(bad.validate(), Err(ValidationError::InvalidEmail(_))),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn intake_deserializes_flat_profile_fields() {
        let payload = serde_json::json!({
            "candidate_id": "cand-1",
            "program_id": 3,
            "full_name": "Yassine B",
            "email": "y@example.org",
            "phone": "+212600000000"
        });
        let parsed: NewSubmission = serde_json::from_value(payload).expect("parses");
        assert_eq!(parsed.profile.full_name, "Yassine B");
        assert_eq!(parsed.profile.phone.as_deref(), Some("+212600000000"));
        assert!(parsed.institution_id.is_none());
    }
}
