use crate::infra::{application_service, inscription_service};
use admissions::config::LifecycleKind;
use admissions::error::AppError;
use admissions::workflows::admissions::{
    AdmissionsService, AdmissionsStore, ApplicationStatus, CandidateProfile, InscriptionStatus,
    LifecycleState, NewSubmission, ServiceError, TransitionRequest,
};
use clap::Args;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Restrict the demo to one lifecycle (`application` or `inscription`).
    #[arg(long)]
    pub(crate) lifecycle: Option<String>,
    /// Print the final dossier of each walked submission as JSON.
    #[arg(long)]
    pub(crate) show_dossier: bool,
}

/// One actor's attempted move in a demo script.
struct Step<S> {
    actor: &'static str,
    target: S,
    comment: Option<&'static str>,
}

fn step<S>(actor: &'static str, target: S) -> Step<S> {
    Step {
        actor,
        target,
        comment: None,
    }
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        lifecycle,
        show_dossier,
    } = args;

    let kinds = match lifecycle {
        Some(raw) => vec![LifecycleKind::parse(&raw)?],
        None => LifecycleKind::ALL.to_vec(),
    };

    println!("Admissions lifecycle demo");
    for kind in kinds {
        match kind {
            LifecycleKind::Application => application_demo(show_dossier)?,
            LifecycleKind::Inscription => inscription_demo(show_dossier)?,
        }
    }
    Ok(())
}

fn application_demo(show_dossier: bool) -> Result<(), AppError> {
    let service = application_service();
    println!("\nApplication lifecycle ({})", ApplicationStatus::LIFECYCLE);

    walk(
        &service,
        demo_intake("cand-alice", "Alice Martin"),
        &[
            step("alice", ApplicationStatus::Submitted),
            step("bob", ApplicationStatus::Accepted),
        ],
        show_dossier,
    )?;

    walk(
        &service,
        demo_intake("cand-carol", "Carol Haddad"),
        &[
            step("carol", ApplicationStatus::Submitted),
            step("registrar", ApplicationStatus::UnderReview),
            Step {
                actor: "committee",
                target: ApplicationStatus::Accepted,
                comment: Some("strong profile"),
            },
        ],
        show_dossier,
    )
}

fn inscription_demo(show_dossier: bool) -> Result<(), AppError> {
    let service = inscription_service();
    println!("\nInscription lifecycle ({})", InscriptionStatus::LIFECYCLE);

    walk(
        &service,
        demo_intake("cand-nadia", "Nadia El Idrissi"),
        &[
            step("nadia", InscriptionStatus::DossierSoumis),
            step("scolarite", InscriptionStatus::EnValidation),
            step("jury", InscriptionStatus::Accepte),
            step("scolarite", InscriptionStatus::Inscrit),
        ],
        show_dossier,
    )?;

    walk(
        &service,
        demo_intake("cand-omar", "Omar Tazi"),
        &[
            step("omar", InscriptionStatus::DossierSoumis),
            step("scolarite", InscriptionStatus::EnValidation),
            Step {
                actor: "jury",
                target: InscriptionStatus::Refuse,
                comment: Some("prerequisites missing"),
            },
            step("scolarite", InscriptionStatus::Inscrit),
        ],
        show_dossier,
    )
}

/// Create a submission and attempt each step, reporting outcomes. Rejected moves are printed,
/// not propagated, so the demo shows the engine refusing illegal transitions.
fn walk<S, R>(
    service: &AdmissionsService<S, R>,
    intake: NewSubmission,
    steps: &[Step<S>],
    show_dossier: bool,
) -> Result<(), AppError>
where
    S: LifecycleState,
    R: AdmissionsStore<S> + 'static,
{
    let submission = match service.create(intake) {
        Ok(submission) => submission,
        Err(err) => {
            println!("  Intake rejected: {}", err);
            return Ok(());
        }
    };
    println!(
        "- {} ({}) created in {}",
        submission.id, submission.profile.full_name, submission.state
    );

    for Step {
        actor,
        target,
        comment,
    } in steps
    {
        let mut request = TransitionRequest::new(*target, *actor);
        if let Some(comment) = comment {
            request = request.with_comment(*comment);
        }
        match service.transition(&submission.id, request) {
            Ok(updated) => {
                let decision = if service.table().requires_decision(*target) {
                    " [decision recorded]"
                } else {
                    ""
                };
                println!(
                    "  {} moved it to {} (version {}){}",
                    actor, updated.state, updated.version, decision
                );
            }
            Err(ServiceError::InvalidTransition {
                current, allowed, ..
            }) => {
                let allowed = allowed
                    .iter()
                    .map(|state| state.label())
                    .collect::<Vec<_>>();
                println!(
                    "  {} tried {} from {}: refused (allowed: {})",
                    actor,
                    target,
                    current,
                    if allowed.is_empty() {
                        "none, terminal state".to_string()
                    } else {
                        allowed.join(", ")
                    }
                );
            }
            Err(err) => println!("  {} tried {}: {}", actor, target, err),
        }
    }

    match service.verify_trail(&submission.id) {
        Ok(state) => println!("  Audit trail replays to {}", state),
        Err(err) => println!("  Audit trail inconsistent: {}", err),
    }

    if show_dossier {
        match service.dossier(&submission.id) {
            Ok(dossier) => println!("{}", serde_json::to_string_pretty(&dossier)?),
            Err(err) => println!("  Dossier unavailable: {}", err),
        }
    }
    Ok(())
}

fn demo_intake(candidate_id: &str, full_name: &str) -> NewSubmission {
    let email = format!(
        "{}@example.org",
        full_name.to_ascii_lowercase().replace(' ', ".")
    );
    NewSubmission {
        candidate_id: candidate_id.to_string(),
        program_id: 7,
        institution_id: Some("fst-settat".to_string()),
        profile: CandidateProfile {
            full_name: full_name.to_string(),
            email,
            phone: None,
            notes: None,
        },
    }
}
