use std::fmt;

use serde::{Deserialize, Serialize};

use super::{LifecycleState, TransitionTable};

/// Status vocabulary for the French inscription lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InscriptionStatus {
    Preinscription,
    DossierSoumis,
    EnValidation,
    Accepte,
    Refuse,
    Inscrit,
}

impl InscriptionStatus {
    const ALL: [InscriptionStatus; 6] = [
        InscriptionStatus::Preinscription,
        InscriptionStatus::DossierSoumis,
        InscriptionStatus::EnValidation,
        InscriptionStatus::Accepte,
        InscriptionStatus::Refuse,
        InscriptionStatus::Inscrit,
    ];
}

impl LifecycleState for InscriptionStatus {
    const LIFECYCLE: &'static str = "inscription";

    fn all() -> &'static [Self] {
        &Self::ALL
    }

    fn label(self) -> &'static str {
        match self {
            InscriptionStatus::Preinscription => "PREINSCRIPTION",
            InscriptionStatus::DossierSoumis => "DOSSIER_SOUMIS",
            InscriptionStatus::EnValidation => "EN_VALIDATION",
            InscriptionStatus::Accepte => "ACCEPTE",
            InscriptionStatus::Refuse => "REFUSE",
            InscriptionStatus::Inscrit => "INSCRIT",
        }
    }

    fn standard_table() -> TransitionTable<Self> {
        use InscriptionStatus::*;

        TransitionTable::new(Preinscription)
            .allow(Preinscription, &[DossierSoumis])
            .allow(DossierSoumis, &[EnValidation])
            .allow(EnValidation, &[Accepte, Refuse])
            .allow(Accepte, &[Inscrit])
            .decision_worthy(&[EnValidation, Accepte, Refuse, Inscrit])
    }
}

impl fmt::Display for InscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
