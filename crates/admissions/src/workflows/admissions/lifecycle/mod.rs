//! Lifecycle vocabularies and the transition tables that govern them.
//!
//! A lifecycle is a closed enumeration of states plus a [`TransitionTable`] describing which
//! moves are legal and which target states call for a recorded decision. Tables are plain
//! values so services can be built against alternative configurations in tests.

mod application;
mod inscription;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::hash::Hash;

use serde::de::DeserializeOwned;
use serde::Serialize;

pub use application::ApplicationStatus;
pub use inscription::InscriptionStatus;

/// A state enumeration that can drive the admissions engine.
pub trait LifecycleState:
    Copy
    + Eq
    + Ord
    + Hash
    + fmt::Debug
    + fmt::Display
    + Serialize
    + DeserializeOwned
    + Send
    + Sync
    + 'static
{
    /// Short name of the lifecycle, used in logs and error payloads.
    const LIFECYCLE: &'static str;

    /// Every member of the enumeration in declaration order.
    fn all() -> &'static [Self];

    /// Wire label of the state.
    fn label(self) -> &'static str;

    /// The table the platform ships with for this vocabulary.
    fn standard_table() -> TransitionTable<Self>;

    /// Match a wire label, ignoring case and surrounding whitespace.
    fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::all()
            .iter()
            .copied()
            .find(|state| state.label().eq_ignore_ascii_case(raw))
    }
}

/// Adjacency map for one lifecycle together with its decision-worthy subset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionTable<S: LifecycleState> {
    initial: S,
    edges: BTreeMap<S, Vec<S>>,
    decision_states: BTreeSet<S>,
}

impl<S: LifecycleState> TransitionTable<S> {
    pub fn new(initial: S) -> Self {
        Self {
            initial,
            edges: BTreeMap::new(),
            decision_states: BTreeSet::new(),
        }
    }

    /// Permit `from` to move to each of `targets`, preserving the given order.
    pub fn allow(mut self, from: S, targets: &[S]) -> Self {
        let entry = self.edges.entry(from).or_default();
        for target in targets {
            if !entry.contains(target) {
                entry.push(*target);
            }
        }
        self
    }

    /// Mark target states whose transitions must be accompanied by a decision record.
    pub fn decision_worthy(mut self, states: &[S]) -> Self {
        self.decision_states.extend(states.iter().copied());
        self
    }

    pub fn initial(&self) -> S {
        self.initial
    }

    pub fn can_transition(&self, current: S, target: S) -> bool {
        self.edges
            .get(&current)
            .map(|allowed| allowed.contains(&target))
            .unwrap_or(false)
    }

    /// Targets reachable in one step from `current`; empty for sinks.
    pub fn allowed_from(&self, current: S) -> &[S] {
        self.edges
            .get(&current)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn requires_decision(&self, target: S) -> bool {
        self.decision_states.contains(&target)
    }

    pub fn is_sink(&self, state: S) -> bool {
        self.allowed_from(state).is_empty()
    }

    pub fn sinks(&self) -> Vec<S> {
        S::all()
            .iter()
            .copied()
            .filter(|state| self.is_sink(*state))
            .collect()
    }

    pub fn describe(&self) -> LifecycleDescription<S> {
        LifecycleDescription {
            lifecycle: S::LIFECYCLE,
            initial: self.initial,
            transitions: self
                .edges
                .iter()
                .map(|(from, allowed)| TransitionRule {
                    from: *from,
                    allowed: allowed.clone(),
                })
                .collect(),
            decision_states: self.decision_states.iter().copied().collect(),
            sinks: self.sinks(),
        }
    }
}

/// Serializable snapshot of a transition table for CLI and HTTP consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(bound = "S: LifecycleState")]
pub struct LifecycleDescription<S: LifecycleState> {
    pub lifecycle: &'static str,
    pub initial: S,
    pub transitions: Vec<TransitionRule<S>>,
    pub decision_states: Vec<S>,
    pub sinks: Vec<S>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(bound = "S: LifecycleState")]
pub struct TransitionRule<S: LifecycleState> {
    pub from: S,
    pub allowed: Vec<S>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walk_is_acyclic<S: LifecycleState>(table: &TransitionTable<S>) -> bool {
        fn visit<S: LifecycleState>(
            table: &TransitionTable<S>,
            state: S,
            path: &mut Vec<S>,
        ) -> bool {
            if path.contains(&state) {
                return false;
            }
            path.push(state);
            let ok = table
                .allowed_from(state)
                .iter()
                .all(|next| visit(table, *next, path));
            path.pop();
            ok
        }
        visit(table, table.initial(), &mut Vec::new())
    }

    #[test]
    fn application_table_matches_generic_lifecycle() {
        let table = ApplicationStatus::standard_table();
        assert_eq!(table.initial(), ApplicationStatus::Draft);
        assert_eq!(
            table.allowed_from(ApplicationStatus::UnderReview),
            &[
                ApplicationStatus::Accepted,
                ApplicationStatus::Rejected,
                ApplicationStatus::Waitlisted
            ]
        );
        assert!(table.can_transition(ApplicationStatus::Waitlisted, ApplicationStatus::Accepted));
        assert!(!table.can_transition(ApplicationStatus::Submitted, ApplicationStatus::Accepted));
        assert_eq!(
            table.sinks(),
            vec![ApplicationStatus::Accepted, ApplicationStatus::Rejected]
        );
        assert!(walk_is_acyclic(&table));
    }

    #[test]
    fn inscription_table_matches_localized_lifecycle() {
        let table = InscriptionStatus::standard_table();
        assert_eq!(table.initial(), InscriptionStatus::Preinscription);
        assert!(table.can_transition(InscriptionStatus::Accepte, InscriptionStatus::Inscrit));
        assert!(!table.can_transition(InscriptionStatus::Refuse, InscriptionStatus::Inscrit));
        assert_eq!(
            table.sinks(),
            vec![InscriptionStatus::Refuse, InscriptionStatus::Inscrit]
        );
        assert!(walk_is_acyclic(&table));
    }

    #[test]
    fn sinks_admit_no_transitions() {
        let table = ApplicationStatus::standard_table();
        for sink in table.sinks() {
            for target in ApplicationStatus::all() {
                assert!(!table.can_transition(sink, *target));
            }
        }
    }

    #[test]
    fn decision_subsets_are_per_lifecycle() {
        let generic = ApplicationStatus::standard_table();
        assert!(!generic.requires_decision(ApplicationStatus::Submitted));
        assert!(generic.requires_decision(ApplicationStatus::UnderReview));
        assert!(generic.requires_decision(ApplicationStatus::Waitlisted));

        let localized = InscriptionStatus::standard_table();
        assert!(!localized.requires_decision(InscriptionStatus::DossierSoumis));
        assert!(localized.requires_decision(InscriptionStatus::EnValidation));
        assert!(localized.requires_decision(InscriptionStatus::Inscrit));
    }

    #[test]
    fn custom_tables_can_be_injected() {
        let table = TransitionTable::new(ApplicationStatus::Draft)
            .allow(ApplicationStatus::Draft, &[ApplicationStatus::Rejected])
            .decision_worthy(&[ApplicationStatus::Rejected]);

        assert!(table.can_transition(ApplicationStatus::Draft, ApplicationStatus::Rejected));
        assert!(!table.can_transition(ApplicationStatus::Draft, ApplicationStatus::Submitted));
        assert!(table.is_sink(ApplicationStatus::Submitted));
    }

    #[test]
    fn parse_accepts_wire_labels_case_insensitively() {
        assert_eq!(
            ApplicationStatus::parse(" under_review "),
            Some(ApplicationStatus::UnderReview)
        );
        assert_eq!(
            InscriptionStatus::parse("DOSSIER_SOUMIS"),
            Some(InscriptionStatus::DossierSoumis)
        );
        assert_eq!(ApplicationStatus::parse("ENROLLED"), None);
    }

    #[test]
    fn description_serializes_with_wire_labels() {
        let description = InscriptionStatus::standard_table().describe();
        let json = serde_json::to_value(&description).expect("serializes");
        assert_eq!(json["lifecycle"], "inscription");
        assert_eq!(json["initial"], "PREINSCRIPTION");
        assert_eq!(json["sinks"], serde_json::json!(["REFUSE", "INSCRIT"]));
    }
}
