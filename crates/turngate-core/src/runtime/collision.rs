// turngate-core/src/runtime/collision.rs
// ============================================================================
// Module: Collision Guard
// Description: Per-session reservation set preventing overlapping mutation
//              effects and ungated external side effects.
// Purpose: Give mutation handlers a single place to reserve the files,
//          symbols, and graph mutations they are about to touch, so two
//          in-flight operations can never clobber each other.
// Dependencies: crate::core
// ============================================================================

//! Per-session reservation set preventing overlapping mutation effects and ungated external side effects.

use std::collections::BTreeSet;
use std::sync::Mutex;

use crate::core::CommitGateId;
use crate::core::RejectionCode;
use crate::core::RunSessionId;

/// The set of effects a single operation is about to produce.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntendedEffectSet {
    /// File paths the operation will write.
    pub files: BTreeSet<String>,
    /// Symbols the operation will modify.
    pub symbols: BTreeSet<String>,
    /// Knowledge-graph mutation ids the operation will apply.
    pub graph_mutations: BTreeSet<String>,
    /// External side effects, tagged by their commit gate id.
    pub external_side_effects: BTreeSet<CommitGateId>,
}

impl IntendedEffectSet {
    fn overlaps(&self, other: &IntendedEffectSet) -> bool {
        !self.files.is_disjoint(&other.files)
            || !self.symbols.is_disjoint(&other.symbols)
            || !self.graph_mutations.is_disjoint(&other.graph_mutations)
    }
}

/// A held reservation, releasable once its operation completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    session: RunSessionId,
    op: String,
}

/// Tracks in-flight effect reservations across all sessions.
///
/// Each session's reservation list is independent; the guard only compares
/// operations within the same `RunSessionId`, matching the single-writer
/// per-session model the dispatcher already enforces via its session lease.
#[derive(Debug, Default)]
pub struct CollisionGuard {
    in_flight: Mutex<std::collections::BTreeMap<String, Vec<(String, IntendedEffectSet)>>>,
}

impl CollisionGuard {
    /// Creates an empty guard.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves `effects` for `op` within `session`, failing if any external
    /// side effect is ungated or any element overlaps an in-flight operation.
    ///
    /// # Errors
    ///
    /// Returns [`RejectionCode::ExecUngatedSideEffect`] when an external side
    /// effect's commit gate is not in `approved_gates`, or
    /// [`RejectionCode::PlanScopeViolation`] when the requested effects
    /// overlap an operation already holding a reservation in this session.
    pub fn assert_and_reserve(
        &self,
        session: &RunSessionId,
        op: &str,
        effects: IntendedEffectSet,
        approved_gates: &BTreeSet<CommitGateId>,
    ) -> Result<Reservation, RejectionCode> {
        let ungated = effects
            .external_side_effects
            .iter()
            .any(|gate| !approved_gates.contains(gate));
        if ungated {
            return Err(RejectionCode::ExecUngatedSideEffect);
        }

        let mut guard = self.in_flight.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let session_key = session.to_string();
        let held = guard.entry(session_key.clone()).or_default();
        if held.iter().any(|(_, existing)| existing.overlaps(&effects)) {
            return Err(RejectionCode::PlanScopeViolation);
        }
        held.push((op.to_owned(), effects));
        Ok(Reservation {
            session: session.clone(),
            op: op.to_owned(),
        })
    }

    /// Releases a reservation once its operation has completed.
    pub fn release(&self, reservation: &Reservation) {
        let mut guard = self.in_flight.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(held) = guard.get_mut(&reservation.session.to_string()) {
            held.retain(|(op, _)| op != &reservation.op);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn effects(files: &[&str]) -> IntendedEffectSet {
        IntendedEffectSet {
            files: files.iter().map(|f| (*f).to_owned()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn non_overlapping_reservations_both_succeed() {
        let guard = CollisionGuard::new();
        let session = RunSessionId::new("s1");
        let gates = BTreeSet::new();
        assert!(guard.assert_and_reserve(&session, "op1", effects(&["a.rs"]), &gates).is_ok());
        assert!(guard.assert_and_reserve(&session, "op2", effects(&["b.rs"]), &gates).is_ok());
    }

    #[test]
    fn overlapping_files_are_rejected() {
        let guard = CollisionGuard::new();
        let session = RunSessionId::new("s1");
        let gates = BTreeSet::new();
        guard.assert_and_reserve(&session, "op1", effects(&["a.rs"]), &gates).expect("first reserves");
        let result = guard.assert_and_reserve(&session, "op2", effects(&["a.rs"]), &gates);
        assert_eq!(result, Err(RejectionCode::PlanScopeViolation));
    }

    #[test]
    fn release_frees_the_reservation_for_reuse() {
        let guard = CollisionGuard::new();
        let session = RunSessionId::new("s1");
        let gates = BTreeSet::new();
        let reservation =
            guard.assert_and_reserve(&session, "op1", effects(&["a.rs"]), &gates).expect("reserves");
        guard.release(&reservation);
        assert!(guard.assert_and_reserve(&session, "op2", effects(&["a.rs"]), &gates).is_ok());
    }

    #[test]
    fn ungated_external_side_effect_is_rejected() {
        let guard = CollisionGuard::new();
        let session = RunSessionId::new("s1");
        let mut effect_set = IntendedEffectSet::default();
        effect_set.external_side_effects.insert(CommitGateId::new("gate-1"));
        let result = guard.assert_and_reserve(&session, "op1", effect_set, &BTreeSet::new());
        assert_eq!(result, Err(RejectionCode::ExecUngatedSideEffect));
    }

    #[test]
    fn approved_gate_allows_the_side_effect() {
        let guard = CollisionGuard::new();
        let session = RunSessionId::new("s1");
        let mut effect_set = IntendedEffectSet::default();
        effect_set.external_side_effects.insert(CommitGateId::new("gate-1"));
        let mut approved = BTreeSet::new();
        approved.insert(CommitGateId::new("gate-1"));
        assert!(guard.assert_and_reserve(&session, "op1", effect_set, &approved).is_ok());
    }
}
