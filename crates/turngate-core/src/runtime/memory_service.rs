// turngate-core/src/runtime/memory_service.rs
// ============================================================================
// Module: Memory Service
// Description: Creates, promotes, and exports the durable lessons a session
//              accumulates across runs.
// Purpose: Let friction observed in one session change enforcement in future
//          sessions without a code change, via a small explicit state machine.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! Creates, promotes, and exports the durable lessons a session accumulates across runs.

use std::collections::BTreeSet;

use crate::core::AnchorId;
use crate::core::DomainAnchor;
use crate::core::EnforcementType;
use crate::core::FewShotPayload;
use crate::core::MemoryId;
use crate::core::MemoryPhase;
use crate::core::MemoryRecord;
use crate::core::MemoryState;
use crate::core::MemoryTrigger;
use crate::core::StrategyId;
use crate::interfaces::MemoryStore;
use crate::interfaces::SessionStoreError;

/// How long a pending memory sits in its contest window before auto-promotion
/// is considered, in seconds.
pub const CONTEST_WINDOW_SECONDS: i64 = 72 * 3600;
/// How long a provisional memory may remain enforced before it expires absent
/// further confirmation, in seconds.
pub const EXPIRY_WINDOW_SECONDS: i64 = 30 * 24 * 3600;

/// Enforcement types eligible for automatic pending-to-provisional promotion.
pub const AUTO_PROMOTABLE_TYPES: [EnforcementType; 2] =
    [EnforcementType::PlanRule, EnforcementType::StrategySignal];

/// Inputs for creating a memory record from observed rejection friction.
pub struct FrictionInput {
    /// Domain anchors this friction occurred under.
    pub domain_anchor_ids: Vec<AnchorId>,
    /// Rejection codes observed.
    pub rejection_codes: Vec<String>,
    /// The strategy in force when the friction occurred.
    pub origin_strategy_id: Option<StrategyId>,
    /// How the resulting lesson should be enforced.
    pub enforcement_type: EnforcementType,
    /// Free-form note on what was observed.
    pub provenance: String,
}

/// Inputs for creating a memory record from an explicit human override.
pub struct HumanOverrideInput {
    /// Domain anchors this override applies to.
    pub domain_anchor_ids: Vec<AnchorId>,
    /// How the override's lesson should be enforced.
    pub enforcement_type: EnforcementType,
    /// Initial state to place the record in; typically
    /// [`MemoryState::Approved`] since a human made the call directly.
    pub initial_state: MemoryState,
    /// Free-form note on who made the override and why.
    pub provenance: String,
}

fn now_id(prefix: &str, seed: &str) -> MemoryId {
    MemoryId::new(format!("{prefix}-{seed}"))
}

/// Creates a `pending` memory record from observed friction.
#[must_use]
pub fn create_from_friction(input: FrictionInput, now: &str, seed: &str) -> MemoryRecord {
    MemoryRecord {
        id: now_id("friction", seed),
        trigger: MemoryTrigger::RejectionPattern,
        phase: MemoryPhase::Planning,
        domain_anchor_ids: input.domain_anchor_ids,
        rejection_codes: input.rejection_codes,
        origin_strategy_id: input.origin_strategy_id,
        enforcement_type: input.enforcement_type,
        few_shot: None,
        plan_rule: None,
        strategy_signal: None,
        state: MemoryState::Pending,
        created_at: now.to_owned(),
        updated_at: now.to_owned(),
        provenance: input.provenance,
    }
}

/// Creates a memory record from an explicit human override.
#[must_use]
pub fn create_from_human_override(input: HumanOverrideInput, now: &str, seed: &str) -> MemoryRecord {
    MemoryRecord {
        id: now_id("override", seed),
        trigger: MemoryTrigger::HumanOverride,
        phase: MemoryPhase::Planning,
        domain_anchor_ids: input.domain_anchor_ids,
        rejection_codes: Vec::new(),
        origin_strategy_id: None,
        enforcement_type: input.enforcement_type,
        few_shot: None,
        plan_rule: None,
        strategy_signal: None,
        state: input.initial_state,
        created_at: now.to_owned(),
        updated_at: now.to_owned(),
        provenance: input.provenance,
    }
}

/// Returns active (approved or provisional) records attached to any of
/// `anchor_ids`.
#[must_use]
pub fn find_active_for_anchors<'a>(
    memories: &'a [MemoryRecord],
    anchor_ids: &[AnchorId],
) -> Vec<&'a MemoryRecord> {
    let wanted: BTreeSet<&AnchorId> = anchor_ids.iter().collect();
    memories
        .iter()
        .filter(|record| matches!(record.state, MemoryState::Approved | MemoryState::Provisional))
        .filter(|record| record.domain_anchor_ids.iter().any(|id| wanted.contains(id)))
        .collect()
}

/// Transitions a memory record to `next_state`, stamping `updated_at` and
/// appending `reason` to its provenance trail.
pub fn transition(record: &mut MemoryRecord, next_state: MemoryState, reason: &str, now: &str) {
    record.state = next_state;
    record.updated_at = now.to_owned();
    record.provenance = format!("{}; {reason}", record.provenance);
}

fn seconds_between(earlier: &str, later: &str) -> Option<i64> {
    let parse = |s: &str| time::OffsetDateTime::parse(s, &time::format_description::well_known::Rfc3339).ok();
    let earlier = parse(earlier)?;
    let later = parse(later)?;
    Some((later - earlier).whole_seconds())
}

/// Runs the age-based auto-promotion pass: pending records older than the
/// contest window move to provisional if their enforcement type is
/// auto-promotable; provisional records older than the expiry window move
/// to expired.
///
/// Non-fatal by design: a record whose timestamp cannot be parsed is left
/// untouched rather than failing the whole pass.
pub fn run_auto_promotion(memories: &mut [MemoryRecord], now: &str) {
    for record in memories.iter_mut() {
        match record.state {
            MemoryState::Pending => {
                let Some(age) = seconds_between(&record.created_at, now) else { continue };
                if age >= CONTEST_WINDOW_SECONDS && AUTO_PROMOTABLE_TYPES.contains(&record.enforcement_type) {
                    transition(record, MemoryState::Provisional, "auto-promoted after contest window", now);
                }
            }
            MemoryState::Provisional => {
                let Some(age) = seconds_between(&record.updated_at, now) else { continue };
                if age >= EXPIRY_WINDOW_SECONDS {
                    transition(record, MemoryState::Expired, "expired after expiry window with no reconfirmation", now);
                }
            }
            _ => {}
        }
    }
}

/// Generates a `pending` few-shot scaffold from rejected content, leaving
/// `after` and `why_wrong` as explicit TODOs for a human to fill in.
#[must_use]
pub fn scaffold_few_shot(
    rejected_content: &str,
    domain_anchor_ids: Vec<AnchorId>,
    origin_strategy_id: Option<StrategyId>,
    now: &str,
    seed: &str,
) -> MemoryRecord {
    MemoryRecord {
        id: now_id("fewshot", seed),
        trigger: MemoryTrigger::Retrospective,
        phase: MemoryPhase::Retrospective,
        domain_anchor_ids,
        rejection_codes: Vec::new(),
        origin_strategy_id,
        enforcement_type: EnforcementType::FewShot,
        few_shot: Some(FewShotPayload {
            before: rejected_content.to_owned(),
            after: "TODO: fill in the corrected approach".to_owned(),
            why_wrong: "TODO: explain why the rejected approach was wrong".to_owned(),
        }),
        plan_rule: None,
        strategy_signal: None,
        state: MemoryState::Pending,
        created_at: now.to_owned(),
        updated_at: now.to_owned(),
        provenance: "scaffolded from a rejected plan node".to_owned(),
    }
}

/// A graph-seed node exported from an active memory record.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct MemoryGraphSeedNode {
    /// The memory id, used as the node id.
    pub node_id: String,
    /// The enforcement type, carried as a node label.
    pub enforcement_type: EnforcementType,
    /// One `APPLIES_TO` edge target per attached anchor.
    pub applies_to: Vec<String>,
}

/// Exports every active memory as a graph-seed node, ready for graph upsert.
///
/// # Errors
///
/// Returns [`SessionStoreError`] if the store's write fails.
pub fn export_as_graph_seed(
    memories: &[MemoryRecord],
    anchors: &[DomainAnchor],
) -> Result<Vec<MemoryGraphSeedNode>, SessionStoreError> {
    let anchor_names: std::collections::BTreeMap<&AnchorId, &str> =
        anchors.iter().map(|anchor| (&anchor.id, anchor.name.as_str())).collect();

    Ok(memories
        .iter()
        .filter(|record| matches!(record.state, MemoryState::Approved | MemoryState::Provisional))
        .map(|record| MemoryGraphSeedNode {
            node_id: record.id.to_string(),
            enforcement_type: record.enforcement_type,
            applies_to: record
                .domain_anchor_ids
                .iter()
                .filter_map(|id| anchor_names.get(id).map(|name| (*name).to_owned()))
                .collect(),
        })
        .collect())
}

/// Loads every stored memory record via `store`. Thin pass-through kept for
/// symmetry with the other service entry points so callers only depend on
/// this module, not [`MemoryStore`] directly.
///
/// # Errors
///
/// Returns [`SessionStoreError`] when the store read fails.
pub fn load_all(store: &dyn MemoryStore) -> Result<Vec<MemoryRecord>, SessionStoreError> {
    store.load_memories()
}
