// turngate-core/src/runtime/enforcement.rs
// ============================================================================
// Module: Enforcement Bundle Builder
// Description: Merges active memory records and graph-derived policy input
//              into the bundle the validator checks a plan against.
// Purpose: Build enforcement fresh per submission so accumulated learning
//          always reflects the latest state, without the validator knowing
//          where any given rule came from.
// Dependencies: crate::core
// ============================================================================

//! Merges active memory records and graph-derived policy input into the bundle the validator checks a plan against.

use crate::core::DomainAnchor;
use crate::core::EnforcementBundle;
use crate::core::EnforcementRule;
use crate::core::EnforcementType;
use crate::core::MemoryRecord;
use crate::core::MemoryState;
use crate::core::MigrationRule;

/// A policy node surfaced from the knowledge graph, pre-resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphPolicyNode {
    /// The source node id or label this policy came from.
    pub source: String,
    /// A pattern describing which change nodes this policy applies to.
    pub condition: String,
    /// Steps required when the condition matches.
    pub required_steps: Vec<crate::core::RequiredStep>,
    /// Whether the graph grounded this policy in an actual referenced node,
    /// as opposed to a dangling or unresolved reference.
    pub grounded: bool,
}

/// Deny code applied to every rule derived from memory or the knowledge
/// graph. Both enforcement sources share the validator's single policy
/// rejection code; `EnforcementRule::source` distinguishes where a specific
/// violated rule came from.
pub const POLICY_RULE_DENY_CODE: &str = "PLAN_POLICY_VIOLATION";

/// Builds an enforcement bundle from currently active memory, resolved graph
/// policy nodes, and migration rules.
///
/// Only memory records in [`MemoryState::Approved`] or
/// [`MemoryState::Provisional`] whose enforcement type is
/// [`EnforcementType::PlanRule`] contribute a hard rule; other states and
/// types are either informational or not yet trusted enough to block a plan.
/// Ungrounded graph policy nodes are dropped rather than enforced, since an
/// unresolved reference cannot be attributed to a real construct.
#[must_use]
pub fn build_enforcement_bundle(
    memories: &[MemoryRecord],
    graph_policies: &[GraphPolicyNode],
    migration_rules: Vec<MigrationRule>,
) -> EnforcementBundle {
    let mut memory_plan_rules = Vec::new();
    let mut advisory_policies = Vec::new();

    for record in memories {
        match (record.state, record.enforcement_type) {
            (MemoryState::Approved | MemoryState::Provisional, EnforcementType::PlanRule) => {
                if let Some(rule) = &record.plan_rule {
                    memory_plan_rules.push(EnforcementRule {
                        source: record.id.to_string(),
                        condition: rule.condition.clone(),
                        required_steps: rule.required_steps.clone(),
                        deny_code: POLICY_RULE_DENY_CODE.to_owned(),
                    });
                }
            }
            (MemoryState::Approved | MemoryState::Provisional, EnforcementType::Informational) => {
                advisory_policies.push(record.provenance.clone());
            }
            _ => {}
        }
    }

    let graph_policy_rules = graph_policies
        .iter()
        .filter(|policy| policy.grounded)
        .map(|policy| EnforcementRule {
            source: policy.source.clone(),
            condition: policy.condition.clone(),
            required_steps: policy.required_steps.clone(),
            deny_code: POLICY_RULE_DENY_CODE.to_owned(),
        })
        .collect();

    EnforcementBundle {
        memory_plan_rules,
        graph_policy_rules,
        migration_rules,
        advisory_policies,
    }
}

/// Returns strategy-signal feature overrides contributed by active memory.
///
/// Used by the strategy selector to fold memory-derived signals into its
/// context signature before running the priority cascade.
#[must_use]
pub fn active_strategy_overrides(
    memories: &[MemoryRecord],
) -> Vec<std::collections::BTreeMap<String, String>> {
    memories
        .iter()
        .filter(|record| {
            matches!(record.state, MemoryState::Approved | MemoryState::Provisional)
                && record.enforcement_type == EnforcementType::StrategySignal
        })
        .filter_map(|record| record.strategy_signal.as_ref().map(|s| s.feature_overrides.clone()))
        .collect()
}

/// Returns anchors that currently have zero attached active memory.
///
/// Exposed for the memory service's retrospective review: anchors with no
/// memory attached are candidates for seeding a first lesson once friction
/// is observed against them.
#[must_use]
pub fn anchors_without_active_memory<'a>(
    anchors: &'a [DomainAnchor],
    memories: &[MemoryRecord],
) -> Vec<&'a DomainAnchor> {
    anchors
        .iter()
        .filter(|anchor| {
            !memories.iter().any(|record| {
                matches!(record.state, MemoryState::Approved | MemoryState::Provisional)
                    && record.domain_anchor_ids.contains(&anchor.id)
            })
        })
        .collect()
}
