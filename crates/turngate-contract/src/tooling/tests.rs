// turngate-contract/src/tooling/tests.rs
// ============================================================================
// Module: Verb Catalog Unit Tests
// Description: Catalog coverage, ordering, and schema-shape checks.
// Purpose: Catch drift between the published catalog and the core verb set.
// Dependencies: crate::tooling
// ============================================================================

use turngate_core::VerbName;

use super::rejection_catalog;
use super::verb_contracts;

#[test]
fn every_verb_has_exactly_one_catalog_entry_in_stable_order() {
    let contracts = verb_contracts();
    assert_eq!(contracts.len(), VerbName::ALL.len());
    for (contract, verb) in contracts.iter().zip(VerbName::ALL.iter()) {
        assert_eq!(contract.definition.name, *verb);
    }
}

#[test]
fn every_input_schema_is_a_closed_object() {
    for contract in verb_contracts() {
        let schema = &contract.definition.input_schema;
        assert_eq!(schema["type"], "object", "{}", contract.definition.name);
        assert_eq!(schema["additionalProperties"], false, "{}", contract.definition.name);
    }
}

#[test]
fn required_argument_names_appear_in_properties() {
    for contract in verb_contracts() {
        let schema = &contract.definition.input_schema;
        let required = schema["required"].as_array().expect("required array");
        for name in required {
            let name = name.as_str().expect("string name");
            assert!(
                schema["properties"].get(name).is_some(),
                "{} requires `{name}` but does not describe it",
                contract.definition.name
            );
        }
    }
}

#[test]
fn submit_execution_plan_documents_the_full_validation_taxonomy() {
    let contracts = verb_contracts();
    let submit = contracts
        .iter()
        .find(|contract| contract.definition.name == VerbName::SubmitExecutionPlan)
        .expect("submit_execution_plan present");
    for code in ["PLAN_NOT_ATOMIC", "PLAN_EVIDENCE_INSUFFICIENT", "PLAN_MIGRATION_RULE_MISSING"] {
        assert!(submit.rejection_codes.iter().any(|c| c == code), "missing {code}");
    }
}

#[test]
fn the_rejection_catalog_covers_every_code_with_a_remediation() {
    let catalog = rejection_catalog();
    assert_eq!(catalog.len(), turngate_core::RejectionCode::ALL.len());
    for entry in &catalog {
        assert!(!entry.remediation.is_empty(), "{} lacks a remediation", entry.code);
    }
}
