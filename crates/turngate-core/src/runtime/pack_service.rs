// turngate-core/src/runtime/pack_service.rs
// ============================================================================
// Module: Pack Service
// Description: Grows a session's context pack as read and escalate verbs run.
// Purpose: Keep the pack's contents and hash consistent and monotonically
//          growing, regardless of which verb added evidence.
// Dependencies: crate::core
// ============================================================================

//! Grows a session's context pack as read and escalate verbs run.

use std::collections::BTreeSet;

use crate::core::hashing::DEFAULT_HASH_ALGORITHM;
use crate::core::hashing::hash_canonical_json;
use crate::core::ContextPack;
use crate::core::PackInsufficiency;
use crate::core::PackRef;

/// Creates an empty context pack for a freshly initialized session.
#[must_use]
pub fn new_pack(pack_ref: PackRef) -> ContextPack {
    let mut pack = ContextPack {
        pack_ref,
        hash: crate::core::hashing::hash_bytes(DEFAULT_HASH_ALGORITHM, b""),
        files: BTreeSet::new(),
        symbols: BTreeSet::new(),
        artifact_ids: BTreeSet::new(),
        insufficiency: None,
    };
    recompute_hash(&mut pack);
    pack
}

#[derive(Default, serde::Serialize)]
struct Snapshot<'a> {
    files: Vec<&'a str>,
    symbols: Vec<&'a str>,
    artifact_ids: Vec<&'a str>,
}

fn recompute_hash(pack: &mut ContextPack) {
    let snapshot = Snapshot {
        files: pack.files.iter().map(String::as_str).collect(),
        symbols: pack.symbols.iter().map(String::as_str).collect(),
        artifact_ids: pack.artifact_ids.iter().map(String::as_str).collect(),
    };
    if let Ok(digest) = hash_canonical_json(DEFAULT_HASH_ALGORITHM, &snapshot) {
        pack.hash = digest;
    }
}

/// The result of widening a context pack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackDelta {
    /// Files newly added by this call.
    pub added_files: Vec<String>,
    /// Symbols newly added by this call.
    pub added_symbols: Vec<String>,
    /// Total file count after this call.
    pub total_files: usize,
    /// Whether the pack hash changed as a result of this call.
    pub hash_changed: bool,
}

/// Widens `pack` with newly gathered files and symbols.
///
/// The pack only ever grows: anything already present is left untouched.
pub fn enrich(
    pack: &mut ContextPack,
    new_files: impl IntoIterator<Item = String>,
    new_symbols: impl IntoIterator<Item = String>,
) -> PackDelta {
    let before_hash = pack.hash.clone();
    let mut added_files = Vec::new();
    for file in new_files {
        if pack.files.insert(file.clone()) {
            added_files.push(file);
        }
    }
    let mut added_symbols = Vec::new();
    for symbol in new_symbols {
        if pack.symbols.insert(symbol.clone()) {
            added_symbols.push(symbol);
        }
    }
    recompute_hash(pack);
    PackDelta {
        added_files,
        added_symbols,
        total_files: pack.files.len(),
        hash_changed: pack.hash != before_hash,
    }
}

/// Registers a fetched artifact id into the pack's evidence surface.
pub fn register_artifact(pack: &mut ContextPack, artifact_id: String) {
    pack.artifact_ids.insert(artifact_id);
    recompute_hash(pack);
}

/// Computes the insufficiency, if any, of `pack` against a set of anchor
/// folder paths a plan claims to address.
///
/// An anchor is considered covered if at least one file in the pack falls
/// under its folder path.
#[must_use]
pub fn compute_insufficiency(
    pack: &ContextPack,
    required_anchor_folders: &[String],
) -> Option<PackInsufficiency> {
    let missing: Vec<String> = required_anchor_folders
        .iter()
        .filter(|folder| !pack.files.iter().any(|file| file.starts_with(folder.as_str())))
        .cloned()
        .collect();

    if missing.is_empty() {
        None
    } else {
        Some(PackInsufficiency {
            missing_anchors: missing,
            reason: "plan references anchors with no gathered evidence".to_owned(),
        })
    }
}
