// turngate-core/src/core/pack.rs
// ============================================================================
// Module: Context Pack
// Description: The bounded evidence surface an agent may cite from.
// Purpose: Track which files, symbols, and artifacts a session has gathered
//          and let that surface grow monotonically as verbs run.
// Dependencies: serde
// ============================================================================

//! The bounded evidence surface an agent may cite from, tracking files, symbols, and artifacts gathered by a session.

use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;

use crate::core::hashing::HashDigest;
use crate::core::ids::PackRef;

/// Describes a known shortfall in the current context pack.
///
/// Produced by the pack service when a plan submission references anchors or
/// files the pack has not yet gathered evidence for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackInsufficiency {
    /// Anchor folder paths the pack has no evidence for.
    pub missing_anchors: Vec<String>,
    /// Human-readable explanation of what evidence is missing.
    pub reason: String,
}

/// The bounded set of files, symbols, and artifacts a session has gathered.
///
/// A context pack only grows: read verbs add entries, `request_evidence_guidance`
/// widens scope, but nothing already present is ever removed. Its hash is
/// recomputed whenever the contents change so a plan submission can be tied
/// to the exact evidence surface it was built against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextPack {
    /// Opaque reference naming this pack snapshot.
    pub pack_ref: PackRef,
    /// Canonical hash over the sorted contents below.
    pub hash: HashDigest,
    /// File paths, relative to the worktree root, currently in evidence.
    pub files: BTreeSet<String>,
    /// Fully qualified symbol names currently in evidence.
    pub symbols: BTreeSet<String>,
    /// Artifact ids (connector fetches, registered specs) currently in evidence.
    pub artifact_ids: BTreeSet<String>,
    /// Known insufficiency, set by the pack service when a plan references
    /// evidence the pack does not yet contain.
    pub insufficiency: Option<PackInsufficiency>,
}

impl ContextPack {
    /// Returns true if every one of `files` is already present in the pack.
    #[must_use]
    pub fn covers_files<'a>(&self, files: impl IntoIterator<Item = &'a str>) -> bool {
        files.into_iter().all(|file| self.files.contains(file))
    }

    /// Returns the files named that the pack does not yet contain.
    #[must_use]
    pub fn missing_files<'a>(&self, files: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        files
            .into_iter()
            .filter(|file| !self.files.contains(*file))
            .map(ToOwned::to_owned)
            .collect()
    }
}
