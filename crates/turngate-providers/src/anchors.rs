// turngate-providers/src/anchors.rs
// ============================================================================
// Module: Domain Anchor Walk
// Description: Seeds the domain-anchor tree from a workspace folder walk.
// Purpose: Give memories and policies folder-scoped identities to bind to
//          without anyone hand-maintaining the anchor list.
// Dependencies: turngate-core
// ============================================================================

//! ## Overview
//! Walks the workspace to a configured depth, skipping excluded folder
//! names, and emits one [`DomainAnchor`] per directory with `CONTAINS`
//! parentage expressed through `parent_anchor_id`. Forced includes are
//! added even when the walk would not reach them, flagged as explicitly
//! declared rather than auto-seeded.

use std::fs;
use std::path::Path;

use turngate_core::AnchorId;
use turngate_core::DomainAnchor;
use turngate_core::IndexerError;

/// Bounds and filters for the anchor walk.
#[derive(Debug, Clone)]
pub struct AnchorWalk {
    /// Maximum folder depth to descend to; the workspace root is depth zero.
    pub max_depth: u32,
    /// Folder names skipped wherever they appear.
    pub exclude_patterns: Vec<String>,
    /// Folder paths always anchored, even past `max_depth`.
    pub force_include: Vec<String>,
}

/// Builds the anchor id for a folder path.
fn anchor_id(folder_path: &str) -> AnchorId {
    AnchorId::new(format!("anchor:{folder_path}"))
}

/// The last path segment, used as the anchor's display name.
fn leaf_name(folder_path: &str) -> String {
    folder_path.rsplit('/').next().unwrap_or(folder_path).to_owned()
}

/// The parent anchor id for a folder path, if it has a parent segment.
fn parent_id(folder_path: &str) -> Option<AnchorId> {
    folder_path.rsplit_once('/').map(|(parent, _)| anchor_id(parent))
}

/// Recursively walks one directory level, appending anchors.
fn walk_level(
    root: &Path,
    relative: &str,
    depth: u32,
    walk: &AnchorWalk,
    anchors: &mut Vec<DomainAnchor>,
) -> Result<(), IndexerError> {
    if depth > walk.max_depth {
        return Ok(());
    }
    let absolute = if relative.is_empty() { root.to_path_buf() } else { root.join(relative) };
    let entries = fs::read_dir(&absolute)
        .map_err(|err| IndexerError::Unavailable(format!("anchor walk failed at {relative}: {err}")))?;
    let mut names: Vec<String> = entries
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_ok_and(|kind| kind.is_dir()))
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| !walk.exclude_patterns.iter().any(|pattern| pattern == name))
        .collect();
    names.sort_unstable();

    for name in names {
        let folder_path = if relative.is_empty() { name.clone() } else { format!("{relative}/{name}") };
        anchors.push(DomainAnchor {
            id: anchor_id(&folder_path),
            name: name.clone(),
            folder_path: folder_path.clone(),
            depth,
            parent_anchor_id: parent_id(&folder_path),
            auto_seeded: true,
        });
        walk_level(root, &folder_path, depth + 1, walk, anchors)?;
    }
    Ok(())
}

/// Walks `root` and returns the seeded anchor tree in path order.
///
/// # Errors
///
/// Returns [`IndexerError::Unavailable`] when a directory cannot be read.
pub fn seed_anchors(root: &Path, walk: &AnchorWalk) -> Result<Vec<DomainAnchor>, IndexerError> {
    let mut anchors = Vec::new();
    walk_level(root, "", 1, walk, &mut anchors)?;

    for folder_path in &walk.force_include {
        let already = anchors.iter().any(|anchor| &anchor.folder_path == folder_path);
        if already {
            continue;
        }
        let depth = u32::try_from(folder_path.split('/').count())
            .map_err(|_| IndexerError::InvalidQuery("absurd force_include depth".to_owned()))?;
        anchors.push(DomainAnchor {
            id: anchor_id(folder_path),
            name: leaf_name(folder_path),
            folder_path: folder_path.clone(),
            depth,
            parent_anchor_id: parent_id(folder_path),
            auto_seeded: false,
        });
    }
    anchors.sort_by(|a, b| a.folder_path.cmp(&b.folder_path));
    Ok(anchors)
}
