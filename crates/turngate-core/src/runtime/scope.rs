// turngate-core/src/runtime/scope.rs
// ============================================================================
// Module: Scope Service
// Description: Confines file and symbol access to a session's allowlist and
//              worktree root.
// Purpose: Give every path-touching verb a single place to check bounds,
//          rather than re-implementing path containment ad hoc.
// Dependencies: crate::core
// ============================================================================

//! Confines file and symbol access to a session's allowlist and worktree root.

use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use crate::core::RejectionCode;
use crate::core::ScopeAllowlist;

/// Resolves `relative` against `root`, rejecting any path that would escape
/// the root through `..` components or an absolute path.
///
/// This is a lexical check: it does not touch the filesystem, so it works
/// the same whether or not `relative` currently exists.
///
/// # Errors
///
/// Returns [`RejectionCode::PlanScopeViolation`] if the path would escape root.
pub fn resolve_within_root(root: &Path, relative: &str) -> Result<PathBuf, RejectionCode> {
    let candidate = Path::new(relative);
    if candidate.is_absolute() {
        return Err(RejectionCode::PlanScopeViolation);
    }

    let mut resolved = root.to_path_buf();
    for component in candidate.components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(RejectionCode::PlanScopeViolation);
            }
        }
    }
    Ok(resolved)
}

/// Returns true if `file` is present in `allowlist`, or if `allowlist` is
/// `None` (meaning no narrowing has been applied yet).
#[must_use]
pub fn file_in_scope(allowlist: Option<&ScopeAllowlist>, file: &str) -> bool {
    match allowlist {
        None => true,
        Some(list) => list.files.iter().any(|allowed| allowed == file),
    }
}

/// Returns true for a symbol that names one concrete thing: non-empty and
/// free of wildcards.
fn symbol_is_concrete(symbol: &str) -> bool {
    !symbol.is_empty() && !symbol.contains('*')
}

/// Returns true if every symbol in `symbols` is concrete and, when an
/// allowlist is in force, present in it.
///
/// Wildcard (`*`) and empty symbols are rejected unconditionally, allowlist
/// or not: a symbol set that cannot be enumerated cannot be scoped.
#[must_use]
pub fn symbols_in_scope<'a>(
    allowlist: Option<&ScopeAllowlist>,
    symbols: impl IntoIterator<Item = &'a str>,
) -> bool {
    let mut symbols = symbols.into_iter();
    match allowlist {
        None => symbols.all(symbol_is_concrete),
        Some(list) => symbols.all(|symbol| {
            symbol_is_concrete(symbol) && list.symbols.iter().any(|allowed| allowed == symbol)
        }),
    }
}

/// Checks a change node's target file and symbols against the scope allowlist.
///
/// # Errors
///
/// Returns [`RejectionCode::PlanScopeViolation`] when the file or any symbol
/// falls outside the allowlist.
pub fn check_change_scope(
    allowlist: Option<&ScopeAllowlist>,
    target_file: &str,
    target_symbols: &[String],
) -> Result<(), RejectionCode> {
    if !file_in_scope(allowlist, target_file) {
        return Err(RejectionCode::PlanScopeViolation);
    }
    if !symbols_in_scope(allowlist, target_symbols.iter().map(String::as_str)) {
        return Err(RejectionCode::PlanScopeViolation);
    }
    Ok(())
}
