// turngate-providers/src/indexer.rs
// ============================================================================
// Module: Walking Indexer
// Description: In-memory Indexer over a workspace directory tree.
// Purpose: Give a session a zero-config source of read-verb evidence without
//          a language server or external index.
// Dependencies: turngate-core
// ============================================================================

//! ## Overview
//! [`WalkingIndexer`] snapshots a directory tree into memory once, at
//! construction or on an explicit [`WalkingIndexer::refresh`] call, and
//! answers every [`Indexer`] query against that snapshot. It never touches
//! the filesystem mid-query, so a session's view of the tree is stable for
//! the snapshot's lifetime even if files change underneath it.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;

use turngate_core::Indexer;
use turngate_core::IndexerError;
use turngate_core::SymbolMatch;
use turngate_core::TextHit;

/// Keywords that mark a line as a plausible definition site rather than a
/// mere reference. Deliberately broad: better to over-match a symbol search
/// than to miss the one definition an agent is looking for.
const DEFINITION_KEYWORDS: [&str; 10] =
    ["fn ", "struct ", "enum ", "trait ", "impl ", "class ", "interface ", "const ", "type ", "def "];

/// Maximum size, in bytes, of a single file this indexer will snapshot.
/// Larger files are skipped rather than truncated, so a search never
/// returns a half-indexed file without saying so.
const MAX_FILE_BYTES: u64 = 2 * 1024 * 1024;

/// An in-memory Indexer that walks a workspace root into a path-to-contents
/// snapshot and answers queries against it.
///
/// # Invariants
/// - `root` is canonicalized at construction; every returned path is
///   relative to it with forward-slash separators.
/// - `exclude_globs` are checked against path components, not just file
///   names, so `target/*` also excludes `crate/target/debug/foo`.
pub struct WalkingIndexer {
    root: PathBuf,
    exclude_globs: Vec<String>,
    snapshot: Mutex<BTreeMap<String, String>>,
}

impl WalkingIndexer {
    /// Builds a new indexer rooted at `root`, excluding paths matched by
    /// `exclude_globs`, and takes an initial snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`IndexerError::Unavailable`] when `root` does not exist, is
    /// not a directory, or the initial walk fails.
    pub fn new(root: &Path, exclude_globs: Vec<String>) -> Result<Self, IndexerError> {
        let root = root
            .canonicalize()
            .map_err(|err| IndexerError::Unavailable(format!("cannot resolve root: {err}")))?;
        if !root.is_dir() {
            return Err(IndexerError::Unavailable("root is not a directory".to_owned()));
        }
        let indexer = Self {
            root,
            exclude_globs,
            snapshot: Mutex::new(BTreeMap::new()),
        };
        indexer.refresh()?;
        Ok(indexer)
    }

    /// Re-walks the root and replaces the snapshot. Call after a batch of
    /// writes (e.g. `write_scratch_file`, `apply_code_patch`) to make new
    /// content visible to read verbs.
    ///
    /// # Errors
    ///
    /// Returns [`IndexerError::Unavailable`] when the walk fails.
    pub fn refresh(&self) -> Result<(), IndexerError> {
        let mut files = BTreeMap::new();
        walk(&self.root, &self.root, &self.exclude_globs, &mut files)?;
        let Ok(mut snapshot) = self.snapshot.lock() else {
            return Err(IndexerError::Unavailable("snapshot lock poisoned".to_owned()));
        };
        *snapshot = files;
        Ok(())
    }

    fn snapshot(&self) -> Result<BTreeMap<String, String>, IndexerError> {
        self.snapshot
            .lock()
            .map(|guard| guard.clone())
            .map_err(|_| IndexerError::Unavailable("snapshot lock poisoned".to_owned()))
    }
}

fn walk(
    root: &Path,
    dir: &Path,
    exclude_globs: &[String],
    out: &mut BTreeMap<String, String>,
) -> Result<(), IndexerError> {
    let entries = fs::read_dir(dir)
        .map_err(|err| IndexerError::Unavailable(format!("cannot read {}: {err}", dir.display())))?;
    for entry in entries {
        let entry =
            entry.map_err(|err| IndexerError::Unavailable(format!("directory entry error: {err}")))?;
        let path = entry.path();
        let Ok(relative) = path.strip_prefix(root) else {
            continue;
        };
        let relative = to_posix(relative);
        if is_excluded(&relative, exclude_globs) {
            continue;
        }
        let file_type =
            entry.file_type().map_err(|err| IndexerError::Unavailable(format!("stat failed: {err}")))?;
        if file_type.is_dir() {
            walk(root, &path, exclude_globs, out)?;
        } else if file_type.is_file() {
            let Ok(metadata) = entry.metadata() else {
                continue;
            };
            if metadata.len() > MAX_FILE_BYTES {
                continue;
            }
            if let Ok(contents) = fs::read_to_string(&path) {
                out.insert(relative, contents);
            }
        }
    }
    Ok(())
}

fn to_posix(path: &Path) -> String {
    path.components()
        .map(|component| component.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Matches a relative path against glob-like exclude patterns. Supports a
/// leading `*.` extension glob, a trailing `/*` directory-prefix glob, and
/// exact path-component matches; anything more exotic is treated literally.
fn is_excluded(relative: &str, exclude_globs: &[String]) -> bool {
    let components: Vec<&str> = relative.split('/').collect();
    exclude_globs.iter().any(|glob| {
        if let Some(extension) = glob.strip_prefix("*.") {
            return relative.ends_with(&format!(".{extension}"));
        }
        if let Some(prefix) = glob.strip_suffix("/*") {
            return components.first().copied() == Some(prefix);
        }
        components.contains(&glob.as_str())
    })
}

impl Indexer for WalkingIndexer {
    fn search_symbol(&self, query: &str, limit: usize) -> Result<Vec<SymbolMatch>, IndexerError> {
        let snapshot = self.snapshot()?;
        let mut matches = Vec::new();
        for (file, contents) in &snapshot {
            if matches.len() >= limit {
                break;
            }
            for (line_number, line) in contents.lines().enumerate() {
                if matches.len() >= limit {
                    break;
                }
                let trimmed = line.trim_start();
                let looks_like_definition = DEFINITION_KEYWORDS
                    .iter()
                    .any(|&keyword| trimmed.starts_with(keyword) || trimmed.starts_with(&format!("pub {keyword}")));
                if looks_like_definition && line.contains(query) {
                    let Ok(line_number) = u32::try_from(line_number + 1) else {
                        continue;
                    };
                    matches.push(SymbolMatch {
                        symbol: query.to_owned(),
                        file: file.clone(),
                        line: line_number,
                        snippet: trimmed.to_owned(),
                    });
                }
            }
        }
        Ok(matches)
    }

    fn search_lexical(&self, query: &str, limit: usize) -> Result<Vec<TextHit>, IndexerError> {
        if query.is_empty() {
            return Err(IndexerError::InvalidQuery("lexical query must not be empty".to_owned()));
        }
        let snapshot = self.snapshot()?;
        let mut hits = Vec::new();
        for (file, contents) in &snapshot {
            if hits.len() >= limit {
                break;
            }
            for (line_number, line) in contents.lines().enumerate() {
                if hits.len() >= limit {
                    break;
                }
                if line.contains(query) {
                    let Ok(line_number) = u32::try_from(line_number + 1) else {
                        continue;
                    };
                    hits.push(TextHit {
                        file: file.clone(),
                        line: line_number,
                        text: line.to_owned(),
                    });
                }
            }
        }
        Ok(hits)
    }

    fn list_indexed_files(&self) -> Result<Vec<String>, IndexerError> {
        Ok(self.snapshot()?.into_keys().collect())
    }

    fn list_directory(&self, path: &str) -> Result<Vec<String>, IndexerError> {
        let prefix = path.trim_matches('/');
        let snapshot = self.snapshot()?;
        let mut seen = std::collections::BTreeSet::new();
        for file in snapshot.keys() {
            let Some(rest) = (if prefix.is_empty() {
                Some(file.as_str())
            } else {
                file.strip_prefix(prefix).and_then(|rest| rest.strip_prefix('/'))
            }) else {
                continue;
            };
            let entry = rest.split('/').next().unwrap_or(rest);
            if !entry.is_empty() {
                seen.insert(entry.to_owned());
            }
        }
        Ok(seen.into_iter().collect())
    }

    fn read_lines(&self, file: &str, start: u32, end: u32) -> Result<Vec<String>, IndexerError> {
        if start == 0 || start > end {
            return Err(IndexerError::InvalidQuery("line range must be non-empty and one-based".to_owned()));
        }
        let snapshot = self.snapshot()?;
        let contents = snapshot
            .get(file)
            .ok_or_else(|| IndexerError::InvalidQuery(format!("file not indexed: {file}")))?;
        let start_index = usize::try_from(start - 1).unwrap_or(usize::MAX);
        let end_index = usize::try_from(end).unwrap_or(usize::MAX);
        Ok(contents.lines().skip(start_index).take(end_index.saturating_sub(start_index)).map(str::to_owned).collect())
    }
}
