//! @dose
//! purpose: Turns an ordered list of search roots plus a glob pattern into an ordered,
//!     deduplicated list of candidate command module files.
//!
//! when-editing:
//!     - !Root order is priority order: index 0 is the highest-precedence root
//!     - !A canonical file location is emitted at most once, under its first root
//!     - Pattern syntax is globset's with literal_separator, so `*` never crosses `/`
//!
//! invariants:
//!     - Missing roots contribute nothing and produce no failure
//!     - Other filesystem errors become ScanFailure entries and scanning continues
//!     - Matches within a root are ordered by relative path
//!
//! do-not:
//!     - Never read module contents here, loading belongs to the ModuleLoader
//!
//! gotchas:
//!     - Walk depth is bounded by the pattern's segment count unless it contains `**`
//!     - Dangling symlinks surface as NotFound from walkdir and are skipped like missing roots
//!     - The walk is pruned to directories the pattern can reach; errors outside them
//!       (symlink loops under node_modules, unreadable siblings) are never reported
//!     - A leading `./` in the pattern is dropped, walk paths never carry it

use crate::error::{BootstrapError, ScanFailure};
use globset::{GlobBuilder, GlobMatcher};
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Pattern used when the caller does not supply one
pub const DEFAULT_PATTERN: &str = "{src/cli,cli}/*.json";

/// Validated search roots and compiled pattern
#[derive(Debug, Clone)]
pub struct SearchSpec {
    directories: Vec<PathBuf>,
    pattern: String,
    matcher: GlobMatcher,
    reach: PatternReach,
    max_depth: Option<usize>,
}

impl SearchSpec {
    /// Validate the root list and compile the pattern
    pub fn new(directories: Vec<PathBuf>, pattern: &str) -> Result<Self, BootstrapError> {
        if directories.is_empty() {
            return Err(BootstrapError::Configuration(
                "at least one search directory is required".to_string(),
            ));
        }
        if let Some(dir) = directories.iter().find(|d| !d.is_absolute()) {
            return Err(BootstrapError::Configuration(format!(
                "search directory '{}' is not absolute",
                dir.display()
            )));
        }

        let pattern = strip_current_dir(pattern);
        let matcher = compile_pattern(pattern)?;

        Ok(Self {
            directories,
            pattern: pattern.to_string(),
            matcher,
            reach: PatternReach::new(pattern),
            max_depth: pattern_depth(pattern),
        })
    }

    pub fn directories(&self) -> &[PathBuf] {
        &self.directories
    }

    /// The pattern as matched, after normalization
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Whether an error at `path` lies somewhere the pattern can reach
    fn reaches(&self, root: &Path, path: Option<&Path>) -> bool {
        let Some(relative) = path.and_then(|p| p.strip_prefix(root).ok()) else {
            return true;
        };
        self.reach.may_contain(relative) || self.matcher.is_match(relative)
    }
}

/// One pattern segment, after alternation is expanded
#[derive(Debug, Clone)]
enum Segment {
    Glob(GlobMatcher),
    /// `**`: anything below can match
    Recursive,
}

/// Directory prefixes that can lead to a match, one segment list per alternative
#[derive(Debug, Clone)]
struct PatternReach {
    alternatives: Vec<Vec<Segment>>,
}

impl PatternReach {
    fn new(pattern: &str) -> Self {
        let alternatives = expand_alternates(pattern)
            .iter()
            .map(|alternative| {
                alternative
                    .split('/')
                    .filter(|s| !s.is_empty())
                    .map(|segment| {
                        if segment.contains("**") {
                            return Segment::Recursive;
                        }
                        GlobBuilder::new(segment)
                            .literal_separator(true)
                            .build()
                            .map(|glob| Segment::Glob(glob.compile_matcher()))
                            .unwrap_or(Segment::Recursive)
                    })
                    .collect()
            })
            .collect();
        Self { alternatives }
    }

    /// Whether the directory at `relative` can contain a matching file
    fn may_contain(&self, relative: &Path) -> bool {
        let components: Vec<_> = relative.components().collect();
        self.alternatives.iter().any(|segments| {
            for (i, component) in components.iter().enumerate() {
                match segments.get(i) {
                    Some(Segment::Recursive) => return true,
                    Some(Segment::Glob(glob))
                        if i + 1 < segments.len() && glob.is_match(component.as_os_str()) => {}
                    _ => return false,
                }
            }
            true
        })
    }
}

fn strip_current_dir(mut pattern: &str) -> &str {
    while let Some(rest) = pattern.strip_prefix("./") {
        pattern = rest;
    }
    pattern
}

/// A matched module file and the root it was found under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidatePath {
    /// Path as found under its root
    pub path: PathBuf,
    /// Symlink-resolved location used for deduplication
    pub canonical: PathBuf,
    /// Index of the originating root; lower wins
    pub root_index: usize,
}

/// Output of a resolve pass
#[derive(Debug, Default)]
pub struct Resolution {
    pub candidates: Vec<CandidatePath>,
    pub failures: Vec<ScanFailure>,
}

/// Compile a relative glob pattern into a case-sensitive matcher
fn compile_pattern(pattern: &str) -> Result<GlobMatcher, BootstrapError> {
    if pattern.trim().is_empty() {
        return Err(BootstrapError::Configuration(
            "module pattern is empty".to_string(),
        ));
    }
    if pattern.starts_with('/') {
        return Err(BootstrapError::Configuration(format!(
            "module pattern '{}' must be relative to each search directory",
            pattern
        )));
    }

    let glob = GlobBuilder::new(pattern)
        .literal_separator(true)
        .case_insensitive(false)
        .build()
        .map_err(|e| {
            BootstrapError::Configuration(format!("invalid module pattern '{}': {}", pattern, e))
        })?;

    Ok(glob.compile_matcher())
}

/// Resolve every root of `spec`, in order, into candidate module paths
pub fn resolve(spec: &SearchSpec) -> Resolution {
    let mut resolution = Resolution::default();
    let mut seen: HashSet<PathBuf> = HashSet::new();

    for (root_index, root) in spec.directories.iter().enumerate() {
        for path in scan_root(spec, root, root_index, &mut resolution.failures) {
            let canonical = path.canonicalize().unwrap_or_else(|_| path.clone());
            if !seen.insert(canonical.clone()) {
                debug!(path = %path.display(), "skipping module already found under an earlier root");
                continue;
            }
            resolution.candidates.push(CandidatePath {
                path,
                canonical,
                root_index,
            });
        }
    }

    debug!(
        candidates = resolution.candidates.len(),
        failures = resolution.failures.len(),
        pattern = %spec.pattern,
        "resolved command modules"
    );

    resolution
}

fn scan_root(
    spec: &SearchSpec,
    root: &Path,
    root_index: usize,
    failures: &mut Vec<ScanFailure>,
) -> Vec<PathBuf> {
    if let Err(e) = fs::metadata(root) {
        if e.kind() == io::ErrorKind::NotFound {
            debug!(root = %root.display(), "search root does not exist");
            return Vec::new();
        }
    }

    let mut walker = WalkDir::new(root)
        .follow_links(true)
        .min_depth(1)
        .sort_by_file_name();
    if let Some(depth) = spec.max_depth {
        walker = walker.max_depth(depth);
    }

    let walker = walker.into_iter().filter_entry(|entry| {
        !entry.file_type().is_dir()
            || entry
                .path()
                .strip_prefix(root)
                .map(|relative| spec.reach.may_contain(relative))
                .unwrap_or(true)
    });

    let mut matches = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(cause) => {
                if !is_not_found(&cause) && spec.reaches(root, cause.path()) {
                    failures.push(ScanFailure {
                        root: root.to_path_buf(),
                        root_index,
                        cause,
                    });
                }
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        if spec.matcher.is_match(relative) {
            matches.push(relative.to_path_buf());
        }
    }

    matches.sort();
    matches.into_iter().map(|rel| root.join(rel)).collect()
}

fn is_not_found(err: &walkdir::Error) -> bool {
    err.io_error()
        .map(|e| e.kind() == io::ErrorKind::NotFound)
        .unwrap_or(false)
}

/// Deepest directory level the pattern can match, None when unbounded
fn pattern_depth(pattern: &str) -> Option<usize> {
    if pattern.contains("**") {
        return None;
    }
    expand_alternates(pattern)
        .iter()
        .map(|p| p.split('/').filter(|s| !s.is_empty()).count())
        .max()
}

/// Expand `{a,b}` groups into every concrete alternative
fn expand_alternates(pattern: &str) -> Vec<String> {
    let Some(open) = pattern.find('{') else {
        return vec![pattern.to_string()];
    };

    let mut depth = 0;
    let mut close = None;
    let mut commas = Vec::new();
    for (offset, c) in pattern[open..].char_indices() {
        let i = open + offset;
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    close = Some(i);
                    break;
                }
            }
            ',' if depth == 1 => commas.push(i),
            _ => {}
        }
    }
    let Some(close) = close else {
        return vec![pattern.to_string()];
    };

    let prefix = &pattern[..open];
    let suffix = &pattern[close + 1..];
    let mut bounds = vec![open];
    bounds.extend(commas);
    bounds.push(close);

    bounds
        .windows(2)
        .flat_map(|w| {
            let alternative = &pattern[w[0] + 1..w[1]];
            expand_alternates(&format!("{}{}{}", prefix, alternative, suffix))
        })
        .collect()
}
