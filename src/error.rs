//! @dose
//! purpose: Error taxonomy for the bootstrap phase. Fatal errors (bad configuration shape,
//!     programmer misuse) abort bootstrap; per-module and per-directory problems are plain
//!     values collected alongside a usable registry.
//!
//! when-editing:
//!     - !Only BootstrapError is ever returned as Err from bootstrap/resolve/register
//!     - !LoadFailure and ScanFailure are data, never propagated with ?
//!     - Handler and initializer errors are anyhow::Error, they are caller-defined
//!
//! invariants:
//!     - Every LoadFailure carries the path of the module that failed
//!     - Every ScanFailure carries the search root it was found under
//!
//! gotchas:
//!     - walkdir::Error is not Clone, so neither failure type is Clone

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal bootstrap errors
#[derive(Error, Debug)]
pub enum BootstrapError {
    /// Invalid pattern or directory list shape; raised before any loading
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Caller misuse of the registry or orchestrator
    #[error("invariant violation: {0}")]
    InvariantViolation(&'static str),
}

/// Why a single command module could not be loaded
#[derive(Error, Debug)]
pub enum LoadCause {
    #[error("failed to read module: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed module: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("no command exported")]
    NoCommandExported,
    #[error("module declares both exec and builtin handlers")]
    AmbiguousHandler,
    #[error("unknown builtin handler '{0}'")]
    UnknownBuiltin(String),
    #[error("invalid command name '{0}'")]
    InvalidName(String),
}

/// A module that failed to load; does not affect other modules
#[derive(Debug)]
pub struct LoadFailure {
    pub path: PathBuf,
    pub cause: LoadCause,
}

impl LoadFailure {
    pub fn new(path: impl Into<PathBuf>, cause: impl Into<LoadCause>) -> Self {
        Self {
            path: path.into(),
            cause: cause.into(),
        }
    }
}

impl fmt::Display for LoadFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.cause)
    }
}

/// A filesystem error hit while scanning one search root
#[derive(Debug)]
pub struct ScanFailure {
    /// The search root being scanned
    pub root: PathBuf,
    /// Index of the root in the search order
    pub root_index: usize,
    pub cause: walkdir::Error,
}

impl fmt::Display for ScanFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "while scanning {}: {}", self.root.display(), self.cause)
    }
}
