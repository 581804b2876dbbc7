//! @dose
//! purpose: The bootstrap orchestrator. Orders the search roots, resolves candidates, loads
//!     every module, merges them into the registry, runs the initializer chain and finalizes.
//!
//! when-editing:
//!     - !Phases advance Idle -> ResolvingPaths -> LoadingModules -> RunningInitializers -> Finalized
//!     - !Only configuration errors and invariant violations return Err
//!     - !The registry merge is sequential in candidate order even when loading is parallel
//!
//! invariants:
//!     - The framework root is always the lowest-precedence search root
//!     - Every initializer runs, in order, even after an earlier one failed
//!     - No initializer error is dropped; the last one is the terminal error
//!
//! do-not:
//!     - Never abort discovery because a single module failed to load
//!
//! gotchas:
//!     - A bootstrapper that aborted on a configuration error stays in its phase, so a retry
//!       on the same instance is an InvariantViolation
//!
//! flows:
//!     - search_roots() -> SearchSpec -> resolve() -> ModuleLoader::load per candidate
//!     - register successes, registry.record_failure for the rest -> run_initializers -> registry.finalize()

use crate::error::{BootstrapError, LoadFailure, ScanFailure};
use crate::module::{CommandDefinition, ModuleLoader};
use crate::registry::{CommandRegistry, CommandSet};
use crate::resolver::{resolve, CandidatePath, SearchSpec, DEFAULT_PATTERN};
use rayon::prelude::*;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Callback run after discovery; receives the error reported before it, if any
pub type Initializer = Box<dyn FnOnce(Option<&anyhow::Error>) -> anyhow::Result<()>>;

/// Relative order of the project root and caller-supplied directories
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Precedence {
    /// `main` before the extra directories
    #[default]
    ProjectFirst,
    /// Extra directories before `main`
    DirectoriesFirst,
}

/// Bootstrap inputs
pub struct BootstrapOptions {
    /// Project root
    pub main: PathBuf,
    /// Extra search roots, in priority order
    pub directories: Vec<PathBuf>,
    /// Lowest-precedence root supplying default commands
    pub framework_root: Option<PathBuf>,
    pub pattern: String,
    pub init_functions: Vec<Initializer>,
    pub precedence: Precedence,
    /// Load modules on the rayon pool
    pub parallel: bool,
}

impl BootstrapOptions {
    pub fn new(main: impl Into<PathBuf>) -> Self {
        Self {
            main: main.into(),
            directories: Vec::new(),
            framework_root: None,
            pattern: DEFAULT_PATTERN.to_string(),
            init_functions: Vec::new(),
            precedence: Precedence::default(),
            parallel: false,
        }
    }

    /// Search roots in priority order, relative entries anchored at `main`
    pub fn search_roots(&self) -> Vec<PathBuf> {
        let main = self.main.clone();
        let extra = self.directories.iter().map(|d| self.main.join(d));

        let mut roots: Vec<PathBuf> = match self.precedence {
            Precedence::ProjectFirst => std::iter::once(main).chain(extra).collect(),
            Precedence::DirectoriesFirst => extra.chain(std::iter::once(main)).collect(),
        };
        if let Some(framework) = &self.framework_root {
            roots.push(self.main.join(framework));
        }
        roots
    }
}

impl fmt::Debug for BootstrapOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BootstrapOptions")
            .field("main", &self.main)
            .field("directories", &self.directories)
            .field("framework_root", &self.framework_root)
            .field("pattern", &self.pattern)
            .field("init_functions", &self.init_functions.len())
            .field("precedence", &self.precedence)
            .field("parallel", &self.parallel)
            .finish()
    }
}

/// Orchestrator lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    ResolvingPaths,
    LoadingModules,
    RunningInitializers,
    Finalized,
}

/// Errors reported by the initializer chain
#[derive(Debug, Default)]
pub struct InitReport {
    errors: Vec<anyhow::Error>,
}

impl InitReport {
    /// The error that decides the bootstrap outcome
    pub fn terminal_error(&self) -> Option<&anyhow::Error> {
        self.errors.last()
    }

    /// Every reported error, in the order reported
    pub fn errors(&self) -> &[anyhow::Error] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<anyhow::Error> {
        self.errors
    }
}

/// Run initializers in order, threading the latest error through the chain
pub fn run_initializers(init_functions: Vec<Initializer>) -> InitReport {
    let mut report = InitReport::default();
    for (index, init) in init_functions.into_iter().enumerate() {
        if let Err(e) = init(report.terminal_error()) {
            warn!("Initializer {} failed: {:#}", index, e);
            report.errors.push(e);
        }
    }
    report
}

/// Result of a completed bootstrap
#[derive(Debug)]
pub struct BootstrapOutcome {
    pub commands: CommandSet,
    /// Modules that failed to load, in candidate order
    pub failures: Vec<LoadFailure>,
    /// Directory-level scan errors
    pub scan_failures: Vec<ScanFailure>,
    pub init: InitReport,
}

impl BootstrapOutcome {
    /// Terminal initializer error, if the chain ended in one
    pub fn error(&self) -> Option<&anyhow::Error> {
        self.init.terminal_error()
    }

    /// No command could be loaded at all
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Drives discovery and registration exactly once
pub struct Bootstrapper<L: ModuleLoader> {
    loader: L,
    registry: CommandRegistry,
    phase: Phase,
}

impl<L: ModuleLoader> Bootstrapper<L> {
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            registry: CommandRegistry::new(),
            phase: Phase::Idle,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn bootstrap(
        &mut self,
        options: BootstrapOptions,
    ) -> Result<BootstrapOutcome, BootstrapError> {
        if self.phase != Phase::Idle {
            return Err(BootstrapError::InvariantViolation(
                "bootstrap can only run once per orchestrator",
            ));
        }

        self.enter(Phase::ResolvingPaths);
        let spec = SearchSpec::new(options.search_roots(), &options.pattern)?;
        let resolution = resolve(&spec);
        for failure in &resolution.failures {
            warn!("{}", failure);
        }

        self.enter(Phase::LoadingModules);
        let loaded = self.load_all(&resolution.candidates, options.parallel);
        for result in loaded {
            match result {
                Ok(def) => {
                    self.registry.register(def)?;
                }
                Err(failure) => {
                    warn!("Skipping command module {}", failure);
                    self.registry.record_failure(failure)?;
                }
            }
        }
        if self.registry.is_empty() {
            warn!(
                "No command modules matching '{}' could be loaded from {}",
                spec.pattern(),
                describe_roots(spec.directories())
            );
        }

        self.enter(Phase::RunningInitializers);
        let init = run_initializers(options.init_functions);

        let commands = self.registry.finalize()?;
        self.enter(Phase::Finalized);

        Ok(BootstrapOutcome {
            commands,
            failures: self.registry.take_failures(),
            scan_failures: resolution.failures,
            init,
        })
    }

    fn load_all(
        &self,
        candidates: &[CandidatePath],
        parallel: bool,
    ) -> Vec<Result<CommandDefinition, LoadFailure>> {
        if parallel {
            candidates
                .par_iter()
                .map(|candidate| self.loader.load(candidate))
                .collect()
        } else {
            candidates
                .iter()
                .map(|candidate| self.loader.load(candidate))
                .collect()
        }
    }

    fn enter(&mut self, phase: Phase) {
        debug!(from = ?self.phase, to = ?phase, "bootstrap phase");
        self.phase = phase;
    }
}

fn describe_roots(roots: &[PathBuf]) -> String {
    roots
        .iter()
        .map(|r| r.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Default framework root: `$LAUNCHPAD_HOME`, else the executable's directory
pub fn default_framework_root() -> Option<PathBuf> {
    if let Some(home) = std::env::var_os("LAUNCHPAD_HOME") {
        return Some(PathBuf::from(home));
    }
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
}
