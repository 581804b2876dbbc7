//! @dose
//! purpose: Top-level startup sequence: update check, identity and config, command discovery,
//!     initializers, then handoff to the dispatcher.
//!
//! when-editing:
//!     - !Broken command modules are warnings, never a reason to stop
//!     - !An initializer chain ending in an error stops startup before dispatch
//!     - Every initializer error is logged; only the last one is returned
//!
//! invariants:
//!     - The update check runs once, before discovery, and cannot fail startup
//!     - The dispatcher only ever sees a finalized CommandSet
//!
//! gotchas:
//!     - Without a framework root, identity and config fall back to `main`

use crate::bootstrap::{
    default_framework_root, BootstrapOptions, Bootstrapper, Initializer, Precedence,
};
use crate::builtins::default_builtins;
use crate::cli::Dispatcher;
use crate::context::AppContext;
use crate::module::{BuiltinHandlers, ManifestLoader};
use crate::project::Project;
use crate::resolver::DEFAULT_PATTERN;
use crate::update::{run_update_check, UpdateCheck};
use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use tracing::{debug, error, warn};

/// Caller-facing startup options
pub struct StartOptions {
    /// Project root
    pub main: PathBuf,
    /// Lowest-precedence root with default commands, package.json and config.json
    pub framework_root: Option<PathBuf>,
    /// Extra command roots, highest precedence first
    pub directories: Vec<PathBuf>,
    pub pattern: String,
    pub init_functions: Vec<Initializer>,
    pub builtins: BuiltinHandlers,
    pub precedence: Precedence,
    pub parallel: bool,
}

impl StartOptions {
    /// Defaults rooted at the current directory
    pub fn from_env() -> Result<Self> {
        let main = env::current_dir().context("Failed to get current directory")?;
        Ok(Self::new(main))
    }

    pub fn new(main: impl Into<PathBuf>) -> Self {
        Self {
            main: main.into(),
            framework_root: default_framework_root(),
            directories: Vec::new(),
            pattern: DEFAULT_PATTERN.to_string(),
            init_functions: Vec::new(),
            builtins: default_builtins(),
            precedence: Precedence::default(),
            parallel: false,
        }
    }
}

/// Bootstrap the application and run the command selected by `args`
pub fn start(
    options: StartOptions,
    args: Vec<String>,
    dispatcher: &dyn Dispatcher,
    update_check: &dyn UpdateCheck,
) -> Result<()> {
    let framework_root = options
        .framework_root
        .clone()
        .unwrap_or_else(|| options.main.clone());
    let project = Project::detect(&options.main, &framework_root);

    run_update_check(update_check, &project.identity.name);

    let ctx = AppContext::new(project, options.main.clone(), framework_root);

    let mut bootstrapper = Bootstrapper::new(ManifestLoader::new(options.builtins));
    let outcome = bootstrapper.bootstrap(BootstrapOptions {
        main: options.main,
        directories: options.directories,
        framework_root: options.framework_root,
        pattern: options.pattern,
        init_functions: options.init_functions,
        precedence: options.precedence,
        parallel: options.parallel,
    })?;

    debug!(
        commands = outcome.commands.len(),
        failures = outcome.failures.len(),
        "bootstrap finished"
    );
    if outcome.is_empty() {
        warn!("No commands are available");
    }

    let mut init_errors = outcome.init.into_errors();
    if let Some(terminal) = init_errors.pop() {
        for earlier in &init_errors {
            error!("Initializer error: {:#}", earlier);
        }
        return Err(terminal.context("Initialization failed"));
    }

    dispatcher.dispatch(ctx, &outcome.commands, args)
}
