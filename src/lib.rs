//! @dose
//! purpose: Library crate root for launchpad, the bootstrap layer of a command-line
//!     application: identity and config detection, layered command discovery, override
//!     registry, initializer chain and dispatcher handoff.
//!
//! when-editing:
//!     - !All public modules must be declared here with pub mod
//!     - Keep the re-export list organized by module
//!
//! invariants:
//!     - Discovery (resolver -> module -> registry -> bootstrap) has no dependency on cli
//!     - No process-global mutable state; handlers receive an AppContext
//!
//! gotchas:
//!     - main.rs only wires logging and process exit around start()

pub mod bootstrap;
pub mod builtins;
pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod module;
pub mod project;
pub mod registry;
pub mod resolver;
pub mod start;
pub mod update;

// Re-export main types for convenience
pub use bootstrap::{
    run_initializers, BootstrapOptions, BootstrapOutcome, Bootstrapper, InitReport, Initializer,
    Phase, Precedence,
};
pub use cli::{ClapDispatcher, Dispatcher};
pub use config::Config;
pub use context::AppContext;
pub use error::{BootstrapError, LoadCause, LoadFailure, ScanFailure};
pub use module::{
    BuiltinHandlers, CommandDefinition, CommandHandler, CommandManifest, ManifestLoader,
    ModuleLoader,
};
pub use project::{AppIdentity, Project};
pub use registry::{CommandRegistry, CommandSet, Registration};
pub use resolver::{resolve, CandidatePath, Resolution, SearchSpec, DEFAULT_PATTERN};
pub use start::{start, StartOptions};
pub use update::{SkipUpdateCheck, UpdateCheck};
