//! @dose
//! purpose: Defines what a command module is once loaded: a named CommandDefinition wrapping
//!     a CommandHandler, plus the ModuleLoader trait that turns one candidate file into a
//!     definition or a LoadFailure.
//!
//! when-editing:
//!     - !CommandHandler and ModuleLoader must stay Send + Sync, loading may run on rayon
//!     - !A loader reports failures as LoadFailure values, it never panics or aborts the scan
//!     - Builtin handlers are registered by the host before bootstrap
//!
//! invariants:
//!     - source_priority equals the originating root index, lower wins
//!     - A definition's name is never empty and never contains whitespace
//!
//! gotchas:
//!     - Plain closures `Fn(&AppContext, &[String]) -> Result<()>` are CommandHandlers
//!
//! flows:
//!     - resolve() yields CandidatePath -> ModuleLoader::load -> CommandDefinition
//!     - CommandRegistry keeps one definition per name, dispatcher calls handler.run

mod exec;
mod manifest;

pub use exec::ExecHandler;
pub use manifest::{CommandManifest, ManifestLoader};

use crate::context::AppContext;
use crate::error::LoadFailure;
use crate::resolver::CandidatePath;
use anyhow::Result;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Entry point of a command
pub trait CommandHandler: Send + Sync {
    fn run(&self, ctx: &AppContext, args: &[String]) -> Result<()>;
}

impl<F> CommandHandler for F
where
    F: Fn(&AppContext, &[String]) -> Result<()> + Send + Sync,
{
    fn run(&self, ctx: &AppContext, args: &[String]) -> Result<()> {
        self(ctx, args)
    }
}

/// Loads one candidate file into a command definition
pub trait ModuleLoader: Send + Sync {
    fn load(&self, candidate: &CandidatePath) -> Result<CommandDefinition, LoadFailure>;
}

/// A loaded command
#[derive(Clone)]
pub struct CommandDefinition {
    pub name: String,
    pub description: Option<String>,
    pub usage: Vec<String>,
    pub handler: Arc<dyn CommandHandler>,
    pub source_path: PathBuf,
    pub source_priority: usize,
}

impl CommandDefinition {
    pub fn new(
        name: impl Into<String>,
        handler: Arc<dyn CommandHandler>,
        source_path: impl Into<PathBuf>,
        source_priority: usize,
    ) -> Self {
        Self {
            name: name.into(),
            description: None,
            usage: Vec::new(),
            handler,
            source_path: source_path.into(),
            source_priority,
        }
    }

    /// Whether this definition beats `other` for the same name
    pub fn outranks(&self, other: &CommandDefinition) -> bool {
        (self.source_priority, &self.source_path) < (other.source_priority, &other.source_path)
    }
}

impl fmt::Debug for CommandDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDefinition")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("source_path", &self.source_path)
            .field("source_priority", &self.source_priority)
            .finish_non_exhaustive()
    }
}

/// Host-provided native handlers, addressable from manifests by name
#[derive(Clone, Default)]
pub struct BuiltinHandlers {
    handlers: HashMap<String, Arc<dyn CommandHandler>>,
}

impl BuiltinHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, handler: impl CommandHandler + 'static) {
        self.handlers.insert(name.into(), Arc::new(handler));
    }

    pub fn with(mut self, name: impl Into<String>, handler: impl CommandHandler + 'static) -> Self {
        self.register(name, handler);
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn CommandHandler>> {
        self.handlers.get(name).cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for BuiltinHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuiltinHandlers")
            .field("names", &self.names())
            .finish()
    }
}

/// Check a declared or derived command name
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && !name.chars().any(char::is_whitespace)
}
