//! @dose
//! purpose: Name -> CommandDefinition map with precedence-based override. Mutable during
//!     discovery, frozen into a read-only CommandSet by finalize.
//!
//! when-editing:
//!     - !The winner for a name depends only on (source_priority, source_path), never on
//!       registration order
//!     - !register/record_failure/finalize after finalize are InvariantViolation errors
//!
//! invariants:
//!     - At most one definition per name
//!     - CommandSet iteration is sorted by name
//!     - Load failures are kept in the order recorded and outlive finalize
//!
//! do-not:
//!     - Never treat a shadowed duplicate as an error, overriding is the point

use crate::error::{BootstrapError, LoadFailure};
use crate::module::CommandDefinition;
use std::collections::BTreeMap;
use tracing::debug;

/// What happened to a registered definition
#[derive(Debug)]
pub enum Registration {
    /// First definition for this name
    Inserted,
    /// Replaced a lower-precedence definition, which is returned
    Replaced(CommandDefinition),
    /// An existing definition outranks it; the incoming one was discarded
    Shadowed,
}

/// Command registry for the bootstrap phase
#[derive(Debug, Default)]
pub struct CommandRegistry {
    commands: BTreeMap<String, CommandDefinition>,
    failures: Vec<LoadFailure>,
    finalized: bool,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, def: CommandDefinition) -> Result<Registration, BootstrapError> {
        if self.finalized {
            return Err(BootstrapError::InvariantViolation(
                "register called after the registry was finalized",
            ));
        }

        match self.commands.get(&def.name) {
            None => {
                debug!(name = %def.name, source = %def.source_path.display(), "registered command");
                self.commands.insert(def.name.clone(), def);
                Ok(Registration::Inserted)
            }
            Some(existing) if def.outranks(existing) => {
                debug!(
                    name = %def.name,
                    winner = %def.source_path.display(),
                    loser = %existing.source_path.display(),
                    "command overridden by higher-precedence module"
                );
                let previous = self.commands.insert(def.name.clone(), def);
                Ok(previous.map_or(Registration::Inserted, Registration::Replaced))
            }
            Some(existing) => {
                debug!(
                    name = %def.name,
                    winner = %existing.source_path.display(),
                    loser = %def.source_path.display(),
                    "command shadowed by higher-precedence module"
                );
                Ok(Registration::Shadowed)
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&CommandDefinition> {
        self.commands.get(name)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Keep a module that failed to load, so callers can report it after discovery
    pub fn record_failure(&mut self, failure: LoadFailure) -> Result<(), BootstrapError> {
        if self.finalized {
            return Err(BootstrapError::InvariantViolation(
                "record_failure called after the registry was finalized",
            ));
        }
        self.failures.push(failure);
        Ok(())
    }

    pub fn failures(&self) -> &[LoadFailure] {
        &self.failures
    }

    pub fn take_failures(&mut self) -> Vec<LoadFailure> {
        std::mem::take(&mut self.failures)
    }

    /// Freeze the registry and hand out the read-only command set
    pub fn finalize(&mut self) -> Result<CommandSet, BootstrapError> {
        if self.finalized {
            return Err(BootstrapError::InvariantViolation(
                "registry already finalized",
            ));
        }
        self.finalized = true;
        Ok(CommandSet {
            commands: std::mem::take(&mut self.commands),
        })
    }
}

/// Finalized, read-only command set
#[derive(Debug, Clone, Default)]
pub struct CommandSet {
    commands: BTreeMap<String, CommandDefinition>,
}

impl CommandSet {
    pub fn get(&self, name: &str) -> Option<&CommandDefinition> {
        self.commands.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommandDefinition> {
        self.commands.values()
    }
}
