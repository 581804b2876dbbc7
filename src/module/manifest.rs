//! @dose
//! purpose: The shipped ModuleLoader. A command module is a JSON manifest naming the command
//!     and declaring exactly one handler: an external program (`exec`) or a host builtin.
//!
//! when-editing:
//!     - !Unknown manifest fields are ignored so manifests can carry extra metadata
//!     - !Every failure maps to a LoadCause, never to a panic
//!
//! invariants:
//!     - Name defaults to the file stem (deploy.json -> deploy)
//!     - A manifest without a usable handler fails with "no command exported"
//!
//! gotchas:
//!     - An empty exec array counts as no handler, not as a malformed module

use super::{is_valid_name, BuiltinHandlers, CommandDefinition, CommandHandler, ExecHandler, ModuleLoader};
use crate::error::{LoadCause, LoadFailure};
use crate::resolver::CandidatePath;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// On-disk command manifest
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CommandManifest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub usage: Vec<String>,
    pub exec: Option<Vec<String>>,
    pub builtin: Option<String>,
    pub env: BTreeMap<String, String>,
}

/// Loads JSON command manifests, resolving builtins against a host table
#[derive(Debug, Clone, Default)]
pub struct ManifestLoader {
    builtins: BuiltinHandlers,
}

impl ManifestLoader {
    pub fn new(builtins: BuiltinHandlers) -> Self {
        Self { builtins }
    }

    fn load_manifest(&self, path: &Path, priority: usize) -> Result<CommandDefinition, LoadCause> {
        let content = fs::read_to_string(path)?;
        let manifest: CommandManifest = serde_json::from_str(&content)?;

        let name = match manifest.name {
            Some(name) => name,
            None => file_stem(path),
        };
        if !is_valid_name(&name) {
            return Err(LoadCause::InvalidName(name));
        }

        let base_dir = path.parent().unwrap_or(path);
        let handler = self.handler_for(&manifest.exec, &manifest.builtin, manifest.env, base_dir)?;

        Ok(CommandDefinition {
            name,
            description: manifest.description,
            usage: manifest.usage,
            handler,
            source_path: path.to_path_buf(),
            source_priority: priority,
        })
    }

    fn handler_for(
        &self,
        exec: &Option<Vec<String>>,
        builtin: &Option<String>,
        env: BTreeMap<String, String>,
        base_dir: &Path,
    ) -> Result<Arc<dyn CommandHandler>, LoadCause> {
        let exec = exec.as_deref().filter(|argv| !argv.is_empty());
        match (exec, builtin) {
            (Some(_), Some(_)) => Err(LoadCause::AmbiguousHandler),
            (Some(argv), None) => Ok(Arc::new(ExecHandler::new(
                &argv[0],
                argv[1..].to_vec(),
                env,
                base_dir,
            ))),
            (None, Some(name)) => self
                .builtins
                .get(name)
                .ok_or_else(|| LoadCause::UnknownBuiltin(name.clone())),
            (None, None) => Err(LoadCause::NoCommandExported),
        }
    }
}

impl ModuleLoader for ManifestLoader {
    fn load(&self, candidate: &CandidatePath) -> Result<CommandDefinition, LoadFailure> {
        self.load_manifest(&candidate.path, candidate.root_index)
            .map_err(|cause| LoadFailure::new(&candidate.path, cause))
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}
