//! @dose
//! purpose: Works out who the application is. A project root holding a package.json is a
//!     package and supplies its own identity and config.json; otherwise both come from the
//!     framework root.
//!
//! when-editing:
//!     - !Identity and config always come from the same root
//!     - Missing or unreadable manifests fall back to this crate's own identity
//!
//! invariants:
//!     - Project::detect never fails; problems are logged as warnings

use crate::config::Config;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const PACKAGE_MANIFEST: &str = "package.json";
pub const CONFIG_FILE: &str = "config.json";

/// Application name, version and description
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AppIdentity {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub description: String,
}

fn default_name() -> String {
    env!("CARGO_PKG_NAME").to_string()
}

impl Default for AppIdentity {
    fn default() -> Self {
        Self {
            name: default_name(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            description: env!("CARGO_PKG_DESCRIPTION").to_string(),
        }
    }
}

impl AppIdentity {
    /// Banner shown at the top of help output
    pub fn title(&self) -> String {
        format!("{} {}", self.description, self.version)
            .trim()
            .to_string()
    }

    fn load(path: &Path) -> Option<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Failed to read {}: {}", path.display(), e);
                return None;
            }
        };
        match serde_json::from_str(&content) {
            Ok(identity) => Some(identity),
            Err(e) => {
                warn!("Failed to parse {}: {}", path.display(), e);
                None
            }
        }
    }
}

/// Result of project detection
#[derive(Debug, Clone)]
pub struct Project {
    pub identity: AppIdentity,
    pub config: Config,
    /// Root that supplied identity and config
    pub source_root: PathBuf,
    pub is_package: bool,
}

impl Project {
    pub fn detect(main: &Path, framework_root: &Path) -> Self {
        let is_package = is_package(main);
        let source_root = if is_package { main } else { framework_root };
        debug!(root = %source_root.display(), is_package, "loading application identity");

        let manifest = source_root.join(PACKAGE_MANIFEST);
        let identity = if manifest.is_file() {
            AppIdentity::load(&manifest).unwrap_or_default()
        } else {
            AppIdentity::default()
        };

        Self {
            identity,
            config: Config::load(&source_root.join(CONFIG_FILE)),
            source_root: source_root.to_path_buf(),
            is_package,
        }
    }
}

/// Whether `dir` carries its own package manifest
pub fn is_package(dir: &Path) -> bool {
    dir.join(PACKAGE_MANIFEST).is_file()
}
