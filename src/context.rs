//! Application context handed to every command handler.

use crate::config::Config;
use crate::project::{AppIdentity, Project};
use std::path::PathBuf;

/// Shared, read-only state for command handlers
#[derive(Debug, Clone)]
pub struct AppContext {
    pub identity: AppIdentity,
    pub config: Config,
    /// Project root (`main`)
    pub project_root: PathBuf,
    pub framework_root: PathBuf,
}

impl AppContext {
    pub fn new(project: Project, project_root: PathBuf, framework_root: PathBuf) -> Self {
        Self {
            identity: project.identity,
            config: project.config,
            project_root,
            framework_root,
        }
    }

    /// Environment exported to external command processes
    pub fn env_vars(&self) -> Vec<(&'static str, String)> {
        vec![
            ("LAUNCHPAD_APP_NAME", self.identity.name.clone()),
            ("LAUNCHPAD_APP_VERSION", self.identity.version.clone()),
            (
                "LAUNCHPAD_PROJECT_ROOT",
                self.project_root.to_string_lossy().to_string(),
            ),
            (
                "LAUNCHPAD_FRAMEWORK_ROOT",
                self.framework_root.to_string_lossy().to_string(),
            ),
        ]
    }
}

#[cfg(test)]
impl AppContext {
    pub(crate) fn for_tests(root: &std::path::Path) -> Self {
        Self {
            identity: AppIdentity::default(),
            config: Config::default(),
            project_root: root.to_path_buf(),
            framework_root: root.to_path_buf(),
        }
    }
}
