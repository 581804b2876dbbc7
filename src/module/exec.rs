use super::CommandHandler;
use crate::context::AppContext;
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Runs an external program declared by a manifest's `exec` field
#[derive(Debug, Clone)]
pub struct ExecHandler {
    program: PathBuf,
    args: Vec<String>,
    env: BTreeMap<String, String>,
}

impl ExecHandler {
    /// `base_dir` anchors relative programs such as `./deploy.sh`
    pub fn new(
        program: &str,
        args: Vec<String>,
        env: BTreeMap<String, String>,
        base_dir: &Path,
    ) -> Self {
        Self {
            program: resolve_program(program, base_dir),
            args,
            env,
        }
    }
}

impl CommandHandler for ExecHandler {
    fn run(&self, ctx: &AppContext, args: &[String]) -> Result<()> {
        debug!(program = %self.program.display(), "running external command");

        let status = Command::new(&self.program)
            .args(&self.args)
            .args(args)
            .current_dir(&ctx.project_root)
            .envs(ctx.env_vars())
            .envs(&self.env)
            .status()
            .with_context(|| format!("Failed to run {}", self.program.display()))?;

        if !status.success() {
            match status.code() {
                Some(code) => anyhow::bail!("{} exited with status {}", self.program.display(), code),
                None => anyhow::bail!("{} was terminated by a signal", self.program.display()),
            }
        }

        Ok(())
    }
}

/// Bare names go through PATH; relative paths anchor at the manifest directory
fn resolve_program(program: &str, base_dir: &Path) -> PathBuf {
    let path = Path::new(program);
    if path.is_relative() && path.components().count() > 1 {
        base_dir.join(path)
    } else {
        path.to_path_buf()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_program() {
        let base = Path::new("/project/cli");
        assert_eq!(resolve_program("git", base), PathBuf::from("git"));
        assert_eq!(
            resolve_program("./deploy.sh", base),
            PathBuf::from("/project/cli/./deploy.sh")
        );
        assert_eq!(
            resolve_program("scripts/run.sh", base),
            PathBuf::from("/project/cli/scripts/run.sh")
        );
        assert_eq!(resolve_program("/bin/sh", base), PathBuf::from("/bin/sh"));
    }

    #[cfg(unix)]
    #[test]
    fn test_exec_passes_args_and_context_env() {
        let temp_dir = TempDir::new().unwrap();
        let out = temp_dir.path().join("out.txt");
        let handler = ExecHandler::new(
            "sh",
            vec![
                "-c".to_string(),
                "echo \"$LAUNCHPAD_APP_NAME $GREETING $1\" > out.txt".to_string(),
                "sh".to_string(),
            ],
            BTreeMap::from([("GREETING".to_string(), "hello".to_string())]),
            temp_dir.path(),
        );
        let ctx = AppContext::for_tests(temp_dir.path());

        handler.run(&ctx, &["world".to_string()]).unwrap();

        let written = fs::read_to_string(out).unwrap();
        assert_eq!(
            written.trim(),
            format!("{} hello world", env!("CARGO_PKG_NAME"))
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_exec_nonzero_exit_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let handler = ExecHandler::new(
            "sh",
            vec!["-c".to_string(), "exit 3".to_string()],
            BTreeMap::new(),
            temp_dir.path(),
        );
        let ctx = AppContext::for_tests(temp_dir.path());

        let err = handler.run(&ctx, &[]).unwrap_err();
        assert!(err.to_string().contains("exited with status 3"));
    }

    #[test]
    fn test_exec_missing_program_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let handler = ExecHandler::new(
            "./definitely-missing.sh",
            vec![],
            BTreeMap::new(),
            temp_dir.path(),
        );
        let ctx = AppContext::for_tests(temp_dir.path());
        assert!(handler.run(&ctx, &[]).is_err());
    }
}
