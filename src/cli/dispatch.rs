//! @dose
//! purpose: Turns the finalized CommandSet into a clap command tree at runtime and runs the
//!     command the user selected.
//!
//! when-editing:
//!     - !Subcommands are built from the CommandSet, nothing is known at compile time
//!     - !--config is global and is merged into the context before the handler runs
//!     - Everything after the command name is passed to the handler verbatim
//!
//! invariants:
//!     - help and --version print and succeed
//!     - No command selected prints the top-level help
//!
//! gotchas:
//!     - clap generates its own `help` subcommand, so a module named help is skipped
//!     - Names and versions are runtime Strings, which needs clap's `string` feature

use crate::config::Config;
use crate::context::AppContext;
use crate::project::AppIdentity;
use crate::registry::CommandSet;
use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{Arg, ArgAction, Command};
use std::path::PathBuf;
use tracing::{debug, warn};

const RESERVED_NAMES: &[&str] = &["help"];

/// Receives the finalized command set and runs the selected command
pub trait Dispatcher {
    fn dispatch(&self, ctx: AppContext, commands: &CommandSet, args: Vec<String>) -> Result<()>;
}

/// Dispatcher backed by a runtime-built clap command
#[derive(Debug, Default, Clone, Copy)]
pub struct ClapDispatcher;

/// Build the clap command tree for the given identity and commands
pub fn build_cli(identity: &AppIdentity, commands: &CommandSet) -> Command {
    let name = identity.name.clone();
    let mut cli = Command::new(name.clone())
        .about(identity.title())
        .override_usage(format!(
            "{name} <command>            - run a command\n       \
             {name} help                 - list all commands\n       \
             {name} help <command>       - display help for a specific command"
        ))
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("file-path")
                .value_parser(clap::value_parser!(PathBuf))
                .action(ArgAction::Set)
                .global(true)
                .help("Load a JSON configuration file (optional)"),
        );
    if !identity.version.is_empty() {
        cli = cli.version(identity.version.clone());
    }

    for def in commands.iter() {
        if RESERVED_NAMES.contains(&def.name.as_str()) {
            warn!(
                "Ignoring command '{}' from {}: the name is reserved",
                def.name,
                def.source_path.display()
            );
            continue;
        }

        let mut sub = Command::new(def.name.clone()).arg(
            Arg::new("args")
                .value_name("ARGS")
                .num_args(0..)
                .trailing_var_arg(true)
                .allow_hyphen_values(true),
        );
        if let Some(description) = &def.description {
            sub = sub.about(description.clone());
        }
        if !def.usage.is_empty() {
            sub = sub.override_usage(def.usage.join("\n       "));
        }
        cli = cli.subcommand(sub);
    }

    cli
}

impl Dispatcher for ClapDispatcher {
    fn dispatch(&self, mut ctx: AppContext, commands: &CommandSet, args: Vec<String>) -> Result<()> {
        let mut cli = build_cli(&ctx.identity, commands);

        let matches = match cli.try_get_matches_from_mut(args) {
            Ok(matches) => matches,
            Err(e) => match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                    e.print()?;
                    return Ok(());
                }
                _ => {
                    e.print()?;
                    anyhow::bail!("invalid command line");
                }
            },
        };

        if let Some(path) = matches.get_one::<PathBuf>("config") {
            anyhow::ensure!(
                path.is_file(),
                "Configuration file {} not found",
                path.display()
            );
            ctx.config.merge(Config::load(path));
        }

        let Some((name, sub_matches)) = matches.subcommand() else {
            cli.print_help()?;
            return Ok(());
        };

        let def = commands
            .get(name)
            .with_context(|| format!("Unknown command '{}'", name))?;
        let args: Vec<String> = sub_matches
            .get_many::<String>("args")
            .map(|values| values.cloned().collect())
            .unwrap_or_default();

        debug!(command = name, source = %def.source_path.display(), "dispatching");
        def.handler
            .run(&ctx, &args)
            .with_context(|| format!("Command '{}' failed", name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::CommandDefinition;
    use crate::registry::CommandRegistry;
    use std::fs;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    type Calls = Arc<Mutex<Vec<(Vec<String>, Option<String>)>>>;

    fn recording_set(calls: &Calls) -> CommandSet {
        let calls = Arc::clone(calls);
        let handler = move |ctx: &AppContext, args: &[String]| -> Result<()> {
            calls.lock().unwrap().push((
                args.to_vec(),
                ctx.config.get_str("env").map(str::to_string),
            ));
            Ok(())
        };
        let mut def = CommandDefinition::new("deploy", Arc::new(handler), "/p/cli/deploy.json", 0);
        def.description = Some("Deploy the app".to_string());

        let failing = |_: &AppContext, _: &[String]| -> Result<()> { anyhow::bail!("boom") };
        let mut registry = CommandRegistry::new();
        registry.register(def).unwrap();
        registry
            .register(CommandDefinition::new("broken", Arc::new(failing), "/p/cli/broken.json", 0))
            .unwrap();
        registry.finalize().unwrap()
    }

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("app")
            .chain(list.iter().copied())
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_build_cli_has_subcommand_per_command() {
        let calls = Calls::default();
        let set = recording_set(&calls);
        let cli = build_cli(&AppIdentity::default(), &set);

        let names: Vec<_> = cli.get_subcommands().map(|c| c.get_name().to_string()).collect();
        assert_eq!(names, vec!["broken", "deploy"]);
        cli.debug_assert();
    }

    #[test]
    fn test_dispatch_passes_arguments_verbatim() {
        let temp_dir = TempDir::new().unwrap();
        let calls = Calls::default();
        let set = recording_set(&calls);

        ClapDispatcher
            .dispatch(
                AppContext::for_tests(temp_dir.path()),
                &set,
                args(&["deploy", "prod", "--force", "-x"]),
            )
            .unwrap();

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, vec!["prod", "--force", "-x"]);
    }

    #[test]
    fn test_dispatch_merges_config_flag() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("override.json");
        fs::write(&config_path, r#"{ "env": "staging" }"#).unwrap();
        let calls = Calls::default();
        let set = recording_set(&calls);

        ClapDispatcher
            .dispatch(
                AppContext::for_tests(temp_dir.path()),
                &set,
                args(&["--config", config_path.to_str().unwrap(), "deploy"]),
            )
            .unwrap();

        assert_eq!(calls.lock().unwrap()[0].1.as_deref(), Some("staging"));
    }

    #[test]
    fn test_dispatch_missing_config_file_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let calls = Calls::default();
        let set = recording_set(&calls);

        let result = ClapDispatcher.dispatch(
            AppContext::for_tests(temp_dir.path()),
            &set,
            args(&["--config", "/definitely/missing.json", "deploy"]),
        );
        assert!(result.is_err());
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_dispatch_handler_error_propagates() {
        let temp_dir = TempDir::new().unwrap();
        let calls = Calls::default();
        let set = recording_set(&calls);

        let err = ClapDispatcher
            .dispatch(AppContext::for_tests(temp_dir.path()), &set, args(&["broken"]))
            .unwrap_err();
        assert!(format!("{:#}", err).contains("boom"));
    }

    #[test]
    fn test_dispatch_unknown_command_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let calls = Calls::default();
        let set = recording_set(&calls);

        let result = ClapDispatcher.dispatch(
            AppContext::for_tests(temp_dir.path()),
            &set,
            args(&["nope"]),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_dispatch_without_command_prints_help() {
        let temp_dir = TempDir::new().unwrap();
        let calls = Calls::default();
        let set = recording_set(&calls);

        ClapDispatcher
            .dispatch(AppContext::for_tests(temp_dir.path()), &set, args(&[]))
            .unwrap();
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_reserved_help_name_is_skipped() {
        let noop = |_: &AppContext, _: &[String]| -> Result<()> { Ok(()) };
        let mut registry = CommandRegistry::new();
        registry
            .register(CommandDefinition::new("help", Arc::new(noop), "/p/cli/help.json", 0))
            .unwrap();
        let set = registry.finalize().unwrap();

        let cli = build_cli(&AppIdentity::default(), &set);
        assert_eq!(cli.get_subcommands().count(), 0);
    }
}
