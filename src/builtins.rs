//! Native handlers the binary exposes to command manifests via `"builtin": "<name>"`.

use crate::context::AppContext;
use crate::module::BuiltinHandlers;
use anyhow::{Context, Result};
use serde_json::Value;

/// Builtins shipped with launchpad
pub fn default_builtins() -> BuiltinHandlers {
    BuiltinHandlers::new().with("config", config_command)
}

/// `config [list]` prints every top-level key; `config get <key>` prints one value
pub fn config_command(ctx: &AppContext, args: &[String]) -> Result<()> {
    let output = render_config(ctx, args)?;
    if !output.is_empty() {
        println!("{}", output);
    }
    Ok(())
}

fn render_config(ctx: &AppContext, args: &[String]) -> Result<String> {
    match args.first().map(String::as_str) {
        None | Some("list") => Ok(ctx
            .config
            .entries()
            .map(|(key, value)| format!("{} = {}", key, render_value(value)))
            .collect::<Vec<_>>()
            .join("\n")),
        Some("get") => {
            let key = args.get(1).context("Usage: config get <key>")?;
            let value = ctx
                .config
                .get(key)
                .with_context(|| format!("No configuration value for '{}'", key))?;
            Ok(render_value(value))
        }
        Some(other) => anyhow::bail!("Unknown config action '{}' (expected list or get)", other),
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
