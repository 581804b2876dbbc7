//! @dose
//! purpose: Key/value application configuration loaded from JSON files (config.json in the
//!     project or framework root, plus any file given with --config).
//!
//! when-editing:
//!     - !Config is loaded once at startup and carried inside AppContext
//!     - !Keys are `:`-separated paths into nested objects (db:host)
//!     - Loading never fails bootstrap: unreadable or invalid files warn and yield empty config
//!
//! invariants:
//!     - Config::load returns an empty config if the file doesn't exist
//!     - The root value is always a JSON object
//!
//! do-not:
//!     - Never validate keys against a schema, consumers own their keys
//!
//! gotchas:
//!     - merge is shallow: an overlay's top-level key replaces the whole subtree

use serde_json::{Map, Value};
use std::fs;
use std::path::Path;
use tracing::warn;

/// Separator for nested key paths
pub const KEY_SEPARATOR: char = ':';

/// JSON key/value configuration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    values: Map<String, Value>,
}

impl Config {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => match Self::from_json(&content) {
                Ok(config) => config,
                Err(e) => {
                    warn!("Failed to parse {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Parse configuration text; the document must be a JSON object
    pub fn from_json(content: &str) -> anyhow::Result<Self> {
        match serde_json::from_str::<Value>(content)? {
            Value::Object(values) => Ok(Self { values }),
            other => anyhow::bail!("expected a JSON object, found {}", kind_name(&other)),
        }
    }

    /// Look up a `:`-separated key
    pub fn get(&self, key: &str) -> Option<&Value> {
        let mut parts = key.split(KEY_SEPARATOR);
        let mut current = self.values.get(parts.next()?)?;
        for part in parts {
            current = current.as_object()?.get(part)?;
        }
        Some(current)
    }

    /// Look up a key holding a string
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Overlay another config; its top-level keys win
    pub fn merge(&mut self, overlay: Config) {
        self.values.extend(overlay.values);
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Top-level entries in key order
    pub fn entries(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
