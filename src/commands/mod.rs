//! Command implementations behind the `crewkb` binary.

pub mod entry;
pub mod model;
pub mod search;

use anyhow::{bail, Context, Result};
use colored::Colorize;
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

use crate::integration::KnowledgeBase;

/// Open the knowledge base at `root`, pointing at `init` when it is missing.
pub(crate) fn open_kb(root: &Path) -> Result<KnowledgeBase> {
    KnowledgeBase::open(root).with_context(|| {
        format!(
            "Failed to open knowledge base at {}. Run 'crewkb init' first.",
            root.display()
        )
    })
}

/// Parse an inline JSON object argument.
pub(crate) fn parse_object(raw: &str) -> Result<Map<String, Value>> {
    let value: Value = serde_json::from_str(raw).context("Invalid JSON")?;
    match value {
        Value::Object(map) => Ok(map),
        _ => bail!("Expected a JSON object, got: {raw}"),
    }
}

/// Read a document body from inline JSON or from a JSON/YAML file.
pub(crate) fn read_body(json: Option<&str>, file: Option<&Path>) -> Result<Map<String, Value>> {
    match (json, file) {
        (Some(raw), None) => parse_object(raw),
        (None, Some(path)) => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let value: Value = serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?;
            match value {
                Value::Object(map) => Ok(map),
                _ => bail!("{} does not contain a mapping", path.display()),
            }
        }
        (Some(_), Some(_)) => bail!("Pass either --json or --file, not both"),
        (None, None) => bail!("A document body is required (--json or --file)"),
    }
}

pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("Failed to serialize output")?
    );
    Ok(())
}

pub(crate) fn nothing(message: &str) {
    println!("{} {message}", "─".dimmed());
}
