//! Implementation of the inspector subcommands.

use super::{Command, OutputFormat};
use crate::decode::{Table, Value};
use crate::env::env_key_for;
use crate::field::FieldPath;
use crate::loader::Loader;
use crate::merge::deep_merge_all;
use crate::source::{decode_file, plain_table};
use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use tracing::debug;

/// A leaf of a document and the variable that overrides it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvEntry {
    pub path: String,
    pub key: String,
}

/// Run a subcommand, writing its report to `out`.
pub fn run(command: &Command, out: &mut impl Write) -> Result<()> {
    match command {
        Command::Files(source) => {
            let loader = source.loader();
            let files = loader.find_files();
            if files.is_empty() {
                writeln!(out, "no files found for {}", loader.filenames().join(", "))?;
            }
            for path in files {
                writeln!(out, "{}", path.display())?;
            }
        }
        Command::Show { source, format } => {
            let merged = merged_document(&source.loader())?;
            let rendered = render(&merged, *format)?;
            out.write_all(rendered.as_bytes())?;
            if !rendered.ends_with('\n') {
                writeln!(out)?;
            }
        }
        Command::Env {
            source,
            prefix,
            json,
        } => {
            let merged = merged_document(&source.loader())?;
            let entries = env_entries(&merged, prefix);
            if *json {
                let rendered =
                    serde_json::to_string_pretty(&entries).context("failed to render json")?;
                writeln!(out, "{}", rendered)?;
                return Ok(());
            }
            let width = entries.iter().map(|e| e.key.len()).max().unwrap_or(0);
            for entry in entries {
                writeln!(out, "{:width$}  {}", entry.key, entry.path, width = width)?;
            }
        }
    }
    Ok(())
}

/// Decode every file the loader would apply, in order.
pub fn read_documents(loader: &Loader) -> Result<Vec<(PathBuf, Table)>> {
    loader
        .find_files()
        .into_iter()
        .map(|path| -> Result<(PathBuf, Table)> {
            debug!(path = %path.display(), "reading");
            let table = plain_table(decode_file(&path)?);
            Ok((path, table))
        })
        .collect()
}

/// The single document equivalent to applying every file in order.
pub fn merged_document(loader: &Loader) -> Result<Value> {
    let documents = read_documents(loader)?;
    if documents.is_empty() {
        anyhow::bail!("{}: file not found", loader.filenames().join(", "));
    }
    Ok(deep_merge_all(
        documents.into_iter().map(|(_, table)| Value::Object(table)),
    ))
}

/// Every leaf path of `value`, in key order.
///
/// Sequences holding maps are indexed, like sequences of sections; other
/// sequences are single leaves.
pub fn leaf_paths(value: &Value) -> Vec<FieldPath> {
    let mut out = Vec::new();
    walk(value, FieldPath::root(), &mut out);
    out
}

fn walk(value: &Value, path: FieldPath, out: &mut Vec<FieldPath>) {
    match value {
        Value::Object(table) => {
            for (key, child) in table {
                walk(child, path.child(key.as_str()), out);
            }
        }
        Value::Array(items) if items.iter().any(Value::is_object) => {
            for (i, item) in items.iter().enumerate() {
                walk(item, path.index(i), out);
            }
        }
        _ if path.is_root() => {}
        _ => out.push(path),
    }
}

/// Environment variable names for every leaf of `value`.
pub fn env_entries(value: &Value, prefix: &str) -> Vec<EnvEntry> {
    leaf_paths(value)
        .into_iter()
        .map(|path| EnvEntry {
            key: env_key_for(&path, prefix),
            path: path.to_string(),
        })
        .collect()
}

/// Serialize `value` in the requested format.
pub fn render(value: &Value, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Yaml => serde_yaml::to_string(value).context("failed to render yaml"),
        OutputFormat::Json => serde_json::to_string_pretty(value).context("failed to render json"),
        OutputFormat::Toml => toml::to_string_pretty(value)
            .context("failed to render toml (null values have no toml form)"),
    }
}
