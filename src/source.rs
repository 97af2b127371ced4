//! Configuration file decoding.
//!
//! The format is chosen by extension. Every format decodes into the same
//! document model so the map decoder treats them alike.

use crate::decode::{Table, Value};
use crate::error::Error;
use std::fmt;
use std::path::Path;

/// Key the `toml` crate uses to carry datetimes through generic values.
const TOML_DATETIME_KEY: &str = "$__toml_private_datetime";

/// Supported file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Json,
    Toml,
}

impl Format {
    /// Pick a format from the file extension, ignoring case.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "yaml" | "yml" => Some(Format::Yaml),
            "json" => Some(Format::Json),
            "toml" => Some(Format::Toml),
            _ => None,
        }
    }

    /// Parse `content` into a top-level table.
    pub fn parse(self, content: &str) -> Result<Table, String> {
        let value = match self {
            Format::Yaml if is_blank_yaml(content) => Value::Null,
            Format::Yaml => serde_yaml::from_str::<Value>(content).map_err(|e| e.to_string())?,
            Format::Json => serde_json::from_str::<Value>(content).map_err(|e| e.to_string())?,
            // Native datetimes keep their wrapper so they are read as RFC 3339.
            Format::Toml => toml::from_str::<Value>(content).map_err(|e| e.to_string())?,
        };
        match value {
            Value::Object(table) => Ok(table),
            // An empty document.
            Value::Null => Ok(Table::new()),
            other => Err(format!(
                "top level must be a map, found {}",
                crate::coerce::value_type(&other)
            )),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Yaml => f.write_str("yaml"),
            Format::Json => f.write_str("json"),
            Format::Toml => f.write_str("toml"),
        }
    }
}

/// Read and decode one configuration file.
pub fn decode_file(path: &Path) -> Result<Table, Error> {
    let format = Format::from_path(path).ok_or_else(|| Error::UnsupportedExtension {
        path: path.to_path_buf(),
    })?;
    let content = std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    format.parse(&content).map_err(|message| Error::Parse {
        path: path.to_path_buf(),
        message,
    })
}

/// A document with nothing but comments and separators.
fn is_blank_yaml(content: &str) -> bool {
    content.lines().map(str::trim).all(|line| {
        line.is_empty() || line.starts_with('#') || line == "---" || line == "..."
    })
}

/// The literal of a native TOML datetime, if `value` is one.
pub(crate) fn native_datetime(value: &Value) -> Option<&str> {
    match value {
        Value::Object(table) if table.len() == 1 => match table.get(TOML_DATETIME_KEY) {
            Some(Value::String(literal)) => Some(literal),
            _ => None,
        },
        _ => None,
    }
}

/// Replace native TOML datetimes with their string form, for display.
pub fn plain_datetimes(value: Value) -> Value {
    if let Some(literal) = native_datetime(&value) {
        return Value::String(literal.to_string());
    }
    match value {
        Value::Object(table) => Value::Object(plain_table(table)),
        Value::Array(items) => Value::Array(items.into_iter().map(plain_datetimes).collect()),
        other => other,
    }
}

/// [`plain_datetimes`] over every entry of a table.
pub fn plain_table(table: Table) -> Table {
    table
        .into_iter()
        .map(|(k, v)| (k, plain_datetimes(v)))
        .collect()
}
