//! Assigning a decoded document onto a configuration struct.
//!
//! Keys are matched against each field's name for the active tag: exact
//! match first, then ASCII case-insensitive. `null` leaves a field untouched.
//! Unmatched keys are ignored unless strict mode is on.

use crate::coerce::Coercer;
use crate::error::{DecodeError, DecodeErrorKind};
use crate::field::{FieldMeta, FieldPath};
use crate::flatten::Section;

pub use serde_json::Value;

/// A decoded document: string keys mapped to arbitrary values.
pub type Table = serde_json::Map<String, Value>;

/// Settings shared by one decode pass.
#[derive(Debug, Clone)]
pub struct DecodeContext<'c> {
    tag: &'c str,
    strict: bool,
    coercer: &'c Coercer,
}

impl<'c> DecodeContext<'c> {
    pub fn new(tag: &'c str, coercer: &'c Coercer) -> Self {
        Self {
            tag,
            strict: false,
            coercer,
        }
    }

    /// Reject document keys that match no field.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn tag(&self) -> &'c str {
        self.tag
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn coercer(&self) -> &'c Coercer {
        self.coercer
    }

    /// Find the entry for `meta`, returning the key as spelled in the document.
    pub fn lookup<'t>(&self, table: &'t Table, meta: &FieldMeta) -> Option<(&'t str, &'t Value)> {
        let name = meta.name(self.tag);
        if let Some((key, value)) = table.get_key_value(name) {
            return Some((key.as_str(), value));
        }
        table
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(key, value)| (key.as_str(), value))
    }

    /// In strict mode, fail when `table` holds keys `T` does not declare.
    pub fn check_keys<T: Section>(&self, table: &Table, path: &FieldPath) -> Result<(), DecodeError> {
        if !self.strict {
            return Ok(());
        }
        let mut names = Vec::new();
        T::field_names(self.tag, &mut names);
        let mut unknown: Vec<String> = table
            .keys()
            .filter(|key| !names.iter().any(|name| name.eq_ignore_ascii_case(key)))
            .cloned()
            .collect();
        if unknown.is_empty() {
            return Ok(());
        }
        unknown.sort();
        Err(DecodeError::at(path, DecodeErrorKind::UnknownKeys(unknown)))
    }
}

/// Decode `table` onto `target`, overwriting only what the document names.
pub fn decode_table<T: Section>(
    target: &mut T,
    table: &Table,
    cx: &DecodeContext<'_>,
) -> Result<(), DecodeError> {
    let root = FieldPath::root();
    cx.check_keys::<T>(table, &root)?;
    target.decode_fields(table, &root, cx)
}
