//! Field model: one discovered leaf of the configuration tree.

use crate::error::CoerceError;
use crate::kind::{Kind, Parsed, Slot};
use std::fmt;

/// One step in a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Name(String),
    Index(usize),
}

/// Address of a field from the configuration root.
///
/// Renders as `spec.containers[0].image`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPath(Vec<Segment>);

impl FieldPath {
    pub fn root() -> Self {
        Self::default()
    }

    /// A new path with a named segment appended.
    pub fn child(&self, name: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(Segment::Name(name.into()));
        Self(segments)
    }

    /// A new path with an index segment appended.
    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(Segment::Index(index));
        Self(segments)
    }

    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                Segment::Name(name) if i == 0 => f.write_str(name)?,
                Segment::Name(name) => write!(f, ".{}", name)?,
                Segment::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

/// Static annotations of a struct field, generated by `#[derive(Config)]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMeta {
    /// The Rust identifier.
    pub ident: &'static str,
    /// Alternate names keyed by tag.
    pub names: &'static [(&'static str, &'static str)],
    pub required: bool,
    pub default: Option<&'static str>,
    pub flatten: bool,
}

impl FieldMeta {
    /// The explicit alternate name under `tag`, if any.
    pub fn alt_name(&self, tag: &str) -> Option<&'static str> {
        self.names
            .iter()
            .find(|(key, _)| *key == tag)
            .map(|(_, name)| *name)
    }

    /// The alternate name under `tag`, falling back to the identifier.
    pub fn name(&self, tag: &str) -> &'static str {
        self.alt_name(tag).unwrap_or(self.ident)
    }
}

enum Target<'a> {
    Slot(&'a mut dyn Slot),
    /// An annotated section container. Its members are separate fields, so
    /// only emptiness is recorded.
    Section { kind: Kind, unset: bool },
}

/// A discovered field: where it lives, what it is, and how it is annotated.
pub struct Field<'a> {
    target: Target<'a>,
    path: FieldPath,
    meta: &'static FieldMeta,
}

impl<'a> Field<'a> {
    pub fn new(slot: &'a mut dyn Slot, path: FieldPath, meta: &'static FieldMeta) -> Self {
        Self {
            target: Target::Slot(slot),
            path,
            meta,
        }
    }

    /// A section container carrying `required` or `default`. It cannot be
    /// assigned; `unset` is true only for an empty sequence of sections.
    pub fn section(kind: Kind, unset: bool, path: FieldPath, meta: &'static FieldMeta) -> Self {
        Self {
            target: Target::Section { kind, unset },
            path,
            meta,
        }
    }

    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    pub fn kind(&self) -> Kind {
        match &self.target {
            Target::Slot(slot) => slot.declared_kind(),
            Target::Section { kind, .. } => kind.clone(),
        }
    }

    pub fn required(&self) -> bool {
        self.meta.required
    }

    pub fn default_literal(&self) -> Option<&'static str> {
        self.meta.default
    }

    pub fn is_zero(&self) -> bool {
        match &self.target {
            Target::Slot(slot) => slot.is_unset(),
            Target::Section { unset, .. } => *unset,
        }
    }

    /// Overwrite the current value.
    pub fn set(&mut self, value: Parsed) -> Result<(), CoerceError> {
        match &mut self.target {
            Target::Slot(slot) => slot.assign(value),
            Target::Section { kind, .. } => Err(CoerceError::Unsupported(kind.clone())),
        }
    }
}

impl fmt::Debug for Field<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("path", &self.path.to_string())
            .field("kind", &self.kind())
            .field("required", &self.meta.required)
            .field("default", &self.meta.default)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static META: FieldMeta = FieldMeta {
        ident: "log_level",
        names: &[("config", "level"), ("custom", "lvl")],
        required: false,
        default: Some("info"),
        flatten: false,
    };

    #[test]
    fn test_path_display() {
        let path = FieldPath::root().child("spec").child("containers").index(0).child("image");
        assert_eq!(path.to_string(), "spec.containers[0].image");
        assert_eq!(FieldPath::root().to_string(), "");
        assert_eq!(FieldPath::root().child("kind").to_string(), "kind");
    }

    #[test]
    fn test_meta_name_by_tag() {
        assert_eq!(META.name("config"), "level");
        assert_eq!(META.name("custom"), "lvl");
        assert_eq!(META.name("other"), "log_level");
        assert_eq!(META.alt_name("other"), None);
    }

    #[test]
    fn test_field_reads_and_writes_slot() {
        let mut level = String::new();
        let mut field = Field::new(&mut level, FieldPath::root().child("level"), &META);
        assert!(field.is_zero());
        assert_eq!(field.kind(), Kind::Str);
        field.set(Parsed::Str("debug".into())).unwrap();
        assert!(!field.is_zero());
        drop(field);
        assert_eq!(level, "debug");
    }

    #[test]
    fn test_section_field_cannot_be_set() {
        let kind = Kind::Sequence(Box::new(Kind::Unsupported("section")));
        let mut field = Field::section(kind.clone(), true, FieldPath::root().child("items"), &META);
        assert!(field.is_zero());
        assert_eq!(
            field.set(Parsed::Seq(Vec::new())),
            Err(CoerceError::Unsupported(kind))
        );
    }
}
