//! Tree flattening.
//!
//! A configuration struct derives [`Section`] (and [`Node`]) with
//! `#[derive(Config)]`. Walking a section yields one [`Field`] per reachable
//! leaf, in declaration order, each holding an exclusive borrow into the tree.
//!
//! [`Node`] is implemented by everything that can appear as a struct field:
//! leaves push themselves as a single field, sections recurse. The
//! `*_optional`, `*_sequence` and `*_sequence_optional` variants let the
//! element type decide how `Option<T>`, `Vec<T>` and `Vec<Option<T>>` fields
//! are handled:
//!
//! - `Option<Leaf>`, `Vec<Leaf>` and `Vec<Option<Leaf>>` are single leaves.
//! - `Option<Section>` is allocated in place and recursed into.
//! - `Vec<Section>` recurses into each element under an index segment.
//! - `Vec<Option<Section>>` does the same, allocating `None` elements first.
//!
//! A section container annotated with `required` or `default` also yields a
//! field for itself. Only an empty sequence of sections counts as unset.

use crate::coerce::value_type;
use crate::decode::{DecodeContext, Table};
use crate::error::{DecodeError, DecodeErrorKind};
use crate::field::{Field, FieldMeta, FieldPath};
use crate::kind::Leaf;
use regex_lite::Regex;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;
use std::path::PathBuf;

/// Flattening context.
#[derive(Debug, Clone, Copy)]
pub struct Walker<'t> {
    tag: &'t str,
}

impl<'t> Walker<'t> {
    pub fn new(tag: &'t str) -> Self {
        Self { tag }
    }

    pub fn tag(&self) -> &'t str {
        self.tag
    }

    /// The path of the field described by `meta` under `parent`.
    pub fn path_for(&self, parent: &FieldPath, meta: &FieldMeta) -> FieldPath {
        parent.child(meta.name(self.tag))
    }
}

/// Anything that can appear as a field of a [`Section`].
pub trait Node {
    fn collect<'a>(
        &'a mut self,
        path: FieldPath,
        meta: &'static FieldMeta,
        walker: &Walker<'_>,
        out: &mut Vec<Field<'a>>,
    );

    fn collect_optional<'a>(
        slot: &'a mut Option<Self>,
        path: FieldPath,
        meta: &'static FieldMeta,
        walker: &Walker<'_>,
        out: &mut Vec<Field<'a>>,
    ) where
        Self: Sized;

    fn collect_sequence<'a>(
        items: &'a mut Vec<Self>,
        path: FieldPath,
        meta: &'static FieldMeta,
        walker: &Walker<'_>,
        out: &mut Vec<Field<'a>>,
    ) where
        Self: Sized;

    fn collect_sequence_optional<'a>(
        items: &'a mut Vec<Option<Self>>,
        path: FieldPath,
        meta: &'static FieldMeta,
        walker: &Walker<'_>,
        out: &mut Vec<Field<'a>>,
    ) where
        Self: Sized;

    fn decode(
        &mut self,
        value: &Value,
        path: &FieldPath,
        cx: &DecodeContext<'_>,
    ) -> Result<(), DecodeError>;

    fn decode_optional(
        slot: &mut Option<Self>,
        value: &Value,
        path: &FieldPath,
        cx: &DecodeContext<'_>,
    ) -> Result<(), DecodeError>
    where
        Self: Sized;

    fn decode_sequence(
        items: &mut Vec<Self>,
        value: &Value,
        path: &FieldPath,
        cx: &DecodeContext<'_>,
    ) -> Result<(), DecodeError>
    where
        Self: Sized;

    fn decode_sequence_optional(
        items: &mut Vec<Option<Self>>,
        value: &Value,
        path: &FieldPath,
        cx: &DecodeContext<'_>,
    ) -> Result<(), DecodeError>
    where
        Self: Sized;
}

/// A configuration struct, usually implemented with `#[derive(Config)]`.
pub trait Section: Default {
    /// Append every field reachable from `self`, with paths under `path`.
    fn collect_fields<'a>(
        &'a mut self,
        path: &FieldPath,
        walker: &Walker<'_>,
        out: &mut Vec<Field<'a>>,
    );

    /// Assign the entries of `table` that match this struct's fields.
    fn decode_fields(
        &mut self,
        table: &Table,
        path: &FieldPath,
        cx: &DecodeContext<'_>,
    ) -> Result<(), DecodeError>;

    /// Document keys this struct accepts under `tag`, including flattened members.
    fn field_names(tag: &str, out: &mut Vec<&'static str>);

    /// Flatten the whole tree rooted at `self`.
    fn fields<'a>(&'a mut self, walker: &Walker<'_>) -> Vec<Field<'a>> {
        let mut out = Vec::new();
        self.collect_fields(&FieldPath::root(), walker, &mut out);
        out
    }
}

/// [`Node`] behaviour for leaf types.
#[doc(hidden)]
pub mod leaf {
    use super::*;

    pub fn collect<'a, T: Leaf>(
        slot: &'a mut T,
        path: FieldPath,
        meta: &'static FieldMeta,
        out: &mut Vec<Field<'a>>,
    ) {
        out.push(Field::new(slot, path, meta));
    }

    pub fn decode<T: Leaf>(
        slot: &mut T,
        value: &Value,
        path: &FieldPath,
        cx: &DecodeContext<'_>,
    ) -> Result<(), DecodeError> {
        let converted = cx
            .coercer()
            .convert(&T::kind(), value)
            .map_err(|e| DecodeError::at(path, e.into()))?;
        if let Some(parsed) = converted {
            *slot = T::from_parsed(parsed).map_err(|e| DecodeError::at(path, e.into()))?;
        }
        Ok(())
    }
}

/// [`Node`] behaviour for derived sections.
#[doc(hidden)]
pub mod section {
    use super::*;
    use crate::kind::Kind;

    const SECTION: Kind = Kind::Unsupported("section");

    /// Annotated containers get a field of their own so `required` and
    /// `default` are still checked.
    fn annotate(
        kind: Kind,
        unset: bool,
        path: &FieldPath,
        meta: &'static FieldMeta,
        out: &mut Vec<Field<'_>>,
    ) {
        if meta.required || meta.default.is_some() {
            out.push(Field::section(kind, unset, path.clone(), meta));
        }
    }

    pub fn collect<'a, T: Section>(
        section: &'a mut T,
        path: FieldPath,
        meta: &'static FieldMeta,
        walker: &Walker<'_>,
        out: &mut Vec<Field<'a>>,
    ) {
        annotate(SECTION, false, &path, meta, out);
        section.collect_fields(&path, walker, out);
    }

    /// A missing section is allocated in place so its fields can be set.
    pub fn collect_optional<'a, T: Section>(
        slot: &'a mut Option<T>,
        path: FieldPath,
        meta: &'static FieldMeta,
        walker: &Walker<'_>,
        out: &mut Vec<Field<'a>>,
    ) {
        annotate(Kind::Pointer(Box::new(SECTION)), false, &path, meta, out);
        slot.get_or_insert_with(T::default)
            .collect_fields(&path, walker, out);
    }

    pub fn collect_sequence<'a, T: Section>(
        items: &'a mut [T],
        path: FieldPath,
        meta: &'static FieldMeta,
        walker: &Walker<'_>,
        out: &mut Vec<Field<'a>>,
    ) {
        annotate(
            Kind::Sequence(Box::new(SECTION)),
            items.is_empty(),
            &path,
            meta,
            out,
        );
        for (i, item) in items.iter_mut().enumerate() {
            item.collect_fields(&path.index(i), walker, out);
        }
    }

    /// Like [`collect_sequence`], but `None` elements are allocated first.
    pub fn collect_sequence_optional<'a, T: Section>(
        items: &'a mut [Option<T>],
        path: FieldPath,
        meta: &'static FieldMeta,
        walker: &Walker<'_>,
        out: &mut Vec<Field<'a>>,
    ) {
        annotate(
            Kind::Sequence(Box::new(Kind::Pointer(Box::new(SECTION)))),
            items.is_empty(),
            &path,
            meta,
            out,
        );
        for (i, item) in items.iter_mut().enumerate() {
            item.get_or_insert_with(T::default)
                .collect_fields(&path.index(i), walker, out);
        }
    }

    pub fn decode<T: Section>(
        section: &mut T,
        value: &Value,
        path: &FieldPath,
        cx: &DecodeContext<'_>,
    ) -> Result<(), DecodeError> {
        match value {
            Value::Null => Ok(()),
            Value::Object(table) => {
                cx.check_keys::<T>(table, path)?;
                section.decode_fields(table, path, cx)
            }
            other => Err(DecodeError::at(
                path,
                DecodeErrorKind::ExpectedMap(value_type(other)),
            )),
        }
    }

    pub fn decode_optional<T: Section>(
        slot: &mut Option<T>,
        value: &Value,
        path: &FieldPath,
        cx: &DecodeContext<'_>,
    ) -> Result<(), DecodeError> {
        if value.is_null() {
            return Ok(());
        }
        decode(slot.get_or_insert_with(T::default), value, path, cx)
    }

    /// Resize `items` to the document's length and decode each element in place.
    pub fn decode_sequence<T: Section>(
        items: &mut Vec<T>,
        value: &Value,
        path: &FieldPath,
        cx: &DecodeContext<'_>,
    ) -> Result<(), DecodeError> {
        match value {
            Value::Null => Ok(()),
            Value::Array(elements) => {
                items.truncate(elements.len());
                items.resize_with(elements.len(), T::default);
                for (i, (item, element)) in items.iter_mut().zip(elements).enumerate() {
                    decode(item, element, &path.index(i), cx)?;
                }
                Ok(())
            }
            other => Err(DecodeError::at(
                path,
                DecodeErrorKind::ExpectedSequence(value_type(other)),
            )),
        }
    }

    /// A `null` element decodes as `None`; anything else into its section.
    pub fn decode_sequence_optional<T: Section>(
        items: &mut Vec<Option<T>>,
        value: &Value,
        path: &FieldPath,
        cx: &DecodeContext<'_>,
    ) -> Result<(), DecodeError> {
        match value {
            Value::Null => Ok(()),
            Value::Array(elements) => {
                items.truncate(elements.len());
                items.resize_with(elements.len(), || None);
                for (i, (item, element)) in items.iter_mut().zip(elements).enumerate() {
                    if element.is_null() {
                        *item = None;
                    } else {
                        decode_optional(item, element, &path.index(i), cx)?;
                    }
                }
                Ok(())
            }
            other => Err(DecodeError::at(
                path,
                DecodeErrorKind::ExpectedSequence(value_type(other)),
            )),
        }
    }
}

/// Implement [`Node`] for leaf types: the value is a single field, and so are
/// `Option<T>` and `Vec<T>` of it.
#[macro_export]
macro_rules! leaf_node {
    ($($t:ty),* $(,)?) => {$(
        impl $crate::Node for $t {
            fn collect<'a>(
                &'a mut self,
                path: $crate::FieldPath,
                meta: &'static $crate::FieldMeta,
                _walker: &$crate::Walker<'_>,
                out: &mut ::std::vec::Vec<$crate::Field<'a>>,
            ) {
                $crate::flatten::leaf::collect(self, path, meta, out)
            }

            fn collect_optional<'a>(
                slot: &'a mut ::std::option::Option<Self>,
                path: $crate::FieldPath,
                meta: &'static $crate::FieldMeta,
                _walker: &$crate::Walker<'_>,
                out: &mut ::std::vec::Vec<$crate::Field<'a>>,
            ) {
                $crate::flatten::leaf::collect(slot, path, meta, out)
            }

            fn collect_sequence<'a>(
                items: &'a mut ::std::vec::Vec<Self>,
                path: $crate::FieldPath,
                meta: &'static $crate::FieldMeta,
                _walker: &$crate::Walker<'_>,
                out: &mut ::std::vec::Vec<$crate::Field<'a>>,
            ) {
                $crate::flatten::leaf::collect(items, path, meta, out)
            }

            fn collect_sequence_optional<'a>(
                items: &'a mut ::std::vec::Vec<::std::option::Option<Self>>,
                path: $crate::FieldPath,
                meta: &'static $crate::FieldMeta,
                _walker: &$crate::Walker<'_>,
                out: &mut ::std::vec::Vec<$crate::Field<'a>>,
            ) {
                $crate::flatten::leaf::collect(items, path, meta, out)
            }

            fn decode(
                &mut self,
                value: &$crate::decode::Value,
                path: &$crate::FieldPath,
                cx: &$crate::DecodeContext<'_>,
            ) -> ::std::result::Result<(), $crate::DecodeError> {
                $crate::flatten::leaf::decode(self, value, path, cx)
            }

            fn decode_optional(
                slot: &mut ::std::option::Option<Self>,
                value: &$crate::decode::Value,
                path: &$crate::FieldPath,
                cx: &$crate::DecodeContext<'_>,
            ) -> ::std::result::Result<(), $crate::DecodeError> {
                $crate::flatten::leaf::decode(slot, value, path, cx)
            }

            fn decode_sequence(
                items: &mut ::std::vec::Vec<Self>,
                value: &$crate::decode::Value,
                path: &$crate::FieldPath,
                cx: &$crate::DecodeContext<'_>,
            ) -> ::std::result::Result<(), $crate::DecodeError> {
                $crate::flatten::leaf::decode(items, value, path, cx)
            }

            fn decode_sequence_optional(
                items: &mut ::std::vec::Vec<::std::option::Option<Self>>,
                value: &$crate::decode::Value,
                path: &$crate::FieldPath,
                cx: &$crate::DecodeContext<'_>,
            ) -> ::std::result::Result<(), $crate::DecodeError> {
                $crate::flatten::leaf::decode(items, value, path, cx)
            }
        }
    )*};
}

leaf_node!(
    bool,
    i8,
    i16,
    i32,
    i64,
    isize,
    u8,
    u16,
    u32,
    u64,
    usize,
    f32,
    f64,
    String,
    PathBuf,
    std::time::Duration,
    chrono::TimeDelta,
    chrono::DateTime<chrono::Utc>,
    chrono::DateTime<chrono::FixedOffset>,
    Regex,
);

/// Generic leaf containers, for nesting such as `Vec<Vec<u16>>` or
/// `Vec<Option<String>>`.
macro_rules! generic_leaf_node {
    ($(impl[$($g:tt)*] for $t:ty;)*) => {$(
        impl<$($g)*> Node for $t {
            fn collect<'a>(
                &'a mut self,
                path: FieldPath,
                meta: &'static FieldMeta,
                _walker: &Walker<'_>,
                out: &mut Vec<Field<'a>>,
            ) {
                leaf::collect(self, path, meta, out)
            }

            fn collect_optional<'a>(
                slot: &'a mut Option<Self>,
                path: FieldPath,
                meta: &'static FieldMeta,
                _walker: &Walker<'_>,
                out: &mut Vec<Field<'a>>,
            ) {
                leaf::collect(slot, path, meta, out)
            }

            fn collect_sequence<'a>(
                items: &'a mut Vec<Self>,
                path: FieldPath,
                meta: &'static FieldMeta,
                _walker: &Walker<'_>,
                out: &mut Vec<Field<'a>>,
            ) {
                leaf::collect(items, path, meta, out)
            }

            fn collect_sequence_optional<'a>(
                items: &'a mut Vec<Option<Self>>,
                path: FieldPath,
                meta: &'static FieldMeta,
                _walker: &Walker<'_>,
                out: &mut Vec<Field<'a>>,
            ) {
                leaf::collect(items, path, meta, out)
            }

            fn decode(
                &mut self,
                value: &Value,
                path: &FieldPath,
                cx: &DecodeContext<'_>,
            ) -> Result<(), DecodeError> {
                leaf::decode(self, value, path, cx)
            }

            fn decode_optional(
                slot: &mut Option<Self>,
                value: &Value,
                path: &FieldPath,
                cx: &DecodeContext<'_>,
            ) -> Result<(), DecodeError> {
                leaf::decode(slot, value, path, cx)
            }

            fn decode_sequence(
                items: &mut Vec<Self>,
                value: &Value,
                path: &FieldPath,
                cx: &DecodeContext<'_>,
            ) -> Result<(), DecodeError> {
                leaf::decode(items, value, path, cx)
            }

            fn decode_sequence_optional(
                items: &mut Vec<Option<Self>>,
                value: &Value,
                path: &FieldPath,
                cx: &DecodeContext<'_>,
            ) -> Result<(), DecodeError> {
                leaf::decode(items, value, path, cx)
            }
        }
    )*};
}

generic_leaf_node! {
    impl[T: Leaf] for Option<T>;
    impl[T: Leaf] for Vec<T>;
    impl[V: Leaf, S: BuildHasher + Default] for HashMap<String, V, S>;
    impl[V: Leaf] for BTreeMap<String, V>;
}
