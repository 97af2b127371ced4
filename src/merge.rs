//! Deep merge of decoded documents.
//!
//! Produces the single document equivalent to applying several files in
//! order. Sequences are replaced, not concatenated, matching how the map
//! decoder applies each file.

use crate::decode::{Table, Value};

/// Merge `overlay` onto `base`, with `overlay` taking precedence.
///
/// - Maps merge recursively.
/// - A `null` overlay keeps the base value, as the decoder leaves the field untouched.
/// - Anything else replaces the base value.
///
/// ```
/// use serde_json::json;
/// use layercfg::merge::deep_merge;
///
/// let base = json!({"server": {"port": 8080, "host": "localhost"}, "tags": ["a", "b"]});
/// let overlay = json!({"server": {"port": 9000}, "tags": ["c"]});
/// assert_eq!(
///     deep_merge(base, overlay),
///     json!({"server": {"port": 9000, "host": "localhost"}, "tags": ["c"]})
/// );
/// ```
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => Value::Object(merge_tables(base, overlay)),
        (base, Value::Null) => base,
        (_, overlay) => overlay,
    }
}

/// Merge two tables key by key.
pub fn merge_tables(mut base: Table, overlay: Table) -> Table {
    for (key, value) in overlay {
        let merged = match base.remove(&key) {
            Some(existing) => deep_merge(existing, value),
            None => value,
        };
        base.insert(key, merged);
    }
    base
}

/// Fold documents in order; later ones win.
pub fn deep_merge_all(values: impl IntoIterator<Item = Value>) -> Value {
    values.into_iter().fold(Value::Null, deep_merge)
}
