//! String and document value coercion.
//!
//! [`Coercer::coerce`] turns a raw string (environment variable, default
//! literal) into a [`Parsed`] value for a declared [`Kind`].
//! [`Coercer::convert`] does the same for values decoded from a file, with
//! weak typing between strings, numbers and booleans.

use crate::duration::parse_duration;
use crate::error::CoerceError;
use crate::kind::{Kind, Parsed};
use crate::sequence::split_sequence;
use crate::source::native_datetime;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use regex_lite::Regex;
use serde_json::Value;
use std::fmt;

/// Layout used to parse timestamps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TimeLayout {
    #[default]
    Rfc3339,
    /// A chrono `strftime` format, e.g. `%m-%d-%Y`.
    Format(String),
}

impl TimeLayout {
    pub fn format(layout: impl Into<String>) -> Self {
        TimeLayout::Format(layout.into())
    }

    pub fn parse(&self, literal: &str) -> Result<DateTime<FixedOffset>, CoerceError> {
        let invalid = |reason: String| CoerceError::InvalidTimestamp {
            literal: literal.to_string(),
            layout: self.to_string(),
            reason,
        };
        match self {
            TimeLayout::Rfc3339 => {
                DateTime::parse_from_rfc3339(literal).map_err(|e| invalid(e.to_string()))
            }
            TimeLayout::Format(fmt) => {
                // Layouts without an offset are read as UTC; date-only layouts as midnight.
                match DateTime::parse_from_str(literal, fmt) {
                    Ok(ts) => Ok(ts),
                    Err(err) => NaiveDateTime::parse_from_str(literal, fmt)
                        .map(|naive| naive.and_utc().fixed_offset())
                        .or_else(|_| {
                            NaiveDate::parse_from_str(literal, fmt)
                                .map(|date| date.and_time(NaiveTime::MIN).and_utc().fixed_offset())
                        })
                        .map_err(|_| invalid(err.to_string())),
                }
            }
        }
    }
}

impl fmt::Display for TimeLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeLayout::Rfc3339 => f.write_str("RFC 3339"),
            TimeLayout::Format(fmt) => write!(f, "{:?}", fmt),
        }
    }
}

/// Literal forms accepted for booleans.
pub fn parse_bool(literal: &str) -> Result<bool, CoerceError> {
    match literal {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(CoerceError::InvalidBool(literal.to_string())),
    }
}

fn parse_int(literal: &str) -> Result<i64, CoerceError> {
    literal.parse::<i64>().map_err(|e| CoerceError::InvalidInt {
        literal: literal.to_string(),
        reason: e.to_string(),
    })
}

fn parse_uint(literal: &str) -> Result<u64, CoerceError> {
    let invalid = |reason: String| CoerceError::InvalidUint {
        literal: literal.to_string(),
        reason,
    };
    if literal.starts_with('-') {
        return Err(invalid("negative value".to_string()));
    }
    if literal.starts_with('+') {
        return Err(invalid("sign not allowed".to_string()));
    }
    literal.parse::<u64>().map_err(|e| invalid(e.to_string()))
}

fn parse_float(literal: &str) -> Result<f64, CoerceError> {
    literal.parse::<f64>().map_err(|e| CoerceError::InvalidFloat {
        literal: literal.to_string(),
        reason: e.to_string(),
    })
}

fn compile_pattern(literal: &str) -> Result<Regex, CoerceError> {
    Regex::new(literal).map_err(|e| CoerceError::InvalidPattern {
        literal: literal.to_string(),
        reason: e.to_string(),
    })
}

pub(crate) fn value_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "map",
    }
}

/// Coerces raw values into typed ones.
#[derive(Debug, Clone, Default)]
pub struct Coercer {
    layout: TimeLayout,
}

impl Coercer {
    pub fn new(layout: TimeLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &TimeLayout {
        &self.layout
    }

    /// Parse `raw` as a value of `kind`.
    pub fn coerce(&self, kind: &Kind, raw: &str) -> Result<Parsed, CoerceError> {
        match kind {
            Kind::Pointer(inner) => self.coerce(inner, raw),
            Kind::Sequence(inner) => split_sequence(raw)
                .into_iter()
                .map(|token| self.coerce(inner, token))
                .collect::<Result<Vec<_>, _>>()
                .map(Parsed::Seq),
            Kind::Bool => parse_bool(raw).map(Parsed::Bool),
            Kind::Int => parse_int(raw).map(Parsed::Int),
            Kind::Duration => Ok(Parsed::Duration(parse_duration(raw)?)),
            Kind::Uint => parse_uint(raw).map(Parsed::Uint),
            Kind::Float => parse_float(raw).map(Parsed::Float),
            Kind::Str => Ok(Parsed::Str(raw.to_string())),
            Kind::Timestamp => self.layout.parse(raw).map(Parsed::Timestamp),
            Kind::Pattern => compile_pattern(raw).map(Parsed::Pattern),
            Kind::Map(_) | Kind::Unsupported(_) => Err(CoerceError::Unsupported(kind.clone())),
        }
    }

    /// Convert a decoded document value into a value of `kind`.
    ///
    /// Returns `Ok(None)` for `null`, which leaves the target untouched.
    pub fn convert(&self, kind: &Kind, value: &Value) -> Result<Option<Parsed>, CoerceError> {
        if value.is_null() {
            return Ok(None);
        }
        if let Some(literal) = native_datetime(value) {
            return match kind {
                Kind::Pointer(inner) => self.convert(inner, value),
                Kind::Timestamp => {
                    parse_native_datetime(literal).map(|ts| Some(Parsed::Timestamp(ts)))
                }
                _ => self.convert(kind, &Value::String(literal.to_string())),
            };
        }
        let mismatch = || CoerceError::Mismatch {
            expected: kind.clone(),
            found: value_type(value),
        };

        let parsed = match (kind, value) {
            (Kind::Pointer(inner), _) => return self.convert(inner, value),

            (Kind::Sequence(inner), Value::Array(items)) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    match self.convert(inner, item)? {
                        Some(parsed) => out.push(parsed),
                        None => out.push(self.zero_of(inner)?),
                    }
                }
                Parsed::Seq(out)
            }
            // A lone scalar becomes a one-element sequence.
            (Kind::Sequence(inner), Value::Bool(_) | Value::Number(_) | Value::String(_)) => {
                match self.convert(inner, value)? {
                    Some(parsed) => Parsed::Seq(vec![parsed]),
                    None => Parsed::Seq(Vec::new()),
                }
            }

            (Kind::Map(inner), Value::Object(entries)) => {
                let mut out = std::collections::BTreeMap::new();
                for (key, item) in entries {
                    if let Some(parsed) = self.convert(inner, item)? {
                        out.insert(key.clone(), parsed);
                    }
                }
                Parsed::Map(out)
            }

            (_, Value::String(s)) => self.coerce(kind, s)?,

            (Kind::Bool, Value::Bool(b)) => Parsed::Bool(*b),
            (Kind::Bool, Value::Number(n)) => match n.as_f64() {
                Some(f) => Parsed::Bool(f != 0.0),
                None => return Err(mismatch()),
            },

            (Kind::Int, Value::Bool(b)) => Parsed::Int(i64::from(*b)),
            (Kind::Int, Value::Number(n)) => Parsed::Int(number_to_i64(n)?),

            (Kind::Uint, Value::Bool(b)) => Parsed::Uint(u64::from(*b)),
            (Kind::Uint, Value::Number(n)) => Parsed::Uint(number_to_u64(n)?),

            (Kind::Float, Value::Bool(b)) => Parsed::Float(if *b { 1.0 } else { 0.0 }),
            (Kind::Float, Value::Number(n)) => match n.as_f64() {
                Some(f) => Parsed::Float(f),
                None => return Err(mismatch()),
            },

            (Kind::Str, Value::Bool(b)) => Parsed::Str(if *b { "1" } else { "0" }.to_string()),
            (Kind::Str, Value::Number(n)) => Parsed::Str(n.to_string()),

            // Integers are taken as nanoseconds.
            (Kind::Duration, Value::Number(n)) => Parsed::Duration(number_to_i64(n)?),

            (Kind::Map(_) | Kind::Unsupported(_), _) => {
                return Err(CoerceError::Unsupported(kind.clone()));
            }
            _ => return Err(mismatch()),
        };
        Ok(Some(parsed))
    }

    /// Zero value for a `null` sequence element.
    fn zero_of(&self, kind: &Kind) -> Result<Parsed, CoerceError> {
        Ok(match kind {
            Kind::Bool => Parsed::Bool(false),
            Kind::Int => Parsed::Int(0),
            Kind::Uint => Parsed::Uint(0),
            Kind::Float => Parsed::Float(0.0),
            Kind::Str => Parsed::Str(String::new()),
            Kind::Duration => Parsed::Duration(0),
            Kind::Timestamp => Parsed::Timestamp(DateTime::<Utc>::UNIX_EPOCH.fixed_offset()),
            Kind::Pattern => Parsed::Pattern(compile_pattern("")?),
            Kind::Pointer(_) => Parsed::Null,
            Kind::Sequence(_) => Parsed::Seq(Vec::new()),
            Kind::Map(_) => Parsed::Map(Default::default()),
            Kind::Unsupported(_) => {
                return Err(CoerceError::Mismatch {
                    expected: kind.clone(),
                    found: "null",
                });
            }
        })
    }
}

/// Read a native TOML datetime. These are always RFC 3339 shaped, whatever
/// layout the loader was given; local forms are read as UTC.
fn parse_native_datetime(literal: &str) -> Result<DateTime<FixedOffset>, CoerceError> {
    DateTime::parse_from_rfc3339(literal)
        .or_else(|err| {
            NaiveDateTime::parse_from_str(literal, "%Y-%m-%dT%H:%M:%S%.f")
                .map(|naive| naive.and_utc().fixed_offset())
                .or_else(|_| {
                    NaiveDate::parse_from_str(literal, "%Y-%m-%d")
                        .map(|date| date.and_time(NaiveTime::MIN).and_utc().fixed_offset())
                })
                .map_err(|_| err)
        })
        .map_err(|err| CoerceError::InvalidTimestamp {
            literal: literal.to_string(),
            layout: "TOML datetime".to_string(),
            reason: err.to_string(),
        })
}

fn number_to_i64(n: &serde_json::Number) -> Result<i64, CoerceError> {
    if let Some(i) = n.as_i64() {
        return Ok(i);
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => Ok(f as i64),
        _ => Err(CoerceError::OutOfRange {
            value: n.to_string(),
            target: "i64",
        }),
    }
}

fn number_to_u64(n: &serde_json::Number) -> Result<u64, CoerceError> {
    if let Some(u) = n.as_u64() {
        return Ok(u);
    }
    if n.as_i64().is_some_and(|i| i < 0) {
        return Err(CoerceError::InvalidUint {
            literal: n.to_string(),
            reason: "negative value".to_string(),
        });
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f >= 0.0 && f < u64::MAX as f64 => Ok(f as u64),
        _ => Err(CoerceError::OutOfRange {
            value: n.to_string(),
            target: "u64",
        }),
    }
}
