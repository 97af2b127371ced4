//! Declared kinds and the leaf types that carry them.
//!
//! Every coercible Rust type implements [`Leaf`], which names its [`Kind`],
//! decides whether its current value is "zero", and builds itself from a
//! [`Parsed`] value. [`Slot`] is the object-safe view used by
//! [`Field`](crate::Field) to read and write a location in place.

use crate::error::CoerceError;
use chrono::{DateTime, FixedOffset, TimeDelta, Utc};
use regex_lite::Regex;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::BuildHasher;
use std::path::PathBuf;

/// The closed set of kinds the coercion engine understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Kind {
    Bool,
    Int,
    Uint,
    Float,
    Str,
    Duration,
    Timestamp,
    Pattern,
    /// An optional value, allocated when written.
    Pointer(Box<Kind>),
    Sequence(Box<Kind>),
    /// String-keyed map. Populated from documents only.
    Map(Box<Kind>),
    Unsupported(&'static str),
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Bool => f.write_str("bool"),
            Kind::Int => f.write_str("int"),
            Kind::Uint => f.write_str("uint"),
            Kind::Float => f.write_str("float"),
            Kind::Str => f.write_str("string"),
            Kind::Duration => f.write_str("duration"),
            Kind::Timestamp => f.write_str("timestamp"),
            Kind::Pattern => f.write_str("pattern"),
            Kind::Pointer(inner) => write!(f, "optional {}", inner),
            Kind::Sequence(inner) => write!(f, "sequence of {}", inner),
            Kind::Map(inner) => write!(f, "map of {}", inner),
            Kind::Unsupported(name) => f.write_str(name),
        }
    }
}

/// A value produced by coercion, shaped after the [`Kind`] it was parsed for.
#[derive(Debug, Clone)]
pub enum Parsed {
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Str(String),
    /// Signed nanoseconds.
    Duration(i64),
    Timestamp(DateTime<FixedOffset>),
    Pattern(Regex),
    Seq(Vec<Parsed>),
    Map(BTreeMap<String, Parsed>),
    /// An absent optional value, e.g. a `null` element of `Vec<Option<T>>`.
    Null,
}

impl Parsed {
    pub fn type_name(&self) -> &'static str {
        match self {
            Parsed::Bool(_) => "bool",
            Parsed::Int(_) => "int",
            Parsed::Uint(_) => "uint",
            Parsed::Float(_) => "float",
            Parsed::Str(_) => "string",
            Parsed::Duration(_) => "duration",
            Parsed::Timestamp(_) => "timestamp",
            Parsed::Pattern(_) => "pattern",
            Parsed::Seq(_) => "sequence",
            Parsed::Map(_) => "map",
            Parsed::Null => "null",
        }
    }
}

/// A type that can be set from a coerced value.
pub trait Leaf: Sized {
    fn kind() -> Kind;

    /// Whether the current value counts as unset.
    fn is_zero(&self) -> bool;

    fn from_parsed(value: Parsed) -> Result<Self, CoerceError>;
}

/// Object-safe accessor over a [`Leaf`] location.
pub trait Slot {
    fn declared_kind(&self) -> Kind;
    fn is_unset(&self) -> bool;
    fn assign(&mut self, value: Parsed) -> Result<(), CoerceError>;
}

impl<T: Leaf> Slot for T {
    fn declared_kind(&self) -> Kind {
        T::kind()
    }

    fn is_unset(&self) -> bool {
        self.is_zero()
    }

    fn assign(&mut self, value: Parsed) -> Result<(), CoerceError> {
        *self = T::from_parsed(value)?;
        Ok(())
    }
}

fn mismatch(expected: Kind, found: &Parsed) -> CoerceError {
    CoerceError::Mismatch {
        expected,
        found: found.type_name(),
    }
}

impl Leaf for bool {
    fn kind() -> Kind {
        Kind::Bool
    }

    fn is_zero(&self) -> bool {
        !*self
    }

    fn from_parsed(value: Parsed) -> Result<Self, CoerceError> {
        match value {
            Parsed::Bool(b) => Ok(b),
            other => Err(mismatch(Kind::Bool, &other)),
        }
    }
}

macro_rules! signed_leaf {
    ($($t:ty),*) => {$(
        impl Leaf for $t {
            fn kind() -> Kind {
                Kind::Int
            }

            fn is_zero(&self) -> bool {
                *self == 0
            }

            fn from_parsed(value: Parsed) -> Result<Self, CoerceError> {
                match value {
                    Parsed::Int(i) => <$t>::try_from(i).map_err(|_| CoerceError::OutOfRange {
                        value: i.to_string(),
                        target: stringify!($t),
                    }),
                    other => Err(mismatch(Kind::Int, &other)),
                }
            }
        }
    )*};
}

macro_rules! unsigned_leaf {
    ($($t:ty),*) => {$(
        impl Leaf for $t {
            fn kind() -> Kind {
                Kind::Uint
            }

            fn is_zero(&self) -> bool {
                *self == 0
            }

            fn from_parsed(value: Parsed) -> Result<Self, CoerceError> {
                match value {
                    Parsed::Uint(u) => <$t>::try_from(u).map_err(|_| CoerceError::OutOfRange {
                        value: u.to_string(),
                        target: stringify!($t),
                    }),
                    other => Err(mismatch(Kind::Uint, &other)),
                }
            }
        }
    )*};
}

signed_leaf!(i8, i16, i32, i64, isize);
unsigned_leaf!(u8, u16, u32, u64, usize);

impl Leaf for f64 {
    fn kind() -> Kind {
        Kind::Float
    }

    fn is_zero(&self) -> bool {
        *self == 0.0
    }

    fn from_parsed(value: Parsed) -> Result<Self, CoerceError> {
        match value {
            Parsed::Float(f) => Ok(f),
            other => Err(mismatch(Kind::Float, &other)),
        }
    }
}

impl Leaf for f32 {
    fn kind() -> Kind {
        Kind::Float
    }

    fn is_zero(&self) -> bool {
        *self == 0.0
    }

    fn from_parsed(value: Parsed) -> Result<Self, CoerceError> {
        match value {
            Parsed::Float(f) if f.is_finite() && f.abs() > f32::MAX as f64 => {
                Err(CoerceError::OutOfRange {
                    value: f.to_string(),
                    target: "f32",
                })
            }
            Parsed::Float(f) => Ok(f as f32),
            other => Err(mismatch(Kind::Float, &other)),
        }
    }
}

impl Leaf for String {
    fn kind() -> Kind {
        Kind::Str
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }

    fn from_parsed(value: Parsed) -> Result<Self, CoerceError> {
        match value {
            Parsed::Str(s) => Ok(s),
            other => Err(mismatch(Kind::Str, &other)),
        }
    }
}

impl Leaf for PathBuf {
    fn kind() -> Kind {
        Kind::Str
    }

    fn is_zero(&self) -> bool {
        self.as_os_str().is_empty()
    }

    fn from_parsed(value: Parsed) -> Result<Self, CoerceError> {
        String::from_parsed(value).map(PathBuf::from)
    }
}

impl Leaf for std::time::Duration {
    fn kind() -> Kind {
        Kind::Duration
    }

    fn is_zero(&self) -> bool {
        self.is_zero()
    }

    fn from_parsed(value: Parsed) -> Result<Self, CoerceError> {
        match value {
            Parsed::Duration(nanos) if nanos < 0 => Err(CoerceError::NegativeDuration(nanos)),
            Parsed::Duration(nanos) => Ok(std::time::Duration::from_nanos(nanos as u64)),
            other => Err(mismatch(Kind::Duration, &other)),
        }
    }
}

impl Leaf for TimeDelta {
    fn kind() -> Kind {
        Kind::Duration
    }

    fn is_zero(&self) -> bool {
        self.is_zero()
    }

    fn from_parsed(value: Parsed) -> Result<Self, CoerceError> {
        match value {
            Parsed::Duration(nanos) => Ok(TimeDelta::nanoseconds(nanos)),
            other => Err(mismatch(Kind::Duration, &other)),
        }
    }
}

impl Leaf for DateTime<FixedOffset> {
    fn kind() -> Kind {
        Kind::Timestamp
    }

    fn is_zero(&self) -> bool {
        self.timestamp() == 0 && self.timestamp_subsec_nanos() == 0
    }

    fn from_parsed(value: Parsed) -> Result<Self, CoerceError> {
        match value {
            Parsed::Timestamp(ts) => Ok(ts),
            other => Err(mismatch(Kind::Timestamp, &other)),
        }
    }
}

impl Leaf for DateTime<Utc> {
    fn kind() -> Kind {
        Kind::Timestamp
    }

    fn is_zero(&self) -> bool {
        self.timestamp() == 0 && self.timestamp_subsec_nanos() == 0
    }

    fn from_parsed(value: Parsed) -> Result<Self, CoerceError> {
        DateTime::<FixedOffset>::from_parsed(value).map(|ts| ts.with_timezone(&Utc))
    }
}

impl Leaf for Regex {
    fn kind() -> Kind {
        Kind::Pattern
    }

    fn is_zero(&self) -> bool {
        self.as_str().is_empty()
    }

    fn from_parsed(value: Parsed) -> Result<Self, CoerceError> {
        match value {
            Parsed::Pattern(re) => Ok(re),
            other => Err(mismatch(Kind::Pattern, &other)),
        }
    }
}

impl<T: Leaf> Leaf for Option<T> {
    fn kind() -> Kind {
        Kind::Pointer(Box::new(T::kind()))
    }

    fn is_zero(&self) -> bool {
        self.is_none()
    }

    fn from_parsed(value: Parsed) -> Result<Self, CoerceError> {
        match value {
            Parsed::Null => Ok(None),
            other => T::from_parsed(other).map(Some),
        }
    }
}

impl<T: Leaf> Leaf for Vec<T> {
    fn kind() -> Kind {
        Kind::Sequence(Box::new(T::kind()))
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }

    fn from_parsed(value: Parsed) -> Result<Self, CoerceError> {
        match value {
            Parsed::Seq(items) => items.into_iter().map(T::from_parsed).collect(),
            other => Err(mismatch(Self::kind(), &other)),
        }
    }
}

impl<V: Leaf, S: BuildHasher + Default> Leaf for HashMap<String, V, S> {
    fn kind() -> Kind {
        Kind::Map(Box::new(V::kind()))
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }

    fn from_parsed(value: Parsed) -> Result<Self, CoerceError> {
        match value {
            Parsed::Map(entries) => entries
                .into_iter()
                .map(|(k, v)| V::from_parsed(v).map(|v| (k, v)))
                .collect(),
            other => Err(mismatch(Self::kind(), &other)),
        }
    }
}

impl<V: Leaf> Leaf for BTreeMap<String, V> {
    fn kind() -> Kind {
        Kind::Map(Box::new(V::kind()))
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }

    fn from_parsed(value: Parsed) -> Result<Self, CoerceError> {
        match value {
            Parsed::Map(entries) => entries
                .into_iter()
                .map(|(k, v)| V::from_parsed(v).map(|v| (k, v)))
                .collect(),
            other => Err(mismatch(Self::kind(), &other)),
        }
    }
}
