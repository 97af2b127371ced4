//! Error types.
//!
//! Usage and source errors abort a load immediately. Per-field failures are
//! collected into [`FieldErrors`] so one load reports every violation.

use crate::duration::DurationError;
use crate::kind::Kind;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level error returned by [`Loader::load`](crate::Loader::load).
#[derive(Debug, Error)]
pub enum Error {
    /// File loading is disabled and so is the environment overlay.
    #[error("invalid sources: file loading and environment lookup are both disabled")]
    InvalidSources,

    /// None of the candidate files exist in any search directory.
    #[error("{}: file not found", .names.join(", "))]
    FileNotFound { names: Vec<String> },

    #[error("failed to read {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported file extension: {}", .path.display())]
    UnsupportedExtension { path: PathBuf },

    #[error("failed to parse {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Fields(#[from] FieldErrors),
}

impl Error {
    /// The per-field failures, if this is a resolution error.
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Error::Fields(errs) => Some(errs),
            _ => None,
        }
    }
}

/// Failure converting a raw value into a typed one.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoerceError {
    #[error("invalid boolean {0:?}")]
    InvalidBool(String),

    #[error("invalid integer {literal:?}: {reason}")]
    InvalidInt { literal: String, reason: String },

    #[error("invalid unsigned integer {literal:?}: {reason}")]
    InvalidUint { literal: String, reason: String },

    #[error("invalid float {literal:?}: {reason}")]
    InvalidFloat { literal: String, reason: String },

    #[error("value {value} out of range for {target}")]
    OutOfRange { value: String, target: &'static str },

    #[error(transparent)]
    InvalidDuration(#[from] DurationError),

    #[error("negative duration {0}ns cannot be stored in std::time::Duration")]
    NegativeDuration(i64),

    #[error("invalid timestamp {literal:?} for layout {layout}: {reason}")]
    InvalidTimestamp {
        literal: String,
        layout: String,
        reason: String,
    },

    #[error("invalid pattern {literal:?}: {reason}")]
    InvalidPattern { literal: String, reason: String },

    #[error("unsupported type {0}")]
    Unsupported(Kind),

    #[error("expected {expected}, found {found}")]
    Mismatch { expected: Kind, found: &'static str },
}

/// Failure resolving a single field.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FieldError {
    #[error("field cannot have both a required validation and a default value")]
    Conflict,

    #[error("required validation failed")]
    Required,

    #[error("unable to set from env {key}: {source}")]
    Env {
        key: String,
        #[source]
        source: CoerceError,
    },

    #[error("unable to set default: {source}")]
    Default {
        #[source]
        source: CoerceError,
    },

    #[error("unable to set default: bool fields cannot have a default value")]
    DefaultOnBool,
}

/// Per-field failures keyed by rendered field path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldErrors(BTreeMap<String, FieldError>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, err: FieldError) {
        self.0.insert(path.into(), err);
    }

    pub fn get(&self, path: &str) -> Option<&FieldError> {
        self.0.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.0.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Failing paths in sorted order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldError)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (path, err) in &self.0 {
            if !first {
                f.write_str(", ")?;
            }
            first = false;
            write!(f, "{}: {}", path, err)?;
        }
        Ok(())
    }
}

impl std::error::Error for FieldErrors {}

/// Failure assigning a decoded document into the target.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeError {
    /// Document path of the offending value.
    pub path: String,
    pub kind: DecodeErrorKind,
}

impl DecodeError {
    pub fn new(path: impl Into<String>, kind: DecodeErrorKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    pub fn at(path: &crate::field::FieldPath, kind: DecodeErrorKind) -> Self {
        Self::new(path.to_string(), kind)
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "<root>: {}", self.kind)
        } else {
            write!(f, "{}: {}", self.path, self.kind)
        }
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeErrorKind {
    #[error(transparent)]
    Coerce(#[from] CoerceError),

    #[error("expected a map, found {0}")]
    ExpectedMap(&'static str),

    #[error("expected a sequence, found {0}")]
    ExpectedSequence(&'static str),

    #[error("has invalid keys: {}", .0.join(", "))]
    UnknownKeys(Vec<String>),
}
