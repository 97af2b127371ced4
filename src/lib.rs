//! Layered configuration loading.
//!
//! A configuration struct derives [`Config`] and is populated from, in order:
//!
//! 1. configuration files (YAML, JSON or TOML), later files winning;
//! 2. environment variables named after each field's path, when enabled;
//! 3. `required` checks and `default` literals declared on the fields.
//!
//! ```no_run
//! use layercfg::Config;
//! use std::time::Duration;
//!
//! #[derive(Debug, Default, Config)]
//! struct Server {
//!     #[config(default = "127.0.0.1")]
//!     host: String,
//!     #[config(required)]
//!     port: u16,
//!     #[config(name = "read_timeout", default = "30s")]
//!     timeout: Duration,
//! }
//!
//! let mut server = Server::default();
//! layercfg::load(&mut server)?;
//! # Ok::<(), layercfg::Error>(())
//! ```

extern crate self as layercfg;

pub mod cli;
pub mod coerce;
pub mod decode;
pub mod duration;
pub mod env;
pub mod error;
pub mod field;
pub mod flatten;
pub mod kind;
pub mod loader;
pub mod merge;
pub mod resolve;
pub mod sequence;
pub mod source;

pub use coerce::{Coercer, TimeLayout};
pub use decode::DecodeContext;
pub use duration::parse_duration;
pub use env::{EnvSource, ProcessEnv, format_env_key};
pub use error::{CoerceError, DecodeError, DecodeErrorKind, Error, FieldError, FieldErrors};
pub use field::{Field, FieldMeta, FieldPath, Segment};
pub use flatten::{Node, Section, Walker};
pub use kind::{Kind, Leaf, Parsed, Slot};
pub use layercfg_derive::Config;
pub use loader::{Loader, load};
pub use sequence::split_sequence;
