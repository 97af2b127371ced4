//! Derive macro for `layercfg` configuration structs.
//!
//! `#[derive(Config)]` implements `layercfg::Section` and `layercfg::Node`
//! for a struct with named fields. Field attributes:
//!
//! - `#[config(name = "x")]`: alternate name under the default `config` tag.
//! - `#[config(rename(yaml = "x", env = "y"))]`: alternate names under other tags.
//! - `#[config(default = "lit")]`: literal applied when the field is still zero.
//! - `#[config(required)]`: the field must be non-zero after loading.
//! - `#[config(flatten)]`: merge a nested section into this one.
//! - `#[config(skip)]`: leave the field out of loading entirely.

mod attr;
mod expand;

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

#[proc_macro_derive(Config, attributes(config))]
pub fn derive_config(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand::derive_config(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
