//! `#[config(...)]` field attribute parsing.

use proc_macro2::Span;
use syn::spanned::Spanned;
use syn::{Attribute, Lit, LitStr};

/// Tag that `name = "..."` registers under.
pub const DEFAULT_TAG: &str = "config";

#[derive(Default)]
pub struct FieldAttrs {
    /// Alternate names keyed by tag.
    pub names: Vec<(String, LitStr)>,
    pub default: Option<LitStr>,
    pub required: bool,
    pub flatten: bool,
    pub skip: bool,
}

impl FieldAttrs {
    pub fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut out = FieldAttrs::default();
        let mut span = None;
        for attr in attrs.iter().filter(|a| a.path().is_ident("config")) {
            span.get_or_insert_with(|| attr.span());
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    let name: LitStr = meta.value()?.parse()?;
                    out.add_name(DEFAULT_TAG.to_string(), name)
                } else if meta.path.is_ident("rename") {
                    meta.parse_nested_meta(|inner| {
                        let tag = match inner.path.get_ident() {
                            Some(ident) => ident.to_string(),
                            None => return Err(inner.error("expected a tag key")),
                        };
                        let name: LitStr = inner.value()?.parse()?;
                        out.add_name(tag, name)
                    })
                } else if meta.path.is_ident("default") {
                    if out.default.is_some() {
                        return Err(meta.error("duplicate `default`"));
                    }
                    let lit: Lit = meta.value()?.parse()?;
                    out.default = Some(default_literal(&lit)?);
                    Ok(())
                } else if meta.path.is_ident("required") {
                    out.required = true;
                    Ok(())
                } else if meta.path.is_ident("flatten") {
                    out.flatten = true;
                    Ok(())
                } else if meta.path.is_ident("skip") {
                    out.skip = true;
                    Ok(())
                } else {
                    Err(meta.error(
                        "unknown config attribute, expected one of: name, rename, default, required, flatten, skip",
                    ))
                }
            })?;
        }

        let span = span.unwrap_or_else(Span::call_site);
        if out.skip && (out.required || out.default.is_some() || out.flatten) {
            return Err(syn::Error::new(
                span,
                "`skip` cannot be combined with `required`, `default` or `flatten`",
            ));
        }
        if out.flatten && (out.required || out.default.is_some()) {
            return Err(syn::Error::new(
                span,
                "a flattened section cannot be `required` or have a `default`",
            ));
        }
        Ok(out)
    }

    fn add_name(&mut self, tag: String, name: LitStr) -> syn::Result<()> {
        if self.names.iter().any(|(t, _)| *t == tag) {
            return Err(syn::Error::new(
                name.span(),
                format!("duplicate name for tag `{}`", tag),
            ));
        }
        if name.value().is_empty() {
            return Err(syn::Error::new(name.span(), "name cannot be empty"));
        }
        self.names.push((tag, name));
        Ok(())
    }
}

/// Defaults are coerced at load time, so every literal is kept as a string.
fn default_literal(lit: &Lit) -> syn::Result<LitStr> {
    let value = match lit {
        Lit::Str(s) => return Ok(s.clone()),
        Lit::Int(i) => i.base10_digits().to_string(),
        Lit::Float(f) => f.base10_digits().to_string(),
        Lit::Bool(b) => b.value.to_string(),
        Lit::Char(c) => c.value().to_string(),
        other => {
            return Err(syn::Error::new(
                other.span(),
                "default must be a string, number, bool or char literal",
            ));
        }
    };
    Ok(LitStr::new(&value, lit.span()))
}
