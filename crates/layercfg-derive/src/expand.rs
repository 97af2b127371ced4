use crate::attr::FieldAttrs;
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::ext::IdentExt;
use syn::{Data, DeriveInput, Fields, GenericArgument, Ident, PathArguments, Type};

/// How a field's type is handed to `Node`.
enum Shape<'a> {
    Plain(&'a Type),
    Optional(&'a Type),
    Sequence(&'a Type),
    /// `Vec<Option<T>>`, handed to `T` so sections can recurse per element.
    SequenceOptional(&'a Type),
}

impl<'a> Shape<'a> {
    fn of(ty: &'a Type) -> Self {
        if let Some(inner) = single_type_arg(ty, "Option") {
            Shape::Optional(inner)
        } else if let Some(inner) = single_type_arg(ty, "Vec") {
            match single_type_arg(inner, "Option") {
                Some(element) => Shape::SequenceOptional(element),
                None => Shape::Sequence(inner),
            }
        } else {
            Shape::Plain(ty)
        }
    }
}

/// `T` when `ty` is `Wrapper<T>`, matched on the last path segment.
fn single_type_arg<'a>(ty: &'a Type, wrapper: &str) -> Option<&'a Type> {
    let Type::Path(path) = ty else { return None };
    if path.qself.is_some() {
        return None;
    }
    let segment = path.path.segments.last()?;
    if segment.ident != wrapper {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    if args.args.len() != 1 {
        return None;
    }
    match args.args.first()? {
        GenericArgument::Type(inner) => Some(inner),
        _ => None,
    }
}

struct ConfigField<'a> {
    member: &'a Ident,
    binding: Ident,
    ty: &'a Type,
    attrs: FieldAttrs,
}

pub fn derive_config(input: &DeriveInput) -> syn::Result<TokenStream> {
    let name = &input.ident;
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Config cannot be derived for generic structs",
        ));
    }
    let named = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => named,
            _ => {
                return Err(syn::Error::new_spanned(
                    name,
                    "Config can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                name,
                "Config can only be derived for structs",
            ));
        }
    };

    let mut fields = Vec::new();
    for (i, field) in named.named.iter().enumerate() {
        let attrs = FieldAttrs::parse(&field.attrs)?;
        if attrs.skip {
            continue;
        }
        let Some(member) = field.ident.as_ref() else {
            continue;
        };
        if attrs.flatten && !matches!(Shape::of(&field.ty), Shape::Plain(_)) {
            return Err(syn::Error::new_spanned(
                &field.ty,
                "only a plain struct field can be flattened",
            ));
        }
        fields.push(ConfigField {
            member,
            binding: format_ident!("__field{}", i),
            ty: &field.ty,
            attrs,
        });
    }

    let metas = fields.iter().map(field_meta);
    let count = fields.len();

    let members = fields.iter().map(|f| f.member);
    let bindings = fields.iter().map(|f| &f.binding);
    let destructure = if fields.is_empty() {
        quote!()
    } else {
        quote! { let Self { #(#members: #bindings,)* .. } = self; }
    };

    let collects = fields.iter().enumerate().map(|(i, f)| collect_field(i, f));
    let decodes = fields.iter().enumerate().map(|(i, f)| decode_field(i, f));
    let names = fields.iter().enumerate().map(|(i, f)| field_name(i, f));

    Ok(quote! {
        const _: () = {
            #[allow(dead_code)]
            static __FIELDS: [::layercfg::FieldMeta; #count] = [#(#metas),*];

            #[automatically_derived]
            impl ::layercfg::Section for #name {
                #[allow(unused_variables)]
                fn collect_fields<'__a>(
                    &'__a mut self,
                    __path: &::layercfg::FieldPath,
                    __walker: &::layercfg::Walker<'_>,
                    __out: &mut ::std::vec::Vec<::layercfg::Field<'__a>>,
                ) {
                    #destructure
                    #(#collects)*
                }

                #[allow(unused_variables)]
                fn decode_fields(
                    &mut self,
                    __table: &::layercfg::decode::Table,
                    __path: &::layercfg::FieldPath,
                    __cx: &::layercfg::DecodeContext<'_>,
                ) -> ::std::result::Result<(), ::layercfg::DecodeError> {
                    #destructure
                    #(#decodes)*
                    ::std::result::Result::Ok(())
                }

                #[allow(unused_variables)]
                fn field_names(__tag: &str, __out: &mut ::std::vec::Vec<&'static str>) {
                    #(#names)*
                }
            }

            #[automatically_derived]
            impl ::layercfg::Node for #name {
                fn collect<'__a>(
                    &'__a mut self,
                    path: ::layercfg::FieldPath,
                    meta: &'static ::layercfg::FieldMeta,
                    walker: &::layercfg::Walker<'_>,
                    out: &mut ::std::vec::Vec<::layercfg::Field<'__a>>,
                ) {
                    ::layercfg::flatten::section::collect(self, path, meta, walker, out)
                }

                fn collect_optional<'__a>(
                    slot: &'__a mut ::std::option::Option<Self>,
                    path: ::layercfg::FieldPath,
                    meta: &'static ::layercfg::FieldMeta,
                    walker: &::layercfg::Walker<'_>,
                    out: &mut ::std::vec::Vec<::layercfg::Field<'__a>>,
                ) {
                    ::layercfg::flatten::section::collect_optional(slot, path, meta, walker, out)
                }

                fn collect_sequence<'__a>(
                    items: &'__a mut ::std::vec::Vec<Self>,
                    path: ::layercfg::FieldPath,
                    meta: &'static ::layercfg::FieldMeta,
                    walker: &::layercfg::Walker<'_>,
                    out: &mut ::std::vec::Vec<::layercfg::Field<'__a>>,
                ) {
                    ::layercfg::flatten::section::collect_sequence(items, path, meta, walker, out)
                }

                fn collect_sequence_optional<'__a>(
                    items: &'__a mut ::std::vec::Vec<::std::option::Option<Self>>,
                    path: ::layercfg::FieldPath,
                    meta: &'static ::layercfg::FieldMeta,
                    walker: &::layercfg::Walker<'_>,
                    out: &mut ::std::vec::Vec<::layercfg::Field<'__a>>,
                ) {
                    ::layercfg::flatten::section::collect_sequence_optional(items, path, meta, walker, out)
                }

                fn decode(
                    &mut self,
                    value: &::layercfg::decode::Value,
                    path: &::layercfg::FieldPath,
                    cx: &::layercfg::DecodeContext<'_>,
                ) -> ::std::result::Result<(), ::layercfg::DecodeError> {
                    ::layercfg::flatten::section::decode(self, value, path, cx)
                }

                fn decode_optional(
                    slot: &mut ::std::option::Option<Self>,
                    value: &::layercfg::decode::Value,
                    path: &::layercfg::FieldPath,
                    cx: &::layercfg::DecodeContext<'_>,
                ) -> ::std::result::Result<(), ::layercfg::DecodeError> {
                    ::layercfg::flatten::section::decode_optional(slot, value, path, cx)
                }

                fn decode_sequence(
                    items: &mut ::std::vec::Vec<Self>,
                    value: &::layercfg::decode::Value,
                    path: &::layercfg::FieldPath,
                    cx: &::layercfg::DecodeContext<'_>,
                ) -> ::std::result::Result<(), ::layercfg::DecodeError> {
                    ::layercfg::flatten::section::decode_sequence(items, value, path, cx)
                }

                fn decode_sequence_optional(
                    items: &mut ::std::vec::Vec<::std::option::Option<Self>>,
                    value: &::layercfg::decode::Value,
                    path: &::layercfg::FieldPath,
                    cx: &::layercfg::DecodeContext<'_>,
                ) -> ::std::result::Result<(), ::layercfg::DecodeError> {
                    ::layercfg::flatten::section::decode_sequence_optional(items, value, path, cx)
                }
            }
        };
    })
}

fn field_meta(field: &ConfigField<'_>) -> TokenStream {
    let ident = field.member.unraw().to_string();
    let names = field.attrs.names.iter().map(|(tag, name)| quote!((#tag, #name)));
    let required = field.attrs.required;
    let default = match &field.attrs.default {
        Some(lit) => quote!(::std::option::Option::Some(#lit)),
        None => quote!(::std::option::Option::None),
    };
    let flatten = field.attrs.flatten;
    quote! {
        ::layercfg::FieldMeta {
            ident: #ident,
            names: &[#(#names),*],
            required: #required,
            default: #default,
            flatten: #flatten,
        }
    }
}

fn collect_field(index: usize, field: &ConfigField<'_>) -> TokenStream {
    let binding = &field.binding;
    if field.attrs.flatten {
        let ty = field.ty;
        return quote! {
            {
                let __child = match __FIELDS[#index].alt_name(__walker.tag()) {
                    ::std::option::Option::Some(__name) => __path.child(__name),
                    ::std::option::Option::None => __path.clone(),
                };
                <#ty as ::layercfg::Section>::collect_fields(#binding, &__child, __walker, __out);
            }
        };
    }
    let call = match Shape::of(field.ty) {
        Shape::Plain(ty) => quote!(<#ty as ::layercfg::Node>::collect),
        Shape::Optional(ty) => quote!(<#ty as ::layercfg::Node>::collect_optional),
        Shape::Sequence(ty) => quote!(<#ty as ::layercfg::Node>::collect_sequence),
        Shape::SequenceOptional(ty) => {
            quote!(<#ty as ::layercfg::Node>::collect_sequence_optional)
        }
    };
    quote! {
        #call(
            #binding,
            __walker.path_for(__path, &__FIELDS[#index]),
            &__FIELDS[#index],
            __walker,
            __out,
        );
    }
}

fn decode_field(index: usize, field: &ConfigField<'_>) -> TokenStream {
    let binding = &field.binding;
    if field.attrs.flatten {
        let ty = field.ty;
        return quote! {
            match __FIELDS[#index].alt_name(__cx.tag()) {
                ::std::option::Option::None => {
                    <#ty as ::layercfg::Section>::decode_fields(#binding, __table, __path, __cx)?;
                }
                ::std::option::Option::Some(_) => {
                    if let ::std::option::Option::Some((__key, __value)) =
                        __cx.lookup(__table, &__FIELDS[#index])
                    {
                        ::layercfg::flatten::section::decode(
                            #binding,
                            __value,
                            &__path.child(__key),
                            __cx,
                        )?;
                    }
                }
            }
        };
    }
    let call = match Shape::of(field.ty) {
        Shape::Plain(ty) => quote!(<#ty as ::layercfg::Node>::decode),
        Shape::Optional(ty) => quote!(<#ty as ::layercfg::Node>::decode_optional),
        Shape::Sequence(ty) => quote!(<#ty as ::layercfg::Node>::decode_sequence),
        Shape::SequenceOptional(ty) => {
            quote!(<#ty as ::layercfg::Node>::decode_sequence_optional)
        }
    };
    quote! {
        if let ::std::option::Option::Some((__key, __value)) =
            __cx.lookup(__table, &__FIELDS[#index])
        {
            #call(#binding, __value, &__path.child(__key), __cx)?;
        }
    }
}

fn field_name(index: usize, field: &ConfigField<'_>) -> TokenStream {
    if field.attrs.flatten {
        let ty = field.ty;
        return quote! {
            match __FIELDS[#index].alt_name(__tag) {
                ::std::option::Option::Some(__name) => __out.push(__name),
                ::std::option::Option::None => {
                    <#ty as ::layercfg::Section>::field_names(__tag, __out)
                }
            }
        };
    }
    quote! {
        __out.push(__FIELDS[#index].name(__tag));
    }
}
