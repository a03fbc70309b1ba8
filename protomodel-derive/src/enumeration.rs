//! Code generation for `#[derive(ProtoEnum)]`.

use std::collections::HashMap;

use proc_macro2::{Literal, TokenStream};
use quote::quote;
use syn::{Data, DeriveInput, Expr, ExprLit, Fields, Lit, Result};

use crate::attr::StructAttrs;

/// Generate `ProtoEnum` and `ProtoType` for a field-less enum.
///
/// Ordinals follow Rust's discriminant rules: an explicit integer literal, or
/// one more than the previous variant (starting at 0).
pub fn derive_enum(input: &DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;
    let attrs = StructAttrs::from_attrs(&input.attrs)?;
    let enum_name = attrs.name.unwrap_or_else(|| name.to_string());

    let data = match &input.data {
        Data::Enum(data) => data,
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "ProtoEnum only supports enums",
            ))
        }
    };

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "ProtoEnum does not support generic enums",
        ));
    }

    let mut next = 0u64;
    let mut seen: HashMap<u64, &syn::Ident> = HashMap::new();
    let mut variants = Vec::with_capacity(data.variants.len());

    for variant in &data.variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(
                variant,
                "ProtoEnum variants must not carry fields",
            ));
        }

        let ordinal = match &variant.discriminant {
            Some((_, Expr::Lit(ExprLit {
                lit: Lit::Int(lit), ..
            }))) => lit.base10_parse::<u64>()?,
            Some((_, expr)) => {
                return Err(syn::Error::new_spanned(
                    expr,
                    "discriminant must be a non-negative integer literal",
                ))
            }
            None => next,
        };

        if let Some(previous) = seen.insert(ordinal, &variant.ident) {
            return Err(syn::Error::new_spanned(
                variant,
                format!("duplicate ordinal {} (also used by '{}')", ordinal, previous),
            ));
        }

        next = ordinal.wrapping_add(1);
        variants.push((&variant.ident, Literal::u64_unsuffixed(ordinal)));
    }

    let to_ordinal = variants.iter().map(|(ident, ord)| quote! { Self::#ident => #ord });
    let from_ordinal = variants
        .iter()
        .map(|(ident, ord)| quote! { #ord => ::core::option::Option::Some(Self::#ident) });

    Ok(quote! {
        impl ::protomodel::ProtoEnum for #name {
            const NAME: &'static str = #enum_name;

            fn ordinal(self) -> u64 {
                match self {
                    #(#to_ordinal,)*
                }
            }

            fn from_ordinal(ordinal: u64) -> ::core::option::Option<Self> {
                match ordinal {
                    #(#from_ordinal,)*
                    _ => ::core::option::Option::None,
                }
            }
        }

        impl ::protomodel::ProtoType for #name {
            fn declared_type() -> ::protomodel::types::DeclaredType {
                ::protomodel::types::DeclaredType::Enum(#enum_name)
            }

            fn to_value(&self) -> ::protomodel::Value {
                ::protomodel::Value::Int(::protomodel::ProtoEnum::ordinal(*self))
            }

            fn from_value(
                value: ::protomodel::Value,
            ) -> ::core::result::Result<Self, ::protomodel::DecodeError> {
                ::protomodel::traits::__private::enum_from_value(value)
            }
        }
    })
}
