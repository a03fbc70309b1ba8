//! Code generation for `ProtoType::from_value`.

use proc_macro2::TokenStream;
use quote::quote;

use crate::attr::{DefaultAttr, FieldInfo};

/// Body of `from_value`: take every field out of the decoded message.
///
/// Skipped fields are filled with `Default::default()`. Fields with a declared
/// default fall back to it when the message does not carry them.
pub fn from_value_body(record: &str, fields: &[FieldInfo]) -> TokenStream {
    let bindings = fields.iter().map(|field| {
        let ident = &field.ident;
        let name = field.name();
        let ty = &field.ty;

        let expr = if field.skip {
            quote! { ::core::default::Default::default() }
        } else if field.is_optional() {
            quote! { ::protomodel::traits::__private::take_optional(&mut __fields, #name)? }
        } else if let Some(default) = &field.default {
            let fallback = default_expr(default, ty);
            quote! {
                ::protomodel::traits::__private::take_or_else(&mut __fields, #name, || #fallback)?
            }
        } else {
            quote! {
                ::protomodel::traits::__private::take_required(&mut __fields, #record, #name)?
            }
        };

        quote! { let #ident: #ty = #expr; }
    });

    let idents = fields.iter().map(|f| &f.ident);

    quote! {
        #[allow(unused_mut, unused_variables)]
        let mut __fields = ::protomodel::traits::__private::take_message(value)?;
        #(#bindings)*
        ::core::result::Result::Ok(Self { #(#idents),* })
    }
}

/// Expression producing a field's declared default value.
pub fn default_expr(default: &DefaultAttr, ty: &syn::Type) -> TokenStream {
    match default {
        DefaultAttr::Trait => quote! { <#ty as ::core::default::Default>::default() },
        DefaultAttr::Path(path) => quote! { #path() },
    }
}
