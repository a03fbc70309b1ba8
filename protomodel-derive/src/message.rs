//! Code generation for `#[derive(ProtoMessage)]`.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{DeriveInput, Result};

use crate::attr::{collect_fields, StructAttrs};
use crate::decode::from_value_body;
use crate::encode::to_value_body;
use crate::schema::declaration_body;

/// Generate the `ProtoType` and `ProtoMessage` implementations for a struct.
pub fn derive_message(input: &DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;
    let struct_attrs = StructAttrs::from_attrs(&input.attrs)?;
    let record = struct_attrs.name.unwrap_or_else(|| name.to_string());

    let fields = collect_fields(input, "ProtoMessage")?;

    let to_value = to_value_body(&fields);
    let from_value = from_value_body(&record, &fields);
    let declaration = declaration_body(&record, &fields);

    Ok(quote! {
        impl ::protomodel::ProtoType for #name {
            fn declared_type() -> ::protomodel::types::DeclaredType {
                ::protomodel::types::DeclaredType::Message(
                    ::protomodel::types::MessageRef::of::<Self>()
                )
            }

            fn to_value(&self) -> ::protomodel::Value {
                #to_value
            }

            fn from_value(
                value: ::protomodel::Value,
            ) -> ::core::result::Result<Self, ::protomodel::DecodeError> {
                #from_value
            }
        }

        impl ::protomodel::ProtoMessage for #name {
            const NAME: &'static str = #record;

            fn declaration() -> ::protomodel::types::RecordDecl {
                #declaration
            }
        }
    })
}
