//! Code generation for `ProtoType::to_value`.

use proc_macro2::TokenStream;
use quote::quote;

use crate::attr::FieldInfo;

/// Body of `to_value`: one map insert per field, `None` options omitted.
pub fn to_value_body(fields: &[FieldInfo]) -> TokenStream {
    let inserts = fields.iter().filter(|f| !f.skip).map(|field| {
        let ident = &field.ident;
        let name = field.name();

        if field.is_optional() {
            quote! {
                if let ::core::option::Option::Some(value) = &self.#ident {
                    fields.insert(
                        ::std::string::String::from(#name),
                        ::protomodel::ProtoType::to_value(value),
                    );
                }
            }
        } else {
            quote! {
                fields.insert(
                    ::std::string::String::from(#name),
                    ::protomodel::ProtoType::to_value(&self.#ident),
                );
            }
        }
    });

    quote! {
        #[allow(unused_mut)]
        let mut fields = ::std::collections::BTreeMap::new();
        #(#inserts)*
        ::protomodel::Value::Message(fields)
    }
}
