//! Code generation for `ProtoMessage::declaration`.

use proc_macro2::TokenStream;
use quote::quote;

use crate::attr::FieldInfo;
use crate::decode::default_expr;

/// Body of `declaration`: a `FieldDecl` per non-skipped field, in order.
pub fn declaration_body(record: &str, fields: &[FieldInfo]) -> TokenStream {
    let decls = fields.iter().filter(|f| !f.skip).map(field_decl);

    quote! {
        ::protomodel::types::RecordDecl {
            name: #record,
            fields: ::std::vec![#(#decls),*],
        }
    }
}

fn field_decl(field: &FieldInfo) -> TokenStream {
    let name = field.name();
    let ty = &field.ty;

    let declared = match &field.option_inner {
        Some(inner) => quote! {
            ::protomodel::types::DeclaredType::optional(
                <#inner as ::protomodel::ProtoType>::declared_type()
            )
        },
        None => quote! { <#ty as ::protomodel::ProtoType>::declared_type() },
    };

    let number = if field.explicit_number {
        let n = field.number;
        quote! { .with_number(#n) }
    } else {
        quote! {}
    };

    let decl = quote! {
        ::protomodel::types::FieldDecl::new(#name, #declared) #number
    };

    match &field.default {
        None => decl,
        Some(default) => {
            let expr = default_expr(default, ty);
            if field.is_optional() {
                // `None` as a default leaves the field merely optional.
                quote! {
                    match #expr {
                        ::core::option::Option::Some(value) => {
                            #decl.with_default(::protomodel::ProtoType::to_value(&value))
                        }
                        ::core::option::Option::None => #decl,
                    }
                }
            } else {
                quote! {
                    #decl.with_default(::protomodel::ProtoType::to_value(&#expr))
                }
            }
        }
    }
}
