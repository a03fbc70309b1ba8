//! Attribute parsing for protomodel derive macros.

use proc_macro2::Span;
use syn::ext::IdentExt;
use syn::{
    Attribute, Data, DeriveInput, Expr, ExprLit, ExprPath, Fields, GenericArgument, Ident, Lit,
    PathArguments, Result, Type,
};

/// How a field's declared default is produced.
#[derive(Clone)]
pub enum DefaultAttr {
    /// `#[proto(default)]`: `Default::default()`.
    Trait,
    /// `#[proto(default = "path")]`: call `path()`.
    Path(ExprPath),
}

/// Parsed field attributes from #[proto(...)]
#[derive(Default)]
pub struct FieldAttrs {
    /// Explicit wire field number overriding the declaration position.
    pub number: Option<u32>,
    /// Whether to leave this field out of the schema.
    pub skip: bool,
    /// Declared default, which makes the field optional.
    pub default: Option<DefaultAttr>,
}

impl FieldAttrs {
    /// Parse attributes from a field.
    pub fn from_attrs(attrs: &[Attribute]) -> Result<Self> {
        let mut result = FieldAttrs::default();

        for attr in attrs {
            if attr.path().is_ident("proto") {
                result.parse_proto_attr(attr)?;
            }
        }

        Ok(result)
    }

    fn parse_proto_attr(&mut self, attr: &Attribute) -> Result<()> {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("number") {
                let value: Expr = meta.value()?.parse()?;
                if let Expr::Lit(ExprLit {
                    lit: Lit::Int(lit), ..
                }) = value
                {
                    self.number = Some(lit.base10_parse()?);
                } else {
                    return Err(syn::Error::new_spanned(value, "expected integer literal"));
                }
            } else if meta.path.is_ident("skip") {
                self.skip = true;
            } else if meta.path.is_ident("default") {
                if meta.input.peek(syn::Token![=]) {
                    let value: Expr = meta.value()?.parse()?;
                    if let Expr::Lit(ExprLit {
                        lit: Lit::Str(lit), ..
                    }) = value
                    {
                        self.default = Some(DefaultAttr::Path(lit.parse()?));
                    } else {
                        return Err(syn::Error::new_spanned(
                            value,
                            "expected string literal naming a function",
                        ));
                    }
                } else {
                    self.default = Some(DefaultAttr::Trait);
                }
            } else {
                return Err(syn::Error::new_spanned(meta.path, "unknown proto attribute"));
            }
            Ok(())
        })
    }
}

/// Parsed struct-level attributes.
#[derive(Default)]
pub struct StructAttrs {
    /// Custom record name (defaults to struct name).
    pub name: Option<String>,
}

impl StructAttrs {
    /// Parse attributes from a struct.
    pub fn from_attrs(attrs: &[Attribute]) -> Result<Self> {
        let mut result = StructAttrs::default();

        for attr in attrs {
            if attr.path().is_ident("proto") {
                result.parse_proto_attr(attr)?;
            }
        }

        Ok(result)
    }

    fn parse_proto_attr(&mut self, attr: &Attribute) -> Result<()> {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                let value: Expr = meta.value()?.parse()?;
                if let Expr::Lit(ExprLit {
                    lit: Lit::Str(lit), ..
                }) = value
                {
                    self.name = Some(lit.value());
                } else {
                    return Err(syn::Error::new_spanned(value, "expected string literal"));
                }
            } else {
                return Err(syn::Error::new_spanned(meta.path, "unknown proto attribute"));
            }
            Ok(())
        })
    }
}

/// Field information collected from the struct definition.
#[derive(Clone)]
pub struct FieldInfo {
    pub ident: Ident,
    pub ty: Type,
    /// Inner `T` when the field is declared as `Option<T>`.
    pub option_inner: Option<Type>,
    /// Effective wire number (override or 1-based position).
    pub number: u32,
    /// Whether the number came from `#[proto(number = N)]`.
    pub explicit_number: bool,
    pub skip: bool,
    pub default: Option<DefaultAttr>,
    pub span: Span,
}

impl FieldInfo {
    /// Field name as it appears in schemas, with any `r#` prefix removed.
    pub fn name(&self) -> String {
        self.ident.unraw().to_string()
    }

    pub fn is_optional(&self) -> bool {
        self.option_inner.is_some()
    }
}

/// Collect named fields of a struct, assigning positional numbers.
///
/// Skipped fields do not consume a position.
pub fn collect_fields(input: &DeriveInput, derive: &str) -> Result<Vec<FieldInfo>> {
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    input,
                    format!("{} only supports structs with named fields", derive),
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                format!("{} only supports structs", derive),
            ))
        }
    };

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            format!("{} does not support generic structs", derive),
        ));
    }

    let mut position = 0u32;
    let mut result = Vec::with_capacity(fields.len());
    for field in fields {
        let ident = match &field.ident {
            Some(ident) => ident.clone(),
            None => return Err(syn::Error::new_spanned(field, "expected a named field")),
        };
        let attrs = FieldAttrs::from_attrs(&field.attrs)?;

        let number = if attrs.skip {
            0
        } else {
            position += 1;
            attrs.number.unwrap_or(position)
        };

        result.push(FieldInfo {
            span: ident.span(),
            ident,
            ty: field.ty.clone(),
            option_inner: option_inner(&field.ty).cloned(),
            number,
            explicit_number: attrs.number.is_some(),
            skip: attrs.skip,
            default: attrs.default,
        });
    }

    validate_fields(&result)?;
    Ok(result)
}

/// Return `T` if `ty` is spelled `Option<T>`.
pub fn option_inner(ty: &Type) -> Option<&Type> {
    if let Type::Path(type_path) = ty {
        if type_path.qself.is_none() {
            if let Some(segment) = type_path.path.segments.last() {
                if segment.ident == "Option" {
                    if let PathArguments::AngleBracketed(args) = &segment.arguments {
                        if let Some(GenericArgument::Type(inner)) = args.args.first() {
                            return Some(inner);
                        }
                    }
                }
            }
        }
    }
    None
}

/// Validate that wire numbers are positive and unique.
pub fn validate_fields(fields: &[FieldInfo]) -> Result<()> {
    use std::collections::HashMap;

    const MAX_FIELD_NUMBER: u32 = (1 << 29) - 1;
    let mut seen: HashMap<u32, &Ident> = HashMap::new();

    for field in fields {
        if field.skip {
            continue;
        }

        if field.number == 0 || field.number > MAX_FIELD_NUMBER {
            return Err(syn::Error::new(
                field.span,
                format!("field number {} is out of range", field.number),
            ));
        }

        if let Some(previous) = seen.insert(field.number, &field.ident) {
            return Err(syn::Error::new(
                field.span,
                format!(
                    "duplicate field number {} (also used by '{}')",
                    field.number, previous
                ),
            ));
        }
    }

    Ok(())
}
