//! Resolution of record declarations into wire schemas.
//!
//! Every declared field gets a wire number (its explicit override, or its
//! 1-based declaration position) and a kind/wire type inferred from its
//! declared type. Resolution is deterministic: a declaration always yields
//! the same schema or the same error.

use crate::error::SchemaError;
use crate::registry;
use crate::types::{
    DeclaredType, FieldDecl, FieldKind, FieldSchema, MessageSchema, RecordDecl, WireType,
    MAX_FIELD_NUMBER,
};

/// Map key entry sub-field number.
pub const MAP_KEY_NUMBER: u32 = 1;
/// Map value entry sub-field number.
pub const MAP_VALUE_NUMBER: u32 = 2;

/// Build the schema for a record declaration.
///
/// Nested record types are resolved (and cached) through the global
/// registry so their errors surface here, except for types that are already
/// being resolved further up the stack.
pub fn resolve(decl: &RecordDecl) -> Result<MessageSchema, SchemaError> {
    let mut fields = Vec::with_capacity(decl.fields.len());

    for (idx, field) in decl.fields.iter().enumerate() {
        let number = field.number.unwrap_or(idx as u32 + 1);
        if number == 0 || number > MAX_FIELD_NUMBER {
            return Err(SchemaError::InvalidFieldNumber {
                record: decl.name.to_string(),
                field: field.name.to_string(),
                number,
            });
        }

        let ctx = FieldContext { decl, field };
        let (ty, admits_absent) = ctx.unwrap_optional()?;
        let (kind, wire_type) = ctx.resolve_kind(ty, number, false)?;

        fields.push(FieldSchema {
            number,
            name: field.name.to_string(),
            kind,
            wire_type,
            is_optional: admits_absent || field.default.is_some(),
            default_value: field.default.clone(),
        });
    }

    fields.sort_by_key(|f| f.number);
    if let Some(pair) = fields.windows(2).find(|w| w[0].number == w[1].number) {
        return Err(SchemaError::DuplicateFieldNumber {
            record: decl.name.to_string(),
            number: pair[0].number,
            first: pair[0].name.clone(),
            second: pair[1].name.clone(),
        });
    }

    Ok(MessageSchema {
        name: decl.name.to_string(),
        fields,
    })
}

struct FieldContext<'a> {
    decl: &'a RecordDecl,
    field: &'a FieldDecl,
}

impl<'a> FieldContext<'a> {
    /// Strip optionality, returning the single present type and whether absence is allowed.
    fn unwrap_optional(&self) -> Result<(&'a DeclaredType, bool), SchemaError> {
        let mut members = Vec::new();
        let mut admits_absent = false;
        flatten_union(&self.field.ty, &mut members, &mut admits_absent);

        let mut unique: Vec<&DeclaredType> = Vec::with_capacity(members.len());
        for member in members {
            if !unique.contains(&member) {
                unique.push(member);
            }
        }

        match unique.as_slice() {
            [single] => Ok((*single, admits_absent)),
            _ => Err(SchemaError::UnsupportedUnion {
                record: self.decl.name.to_string(),
                field: self.field.name.to_string(),
            }),
        }
    }

    fn resolve_kind(
        &self,
        ty: &DeclaredType,
        number: u32,
        in_collection: bool,
    ) -> Result<(FieldKind, WireType), SchemaError> {
        match ty {
            DeclaredType::List(elem) => {
                if in_collection {
                    return Err(self.nesting());
                }
                let elem = self.entry_schema(elem, number)?;
                let wire_type = elem.wire_type;
                Ok((FieldKind::List(Box::new(elem)), wire_type))
            }
            DeclaredType::Map(key, value) => {
                if in_collection {
                    return Err(self.nesting());
                }
                let key = self.entry_schema(key, MAP_KEY_NUMBER)?;
                if !matches!(
                    key.kind,
                    FieldKind::Int | FieldKind::Enum | FieldKind::Bool | FieldKind::String
                ) {
                    return Err(self.unsupported(ty));
                }
                let value = self.entry_schema(value, MAP_VALUE_NUMBER)?;
                Ok((
                    FieldKind::Map(Box::new(key), Box::new(value)),
                    WireType::LengthDelimited,
                ))
            }
            DeclaredType::Int => Ok((FieldKind::Int, WireType::Varint)),
            DeclaredType::Enum(_) => Ok((FieldKind::Enum, WireType::Varint)),
            DeclaredType::Bool => Ok((FieldKind::Bool, WireType::Varint)),
            DeclaredType::Float => Ok((FieldKind::Float, WireType::Fixed64)),
            DeclaredType::Str => Ok((FieldKind::String, WireType::LengthDelimited)),
            DeclaredType::Bytes => Ok((FieldKind::Bytes, WireType::LengthDelimited)),
            DeclaredType::Message(msg) => {
                if !registry::is_resolving(msg.type_id()) {
                    msg.schema()?;
                }
                Ok((FieldKind::Message(*msg), WireType::LengthDelimited))
            }
            DeclaredType::Optional(_)
            | DeclaredType::Union(_)
            | DeclaredType::Absent
            | DeclaredType::Unsupported(_) => Err(self.unsupported(ty)),
        }
    }

    /// Schema for a list element or map key/value, sharing the field's name.
    fn entry_schema(&self, ty: &DeclaredType, number: u32) -> Result<FieldSchema, SchemaError> {
        let (kind, wire_type) = self.resolve_kind(ty, number, true)?;
        Ok(FieldSchema {
            number,
            name: self.field.name.to_string(),
            kind,
            wire_type,
            is_optional: false,
            default_value: None,
        })
    }

    fn nesting(&self) -> SchemaError {
        SchemaError::UnsupportedNesting {
            record: self.decl.name.to_string(),
            field: self.field.name.to_string(),
        }
    }

    fn unsupported(&self, ty: &DeclaredType) -> SchemaError {
        SchemaError::UnsupportedType {
            record: self.decl.name.to_string(),
            field: self.field.name.to_string(),
            type_name: ty.describe(),
        }
    }
}

fn flatten_union<'a>(
    ty: &'a DeclaredType,
    members: &mut Vec<&'a DeclaredType>,
    admits_absent: &mut bool,
) {
    match ty {
        DeclaredType::Optional(inner) => {
            *admits_absent = true;
            flatten_union(inner, members, admits_absent);
        }
        DeclaredType::Union(variants) => {
            for variant in variants {
                flatten_union(variant, members, admits_absent);
            }
        }
        DeclaredType::Absent => *admits_absent = true,
        other => members.push(other),
    }
}
