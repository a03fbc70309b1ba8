use crate::error::EncodeError;
use crate::types::{FieldKind, FieldSchema, MessageSchema};
use crate::value::Value;

use super::wire::*;

/// Encode a `Value::Message` according to a `MessageSchema`.
///
/// Fields are written in ascending field-number order. The result carries no
/// outer length prefix; embedding code adds one.
pub fn encode_value(schema: &MessageSchema, value: &Value) -> Result<Vec<u8>, EncodeError> {
    let mut out = Vec::new();
    encode_message(schema, value, &mut out)?;
    tracing::trace!(record = %schema.name, len = out.len(), "encoded message");
    Ok(out)
}

fn encode_message(
    schema: &MessageSchema,
    value: &Value,
    out: &mut Vec<u8>,
) -> Result<(), EncodeError> {
    let fields = match value {
        Value::Message(map) => map,
        _ => {
            return Err(EncodeError::TypeMismatch {
                field: schema.name.clone(),
                expected: "message",
                actual: value.type_name(),
            });
        }
    };

    for field in &schema.fields {
        let val = match fields.get(&field.name) {
            Some(v) => v,
            None if field.is_optional => continue,
            None => return Err(EncodeError::MissingField(field.name.clone())),
        };

        // Optional fields holding their default are elided.
        if field.is_optional && field.is_default(val) {
            continue;
        }

        match &field.kind {
            FieldKind::List(elem) => encode_list(field, elem, val, out)?,
            FieldKind::Map(key, value) => encode_map(field, key, value, val, out)?,
            _ => {
                encode_varint(field.tag(), out);
                encode_single(field, val, out)?;
            }
        }
    }

    Ok(())
}

/// Encode one value (without its tag) for a scalar or message field.
fn encode_single(field: &FieldSchema, value: &Value, out: &mut Vec<u8>) -> Result<(), EncodeError> {
    match (&field.kind, value) {
        (FieldKind::Int | FieldKind::Enum, Value::Int(v)) => encode_varint(*v, out),
        (FieldKind::Bool, Value::Bool(b)) => encode_varint(*b as u64, out),
        (FieldKind::Float, Value::Float(f)) => write_fixed64(f.to_bits(), out),
        (FieldKind::String, Value::Str(s)) => write_length_delimited(s.as_bytes(), out),
        (FieldKind::Bytes, Value::Bytes(b)) => write_length_delimited(b, out),
        (FieldKind::Message(msg), Value::Message(_)) => {
            let schema = msg.schema()?;
            let mut nested = Vec::new();
            encode_message(&schema, value, &mut nested)?;
            write_length_delimited(&nested, out);
        }
        (FieldKind::List(_) | FieldKind::Map(..), _) => {
            return Err(EncodeError::UnsupportedNesting {
                field: field.name.clone(),
            });
        }
        (kind, _) => {
            return Err(EncodeError::TypeMismatch {
                field: field.name.clone(),
                expected: kind.name(),
                actual: value.type_name(),
            });
        }
    }
    Ok(())
}

fn check_not_collection(field: &FieldSchema, item: &Value) -> Result<(), EncodeError> {
    match item {
        Value::List(_) | Value::Map(_) => Err(EncodeError::UnsupportedNesting {
            field: field.name.clone(),
        }),
        _ => Ok(()),
    }
}

/// Repeated fields are unpacked: one tag and value per element.
fn encode_list(
    field: &FieldSchema,
    elem: &FieldSchema,
    value: &Value,
    out: &mut Vec<u8>,
) -> Result<(), EncodeError> {
    let items = match value {
        Value::List(items) => items,
        _ => {
            return Err(EncodeError::TypeMismatch {
                field: field.name.clone(),
                expected: "list",
                actual: value.type_name(),
            });
        }
    };

    let tag = elem.tag();
    for item in items {
        check_not_collection(field, item)?;
        encode_varint(tag, out);
        encode_single(elem, item, out)?;
    }
    Ok(())
}

/// Each map entry becomes a length-delimited sub-message with the key at
/// sub-field 1 and the value at sub-field 2.
fn encode_map(
    field: &FieldSchema,
    key_schema: &FieldSchema,
    value_schema: &FieldSchema,
    value: &Value,
    out: &mut Vec<u8>,
) -> Result<(), EncodeError> {
    let entries = match value {
        Value::Map(entries) => entries,
        _ => {
            return Err(EncodeError::TypeMismatch {
                field: field.name.clone(),
                expected: "map",
                actual: value.type_name(),
            });
        }
    };

    let tag = field.tag();
    let mut entry = Vec::new();
    for (k, v) in entries {
        check_not_collection(field, k)?;
        check_not_collection(field, v)?;
        entry.clear();
        encode_varint(key_schema.tag(), &mut entry);
        encode_single(key_schema, k, &mut entry)?;
        encode_varint(value_schema.tag(), &mut entry);
        encode_single(value_schema, v, &mut entry)?;

        encode_varint(tag, out);
        write_length_delimited(&entry, out);
    }
    Ok(())
}
