use std::collections::{BTreeMap, HashMap};

use crate::error::DecodeError;
use crate::resolver::{MAP_KEY_NUMBER, MAP_VALUE_NUMBER};
use crate::types::{FieldKind, FieldSchema, MessageSchema, WireType};
use crate::value::Value;

use super::wire::*;

/// Deepest nesting of embedded messages accepted on decode.
pub const MAX_RECURSION_DEPTH: usize = 100;

/// Decode binary data into a `Value::Message` according to a `MessageSchema`.
///
/// Unknown field numbers abort decoding. Unseen optional fields take their
/// declared default; unseen required scalar and message fields are an error.
pub fn decode_value(schema: &MessageSchema, data: &[u8]) -> Result<Value, DecodeError> {
    let value = decode_message(schema, data, 0)?;
    tracing::trace!(record = %schema.name, len = data.len(), "decoded message");
    Ok(value)
}

/// Map entries collected so far; a repeated key overwrites in place.
#[derive(Default)]
struct MapAccumulator {
    entries: Vec<(Value, Value)>,
    index: HashMap<Value, usize>,
}

impl MapAccumulator {
    fn insert(&mut self, key: Value, value: Value) {
        match self.index.get(&key) {
            Some(&idx) => self.entries[idx].1 = value,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
            }
        }
    }
}

fn decode_message(schema: &MessageSchema, data: &[u8], depth: usize) -> Result<Value, DecodeError> {
    if depth > MAX_RECURSION_DEPTH {
        return Err(DecodeError::RecursionLimitExceeded {
            limit: MAX_RECURSION_DEPTH,
        });
    }

    let mut singles: HashMap<u32, Value> = HashMap::new();
    let mut lists: HashMap<u32, Vec<Value>> = HashMap::new();
    let mut maps: HashMap<u32, MapAccumulator> = HashMap::new();

    let mut offset = 0usize;
    while offset < data.len() {
        let tag = decode_varint(data, &mut offset)?;
        let number = tag >> 3;
        let field = schema
            .field_by_number(number)
            .ok_or_else(|| DecodeError::UnknownField {
                record: schema.name.clone(),
                number,
            })?;
        check_wire_type(field, tag)?;

        match &field.kind {
            FieldKind::List(elem) => {
                let item = decode_single(elem, data, &mut offset, depth)?;
                lists.entry(field.number).or_default().push(item);
            }
            FieldKind::Map(key_schema, value_schema) => {
                let payload = read_length_delimited(data, &mut offset)?;
                let (key, value) = decode_map_entry(schema, key_schema, value_schema, payload, depth)?;
                maps.entry(field.number).or_default().insert(key, value);
            }
            _ => {
                let value = decode_single(field, data, &mut offset, depth)?;
                singles.insert(field.number, value);
            }
        }
    }

    let mut result = BTreeMap::new();
    for field in &schema.fields {
        let value = if let Some(value) = singles.remove(&field.number) {
            value
        } else if let Some(items) = lists.remove(&field.number) {
            Value::List(items)
        } else if let Some(acc) = maps.remove(&field.number) {
            Value::Map(acc.entries)
        } else if field.is_optional {
            match &field.default_value {
                Some(default) => default.clone(),
                None => continue,
            }
        } else {
            // A required list or map has no presence on the wire: zero entries is empty.
            match &field.kind {
                FieldKind::List(_) => Value::List(Vec::new()),
                FieldKind::Map(..) => Value::Map(Vec::new()),
                _ => {
                    return Err(DecodeError::MissingRequiredField {
                        record: schema.name.clone(),
                        field: field.name.clone(),
                    });
                }
            }
        };
        result.insert(field.name.clone(), value);
    }

    Ok(Value::Message(result))
}

fn check_wire_type(field: &FieldSchema, tag: u64) -> Result<(), DecodeError> {
    let raw = (tag & 0x7) as u8;
    match WireType::from_u8(raw) {
        Some(wire_type) if wire_type == field.wire_type => Ok(()),
        _ => Err(DecodeError::WireTypeMismatch {
            field: field.name.clone(),
            expected: field.wire_type,
            actual: raw,
        }),
    }
}

/// Decode one value (tag already consumed) for a scalar, message or element schema.
fn decode_single(
    field: &FieldSchema,
    data: &[u8],
    offset: &mut usize,
    depth: usize,
) -> Result<Value, DecodeError> {
    match &field.kind {
        FieldKind::Int | FieldKind::Enum => Ok(Value::Int(decode_varint(data, offset)?)),
        FieldKind::Bool => Ok(Value::Bool(decode_varint(data, offset)? != 0)),
        FieldKind::Float => Ok(Value::Float(f64::from_bits(read_fixed64(data, offset)?))),
        FieldKind::String => {
            let payload = read_length_delimited(data, offset)?;
            let s = std::str::from_utf8(payload).map_err(|e| {
                DecodeError::InvalidEncoding(format!(
                    "invalid utf-8 string in field '{}': {}",
                    field.name, e
                ))
            })?;
            Ok(Value::Str(s.to_string()))
        }
        FieldKind::Bytes => Ok(Value::Bytes(read_length_delimited(data, offset)?.to_vec())),
        FieldKind::Message(msg) => {
            let payload = read_length_delimited(data, offset)?;
            let schema = msg.schema()?;
            decode_message(&schema, payload, depth + 1)
        }
        FieldKind::List(_) | FieldKind::Map(..) => Err(DecodeError::InvalidEncoding(format!(
            "field '{}' nests a list or map inside a list or map",
            field.name
        ))),
    }
}

/// Decode a map entry sub-message into its key and value.
///
/// A key or value missing from the entry takes its kind's zero value.
fn decode_map_entry(
    schema: &MessageSchema,
    key_schema: &FieldSchema,
    value_schema: &FieldSchema,
    payload: &[u8],
    depth: usize,
) -> Result<(Value, Value), DecodeError> {
    let mut key = None;
    let mut value = None;

    let mut offset = 0usize;
    while offset < payload.len() {
        let tag = decode_varint(payload, &mut offset)?;
        let number = tag >> 3;
        let (target, slot) = match number {
            n if n == MAP_KEY_NUMBER as u64 => (key_schema, &mut key),
            n if n == MAP_VALUE_NUMBER as u64 => (value_schema, &mut value),
            _ => {
                return Err(DecodeError::UnknownField {
                    record: format!("{}.{}", schema.name, key_schema.name),
                    number,
                });
            }
        };
        check_wire_type(target, tag)?;
        *slot = Some(decode_single(target, payload, &mut offset, depth)?);
    }

    let key = match key {
        Some(key) => key,
        None => zero_value(key_schema, depth)?,
    };
    let value = match value {
        Some(value) => value,
        None => zero_value(value_schema, depth)?,
    };
    Ok((key, value))
}

fn zero_value(field: &FieldSchema, depth: usize) -> Result<Value, DecodeError> {
    match &field.kind {
        FieldKind::Int | FieldKind::Enum => Ok(Value::Int(0)),
        FieldKind::Bool => Ok(Value::Bool(false)),
        FieldKind::Float => Ok(Value::Float(0.0)),
        FieldKind::String => Ok(Value::Str(String::new())),
        FieldKind::Bytes => Ok(Value::Bytes(Vec::new())),
        FieldKind::Message(msg) => {
            let schema = msg.schema()?;
            decode_message(&schema, &[], depth + 1)
        }
        FieldKind::List(_) | FieldKind::Map(..) => Err(DecodeError::InvalidEncoding(format!(
            "field '{}' nests a list or map inside a list or map",
            field.name
        ))),
    }
}
