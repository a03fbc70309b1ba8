//! Traits connecting Rust record types to their wire schema.
//!
//! `ProtoMessage` and `ProtoEnum` are implemented by the
//! `#[derive(ProtoMessage)]` and `#[derive(ProtoEnum)]` macros from the
//! `protomodel-derive` crate. `ProtoType` covers every type that can appear
//! as a field and is implemented here for the supported std types.

use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;

use crate::codec;
use crate::error::{DecodeError, Error, SchemaError};
use crate::registry;
use crate::types::{DeclaredType, MessageRef, MessageSchema, RecordDecl};
use crate::value::Value;

/// A type that can be stored in a record field.
///
/// The `list_*` methods decide how `Vec<Self>` is represented; they default to
/// a repeated field and are overridden by `u8` so that `Vec<u8>` is bytes.
pub trait ProtoType: Sized {
    /// The declared type the resolver infers the wire type from.
    fn declared_type() -> DeclaredType;

    /// Convert into the dynamic value form.
    fn to_value(&self) -> Value;

    /// Rebuild from the dynamic value form.
    fn from_value(value: Value) -> Result<Self, DecodeError>;

    #[doc(hidden)]
    fn list_declared_type() -> DeclaredType {
        DeclaredType::list(Self::declared_type())
    }

    #[doc(hidden)]
    fn list_to_value(items: &[Self]) -> Value {
        Value::List(items.iter().map(Self::to_value).collect())
    }

    #[doc(hidden)]
    fn list_from_value(value: Value) -> Result<Vec<Self>, DecodeError> {
        match value {
            Value::List(items) => items.into_iter().map(Self::from_value).collect(),
            other => Err(mismatch("list", &other)),
        }
    }
}

/// A record type encoded as a protobuf message.
///
/// # Example
///
/// ```rust,ignore
/// use protomodel::ProtoMessage;
///
/// #[derive(ProtoMessage)]
/// struct Person {
///     id: u64,
///     name: String,
///     #[proto(number = 9)]
///     email: Option<String>,
/// }
///
/// let person = Person { id: 42, name: "Alice".into(), email: None };
/// let bytes = person.encode_proto().unwrap();
/// let decoded = Person::decode_proto(&bytes).unwrap();
/// ```
pub trait ProtoMessage: ProtoType + 'static {
    /// Record name used in schemas and error messages.
    const NAME: &'static str;

    /// Declared fields in declaration order.
    fn declaration() -> RecordDecl;

    /// The resolved schema, cached in the global registry.
    fn schema() -> Result<Arc<MessageSchema>, SchemaError> {
        registry::global().schema_for(&MessageRef::of::<Self>())
    }

    /// Encode this record to protobuf wire format.
    fn encode_proto(&self) -> Result<Vec<u8>, Error> {
        codec::encode(self)
    }

    /// Decode a record from protobuf wire format.
    fn decode_proto(data: &[u8]) -> Result<Self, Error> {
        codec::decode(data)
    }
}

/// A field-less enum carried on the wire as its ordinal.
pub trait ProtoEnum: Copy + 'static {
    const NAME: &'static str;

    fn ordinal(self) -> u64;

    fn from_ordinal(ordinal: u64) -> Option<Self>;
}

fn mismatch(expected: &'static str, actual: &Value) -> DecodeError {
    DecodeError::ValueMismatch {
        expected,
        actual: actual.type_name(),
    }
}

fn expect_int(value: Value) -> Result<u64, DecodeError> {
    match value {
        Value::Int(v) => Ok(v),
        other => Err(mismatch("int", &other)),
    }
}

fn out_of_range(value: u64, target: &str) -> DecodeError {
    DecodeError::InvalidEncoding(format!("integer {} out of range for {}", value, target))
}

macro_rules! impl_unsigned {
    ($($t:ty),*) => {
        $(
            impl ProtoType for $t {
                fn declared_type() -> DeclaredType {
                    DeclaredType::Int
                }

                fn to_value(&self) -> Value {
                    Value::Int(*self as u64)
                }

                fn from_value(value: Value) -> Result<Self, DecodeError> {
                    let v = expect_int(value)?;
                    <$t>::try_from(v).map_err(|_| out_of_range(v, stringify!($t)))
                }
            }
        )*
    };
}

// Signed integers travel as their two's-complement u64 (protobuf int32/int64), never zigzag.
macro_rules! impl_signed {
    ($($t:ty),*) => {
        $(
            impl ProtoType for $t {
                fn declared_type() -> DeclaredType {
                    DeclaredType::Int
                }

                fn to_value(&self) -> Value {
                    Value::Int(*self as i64 as u64)
                }

                fn from_value(value: Value) -> Result<Self, DecodeError> {
                    let v = expect_int(value)?;
                    <$t>::try_from(v as i64).map_err(|_| out_of_range(v, stringify!($t)))
                }
            }
        )*
    };
}

impl_unsigned!(u16, u32, u64, usize);
impl_signed!(i8, i16, i32, i64, isize);

impl ProtoType for u8 {
    fn declared_type() -> DeclaredType {
        DeclaredType::Int
    }

    fn to_value(&self) -> Value {
        Value::Int(*self as u64)
    }

    fn from_value(value: Value) -> Result<Self, DecodeError> {
        let v = expect_int(value)?;
        u8::try_from(v).map_err(|_| out_of_range(v, "u8"))
    }

    fn list_declared_type() -> DeclaredType {
        DeclaredType::Bytes
    }

    fn list_to_value(items: &[Self]) -> Value {
        Value::Bytes(items.to_vec())
    }

    fn list_from_value(value: Value) -> Result<Vec<Self>, DecodeError> {
        match value {
            Value::Bytes(bytes) => Ok(bytes),
            other => Err(mismatch("bytes", &other)),
        }
    }
}

impl ProtoType for bool {
    fn declared_type() -> DeclaredType {
        DeclaredType::Bool
    }

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }

    fn from_value(value: Value) -> Result<Self, DecodeError> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(mismatch("bool", &other)),
        }
    }
}

impl ProtoType for f64 {
    fn declared_type() -> DeclaredType {
        DeclaredType::Float
    }

    fn to_value(&self) -> Value {
        Value::Float(*self)
    }

    fn from_value(value: Value) -> Result<Self, DecodeError> {
        match value {
            Value::Float(v) => Ok(v),
            other => Err(mismatch("float", &other)),
        }
    }
}

// Widened to a double on the wire; there is no single-precision encoding.
impl ProtoType for f32 {
    fn declared_type() -> DeclaredType {
        DeclaredType::Float
    }

    fn to_value(&self) -> Value {
        Value::Float(*self as f64)
    }

    fn from_value(value: Value) -> Result<Self, DecodeError> {
        match value {
            Value::Float(v) => Ok(v as f32),
            other => Err(mismatch("float", &other)),
        }
    }
}

impl ProtoType for String {
    fn declared_type() -> DeclaredType {
        DeclaredType::Str
    }

    fn to_value(&self) -> Value {
        Value::Str(self.clone())
    }

    fn from_value(value: Value) -> Result<Self, DecodeError> {
        match value {
            Value::Str(s) => Ok(s),
            other => Err(mismatch("string", &other)),
        }
    }
}

impl<T: ProtoType> ProtoType for Vec<T> {
    fn declared_type() -> DeclaredType {
        T::list_declared_type()
    }

    fn to_value(&self) -> Value {
        T::list_to_value(self)
    }

    fn from_value(value: Value) -> Result<Self, DecodeError> {
        T::list_from_value(value)
    }
}

impl<T: ProtoType> ProtoType for Box<T> {
    fn declared_type() -> DeclaredType {
        T::declared_type()
    }

    fn to_value(&self) -> Value {
        T::to_value(self)
    }

    fn from_value(value: Value) -> Result<Self, DecodeError> {
        T::from_value(value).map(Box::new)
    }
}

impl<K, V, S> ProtoType for HashMap<K, V, S>
where
    K: ProtoType + Eq + Hash,
    V: ProtoType,
    S: BuildHasher + Default,
{
    fn declared_type() -> DeclaredType {
        DeclaredType::map(K::declared_type(), V::declared_type())
    }

    /// Entries are sorted by key so the encoding does not depend on hash order.
    fn to_value(&self) -> Value {
        let mut entries: Vec<(Value, Value)> =
            self.iter().map(|(k, v)| (k.to_value(), v.to_value())).collect();
        entries.sort_by(|a, b| a.0.key_cmp(&b.0));
        Value::Map(entries)
    }

    fn from_value(value: Value) -> Result<Self, DecodeError> {
        match value {
            Value::Map(entries) => entries
                .into_iter()
                .map(|(k, v)| Ok((K::from_value(k)?, V::from_value(v)?)))
                .collect(),
            other => Err(mismatch("map", &other)),
        }
    }
}

impl<K, V> ProtoType for BTreeMap<K, V>
where
    K: ProtoType + Ord,
    V: ProtoType,
{
    fn declared_type() -> DeclaredType {
        DeclaredType::map(K::declared_type(), V::declared_type())
    }

    fn to_value(&self) -> Value {
        Value::Map(
            self.iter()
                .map(|(k, v)| (k.to_value(), v.to_value()))
                .collect(),
        )
    }

    fn from_value(value: Value) -> Result<Self, DecodeError> {
        match value {
            Value::Map(entries) => entries
                .into_iter()
                .map(|(k, v)| Ok((K::from_value(k)?, V::from_value(v)?)))
                .collect(),
            other => Err(mismatch("map", &other)),
        }
    }
}

/// Support functions called by derive-generated code.
#[doc(hidden)]
pub mod __private {
    use std::collections::BTreeMap;

    use super::{mismatch, ProtoEnum, ProtoType};
    use crate::error::DecodeError;
    use crate::value::Value;

    pub type Fields = BTreeMap<String, Value>;

    pub fn take_message(value: Value) -> Result<Fields, DecodeError> {
        match value {
            Value::Message(fields) => Ok(fields),
            other => Err(mismatch("message", &other)),
        }
    }

    /// Remove a required field; a missing one is an error.
    pub fn take_required<T: ProtoType>(
        fields: &mut Fields,
        record: &str,
        name: &str,
    ) -> Result<T, DecodeError> {
        match fields.remove(name) {
            Some(value) => T::from_value(value),
            None => Err(DecodeError::MissingRequiredField {
                record: record.to_string(),
                field: name.to_string(),
            }),
        }
    }

    /// Remove an `Option<T>` field; a missing one is `None`.
    pub fn take_optional<T: ProtoType>(
        fields: &mut Fields,
        name: &str,
    ) -> Result<Option<T>, DecodeError> {
        fields.remove(name).map(T::from_value).transpose()
    }

    /// Remove a field with a declared default, falling back to `default`.
    pub fn take_or_else<T: ProtoType>(
        fields: &mut Fields,
        name: &str,
        default: impl FnOnce() -> T,
    ) -> Result<T, DecodeError> {
        match fields.remove(name) {
            Some(value) => T::from_value(value),
            None => Ok(default()),
        }
    }

    pub fn enum_from_value<E: ProtoEnum>(value: Value) -> Result<E, DecodeError> {
        match value {
            Value::Int(ordinal) => E::from_ordinal(ordinal).ok_or_else(|| {
                DecodeError::InvalidEncoding(format!(
                    "unknown ordinal {} for enum {}",
                    ordinal,
                    E::NAME
                ))
            }),
            other => Err(mismatch("enum", &other)),
        }
    }
}
