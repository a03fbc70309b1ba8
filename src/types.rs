use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

use crate::error::SchemaError;
use crate::registry;
use crate::traits::ProtoMessage;
use crate::value::Value;

/// Largest field number protobuf allows.
pub const MAX_FIELD_NUMBER: u32 = (1 << 29) - 1;

/// Payload framing selected by the low three bits of a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum WireType {
    Varint = 0,
    Fixed64 = 1,
    LengthDelimited = 2,
}

impl WireType {
    /// Map the raw 3-bit wire type. Groups and 32-bit fixed (3, 4, 5) are not supported.
    pub fn from_u8(raw: u8) -> Option<WireType> {
        match raw {
            0 => Some(WireType::Varint),
            1 => Some(WireType::Fixed64),
            2 => Some(WireType::LengthDelimited),
            _ => None,
        }
    }

    /// Build the tag varint value for a field number.
    #[inline]
    pub fn tag(self, number: u32) -> u64 {
        ((number as u64) << 3) | self as u64
    }
}

/// Reference to a record type whose schema is resolved through the registry.
///
/// Holding a reference instead of the nested schema itself lets
/// self-referential records resolve.
#[derive(Clone, Copy)]
pub struct MessageRef {
    name: &'static str,
    type_id: TypeId,
    declaration: fn() -> RecordDecl,
}

impl MessageRef {
    /// Reference the record type `T`.
    pub fn of<T: ProtoMessage>() -> Self {
        MessageRef {
            name: T::NAME,
            type_id: TypeId::of::<T>(),
            declaration: T::declaration,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Produce the record's field declarations.
    pub fn declaration(&self) -> RecordDecl {
        (self.declaration)()
    }

    /// Resolved schema of the referenced record, cached process-wide.
    pub fn schema(&self) -> Result<Arc<MessageSchema>, SchemaError> {
        registry::global().schema_for(self)
    }
}

impl PartialEq for MessageRef {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl fmt::Debug for MessageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MessageRef({})", self.name)
    }
}

/// The resolved kind of a field; decides both wire type and decode interpretation.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Int,
    Bool,
    Float,
    String,
    Bytes,
    Enum,
    Message(MessageRef),
    /// Repeated field; each element is framed per the element schema.
    List(Box<FieldSchema>),
    /// Map field; entries are framed as a key (#1) / value (#2) sub-message.
    Map(Box<FieldSchema>, Box<FieldSchema>),
}

impl FieldKind {
    pub fn is_collection(&self) -> bool {
        matches!(self, FieldKind::List(_) | FieldKind::Map(..))
    }

    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Int => "int",
            FieldKind::Bool => "bool",
            FieldKind::Float => "float",
            FieldKind::String => "string",
            FieldKind::Bytes => "bytes",
            FieldKind::Enum => "enum",
            FieldKind::Message(_) => "message",
            FieldKind::List(_) => "list",
            FieldKind::Map(..) => "map",
        }
    }
}

/// A resolved field within a message schema.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSchema {
    /// Wire field number (unique within the schema, positive).
    pub number: u32,
    /// Field name as declared.
    pub name: String,
    pub kind: FieldKind,
    /// Wire type of one occurrence of this field. For lists this is the
    /// element's wire type; maps are always length-delimited.
    pub wire_type: WireType,
    /// Whether the field may be omitted on the wire.
    pub is_optional: bool,
    /// Declared default for optional fields. `None` means the default is absence.
    pub default_value: Option<Value>,
}

impl FieldSchema {
    pub fn element_schema(&self) -> Option<&FieldSchema> {
        match &self.kind {
            FieldKind::List(elem) => Some(elem),
            _ => None,
        }
    }

    pub fn key_schema(&self) -> Option<&FieldSchema> {
        match &self.kind {
            FieldKind::Map(key, _) => Some(key),
            _ => None,
        }
    }

    pub fn value_schema(&self) -> Option<&FieldSchema> {
        match &self.kind {
            FieldKind::Map(_, value) => Some(value),
            _ => None,
        }
    }

    /// Schema of an embedded message field.
    pub fn nested_schema(&self) -> Option<Result<Arc<MessageSchema>, SchemaError>> {
        match &self.kind {
            FieldKind::Message(msg) => Some(msg.schema()),
            _ => None,
        }
    }

    /// Tag varint value for one occurrence of this field.
    #[inline]
    pub fn tag(&self) -> u64 {
        self.wire_type.tag(self.number)
    }

    /// Whether `value` equals this field's declared default and may be elided.
    ///
    /// An empty list or map counts as default unless a non-empty default was declared.
    pub fn is_default(&self, value: &Value) -> bool {
        if self.kind.is_collection() && value.is_empty_collection() {
            return match &self.default_value {
                None => true,
                Some(default) => default.is_empty_collection(),
            };
        }
        self.default_value.as_ref() == Some(value)
    }
}

/// Immutable schema of one record type, fields sorted by ascending number.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageSchema {
    pub name: String,
    pub fields: Vec<FieldSchema>,
}

impl MessageSchema {
    /// Find a field by wire number using binary search.
    pub fn field_by_number(&self, number: u64) -> Option<&FieldSchema> {
        let number = u32::try_from(number).ok()?;
        self.fields
            .binary_search_by_key(&number, |f| f.number)
            .ok()
            .map(|idx| &self.fields[idx])
    }

    /// Find a field by name.
    pub fn field_by_name(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// A field's type as declared on the record, before resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum DeclaredType {
    Int,
    Bool,
    Float,
    Str,
    Bytes,
    Enum(&'static str),
    Message(MessageRef),
    List(Box<DeclaredType>),
    Map(Box<DeclaredType>, Box<DeclaredType>),
    /// `T` or absent.
    Optional(Box<DeclaredType>),
    /// Any of the member types.
    Union(Vec<DeclaredType>),
    /// The absent value, only meaningful inside a union.
    Absent,
    /// A type with no wire representation, named for error messages.
    ///
    /// The derive never emits this: a field type without a `ProtoType` impl
    /// fails to compile. Manual `ProtoType` impls return it for types that
    /// can be held in a record but not put on the wire. Resolution then
    /// raises `SchemaError::UnsupportedType`.
    Unsupported(&'static str),
}

impl DeclaredType {
    pub fn optional(inner: DeclaredType) -> Self {
        DeclaredType::Optional(Box::new(inner))
    }

    pub fn list(elem: DeclaredType) -> Self {
        DeclaredType::List(Box::new(elem))
    }

    pub fn map(key: DeclaredType, value: DeclaredType) -> Self {
        DeclaredType::Map(Box::new(key), Box::new(value))
    }

    /// Human readable type name used in error messages.
    pub fn describe(&self) -> String {
        match self {
            DeclaredType::Int => "int".into(),
            DeclaredType::Bool => "bool".into(),
            DeclaredType::Float => "float".into(),
            DeclaredType::Str => "string".into(),
            DeclaredType::Bytes => "bytes".into(),
            DeclaredType::Enum(name) => (*name).into(),
            DeclaredType::Message(msg) => msg.name().into(),
            DeclaredType::List(elem) => format!("list<{}>", elem.describe()),
            DeclaredType::Map(k, v) => format!("map<{}, {}>", k.describe(), v.describe()),
            DeclaredType::Optional(inner) => format!("optional<{}>", inner.describe()),
            DeclaredType::Union(members) => members
                .iter()
                .map(DeclaredType::describe)
                .collect::<Vec<_>>()
                .join(" | "),
            DeclaredType::Absent => "none".into(),
            DeclaredType::Unsupported(name) => (*name).into(),
        }
    }
}

/// One declared field of a record type.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub name: &'static str,
    pub ty: DeclaredType,
    /// Explicit wire number overriding the 1-based declaration position.
    pub number: Option<u32>,
    /// Declared default; its presence makes the field optional.
    pub default: Option<Value>,
}

impl FieldDecl {
    pub fn new(name: &'static str, ty: DeclaredType) -> Self {
        FieldDecl {
            name,
            ty,
            number: None,
            default: None,
        }
    }

    pub fn with_number(mut self, number: u32) -> Self {
        self.number = Some(number);
        self
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }
}

/// The declared fields of a record type, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordDecl {
    pub name: &'static str,
    pub fields: Vec<FieldDecl>,
}
