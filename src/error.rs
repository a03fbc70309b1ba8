use crate::types::WireType;

/// Errors raised while resolving a record declaration into a schema.
///
/// Resolution happens before any bytes are touched, so these always surface
/// on the first encode/decode of a type and are identical on every retry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("unsupported type '{type_name}' for field '{field}' in '{record}'")]
    UnsupportedType {
        record: String,
        field: String,
        type_name: String,
    },

    #[error("field '{field}' in '{record}' must have exactly one non-optional type")]
    UnsupportedUnion { record: String, field: String },

    #[error("field '{field}' in '{record}' nests a list or map inside a list or map")]
    UnsupportedNesting { record: String, field: String },

    #[error("invalid field number {number} for field '{field}' in '{record}'")]
    InvalidFieldNumber {
        record: String,
        field: String,
        number: u32,
    },

    #[error("duplicate field number {number} in '{record}' (fields '{first}' and '{second}')")]
    DuplicateFieldNumber {
        record: String,
        number: u32,
        first: String,
        second: String,
    },
}

/// Errors from the message encoder.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EncodeError {
    #[error("field '{field}' nests a list or map inside a list or map")]
    UnsupportedNesting { field: String },

    #[error("type mismatch for field '{field}': expected {expected}, got {actual}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("missing required field '{0}'")]
    MissingField(String),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Errors from the message decoder.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecodeError {
    #[error("unknown field number {number} in '{record}'")]
    UnknownField { record: String, number: u64 },

    #[error("truncated input: need {need} bytes, have {have}")]
    TruncatedInput { need: usize, have: usize },

    #[error("invalid encoding: {0}")]
    InvalidEncoding(String),

    #[error("wire type mismatch for field '{field}': expected {expected:?}, got {actual}")]
    WireTypeMismatch {
        field: String,
        expected: WireType,
        actual: u8,
    },

    #[error("message nesting exceeds {limit} levels")]
    RecursionLimitExceeded { limit: usize },

    #[error("missing required field '{field}' in '{record}'")]
    MissingRequiredField { record: String, field: String },

    #[error("value mismatch: expected {expected}, got {actual}")]
    ValueMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Top-level error type that wraps all sub-errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Result type alias for protomodel operations.
pub type Result<T> = std::result::Result<T, Error>;
