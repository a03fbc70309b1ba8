//! Protomodel: protocol-buffers wire encoding derived from Rust record declarations.
//!
//! A record's field declarations are turned into a wire schema once per type
//! (field numbers from declaration order or `#[proto(number = N)]`, wire
//! types inferred from field types) and cached. Records then encode to and
//! decode from bytes that a standard protobuf implementation with an
//! equivalently numbered `.proto` schema reads and writes.
//!
//! Supported wire types are varint, 64-bit fixed and length-delimited.
//! Integers are unsigned varints; signed Rust integers are carried as their
//! two's-complement `u64` (protobuf `int64`), never zigzag. Floats are always
//! doubles. Repeated fields are written unpacked, and unknown fields are an
//! error rather than skipped.
//!
//! # Quick Start
//!
//! ```rust
//! use protomodel::ProtoMessage;
//!
//! #[derive(Debug, PartialEq, ProtoMessage)]
//! struct User {
//!     id: u64,
//!     name: String,
//! }
//!
//! let user = User { id: 42, name: "Alice".into() };
//! let bytes = user.encode_proto().unwrap();
//! assert_eq!(bytes, b"\x08\x2a\x12\x05Alice");
//!
//! let decoded = User::decode_proto(&bytes).unwrap();
//! assert_eq!(user, decoded);
//! ```

pub mod error;
pub mod value;
pub mod types;
pub mod resolver;
pub mod registry;
pub mod codec;
pub mod traits;

pub use codec::{decode, encode};
pub use error::{DecodeError, EncodeError, Error, Result, SchemaError};
pub use registry::SchemaRegistry;
pub use traits::{ProtoEnum, ProtoMessage, ProtoType};
pub use types::{FieldKind, FieldSchema, MessageSchema, WireType};
pub use value::Value;

// Re-export derive macros when the feature is enabled
#[cfg(feature = "derive")]
pub use protomodel_derive::{ProtoEnum, ProtoMessage};
