//! Derive macros for protomodel records.
//!
//! `#[derive(ProtoMessage)]` turns a struct's field declarations into a
//! protobuf message declaration plus conversions to and from the dynamic
//! `Value` form. `#[derive(ProtoEnum)]` does the same for field-less enums,
//! which travel as varint ordinals.
//!
//! # Example
//!
//! ```rust,ignore
//! use protomodel::{ProtoEnum, ProtoMessage};
//!
//! #[derive(Clone, Copy, ProtoEnum)]
//! enum Kind {
//!     Email,
//!     Phone,
//! }
//!
//! #[derive(ProtoMessage)]
//! struct Contact {
//!     kind: Kind,
//!     value: String,
//!     #[proto(number = 10)]
//!     note: Option<String>,
//! }
//! ```

mod attr;
mod decode;
mod encode;
mod enumeration;
mod message;
mod schema;

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

/// Derive macro implementing `ProtoType` and `ProtoMessage` for a struct.
///
/// Fields are numbered by declaration position starting at 1.
///
/// # Attributes
///
/// - `#[proto(number = N)]` - Use wire field number N instead of the position.
/// - `#[proto(default)]` - Field is optional with `Default::default()` as its default.
/// - `#[proto(default = "path")]` - Field is optional with `path()` as its default.
/// - `#[proto(skip)]` - Leave the field out of the schema; decoding fills it with `Default`.
/// - `#[proto(name = "...")]` - On the struct, the record name used in schemas and errors.
///
/// `Option<T>` fields are optional without further attributes.
#[proc_macro_derive(ProtoMessage, attributes(proto))]
pub fn derive_proto_message(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    message::derive_message(&input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

/// Derive macro implementing `ProtoEnum` and `ProtoType` for a field-less enum.
///
/// The enum must also derive `Clone` and `Copy`.
#[proc_macro_derive(ProtoEnum, attributes(proto))]
pub fn derive_proto_enum(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    enumeration::derive_enum(&input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
