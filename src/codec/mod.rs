pub mod wire;
pub mod encoder;
pub mod decoder;

pub use decoder::decode_value;
pub use encoder::encode_value;

use crate::error::Result;
use crate::traits::ProtoMessage;

/// Encode a record to protobuf wire format.
///
/// The record's schema is resolved on first use and cached.
pub fn encode<T: ProtoMessage>(record: &T) -> Result<Vec<u8>> {
    let schema = T::schema()?;
    let value = record.to_value();
    Ok(encode_value(&schema, &value)?)
}

/// Decode a record of type `T` from protobuf wire format.
pub fn decode<T: ProtoMessage>(data: &[u8]) -> Result<T> {
    let schema = T::schema()?;
    let value = decode_value(&schema, data)?;
    Ok(T::from_value(value)?)
}
