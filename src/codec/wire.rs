//! Varint and fixed-width wire format utilities.
//!
//! Varints are unsigned LEB128: seven payload bits per byte, least
//! significant group first, high bit set on every byte but the last.
//! Signed values are not zigzag-encoded; callers cast them to `u64`.

use crate::error::DecodeError;

/// Longest possible varint encoding of a `u64`.
pub const MAX_VARINT_LEN: usize = 10;
/// Size of a 64-bit fixed value.
pub const SIZEOF_FIXED64: usize = 8;

/// Append `value` as an unsigned LEB128 varint.
#[inline]
pub fn encode_varint(mut value: u64, out: &mut Vec<u8>) {
    while value >= 0x80 {
        out.push((value as u8) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

/// Number of bytes `encode_varint` writes for `value`.
#[inline]
pub fn encoded_len(value: u64) -> usize {
    let bits = 64 - (value | 1).leading_zeros() as usize;
    (bits + 6) / 7
}

/// Read a varint starting at `*offset`, advancing it past the value.
pub fn decode_varint(data: &[u8], offset: &mut usize) -> Result<u64, DecodeError> {
    let mut result: u64 = 0;
    let mut shift: u32 = 0;
    loop {
        let byte = *data.get(*offset).ok_or(DecodeError::TruncatedInput {
            need: *offset + 1,
            have: data.len(),
        })?;
        *offset += 1;

        // The tenth byte may only carry the top bit of a u64.
        if shift == 63 && byte > 1 {
            return Err(DecodeError::InvalidEncoding(
                "varint overflows 64 bits".into(),
            ));
        }
        result |= ((byte & 0x7f) as u64) << shift;
        if byte & 0x80 == 0 {
            return Ok(result);
        }
        shift += 7;
    }
}

/// Append a little-endian 64-bit value.
#[inline]
pub fn write_fixed64(value: u64, out: &mut Vec<u8>) {
    out.extend_from_slice(&value.to_le_bytes());
}

/// Read exactly eight little-endian bytes at `*offset`.
pub fn read_fixed64(data: &[u8], offset: &mut usize) -> Result<u64, DecodeError> {
    let end = *offset + SIZEOF_FIXED64;
    let bytes = data.get(*offset..end).ok_or(DecodeError::TruncatedInput {
        need: end,
        have: data.len(),
    })?;
    let mut buf = [0u8; SIZEOF_FIXED64];
    buf.copy_from_slice(bytes);
    *offset = end;
    Ok(u64::from_le_bytes(buf))
}

/// Append a varint length prefix followed by `payload`.
#[inline]
pub fn write_length_delimited(payload: &[u8], out: &mut Vec<u8>) {
    encode_varint(payload.len() as u64, out);
    out.extend_from_slice(payload);
}

/// Read a varint length prefix and borrow that many bytes.
///
/// The declared length is checked against the remaining input before
/// anything is sliced or allocated.
pub fn read_length_delimited<'a>(data: &'a [u8], offset: &mut usize) -> Result<&'a [u8], DecodeError> {
    let len = decode_varint(data, offset)?;
    let remaining = data.len() - *offset;
    if len > remaining as u64 {
        let need = usize::try_from(len)
            .map(|len| offset.saturating_add(len))
            .unwrap_or(usize::MAX);
        return Err(DecodeError::TruncatedInput {
            need,
            have: data.len(),
        });
    }
    let start = *offset;
    *offset += len as usize;
    Ok(&data[start..*offset])
}
