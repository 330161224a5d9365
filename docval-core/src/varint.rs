// Variable-length integers for the document format
//
// Unsigned integers use LEB128: seven payload bits per byte, least significant
// group first, high bit set on every byte but the last. Signed integers are
// zig-zag mapped onto unsigned ones first so small magnitudes stay short.

use crate::error::DecodeError;

/// Longest LEB128 encoding of a `u64`.
pub const MAX_VARINT_LEN: usize = 10;

/// Append `value` to `out` as an unsigned LEB128 varint, returning the bytes written.
pub fn put_uvarint(out: &mut Vec<u8>, mut value: u64) -> usize {
    let mut written = 1;
    while value >= 0x80 {
        out.push((value as u8) | 0x80);
        value >>= 7;
        written += 1;
    }
    out.push(value as u8);
    written
}

/// Read an unsigned LEB128 varint from the front of `data`.
///
/// Returns the value and the number of bytes consumed.
pub fn read_uvarint(data: &[u8]) -> Result<(u64, usize), DecodeError> {
    let mut value: u64 = 0;
    let mut shift = 0u32;

    for (i, &byte) in data.iter().enumerate() {
        if i == MAX_VARINT_LEN - 1 && byte > 1 {
            return Err(DecodeError::VarintOverflow);
        }
        if byte < 0x80 {
            return Ok((value | (u64::from(byte) << shift), i + 1));
        }
        value |= u64::from(byte & 0x7f) << shift;
        shift += 7;
        if i + 1 == MAX_VARINT_LEN {
            return Err(DecodeError::VarintOverflow);
        }
    }

    Err(DecodeError::TruncatedVarint)
}

/// Zig-zag encoding converts a signed integer to unsigned
///
/// Formula: (n << 1) ^ (n >> 63)
pub fn zig_zag_encode(n: i64) -> u64 {
    ((n as u64) << 1) ^ ((n >> 63) as u64)
}

/// Decode a zig-zag encoded value back to a signed integer
pub fn zig_zag_decode(n: u64) -> i64 {
    ((n >> 1) as i64) ^ -((n & 1) as i64)
}

/// Append `value` as a zig-zag varint.
pub fn put_varint(out: &mut Vec<u8>, value: i64) -> usize {
    put_uvarint(out, zig_zag_encode(value))
}

/// Read a zig-zag varint from the front of `data`.
pub fn read_varint(data: &[u8]) -> Result<(i64, usize), DecodeError> {
    let (raw, n) = read_uvarint(data)?;
    Ok((zig_zag_decode(raw), n))
}
