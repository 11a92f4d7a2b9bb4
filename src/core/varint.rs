//! Variable-length integer encoding.
//!
//! Little-endian base-128 groups: each byte carries 7 value bits in its low
//! bits and sets the high bit when more bytes follow. Values decode into a
//! 32-bit accumulator, so at most [`MAX_VARINT_LEN`] bytes are accepted.

use bytes::{Buf, BufMut};

use crate::error::{ProtocolError, Result};

/// Segment bits mask (lower 7 bits).
const SEGMENT_BITS: u8 = 0x7F;

/// Continue bit (high bit).
const CONTINUE_BIT: u8 = 0x80;

/// Longest encoding of a 32-bit value.
pub const MAX_VARINT_LEN: usize = 5;

/// Bits that may be set in the last byte of a maximal encoding.
const LAST_BYTE_MASK: u8 = 0x0F;

/// Read a variable-length integer from a buffer.
///
/// # Errors
///
/// - [`ProtocolError::Truncated`] if the buffer ends inside the integer
/// - [`ProtocolError::MalformedVarInt`] if the encoding does not fit in 32 bits
pub fn read_varint(buf: &mut impl Buf) -> Result<u64> {
    let mut value: u32 = 0;

    for index in 0..MAX_VARINT_LEN {
        if !buf.has_remaining() {
            return Err(ProtocolError::Truncated {
                needed: 1,
                remaining: 0,
            });
        }
        let byte = buf.get_u8();

        if index == MAX_VARINT_LEN - 1 && byte & !LAST_BYTE_MASK != 0 {
            return Err(ProtocolError::MalformedVarInt);
        }

        value |= u32::from(byte & SEGMENT_BITS) << (7 * index);

        if byte & CONTINUE_BIT == 0 {
            return Ok(u64::from(value));
        }
    }

    Err(ProtocolError::MalformedVarInt)
}

/// Write a variable-length integer using the minimal number of bytes.
///
/// Returns the number of bytes written.
pub fn write_varint(buf: &mut impl BufMut, mut value: u64) -> usize {
    let mut bytes_written = 0;

    loop {
        #[allow(clippy::cast_possible_truncation)]
        let mut byte = (value & u64::from(SEGMENT_BITS)) as u8;
        value >>= 7;

        if value != 0 {
            byte |= CONTINUE_BIT;
        }

        buf.put_u8(byte);
        bytes_written += 1;

        if value == 0 {
            break;
        }
    }

    bytes_written
}

/// Number of bytes needed to encode `value`.
#[must_use]
pub const fn varint_len(value: u64) -> usize {
    if value == 0 {
        return 1;
    }
    let bits_needed = 64 - value.leading_zeros();
    (bits_needed as usize).div_ceil(7)
}
