//! Variable-length integers.
//!
//! A varint is 1 to 9 bytes. The first eight bytes each carry 7 bits of
//! value, most significant first, and the high bit says whether another byte
//! follows. A ninth byte, if reached, carries a full 8 bits and always ends
//! the value.
//!
//! ```text
//! 0x00            -> 0
//! 0x7F            -> 127
//! 0x81 0x00       -> 128
//! 0xFF x8, 0xFF   -> u64::MAX (9 bytes)
//! ```

use crate::error::{Error, Result};

/// Longest possible encoding.
pub const MAX_VARINT_LEN: usize = 9;

/// Decode a varint from the front of `buf`.
///
/// Returns the value and the number of bytes consumed. Row keys are the
/// two's-complement reinterpretation of the returned value.
pub fn read_varint(buf: &[u8]) -> Result<(u64, usize)> {
    let mut value: u64 = 0;
    for (i, &byte) in buf.iter().enumerate().take(MAX_VARINT_LEN - 1) {
        value = (value << 7) | u64::from(byte & 0x7F);
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }

    match buf.get(MAX_VARINT_LEN - 1) {
        Some(&last) => Ok(((value << 8) | u64::from(last), MAX_VARINT_LEN)),
        None => Err(Error::TruncatedVarint {
            available: buf.len(),
        }),
    }
}

/// Number of bytes `write_varint` uses for `value`.
pub const fn varint_len(value: u64) -> usize {
    if value > 0x00FF_FFFF_FFFF_FFFF {
        return MAX_VARINT_LEN;
    }
    let mut len = 1;
    let mut rest = value >> 7;
    while rest != 0 {
        len += 1;
        rest >>= 7;
    }
    len
}

/// Encode `value` into the front of `buf`, returning the bytes written.
///
/// Panics if `buf` is shorter than `varint_len(value)`.
pub fn write_varint(buf: &mut [u8], value: u64) -> usize {
    let len = varint_len(value);
    if len == MAX_VARINT_LEN {
        buf[8] = value as u8;
        let mut rest = value >> 8;
        for i in (0..8).rev() {
            buf[i] = (rest as u8 & 0x7F) | 0x80;
            rest >>= 7;
        }
        return len;
    }

    let mut rest = value;
    for i in (0..len).rev() {
        let continuation = if i == len - 1 { 0 } else { 0x80 };
        buf[i] = (rest as u8 & 0x7F) | continuation;
        rest >>= 7;
    }
    len
}
