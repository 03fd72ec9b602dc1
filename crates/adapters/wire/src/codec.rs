//! Bit and byte-order primitives shared by every encoder and decoder.
//!
//! Pure functions, no state.

use crate::error::CodecError;

/// Whether bit `n` (0 = least significant) of `byte` is set.
///
/// # Errors
///
/// Returns [`CodecError::BitOutOfRange`] when `n > 7`.
pub fn bit_at(byte: u8, n: u8) -> Result<bool, CodecError> {
    if n > 7 {
        return Err(CodecError::BitOutOfRange { position: n });
    }
    Ok(byte & (1 << n) != 0)
}

/// Assemble a big-endian pair into a `u16`.
#[must_use]
pub fn concat_u8_pair(hi: u8, lo: u8) -> u16 {
    (u16::from(hi) << 8) | u16::from(lo)
}

/// Least significant byte first.
#[must_use]
pub fn u32_to_le_bytes(n: u32) -> [u8; 4] {
    n.to_le_bytes()
}

#[must_use]
pub fn le_bytes_to_u16(bytes: [u8; 2]) -> u16 {
    u16::from_le_bytes(bytes)
}

/// Two's complement, least significant byte first.
#[must_use]
pub fn i32_to_le_bytes(n: i32) -> [u8; 4] {
    u32_to_le_bytes(n.cast_unsigned())
}

/// Reinterpret an octet as a signed 8-bit value.
#[must_use]
pub fn u8_as_i8(byte: u8) -> i8 {
    byte.cast_signed()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_match_shift_and_mask_for_every_byte_and_position() {
        for byte in 0..=u8::MAX {
            for n in 0..8 {
                assert_eq!(bit_at(byte, n).unwrap(), (byte >> n) & 1 == 1);
            }
        }
    }

    #[test]
    fn should_reject_bit_position_above_seven() {
        assert_eq!(bit_at(0xFF, 8), Err(CodecError::BitOutOfRange { position: 8 }));
    }

    #[test]
    fn should_concat_big_endian_pair() {
        assert_eq!(concat_u8_pair(0x01, 0x02), 0x0102);
        assert_eq!(concat_u8_pair(0x11, 0x22), 0x1122);
    }

    #[test]
    fn should_write_u32_least_significant_byte_first() {
        assert_eq!(u32_to_le_bytes(0x0102_0304), [0x04, 0x03, 0x02, 0x01]);
    }

    #[test]
    fn should_read_little_endian_u16() {
        assert_eq!(le_bytes_to_u16([0b1111_0000, 0b0000_1111]), 0b0000_1111_1111_0000);
    }

    #[test]
    fn should_write_negative_i32_as_twos_complement() {
        assert_eq!(i32_to_le_bytes(-1), [0xFF; 4]);
        assert_eq!(i32_to_le_bytes(-90), [0xA6, 0xFF, 0xFF, 0xFF]);
        assert_eq!(i32_to_le_bytes(360), [0x68, 0x01, 0x00, 0x00]);
    }

    #[test]
    fn should_reinterpret_octet_as_signed() {
        assert_eq!(u8_as_i8(0xFF), -1);
        assert_eq!(u8_as_i8(0x7F), 127);
        assert_eq!(u8_as_i8(0x80), -128);
    }
}
