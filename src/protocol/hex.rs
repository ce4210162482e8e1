//! ASCII-hex nibble codec used on the wire.
//!
//! Decoding is lenient: any character outside `[0-9a-fA-F]`
//! decodes to nibble 0 and no error is raised.

const DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Decode one ASCII hex digit. Non-hex characters yield 0.
pub fn nibble(c: u8) -> u8 {
    match c {
        b'0'..=b'9' => c - b'0',
        b'a'..=b'f' => c - b'a' + 10,
        b'A'..=b'F' => c - b'A' + 10,
        _ => 0,
    }
}

/// Encode the low four bits of `value` as an uppercase ASCII hex digit.
pub fn digit(value: u8) -> u8 {
    DIGITS[usize::from(value & 0x0F)]
}

/// Decode a two-character pair, high nibble first.
pub fn decode_pair(high: u8, low: u8) -> u8 {
    (nibble(high) << 4) | nibble(low)
}

/// Encode a byte as two uppercase ASCII hex digits, high nibble first.
pub fn encode_pair(value: u8) -> [u8; 2] {
    [digit(value >> 4), digit(value)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_hex_pair_normalizes() {
        let alphabet = b"0123456789abcdefABCDEF";
        for &h in alphabet {
            for &l in alphabet {
                let value = decode_pair(h, l);
                let encoded = encode_pair(value);
                assert_eq!(encoded[0], h.to_ascii_uppercase());
                assert_eq!(encoded[1], l.to_ascii_uppercase());
                assert_eq!(decode_pair(encoded[0], encoded[1]), value);
            }
        }
    }

    #[test]
    fn test_non_hex_decodes_to_zero() {
        for c in [b'g', b'G', b'z', b' ', b':', 0x00, 0x11, 0xFF] {
            assert_eq!(nibble(c), 0, "char {:#04x}", c);
        }
        assert_eq!(decode_pair(b'x', b'7'), 0x07);
        assert_eq!(decode_pair(b'9', b'?'), 0x90);
    }

    #[test]
    fn test_digit_masks_high_bits() {
        assert_eq!(digit(0x3C), b'C');
        assert_eq!(encode_pair(0x6E), *b"6E");
    }
}
