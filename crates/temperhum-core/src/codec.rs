//! Byte-level helpers shared by the decoder and the CLI.

/// Render bytes as space-separated `0x`-prefixed lowercase hex tokens.
///
/// An empty slice renders as an empty string.
pub fn hex_dump(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("0x{b:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Reinterpret the low `bit_width` bits of `value` as a two's-complement number.
///
/// If bit `bit_width - 1` is set, `2^bit_width` is subtracted; otherwise the
/// value is returned unchanged. Widths outside `1..=32` return the value
/// unchanged.
pub fn signed_from_twos_complement(value: u32, bit_width: u8) -> i64 {
    let value = i64::from(value);
    if bit_width == 0 || bit_width > 32 {
        return value;
    }
    if value & (1 << (bit_width - 1)) != 0 {
        value - (1 << bit_width)
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_dump_empty() {
        assert_eq!(hex_dump(&[]), "");
    }

    #[test]
    fn test_hex_dump_pads_and_lowercases() {
        assert_eq!(hex_dump(&[0x01, 0x0A]), "0x01 0x0a");
        assert_eq!(hex_dump(&[0xFF]), "0xff");
    }

    #[test]
    fn test_twos_complement_16() {
        assert_eq!(signed_from_twos_complement(0xFFFF, 16), -1);
        assert_eq!(signed_from_twos_complement(0x7FFF, 16), 32767);
        assert_eq!(signed_from_twos_complement(0x8000, 16), -32768);
        assert_eq!(signed_from_twos_complement(0x0000, 16), 0);
    }

    #[test]
    fn test_twos_complement_other_widths() {
        assert_eq!(signed_from_twos_complement(0x80, 8), -128);
        assert_eq!(signed_from_twos_complement(0x7F, 8), 127);
        assert_eq!(signed_from_twos_complement(0b1, 1), -1);
        assert_eq!(signed_from_twos_complement(0xFFFF_FFFF, 32), -1);
        assert_eq!(signed_from_twos_complement(0x7FFF_FFFF, 32), i64::from(i32::MAX));
    }

    #[test]
    fn test_twos_complement_out_of_range_width() {
        assert_eq!(signed_from_twos_complement(0xFFFF, 0), 0xFFFF);
        assert_eq!(signed_from_twos_complement(0xFFFF, 33), 0xFFFF);
    }
}
