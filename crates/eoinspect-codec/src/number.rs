//! Variable-width number encoding.
//!
//! Numbers are written as up to four little-endian base-253 digits. Each
//! digit is stored as `digit + 1`; byte value 254 marks an absent digit and
//! byte value 0 is read the same way, so both `0` and `1` decode to digit 0.

use crate::error::{CodecError, Result};

/// Place value of the second digit.
pub const MAX1: u32 = 253;

/// Place value of the third digit.
pub const MAX2: u32 = MAX1 * MAX1;

/// Place value of the fourth digit.
pub const MAX3: u32 = MAX2 * MAX1;

/// Largest value `encode_number` accepts.
pub const MAX_INT: u32 = MAX3 * MAX1 - 1;

/// Largest value that fits in a two-byte (short) encoding.
pub const MAX_SHORT: u32 = MAX2 - 1;

/// Field terminator used by break strings and delimited arrays.
pub const BREAK_BYTE: u8 = 255;

const ABSENT_DIGIT: u8 = 254;
const PLACE_VALUES: [u32; 4] = [1, MAX1, MAX2, MAX3];

/// Decode up to four encoded bytes into a number.
///
/// Missing bytes count as zero and bytes past the fourth are ignored, so
/// this is defined for every input, including an empty slice.
pub fn decode_number(bytes: &[u8]) -> u32 {
    let mut value = 0u32;
    for (index, place) in PLACE_VALUES.iter().enumerate() {
        let raw = match bytes.get(index) {
            Some(&byte) if byte != 0 => byte,
            _ => ABSENT_DIGIT,
        };
        let raw = if raw == ABSENT_DIGIT { 1 } else { raw };
        value += u32::from(raw - 1) * place;
    }
    value
}

/// Encode a number into its four-byte representation.
///
/// Unused high digits are filled with the absent marker (254).
pub fn encode_number(value: u32) -> Result<[u8; 4]> {
    if value > MAX_INT {
        return Err(CodecError::NumberTooLarge {
            value,
            max: MAX_INT,
        });
    }

    let mut bytes = [ABSENT_DIGIT; 4];
    let mut rest = value;

    if value >= MAX3 {
        bytes[3] = (rest / MAX3 + 1) as u8;
        rest %= MAX3;
    }
    if value >= MAX2 {
        bytes[2] = (rest / MAX2 + 1) as u8;
        rest %= MAX2;
    }
    if value >= MAX1 {
        bytes[1] = (rest / MAX1 + 1) as u8;
        rest %= MAX1;
    }
    bytes[0] = (rest + 1) as u8;

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_known_values() {
        assert_eq!(decode_number(&[]), 0);
        assert_eq!(decode_number(&[0]), 0);
        assert_eq!(decode_number(&[1]), 0);
        assert_eq!(decode_number(&[2]), 1);
        assert_eq!(decode_number(&[2, 2]), 254);
        assert_eq!(decode_number(&[1, 1, 1, 1]), 0);
    }

    #[test]
    fn absent_marker_is_zero_digit() {
        assert_eq!(decode_number(&[254]), 0);
        assert_eq!(decode_number(&[254, 254, 254, 254]), 0);
        assert_eq!(decode_number(&[3, 254]), 2);
    }

    #[test]
    fn bytes_past_fourth_are_ignored() {
        assert_eq!(decode_number(&[2, 1, 1, 1, 200, 9]), 1);
    }

    #[test]
    fn decode_is_deterministic_and_bounded() {
        let inputs: [&[u8]; 4] = [&[255], &[255, 255], &[255, 255, 255], &[255, 255, 255, 255]];
        for input in inputs {
            let first = decode_number(input);
            assert_eq!(first, decode_number(input));
            assert!(first <= 254 * (1 + MAX1 + MAX2 + MAX3));
        }
    }

    #[test]
    fn place_values_match_base_253() {
        assert_eq!(MAX2, 64009);
        assert_eq!(MAX3, 16194277);
        assert_eq!(MAX_SHORT, 64008);
    }

    #[test]
    fn encode_short_values() {
        assert_eq!(encode_number(0).unwrap(), [1, 254, 254, 254]);
        assert_eq!(encode_number(1).unwrap(), [2, 254, 254, 254]);
        assert_eq!(encode_number(253).unwrap(), [1, 2, 254, 254]);
    }

    #[test]
    fn encode_then_decode_agrees_on_samples() {
        for value in [0, 7, 252, 253, 254, 64008, 64009, 16194276, 16194277, MAX_INT] {
            let bytes = encode_number(value).unwrap();
            assert_eq!(decode_number(&bytes), value, "value {value}");
        }
    }

    #[test]
    fn encode_rejects_out_of_range() {
        let err = encode_number(MAX_INT + 1).unwrap_err();
        assert!(matches!(err, CodecError::NumberTooLarge { .. }));
    }
}
