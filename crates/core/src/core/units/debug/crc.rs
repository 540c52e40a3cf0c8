//! CRC-32 (IEEE 802.3) framing for JTAG DEBUG data-register commands (§4.9).
//!
//! The polynomial, initial value, and bit order (MS-bit first) are fixed by
//! the architecture; ported from `examples/original_source/debug/jtag.c`'s
//! `crc32()` as a small bit-at-a-time shift register rather than a lookup
//! table, since the payload a command CRCs over is an arbitrary run-time bit
//! length, not a byte-aligned buffer.

/// IEEE 802.3 CRC-32 polynomial.
const POLY: u32 = 0x04c1_1db7;

/// Initial CRC register value before any bits have been shifted in.
pub const INIT: u32 = 0xffff_ffff;

/// Folds a single bit (MS-bit first) into a running CRC.
#[must_use]
fn update_bit(crc: u32, bit: bool) -> u32 {
    let msb_set = (crc >> 31) & 1 == 1;
    let shifted = crc << 1;
    if msb_set ^ bit {
        shifted ^ POLY
    } else {
        shifted
    }
}

/// Folds the low `nbits` of `value` into `crc`, most-significant bit first.
#[must_use]
pub fn update(mut crc: u32, value: u64, nbits: u32) -> u32 {
    for i in (0..nbits).rev() {
        let bit = (value >> i) & 1 == 1;
        crc = update_bit(crc, bit);
    }
    crc
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn single_zero_bit_does_not_flip_polynomial() {
        assert_eq!(update_bit(0, false), 0);
    }

    #[test]
    fn crc_changes_when_a_bit_flips() {
        let a = update(INIT, 0x1234_5678, 32);
        let b = update(INIT, 0x1234_5679, 32);
        assert_ne!(a, b);
    }

    #[test]
    fn crc_is_deterministic() {
        let a = update(INIT, 0xdead_beef, 32);
        let b = update(INIT, 0xdead_beef, 32);
        assert_eq!(a, b);
    }

    proptest::proptest! {
        /// Flipping any single bit of the input changes the resulting CRC,
        /// for any value and bit position within it.
        #[test]
        fn single_bit_flip_changes_the_crc(value in proptest::prelude::any::<u32>(), bit in 0u32..32) {
            let a = update(INIT, u64::from(value), 32);
            let flipped = value ^ (1 << bit);
            let b = update(INIT, u64::from(flipped), 32);
            prop_assert_ne!(a, b);
        }
    }
}
