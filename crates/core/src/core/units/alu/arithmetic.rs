//! ALU arithmetic operations.
//!
//! Addition, subtraction, and multiplication wrap silently on overflow, per
//! the two's-complement semantics of the architecture. Division is handled
//! separately from the rest of the ALU: a zero divisor is a range exception
//! (§4.8, §7), not a RISC-V-style folded result.

use super::DivResult;

/// `l.add`/`l.addi`: wrapping 32-bit addition.
#[must_use]
pub fn add(a: u32, b: u32) -> u32 {
    a.wrapping_add(b)
}

/// `l.sub`: wrapping 32-bit subtraction.
#[must_use]
pub fn sub(a: u32, b: u32) -> u32 {
    a.wrapping_sub(b)
}

/// `l.mul`: wrapping 32-bit multiplication, low word only.
#[must_use]
pub fn mul(a: u32, b: u32) -> u32 {
    a.wrapping_mul(b)
}

/// `l.div`: signed division. A zero divisor is reported rather than folded
/// into a sentinel value.
#[must_use]
pub fn div_signed(a: u32, b: u32) -> DivResult {
    if b == 0 {
        return DivResult {
            value: 0,
            divide_by_zero: true,
        };
    }
    let value = (a as i32).wrapping_div(b as i32) as u32;
    DivResult {
        value,
        divide_by_zero: false,
    }
}

/// `l.divu`: unsigned division. A zero divisor is reported rather than
/// folded into a sentinel value.
#[must_use]
pub fn div_unsigned(a: u32, b: u32) -> DivResult {
    if b == 0 {
        return DivResult {
            value: 0,
            divide_by_zero: true,
        };
    }
    DivResult {
        value: a / b,
        divide_by_zero: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_division_truncates_towards_zero() {
        let result = div_signed((-7i32) as u32, 2);
        assert_eq!(result.value as i32, -3);
    }

    #[test]
    fn unsigned_division_by_zero_is_flagged() {
        assert!(div_unsigned(5, 0).divide_by_zero);
    }
}
