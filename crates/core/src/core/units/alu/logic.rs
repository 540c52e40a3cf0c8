//! ALU bitwise logical operations.

/// `l.and`/`l.andi`.
#[must_use]
pub fn and(a: u32, b: u32) -> u32 {
    a & b
}

/// `l.or`/`l.ori`.
#[must_use]
pub fn or(a: u32, b: u32) -> u32 {
    a | b
}

/// `l.xor`/`l.xori`.
#[must_use]
pub fn xor(a: u32, b: u32) -> u32 {
    a ^ b
}
