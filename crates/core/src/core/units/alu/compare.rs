//! `l.sf*` compare-and-set-flag family.
//!
//! Unlike the rest of the ALU, these operations never write a
//! general-purpose register: they evaluate a condition and return the new
//! value of the single architectural condition flag (§3 `flag`, SPR `SR_F`),
//! which `l.bf`/`l.bnf` later consume.

use super::CompareOp;

/// Evaluates `op` over `a` and `b`, returning the new flag value.
#[must_use]
pub fn evaluate(op: CompareOp, a: u32, b: u32) -> bool {
    match op {
        CompareOp::Eq => a == b,
        CompareOp::Ne => a != b,
        CompareOp::Gts => (a as i32) > (b as i32),
        CompareOp::Ges => (a as i32) >= (b as i32),
        CompareOp::Lts => (a as i32) < (b as i32),
        CompareOp::Les => (a as i32) <= (b as i32),
        CompareOp::Gtu => a > b,
        CompareOp::Geu => a >= b,
        CompareOp::Ltu => a < b,
        CompareOp::Leu => a <= b,
    }
}
