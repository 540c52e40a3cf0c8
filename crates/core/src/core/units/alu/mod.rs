//! Arithmetic Logic Unit (ALU).
//!
//! This architecture is 32-bit, two's-complement, with no floating-point
//! unit. Operations are organized into submodules by category:
//! - [`arithmetic`]: `l.add`, `l.sub`, `l.mul`, `l.div`, `l.divu`
//! - [`logic`]:      `l.and`, `l.or`, `l.xor`
//! - [`shifts`]:     `l.sll`, `l.srl`, `l.sra`
//! - [`compare`]:    the `l.sf*` family, which sets the single condition flag
//!   rather than writing a register

/// Integer arithmetic operations (add, subtract, multiply, divide).
pub mod arithmetic;

/// Compare-and-set-flag operations (`l.sf*`).
pub mod compare;

/// Bitwise logical operations (and, or, xor).
pub mod logic;

/// Shift operations (sll, srl, sra).
pub mod shifts;

/// An arithmetic or logical ALU operation, producing a 32-bit result.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AluOp {
    /// `l.add` / `l.addi`.
    Add,
    /// `l.sub`.
    Sub,
    /// `l.and` / `l.andi`.
    And,
    /// `l.or` / `l.ori`.
    Or,
    /// `l.xor` / `l.xori`.
    Xor,
    /// `l.mul`.
    Mul,
    /// `l.div` (signed).
    Div,
    /// `l.divu` (unsigned).
    Divu,
    /// `l.sll` / `l.slli`.
    Sll,
    /// `l.srl` / `l.srli`.
    Srl,
    /// `l.sra` / `l.srai`.
    Sra,
}

/// A comparison performed by the `l.sf*` family, which sets the condition
/// flag (`SR_F`) rather than writing a general-purpose register.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompareOp {
    /// `l.sfeq`: equal.
    Eq,
    /// `l.sfne`: not equal.
    Ne,
    /// `l.sfgts`: signed greater than.
    Gts,
    /// `l.sfges`: signed greater than or equal.
    Ges,
    /// `l.sflts`: signed less than.
    Lts,
    /// `l.sfles`: signed less than or equal.
    Les,
    /// `l.sfgtu`: unsigned greater than.
    Gtu,
    /// `l.sfgeu`: unsigned greater than or equal.
    Geu,
    /// `l.sfltu`: unsigned less than.
    Ltu,
    /// `l.sfleu`: unsigned less than or equal.
    Leu,
}

/// Result of a division-family operation: the quotient/remainder plus
/// whether the divisor was zero, which the executor raises as a range
/// exception (§4.8) rather than folding into the result the way RISC-V's
/// ALU does.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DivResult {
    /// The quotient (or 0 if `divide_by_zero` is set).
    pub value: u32,
    /// Whether the divisor was zero.
    pub divide_by_zero: bool,
}

/// The arithmetic logic unit. Stateless: every operation is a pure function
/// of its operands.
pub struct Alu;

impl Alu {
    /// Executes a non-division arithmetic or logical operation.
    ///
    /// # Panics
    ///
    /// Panics if `op` is [`AluOp::Div`] or [`AluOp::Divu`]; use
    /// [`Alu::divide`] for those, since they can fail.
    #[must_use]
    pub fn execute(op: AluOp, a: u32, b: u32) -> u32 {
        match op {
            AluOp::Add => arithmetic::add(a, b),
            AluOp::Sub => arithmetic::sub(a, b),
            AluOp::Mul => arithmetic::mul(a, b),
            AluOp::And => logic::and(a, b),
            AluOp::Or => logic::or(a, b),
            AluOp::Xor => logic::xor(a, b),
            AluOp::Sll => shifts::sll(a, b),
            AluOp::Srl => shifts::srl(a, b),
            AluOp::Sra => shifts::sra(a, b),
            AluOp::Div | AluOp::Divu => {
                unreachable!("division operations must go through Alu::divide")
            }
        }
    }

    /// Performs `l.div`/`l.divu`, reporting divide-by-zero rather than
    /// folding it into the result.
    #[must_use]
    pub fn divide(op: AluOp, a: u32, b: u32) -> DivResult {
        match op {
            AluOp::Div => arithmetic::div_signed(a, b),
            AluOp::Divu => arithmetic::div_unsigned(a, b),
            _ => unreachable!("Alu::divide called with a non-division op"),
        }
    }

    /// Evaluates an `l.sf*` comparison, returning the new value of the
    /// condition flag.
    #[must_use]
    pub fn compare(op: CompareOp, a: u32, b: u32) -> bool {
        compare::evaluate(op, a, b)
    }
}
