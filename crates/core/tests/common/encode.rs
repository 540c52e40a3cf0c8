//! Fluent instruction-word builders, for assembling short test programs
//! without hand-computing bit patterns at every call site.
//!
//! Mirrors the three raw shapes `orisc_core::isa::instruction::RawFields`
//! decodes from: `RR` (register/register), `RI` (register/immediate, which
//! also covers loads, stores, `l.mtspr`/`l.mfspr` since they share the same
//! field layout), and `J` (the 26-bit scaled jump/branch target).

pub const OP_ADD: u32 = 0x01;
pub const OP_AND: u32 = 0x03;
pub const OP_OR: u32 = 0x04;
pub const OP_XOR: u32 = 0x05;
pub const OP_ADDI: u32 = 0x0C;
pub const OP_ANDI: u32 = 0x0D;
pub const OP_ORI: u32 = 0x0E;
pub const OP_XORI: u32 = 0x0F;
pub const OP_MOVHI: u32 = 0x14;
pub const OP_SFEQ: u32 = 0x15;
pub const OP_LBZ: u32 = 0x29;
pub const OP_LHZ: u32 = 0x2B;
pub const OP_LWZ: u32 = 0x2D;
pub const OP_SW: u32 = 0x31;
pub const OP_BF: u32 = 0x32;
pub const OP_BNF: u32 = 0x33;
pub const OP_J: u32 = 0x34;
pub const OP_MFSPR: u32 = 0x38;
pub const OP_MTSPR: u32 = 0x39;
pub const OP_NOP: u32 = 0x3A;
pub const OP_RFE: u32 = 0x3D;

pub const NOP_EXIT: u16 = 0x1;
pub const NOP_REPORT: u16 = 0x2;

/// `RR`-shaped word: `opcode(31:26) rd(25:21) ra(20:16) rb(15:11)`. Covers
/// `l.add`/`l.sub`/... and `l.sfeq`/...; `funct` is never consulted by this
/// decoder, so it is always zero here.
#[must_use]
pub fn rr(major: u32, rd: u32, ra: u32, rb: u32) -> u32 {
    (major << 26) | (rd << 21) | (ra << 16) | (rb << 11)
}

/// `RI`-shaped word: `opcode(31:26) rd(25:21) ra(20:16) imm16(15:0)`. Covers
/// arithmetic-immediate, loads, stores (where the "rd" slot carries the
/// value register, not a destination), `l.mtspr`/`l.mfspr`, and `l.nop`.
#[must_use]
pub fn ri(major: u32, rd: u32, ra: u32, imm: u16) -> u32 {
    (major << 26) | (rd << 21) | (ra << 16) | u32::from(imm)
}

/// `J`-shaped word for `l.bf`/`l.bnf`/`l.j`/`l.jal`: `byte_offset` must be a
/// multiple of 4 and fit the 26-bit scaled, sign-extended field.
#[must_use]
pub fn jump(major: u32, byte_offset: i32) -> u32 {
    let scaled = (byte_offset / 4) as u32 & 0x03FF_FFFF;
    (major << 26) | scaled
}

/// `l.rfe`, the only no-operand opcode this suite needs.
#[must_use]
pub fn rfe() -> u32 {
    OP_RFE << 26
}

/// Appends `word`'s big-endian bytes to `image`.
pub fn push(image: &mut Vec<u8>, word: u32) {
    image.extend_from_slice(&word.to_be_bytes());
}

/// Pads `image` with `l.nop` (opcode 0 word, i.e. illegal-and-never-fetched
/// filler) up to byte offset `to`.
pub fn pad_to(image: &mut Vec<u8>, to: usize) {
    assert!(image.len() <= to, "pad_to target already passed");
    image.resize(to, 0);
}
