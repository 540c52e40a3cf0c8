//! Instruction Set Architecture (ISA) definitions.
//!
//! A 32-bit, fixed-width, delay-slot instruction set in the `l.*`
//! (OpenRISC-like) tradition: three raw encodings ([`instruction`]), a
//! closed mnemonic table ([`opcodes`]), a combinational decoder
//! ([`decode`]), and a disassembler ([`disasm`]) for trace output.

/// Instruction decoding: maps a raw word to a [`instruction::Decoded`].
pub mod decode;

/// Instruction disassembler for debug tracing and diagnostics.
pub mod disasm;

/// Raw instruction field extraction and the decoder's output type.
pub mod instruction;

/// The closed mnemonic table ([`opcodes::Opcode`]).
pub mod opcodes;
