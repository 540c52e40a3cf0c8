//! Instruction disassembler for debug tracing and diagnostics.
//!
//! Converts a 32-bit instruction word into a human-readable mnemonic
//! string, used by the commit-log feature and trap diagnostics. This is
//! deliberately a second consumer of [`decode`](super::decode::decode)
//! rather than a separate bit-level decoder: one source of truth for what
//! a word means.

use super::decode::decode;
use super::opcodes::Opcode;

/// Returns the conventional register name (`r0`-`r31`) for a register
/// index.
#[inline]
fn reg(idx: usize) -> String {
    format!("r{idx}")
}

/// Disassembles a 32-bit instruction word into a mnemonic string such as
/// `"l.add r1, r2, r3"` or `"l.illegal (0xdeadbeef)"` for an unrecognised
/// encoding.
#[must_use]
pub fn disassemble(word: u32) -> String {
    let d = decode(word);
    let rd = reg(d.rd);
    let ra = reg(d.ra);
    let rb = reg(d.rb);

    match d.opcode {
        Opcode::Illegal => format!("l.illegal ({word:#010x})"),

        Opcode::Add => format!("l.add {rd}, {ra}, {rb}"),
        Opcode::Sub => format!("l.sub {rd}, {ra}, {rb}"),
        Opcode::And => format!("l.and {rd}, {ra}, {rb}"),
        Opcode::Or => format!("l.or {rd}, {ra}, {rb}"),
        Opcode::Xor => format!("l.xor {rd}, {ra}, {rb}"),
        Opcode::Mul => format!("l.mul {rd}, {ra}, {rb}"),
        Opcode::Div => format!("l.div {rd}, {ra}, {rb}"),
        Opcode::Divu => format!("l.divu {rd}, {ra}, {rb}"),
        Opcode::Sll => format!("l.sll {rd}, {ra}, {rb}"),
        Opcode::Srl => format!("l.srl {rd}, {ra}, {rb}"),
        Opcode::Sra => format!("l.sra {rd}, {ra}, {rb}"),

        Opcode::Addi => format!("l.addi {rd}, {ra}, {}", d.imm),
        Opcode::Andi => format!("l.andi {rd}, {ra}, {:#06x}", d.imm),
        Opcode::Ori => format!("l.ori {rd}, {ra}, {:#06x}", d.imm),
        Opcode::Xori => format!("l.xori {rd}, {ra}, {}", d.imm),
        Opcode::Muli => format!("l.muli {rd}, {ra}, {}", d.imm),
        Opcode::Slli => format!("l.slli {rd}, {ra}, {}", d.imm & 0x1F),
        Opcode::Srli => format!("l.srli {rd}, {ra}, {}", d.imm & 0x1F),
        Opcode::Srai => format!("l.srai {rd}, {ra}, {}", d.imm & 0x1F),
        Opcode::Movhi => format!("l.movhi {rd}, {:#06x}", d.imm),

        Opcode::SfEq => format!("l.sfeq {ra}, {rb}"),
        Opcode::SfNe => format!("l.sfne {ra}, {rb}"),
        Opcode::SfGts => format!("l.sfgts {ra}, {rb}"),
        Opcode::SfGes => format!("l.sfges {ra}, {rb}"),
        Opcode::SfLts => format!("l.sflts {ra}, {rb}"),
        Opcode::SfLes => format!("l.sfles {ra}, {rb}"),
        Opcode::SfGtu => format!("l.sfgtu {ra}, {rb}"),
        Opcode::SfGeu => format!("l.sfgeu {ra}, {rb}"),
        Opcode::SfLtu => format!("l.sfltu {ra}, {rb}"),
        Opcode::SfLeu => format!("l.sfleu {ra}, {rb}"),

        Opcode::SfEqi => format!("l.sfeqi {ra}, {}", d.imm),
        Opcode::SfNei => format!("l.sfnei {ra}, {}", d.imm),
        Opcode::SfGtsi => format!("l.sfgtsi {ra}, {}", d.imm),
        Opcode::SfGesi => format!("l.sfgesi {ra}, {}", d.imm),
        Opcode::SfLtsi => format!("l.sfltsi {ra}, {}", d.imm),
        Opcode::SfLesi => format!("l.sflesi {ra}, {}", d.imm),
        Opcode::SfGtui => format!("l.sfgtui {ra}, {}", d.imm),
        Opcode::SfGeui => format!("l.sfgeui {ra}, {}", d.imm),
        Opcode::SfLtui => format!("l.sfltui {ra}, {}", d.imm),
        Opcode::SfLeui => format!("l.sfleui {ra}, {}", d.imm),

        Opcode::Lbz => format!("l.lbz {rd}, {}({ra})", d.imm),
        Opcode::Lbs => format!("l.lbs {rd}, {}({ra})", d.imm),
        Opcode::Lhz => format!("l.lhz {rd}, {}({ra})", d.imm),
        Opcode::Lhs => format!("l.lhs {rd}, {}({ra})", d.imm),
        Opcode::Lwz => format!("l.lwz {rd}, {}({ra})", d.imm),
        Opcode::Lws => format!("l.lws {rd}, {}({ra})", d.imm),

        Opcode::Sb => format!("l.sb {}({ra}), {rb}", d.imm),
        Opcode::Sh => format!("l.sh {}({ra}), {rb}", d.imm),
        Opcode::Sw => format!("l.sw {}({ra}), {rb}", d.imm),

        Opcode::Bf => format!("l.bf {}", d.imm),
        Opcode::Bnf => format!("l.bnf {}", d.imm),

        Opcode::J => format!("l.j {}", d.imm),
        Opcode::Jal => format!("l.jal {}", d.imm),
        Opcode::Jr => format!("l.jr {rb}"),
        Opcode::Jalr => format!("l.jalr {rb}"),

        Opcode::Mfspr => format!("l.mfspr {rd}, {ra}, {}", d.imm),
        Opcode::Mtspr => format!("l.mtspr {ra}, {rb}, {}", d.imm),

        Opcode::Nop => format!("l.nop {:#06x}", d.imm),
        Opcode::Sys => format!("l.sys {:#06x}", d.imm),
        Opcode::Trap => format!("l.trap {:#06x}", d.imm),
        Opcode::Rfe => "l.rfe".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rr(major: u32, rd: u32, ra: u32, rb: u32) -> u32 {
        (major << 26) | (rd << 21) | (ra << 16) | (rb << 11)
    }

    #[test]
    fn disassembles_add() {
        assert_eq!(disassemble(rr(0x01, 1, 2, 3)), "l.add r1, r2, r3");
    }

    #[test]
    fn disassembles_illegal_with_hex_word() {
        let text = disassemble(0xFFFF_FFFF);
        assert!(text.starts_with("l.illegal"));
    }
}
