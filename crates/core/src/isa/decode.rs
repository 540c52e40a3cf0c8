//! Instruction decoder (component G, §4.7).
//!
//! A single combinational function from a 32-bit word to a [`Decoded`].
//! The major opcode alone selects the mnemonic — there is no secondary
//! `funct` dispatch, so decoding never fails except by falling through to
//! [`Opcode::Illegal`]. Turning an illegal decode into a trap is the
//! executor's job: decoding a word that happens to sit in dead code must
//! not itself be observable.

use super::instruction::{Decoded, RawFields};
use super::opcodes::Opcode;

const OP_ADD: u32 = 0x01;
const OP_SUB: u32 = 0x02;
const OP_AND: u32 = 0x03;
const OP_OR: u32 = 0x04;
const OP_XOR: u32 = 0x05;
const OP_MUL: u32 = 0x06;
const OP_DIV: u32 = 0x07;
const OP_DIVU: u32 = 0x08;
const OP_SLL: u32 = 0x09;
const OP_SRL: u32 = 0x0A;
const OP_SRA: u32 = 0x0B;

const OP_ADDI: u32 = 0x0C;
const OP_ANDI: u32 = 0x0D;
const OP_ORI: u32 = 0x0E;
const OP_XORI: u32 = 0x0F;
const OP_MULI: u32 = 0x10;
const OP_SLLI: u32 = 0x11;
const OP_SRLI: u32 = 0x12;
const OP_SRAI: u32 = 0x13;
const OP_MOVHI: u32 = 0x14;

const OP_SFEQ: u32 = 0x15;
const OP_SFNE: u32 = 0x16;
const OP_SFGTS: u32 = 0x17;
const OP_SFGES: u32 = 0x18;
const OP_SFLTS: u32 = 0x19;
const OP_SFLES: u32 = 0x1A;
const OP_SFGTU: u32 = 0x1B;
const OP_SFGEU: u32 = 0x1C;
const OP_SFLTU: u32 = 0x1D;
const OP_SFLEU: u32 = 0x1E;

const OP_SFEQI: u32 = 0x1F;
const OP_SFNEI: u32 = 0x20;
const OP_SFGTSI: u32 = 0x21;
const OP_SFGESI: u32 = 0x22;
const OP_SFLTSI: u32 = 0x23;
const OP_SFLESI: u32 = 0x24;
const OP_SFGTUI: u32 = 0x25;
const OP_SFGEUI: u32 = 0x26;
const OP_SFLTUI: u32 = 0x27;
const OP_SFLEUI: u32 = 0x28;

const OP_LBZ: u32 = 0x29;
const OP_LBS: u32 = 0x2A;
const OP_LHZ: u32 = 0x2B;
const OP_LHS: u32 = 0x2C;
const OP_LWZ: u32 = 0x2D;
const OP_LWS: u32 = 0x2E;

const OP_SB: u32 = 0x2F;
const OP_SH: u32 = 0x30;
const OP_SW: u32 = 0x31;

const OP_BF: u32 = 0x32;
const OP_BNF: u32 = 0x33;

const OP_J: u32 = 0x34;
const OP_JAL: u32 = 0x35;
const OP_JR: u32 = 0x36;
const OP_JALR: u32 = 0x37;

const OP_MFSPR: u32 = 0x38;
const OP_MTSPR: u32 = 0x39;

const OP_NOP: u32 = 0x3A;
const OP_SYS: u32 = 0x3B;
const OP_TRAP: u32 = 0x3C;
const OP_RFE: u32 = 0x3D;

/// Decodes a raw instruction word.
#[must_use]
pub fn decode(word: u32) -> Decoded {
    let major = word.major_opcode();

    match major {
        OP_ADD..=OP_SRA => Decoded {
            raw: word,
            opcode: rr_arith_opcode(major),
            rd: word.field_d(),
            ra: word.field_a(),
            rb: word.field_b(),
            imm: 0,
        },

        OP_ADDI | OP_XORI | OP_MULI | OP_SLLI | OP_SRLI | OP_SRAI => Decoded {
            raw: word,
            opcode: ri_arith_opcode(major),
            rd: word.field_d(),
            ra: word.field_a(),
            rb: 0,
            imm: word.imm16(),
        },

        OP_ANDI | OP_ORI => Decoded {
            raw: word,
            opcode: if major == OP_ANDI {
                Opcode::Andi
            } else {
                Opcode::Ori
            },
            rd: word.field_d(),
            ra: word.field_a(),
            rb: 0,
            imm: word.imm16_zext() as i32,
        },

        OP_MOVHI => Decoded {
            raw: word,
            opcode: Opcode::Movhi,
            rd: word.field_d(),
            ra: 0,
            rb: 0,
            imm: word.imm16_zext() as i32,
        },

        OP_SFEQ..=OP_SFLEU => Decoded {
            raw: word,
            opcode: compare_rr_opcode(major),
            rd: 0,
            ra: word.field_a(),
            rb: word.field_b(),
            imm: 0,
        },

        OP_SFEQI..=OP_SFLEUI => Decoded {
            raw: word,
            opcode: compare_ri_opcode(major),
            rd: 0,
            ra: word.field_a(),
            rb: 0,
            imm: word.imm16(),
        },

        OP_LBZ..=OP_LWS => Decoded {
            raw: word,
            opcode: load_opcode(major),
            rd: word.field_d(),
            ra: word.field_a(),
            rb: 0,
            imm: word.imm16(),
        },

        OP_SB..=OP_SW => Decoded {
            raw: word,
            opcode: store_opcode(major),
            rd: 0,
            ra: word.field_a(),
            rb: word.field_d(),
            imm: word.imm16(),
        },

        OP_BF | OP_BNF => Decoded {
            raw: word,
            opcode: if major == OP_BF { Opcode::Bf } else { Opcode::Bnf },
            rd: 0,
            ra: 0,
            rb: 0,
            imm: word.imm26_scaled(),
        },

        OP_J | OP_JAL => Decoded {
            raw: word,
            opcode: if major == OP_J { Opcode::J } else { Opcode::Jal },
            rd: 0,
            ra: 0,
            rb: 0,
            imm: word.imm26_scaled(),
        },

        OP_JR | OP_JALR => Decoded {
            raw: word,
            opcode: if major == OP_JR { Opcode::Jr } else { Opcode::Jalr },
            rd: 0,
            ra: 0,
            rb: word.field_a(),
            imm: 0,
        },

        OP_MFSPR => Decoded {
            raw: word,
            opcode: Opcode::Mfspr,
            rd: word.field_d(),
            ra: word.field_a(),
            rb: 0,
            imm: word.imm16(),
        },

        OP_MTSPR => Decoded {
            raw: word,
            opcode: Opcode::Mtspr,
            rd: 0,
            ra: word.field_a(),
            rb: word.field_d(),
            imm: word.imm16(),
        },

        OP_NOP => Decoded {
            raw: word,
            opcode: Opcode::Nop,
            rd: 0,
            ra: 0,
            rb: 0,
            imm: word.imm16_zext() as i32,
        },

        OP_SYS | OP_TRAP => Decoded {
            raw: word,
            opcode: if major == OP_SYS {
                Opcode::Sys
            } else {
                Opcode::Trap
            },
            rd: 0,
            ra: 0,
            rb: 0,
            imm: word.imm16_zext() as i32,
        },

        OP_RFE => Decoded {
            raw: word,
            opcode: Opcode::Rfe,
            rd: 0,
            ra: 0,
            rb: 0,
            imm: 0,
        },

        _ => Decoded::illegal(word),
    }
}

fn rr_arith_opcode(major: u32) -> Opcode {
    match major {
        OP_ADD => Opcode::Add,
        OP_SUB => Opcode::Sub,
        OP_AND => Opcode::And,
        OP_OR => Opcode::Or,
        OP_XOR => Opcode::Xor,
        OP_MUL => Opcode::Mul,
        OP_DIV => Opcode::Div,
        OP_DIVU => Opcode::Divu,
        OP_SLL => Opcode::Sll,
        OP_SRL => Opcode::Srl,
        OP_SRA => Opcode::Sra,
        _ => unreachable!("caller matched OP_ADD..=OP_SRA"),
    }
}

fn ri_arith_opcode(major: u32) -> Opcode {
    match major {
        OP_ADDI => Opcode::Addi,
        OP_XORI => Opcode::Xori,
        OP_MULI => Opcode::Muli,
        OP_SLLI => Opcode::Slli,
        OP_SRLI => Opcode::Srli,
        OP_SRAI => Opcode::Srai,
        _ => unreachable!("caller matched the register-immediate arithmetic majors"),
    }
}

fn compare_rr_opcode(major: u32) -> Opcode {
    match major {
        OP_SFEQ => Opcode::SfEq,
        OP_SFNE => Opcode::SfNe,
        OP_SFGTS => Opcode::SfGts,
        OP_SFGES => Opcode::SfGes,
        OP_SFLTS => Opcode::SfLts,
        OP_SFLES => Opcode::SfLes,
        OP_SFGTU => Opcode::SfGtu,
        OP_SFGEU => Opcode::SfGeu,
        OP_SFLTU => Opcode::SfLtu,
        OP_SFLEU => Opcode::SfLeu,
        _ => unreachable!("caller matched OP_SFEQ..=OP_SFLEU"),
    }
}

fn compare_ri_opcode(major: u32) -> Opcode {
    match major {
        OP_SFEQI => Opcode::SfEqi,
        OP_SFNEI => Opcode::SfNei,
        OP_SFGTSI => Opcode::SfGtsi,
        OP_SFGESI => Opcode::SfGesi,
        OP_SFLTSI => Opcode::SfLtsi,
        OP_SFLESI => Opcode::SfLesi,
        OP_SFGTUI => Opcode::SfGtui,
        OP_SFGEUI => Opcode::SfGeui,
        OP_SFLTUI => Opcode::SfLtui,
        OP_SFLEUI => Opcode::SfLeui,
        _ => unreachable!("caller matched OP_SFEQI..=OP_SFLEUI"),
    }
}

fn load_opcode(major: u32) -> Opcode {
    match major {
        OP_LBZ => Opcode::Lbz,
        OP_LBS => Opcode::Lbs,
        OP_LHZ => Opcode::Lhz,
        OP_LHS => Opcode::Lhs,
        OP_LWZ => Opcode::Lwz,
        OP_LWS => Opcode::Lws,
        _ => unreachable!("caller matched OP_LBZ..=OP_LWS"),
    }
}

fn store_opcode(major: u32) -> Opcode {
    match major {
        OP_SB => Opcode::Sb,
        OP_SH => Opcode::Sh,
        OP_SW => Opcode::Sw,
        _ => unreachable!("caller matched OP_SB..=OP_SW"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rr(major: u32, rd: u32, ra: u32, rb: u32) -> u32 {
        (major << 26) | (rd << 21) | (ra << 16) | (rb << 11)
    }

    fn ri(major: u32, rd: u32, ra: u32, imm: u16) -> u32 {
        (major << 26) | (rd << 21) | (ra << 16) | imm as u32
    }

    #[test]
    fn decodes_add() {
        let d = decode(rr(OP_ADD, 1, 2, 3));
        assert_eq!(d.opcode, Opcode::Add);
        assert_eq!((d.rd, d.ra, d.rb), (1, 2, 3));
    }

    #[test]
    fn decodes_addi_with_sign_extended_immediate() {
        let d = decode(ri(OP_ADDI, 4, 5, 0xFFFF));
        assert_eq!(d.opcode, Opcode::Addi);
        assert_eq!(d.imm, -1);
    }

    #[test]
    fn decodes_andi_with_zero_extended_immediate() {
        let d = decode(ri(OP_ANDI, 4, 5, 0xFFFF));
        assert_eq!(d.opcode, Opcode::Andi);
        assert_eq!(d.imm, 0xFFFF);
    }

    #[test]
    fn decodes_store_reusing_rd_field_as_value_source() {
        let d = decode(ri(OP_SW, 7, 2, 0x10));
        assert_eq!(d.opcode, Opcode::Sw);
        assert_eq!(d.ra, 2);
        assert_eq!(d.rb, 7);
        assert_eq!(d.imm, 0x10);
    }

    #[test]
    fn decodes_mtspr_reusing_rd_field_as_value_source() {
        let d = decode(ri(OP_MTSPR, 11, 2, 4));
        assert_eq!(d.opcode, Opcode::Mtspr);
        assert_eq!(d.ra, 2);
        assert_eq!(d.rb, 11);
        assert_eq!(d.imm, 4);
    }

    #[test]
    fn unassigned_major_opcode_decodes_illegal() {
        let d = decode(0x3F << 26);
        assert_eq!(d.opcode, Opcode::Illegal);
    }

    #[test]
    fn reset_vector_zero_word_decodes_illegal() {
        assert_eq!(decode(0).opcode, Opcode::Illegal);
    }
}
