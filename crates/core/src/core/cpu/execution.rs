//! Fetch-decode-execute-retire loop (component H, §4.8).
//!
//! [`Cpu::step`] is the only entry point: it fetches one instruction through
//! [`crate::core::cpu::memory`], decodes it, dispatches on the mnemonic, and
//! updates `pc`/`pc_next`/`delay_insn` for the following cycle. Everything
//! that can fail architecturally returns a [`Trap`] internally and is
//! vectored by [`crate::core::cpu::trap::Cpu::enter_exception`] before
//! `step` returns — callers never see a `Trap` directly, matching §7's
//! "architectural exceptions are always recoverable [and] vectored, not
//! propagated".
//!
//! The per-cycle concerns this module does *not* own — polling the
//! interrupt controller before fetch, running due scheduler events at
//! retire, and folding `mem_cycles` into a global cycle counter — belong to
//! [`crate::sim::simulator::Simulator`], which is the only thing that can see
//! more than just this one CPU.

use super::Cpu;
use crate::common::Trap;
use crate::common::constants::LINK_REGISTER;
use crate::core::units::alu::{Alu, AluOp, CompareOp};
use crate::isa::decode::decode;
use crate::isa::opcodes::Opcode;
use crate::soc::AddressSpace;

/// A testbench hook carried by a distinguished `l.nop` immediate (§4.8,
/// §6A supplemented feature). Guest test code uses this to signal
/// completion to the host without the host needing to parse program
/// output; normal compiler-generated code never emits these encodings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NopHook {
    /// The guest requested termination with the value of `r3` as an exit
    /// code.
    Exit(u32),
    /// The guest reported the value of `r3` to the host, e.g. for test
    /// assertions, without requesting termination.
    Report(u32),
}

const NOP_EXIT: u32 = 0x1;
const NOP_REPORT: u32 = 0x2;

impl Cpu {
    /// Executes exactly one instruction.
    ///
    /// Resets `mem_cycles` to zero before fetching — the caller reads it
    /// back afterwards to fold memory-access timing into the global cycle
    /// counter, win or trap. A halted CPU (power-management doze, §6A) does
    /// nothing and charges no cycles; waking it on an unmasked interrupt is
    /// the simulator's job.
    pub fn step(&mut self, bus: &mut AddressSpace) -> Option<NopHook> {
        self.mem_cycles = 0;
        if self.halted {
            return None;
        }
        match self.dispatch_cycle(bus) {
            Ok(hook) => hook,
            Err(trap) => {
                self.enter_exception(trap);
                None
            }
        }
    }

    fn dispatch_cycle(&mut self, bus: &mut AddressSpace) -> Result<Option<NopHook>, Trap> {
        let word = self.fetch32(bus)?;
        let decoded = decode(word);

        let was_delay_slot = self.delay_insn;
        let next_pc = self.pc_next;
        let mut next_pc_next = next_pc.wrapping_add(4);
        let mut branch_taken = false;
        let mut hook = None;

        match decoded.opcode {
            Opcode::Illegal => return Err(Trap::IllegalInstruction),

            Opcode::Add
            | Opcode::Sub
            | Opcode::And
            | Opcode::Or
            | Opcode::Xor
            | Opcode::Mul
            | Opcode::Sll
            | Opcode::Srl
            | Opcode::Sra => {
                let op = rr_alu_op(decoded.opcode);
                let result = Alu::execute(op, self.gpr.read(decoded.ra), self.gpr.read(decoded.rb));
                self.gpr.write(decoded.rd, result);
            }
            Opcode::Div | Opcode::Divu => {
                let op = if decoded.opcode == Opcode::Div { AluOp::Div } else { AluOp::Divu };
                let result = Alu::divide(op, self.gpr.read(decoded.ra), self.gpr.read(decoded.rb));
                if result.divide_by_zero {
                    return Err(Trap::Range);
                }
                self.gpr.write(decoded.rd, result.value);
            }

            Opcode::Addi | Opcode::Xori | Opcode::Muli | Opcode::Slli | Opcode::Srli | Opcode::Srai => {
                let op = ri_alu_op(decoded.opcode);
                let result = Alu::execute(op, self.gpr.read(decoded.ra), decoded.imm as u32);
                self.gpr.write(decoded.rd, result);
            }
            Opcode::Andi => {
                let result = Alu::execute(AluOp::And, self.gpr.read(decoded.ra), decoded.imm as u32);
                self.gpr.write(decoded.rd, result);
            }
            Opcode::Ori => {
                let result = Alu::execute(AluOp::Or, self.gpr.read(decoded.ra), decoded.imm as u32);
                self.gpr.write(decoded.rd, result);
            }
            Opcode::Movhi => {
                self.gpr.write(decoded.rd, (decoded.imm as u32) << 16);
            }

            Opcode::SfEq
            | Opcode::SfNe
            | Opcode::SfGts
            | Opcode::SfGes
            | Opcode::SfLts
            | Opcode::SfLes
            | Opcode::SfGtu
            | Opcode::SfGeu
            | Opcode::SfLtu
            | Opcode::SfLeu => {
                let op = rr_compare_op(decoded.opcode);
                let flag = Alu::compare(op, self.gpr.read(decoded.ra), self.gpr.read(decoded.rb));
                self.set_flag(flag);
            }
            Opcode::SfEqi
            | Opcode::SfNei
            | Opcode::SfGtsi
            | Opcode::SfGesi
            | Opcode::SfLtsi
            | Opcode::SfLesi
            | Opcode::SfGtui
            | Opcode::SfGeui
            | Opcode::SfLtui
            | Opcode::SfLeui => {
                let op = ri_compare_op(decoded.opcode);
                let flag = Alu::compare(op, self.gpr.read(decoded.ra), decoded.imm as u32);
                self.set_flag(flag);
            }

            Opcode::Lbz | Opcode::Lbs | Opcode::Lhz | Opcode::Lhs | Opcode::Lwz | Opcode::Lws => {
                let vaddr = self.gpr.read(decoded.ra).wrapping_add(decoded.imm as u32);
                let value = match decoded.opcode {
                    Opcode::Lbz => u32::from(self.load_byte(bus, vaddr)?),
                    Opcode::Lbs => (self.load_byte(bus, vaddr)? as i8) as i32 as u32,
                    Opcode::Lhz => u32::from(self.load_half(bus, vaddr)?),
                    Opcode::Lhs => (self.load_half(bus, vaddr)? as i16) as i32 as u32,
                    Opcode::Lwz | Opcode::Lws => self.load_word(bus, vaddr)?,
                    _ => unreachable!("matched load opcodes above"),
                };
                self.gpr.write(decoded.rd, value);
            }

            Opcode::Sb | Opcode::Sh | Opcode::Sw => {
                let vaddr = self.gpr.read(decoded.ra).wrapping_add(decoded.imm as u32);
                let value = self.gpr.read(decoded.rb);
                match decoded.opcode {
                    Opcode::Sb => self.store_byte(bus, vaddr, value as u8)?,
                    Opcode::Sh => self.store_half(bus, vaddr, value as u16)?,
                    Opcode::Sw => self.store_word(bus, vaddr, value)?,
                    _ => unreachable!("matched store opcodes above"),
                }
            }

            Opcode::Bf | Opcode::Bnf => {
                if was_delay_slot {
                    tracing::warn!(pc = self.pc, "branch in delay slot is undefined; treated as nop-in-delay");
                } else if self.flag() == (decoded.opcode == Opcode::Bf) {
                    branch_taken = true;
                    next_pc_next = self.pc.wrapping_add(decoded.imm as u32);
                }
            }

            Opcode::J | Opcode::Jal => {
                if was_delay_slot {
                    tracing::warn!(pc = self.pc, "jump in delay slot is undefined; treated as nop-in-delay");
                } else {
                    if decoded.opcode == Opcode::Jal {
                        self.gpr.write(LINK_REGISTER, self.pc.wrapping_add(8));
                    }
                    branch_taken = true;
                    next_pc_next = self.pc.wrapping_add(decoded.imm as u32);
                }
            }

            Opcode::Jr | Opcode::Jalr => {
                if was_delay_slot {
                    tracing::warn!(pc = self.pc, "jump in delay slot is undefined; treated as nop-in-delay");
                } else {
                    let target = self.gpr.read(decoded.rb);
                    if decoded.opcode == Opcode::Jalr {
                        self.gpr.write(LINK_REGISTER, self.pc.wrapping_add(8));
                    }
                    branch_taken = true;
                    next_pc_next = target;
                }
            }

            Opcode::Mfspr => {
                let addr = self.gpr.read(decoded.ra).wrapping_add(decoded.imm as u32) as u16;
                let value = self.sprs.read(addr);
                self.gpr.write(decoded.rd, value);
            }
            Opcode::Mtspr => {
                let addr = self.gpr.read(decoded.ra).wrapping_add(decoded.imm as u32) as u16;
                let value = self.gpr.read(decoded.rb);
                let effect = self.sprs.write(addr, value);
                tracing::trace!(?effect, addr, "spr write applied");
                self.apply_spr_effect(effect);
            }

            Opcode::Nop => hook = nop_hook(decoded.imm as u32, self.gpr.read(3)),

            Opcode::Sys => return Err(Trap::Syscall),
            Opcode::Trap => return Err(Trap::Trap),
            Opcode::Rfe => {
                self.rfe();
                return Ok(hook);
            }
        }

        self.pc = next_pc;
        self.pc_next = next_pc_next;
        self.delay_insn = branch_taken;
        Ok(hook)
    }
}

fn nop_hook(imm: u32, r3: u32) -> Option<NopHook> {
    match imm {
        NOP_EXIT => Some(NopHook::Exit(r3)),
        NOP_REPORT => Some(NopHook::Report(r3)),
        _ => None,
    }
}

fn rr_alu_op(opcode: Opcode) -> AluOp {
    match opcode {
        Opcode::Add => AluOp::Add,
        Opcode::Sub => AluOp::Sub,
        Opcode::And => AluOp::And,
        Opcode::Or => AluOp::Or,
        Opcode::Xor => AluOp::Xor,
        Opcode::Mul => AluOp::Mul,
        Opcode::Sll => AluOp::Sll,
        Opcode::Srl => AluOp::Srl,
        Opcode::Sra => AluOp::Sra,
        _ => unreachable!("caller matched the register-register arithmetic opcodes"),
    }
}

fn ri_alu_op(opcode: Opcode) -> AluOp {
    match opcode {
        Opcode::Addi => AluOp::Add,
        Opcode::Xori => AluOp::Xor,
        Opcode::Muli => AluOp::Mul,
        Opcode::Slli => AluOp::Sll,
        Opcode::Srli => AluOp::Srl,
        Opcode::Srai => AluOp::Sra,
        _ => unreachable!("caller matched the register-immediate arithmetic opcodes"),
    }
}

fn rr_compare_op(opcode: Opcode) -> CompareOp {
    match opcode {
        Opcode::SfEq => CompareOp::Eq,
        Opcode::SfNe => CompareOp::Ne,
        Opcode::SfGts => CompareOp::Gts,
        Opcode::SfGes => CompareOp::Ges,
        Opcode::SfLts => CompareOp::Lts,
        Opcode::SfLes => CompareOp::Les,
        Opcode::SfGtu => CompareOp::Gtu,
        Opcode::SfGeu => CompareOp::Geu,
        Opcode::SfLtu => CompareOp::Ltu,
        Opcode::SfLeu => CompareOp::Leu,
        _ => unreachable!("caller matched the register-register compare opcodes"),
    }
}

fn ri_compare_op(opcode: Opcode) -> CompareOp {
    match opcode {
        Opcode::SfEqi => CompareOp::Eq,
        Opcode::SfNei => CompareOp::Ne,
        Opcode::SfGtsi => CompareOp::Gts,
        Opcode::SfGesi => CompareOp::Ges,
        Opcode::SfLtsi => CompareOp::Lts,
        Opcode::SfLesi => CompareOp::Les,
        Opcode::SfGtui => CompareOp::Gtu,
        Opcode::SfGeui => CompareOp::Geu,
        Opcode::SfLtui => CompareOp::Ltu,
        Opcode::SfLeui => CompareOp::Leu,
        _ => unreachable!("caller matched the register-immediate compare opcodes"),
    }
}
