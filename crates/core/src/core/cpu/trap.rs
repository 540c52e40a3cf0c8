//! Exception entry and `l.rfe` (§4.8 "Exception vectoring", §9 delay-slot
//! re-entry).
//!
//! This architecture has exactly one privilege level above user mode, so
//! there is exactly one shadow-register bank (`bank = 0`) — no M/S
//! delegation logic is needed here, unlike an architecture with nested
//! trap levels.

use super::Cpu;
use crate::common::Trap;
use crate::core::arch::spr::{self, SprEffect};

/// The only shadow-register bank this architecture has.
const BANK: u16 = 0;

impl Cpu {
    /// Vectors to `trap`'s exception handler (§4.8).
    ///
    /// Saves PC, SR, and (if the trap carries one) the effective address to
    /// their shadow SPRs, masks interrupts, switches to supervisor mode, and
    /// jumps to the trap's fixed vector.
    ///
    /// If `self.delay_insn` is set — this trap was raised by the
    /// delay-slot instruction, not by the branch that preceded it — `EPCR`
    /// is set to the *branch's* PC (`pc - 4`), not the delay slot's own PC,
    /// so that `l.rfe` naturally re-enters the branch and the delay slot
    /// replays exactly once, rather than resuming one instruction late and
    /// skipping the branch entirely (§8 testable property 3). `SR_DSX` in
    /// the shadow `ESR` records that this happened, for diagnostics; `rfe`
    /// itself does not need to consult it; `EPCR` alone determines where
    /// execution resumes.
    pub fn enter_exception(&mut self, trap: Trap) {
        let epc = if self.delay_insn { self.pc.wrapping_sub(4) } else { self.pc };
        self.sprs.set_epcr(BANK, epc);

        let sr = self.sprs.sr();
        let esr = if self.delay_insn { sr | spr::SR_DSX } else { sr & !spr::SR_DSX };
        self.sprs.set_esr(BANK, esr);

        if let Some(addr) = trap.effective_address() {
            self.sprs.set_eear(BANK, addr);
        }

        let new_sr = (sr | spr::SR_SM) & !(spr::SR_IEE | spr::SR_TEE | spr::SR_DME | spr::SR_IME);
        self.sprs.set_sr(new_sr);
        self.apply_spr_effect(SprEffect::SupervisorRegisterChanged);

        let vector = trap.vector_address();
        tracing::debug!(cause = %trap, vector, epc, "exception entry");
        self.exceptions_taken += 1;

        self.pc = vector;
        self.pc_next = vector.wrapping_add(4);
        self.delay_insn = false;
    }

    /// `l.rfe` — restores `SR` and `PC` from their shadow SPRs and resumes
    /// wherever the exception interrupted (§4.8, §GLOSSARY "rfe").
    ///
    /// `delay_insn` always clears unconditionally: `EPCR` already points at
    /// whichever address is the correct continuation (the original
    /// instruction, or the branch itself if the trap interrupted its delay
    /// slot), so the next fetch is never itself inside a delay slot.
    pub fn rfe(&mut self) {
        let esr = self.sprs.esr(BANK);
        self.sprs.set_sr(esr);
        self.apply_spr_effect(SprEffect::SupervisorRegisterChanged);

        let epc = self.sprs.epcr(BANK);
        tracing::debug!(epc, "rfe");
        self.pc = epc;
        self.pc_next = epc.wrapping_add(4);
        self.delay_insn = false;
    }
}
