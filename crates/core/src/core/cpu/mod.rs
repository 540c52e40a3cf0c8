//! CPU architectural state (§3 DATA MODEL).
//!
//! `Cpu` owns everything an instruction's execution touches directly: the
//! general-purpose register file, the program counter pair that makes the
//! delay slot explicit (`pc`/`pc_next`), the SPR file, and the per-CPU memory
//! hierarchy (instruction and data MMU, instruction and data cache). It does
//! not own the address-space map, the scheduler, the interrupt controller,
//! or the JTAG channel — those are shared simulator-level state owned by
//! [`crate::sim::simulator::Simulator`], which is also the only thing that
//! calls into more than one CPU-owned subsystem at once.

/// Instruction execution orchestration: fetch, decode, dispatch, retire.
pub mod execution;

/// Memory access handling and load/store orchestration through MMU and cache.
pub mod memory;

/// Trap entry/exit: exception vectoring and `l.rfe`.
pub mod trap;

use crate::common::RegisterFile;
use crate::config::Config;
use crate::core::arch::mode::PrivilegeMode;
use crate::core::arch::spr::{self, SprEffect, SprFile};
use crate::core::units::cache::CacheSim;
use crate::core::units::mmu::Mmu;

/// CPU architectural state.
pub struct Cpu {
    /// General-purpose registers.
    pub gpr: RegisterFile,
    /// Program counter of the instruction currently being retired.
    pub pc: u32,
    /// Program counter of the instruction that will be fetched next cycle.
    pub pc_next: u32,
    /// Whether the instruction about to be fetched is a delay slot, i.e. the
    /// previous cycle retired a taken branch or jump.
    pub delay_insn: bool,
    /// The special-purpose register file.
    pub sprs: SprFile,
    /// Current privilege level, mirrored from the SR's `SM` bit.
    pub privilege: PrivilegeMode,
    /// Instruction MMU.
    pub immu: Mmu,
    /// Data MMU.
    pub dmmu: Mmu,
    /// Instruction cache.
    pub icache: CacheSim,
    /// Data cache.
    pub dcache: CacheSim,
    /// Cycles charged by the current instruction's memory accesses,
    /// accumulated by [`crate::core::cpu::memory`] and folded into the
    /// global cycle count at retire (§4.1, §4.8).
    pub mem_cycles: u32,
    /// Set by a power-management doze write; the executor stops fetching
    /// until an unmasked interrupt arrives (§6A supplemented feature).
    pub halted: bool,
    /// The most recent simulator-owned [`SprEffect`] this CPU could not
    /// apply itself (interrupt mask/status, tick-timer reconfiguration).
    /// Drained by [`crate::sim::simulator::Simulator`] after every
    /// [`crate::core::cpu::execution`] step, since `Cpu::step` has no
    /// reference back to the subsystems that own them.
    pub pending_sim_effect: Option<SprEffect>,
    /// Count of exceptions vectored through [`trap::Cpu::enter_exception`],
    /// including delivered interrupts. Latched into [`crate::stats::SimStats`]
    /// by the simulator, which has no other way to see traps `Cpu::step`
    /// handled internally.
    pub exceptions_taken: u64,
}

impl Cpu {
    /// Builds a CPU from a configuration, with architectural state as it
    /// would be immediately after reset.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        let mut sprs = SprFile::new(config.cpu.ver, config.cpu.upr, config.cpu.cfgr);
        sprs.set_sr(config.cpu.sr);

        let mut cpu = Self {
            gpr: RegisterFile::new(),
            pc: 0,
            pc_next: 4,
            delay_insn: false,
            sprs,
            privilege: PrivilegeMode::Supervisor,
            immu: Mmu::new(&config.immu),
            dmmu: Mmu::new(&config.dmmu),
            icache: CacheSim::new(&config.ic),
            dcache: CacheSim::new(&config.dc),
            mem_cycles: 0,
            halted: false,
            pending_sim_effect: None,
            exceptions_taken: 0,
        };
        cpu.sync_sr_derived_state();
        cpu
    }

    /// Reinitialises the CPU to its post-reset state. Registered with the
    /// simulator's [`crate::core::reset::ResetBus`] so a guest-triggered
    /// reset and a fresh `init()` go through the same path.
    pub fn reset(&mut self, config: &Config) {
        *self = Cpu::new(config);
    }

    /// Reads the condition flag (`SR_F`), set by `l.sf*` and tested by
    /// `l.bf`/`l.bnf`.
    #[must_use]
    pub fn flag(&self) -> bool {
        self.sprs.sr() & spr::SR_F != 0
    }

    /// Sets or clears the condition flag, leaving the rest of `SR` untouched.
    pub fn set_flag(&mut self, value: bool) {
        let sr = self.sprs.sr();
        let sr = if value { sr | spr::SR_F } else { sr & !spr::SR_F };
        self.sprs.set_sr(sr);
    }

    /// Applies a CPU-local side effect reported by [`SprFile::write`].
    ///
    /// Effects that touch simulator-owned state — the interrupt controller's
    /// mask/status, the tick timer, and the power-management halt request —
    /// are logged and left to the caller
    /// ([`crate::sim::simulator::Simulator::apply_spr_effect`], which owns
    /// those subsystems and handles the full set itself, delegating the
    /// CPU-local variants back here).
    pub fn apply_spr_effect(&mut self, effect: SprEffect) {
        match effect {
            SprEffect::None => {}
            SprEffect::SupervisorRegisterChanged => self.sync_sr_derived_state(),
            SprEffect::DataTlbEntryWritten { set, way } => {
                // `way` only addresses which raw SPR register to read back;
                // which way of the set actually gets the entry is the TLB's
                // own LRU decision, not the guest's.
                let raw = self.sprs.read(spr::addr(spr::GROUP_DMMU, tlb_index(set, way)));
                self.dmmu.refill(set, raw);
            }
            SprEffect::InstructionTlbEntryWritten { set, way } => {
                let raw = self.sprs.read(spr::addr(spr::GROUP_IMMU, tlb_index(set, way)));
                self.immu.refill(set, raw);
            }
            SprEffect::PowerManagementHalt => self.halted = true,
            SprEffect::InterruptMaskChanged
            | SprEffect::InterruptStatusCleared { .. }
            | SprEffect::TickTimerReconfigured => {
                tracing::trace!(?effect, "spr effect requires simulator-owned state, deferred");
                self.pending_sim_effect = Some(effect);
            }
        }
    }

    /// Syncs privilege mode and cache/MMU live-enable state from the current
    /// `SR` value. Runs whenever `SR` changes: at construction and on every
    /// `l.mtspr`/`l.rfe` write that reports `SupervisorRegisterChanged`.
    fn sync_sr_derived_state(&mut self) {
        let sr = self.sprs.sr();
        self.privilege = PrivilegeMode::from_supervisor_bit(sr & spr::SR_SM != 0);
        self.icache.enabled = sr & spr::SR_ICE != 0;
        self.dcache.enabled = sr & spr::SR_DCE != 0;
        self.immu.enabled = sr & spr::SR_IME != 0;
        self.dmmu.enabled = sr & spr::SR_DME != 0;
    }

    /// Dumps register and program-counter state to stderr, for debugging.
    pub fn dump_state(&self) {
        eprintln!(
            "pc={:#010x} pc_next={:#010x} delay_insn={} flag={} privilege={}",
            self.pc,
            self.pc_next,
            self.delay_insn,
            self.flag(),
            self.privilege
        );
        self.gpr.dump();
    }
}

/// Builds a DMMU/IMMU in-group SPR index from a (set, way) pair, the inverse
/// of the SPR file's own set/way split.
fn tlb_index(set: u32, way: u32) -> u16 {
    (((way as u16) << 7) | (set as u16 & 0x7f)) & 0x07ff
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_state_has_empty_delay_slot_and_supervisor_privilege() {
        let cpu = Cpu::new(&Config::default());
        assert!(!cpu.delay_insn);
        assert_eq!(cpu.privilege, PrivilegeMode::Supervisor);
    }

    #[test]
    fn writing_sr_flips_cache_enable_live() {
        let mut cpu = Cpu::new(&Config::default());
        assert!(cpu.icache.enabled);
        let effect = cpu.sprs.write(spr::addr(spr::GROUP_SYS, spr::SYS_SR), 0);
        cpu.apply_spr_effect(effect);
        assert!(!cpu.icache.enabled);
        assert_eq!(cpu.privilege, PrivilegeMode::User);
    }

    #[test]
    fn flag_round_trips_through_sr() {
        let mut cpu = Cpu::new(&Config::default());
        assert!(!cpu.flag());
        cpu.set_flag(true);
        assert!(cpu.flag());
        assert_ne!(cpu.sprs.sr() & spr::SR_F, 0);
    }

    #[test]
    fn tlb_entry_effect_refills_the_right_mmu() {
        let dmmu = crate::config::MmuConfig {
            enabled: true,
            ..crate::config::MmuConfig::default()
        };
        let pagesize = dmmu.pagesize;
        let mut cpu = Cpu::new(&Config {
            dmmu,
            ..Config::default()
        });
        let vaddr = crate::common::VirtAddr::new(2 * pagesize);
        // The refill handler only runs after the set's tag is pending from
        // a real miss; this records it against set 2.
        cpu.dmmu
            .translate(vaddr, crate::core::units::mmu::Access::Read, PrivilegeMode::Supervisor)
            .unwrap_err();
        let effect = cpu.sprs.write(spr::addr(spr::GROUP_DMMU, tlb_index(2, 1)), 0x8000_0000 | 0b0111);
        cpu.apply_spr_effect(effect);
        let t = cpu
            .dmmu
            .translate(vaddr, crate::core::units::mmu::Access::Read, PrivilegeMode::Supervisor)
            .unwrap();
        assert_eq!(t.phys.val(), 0x8000_0000);
    }
}
