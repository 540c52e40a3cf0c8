//! Special-purpose register (SPR) file.
//!
//! This module implements component F of the architecture: a single
//! 16-bit-addressed register space, partitioned into groups by the high 5
//! bits of the address (`group = addr >> 11`), with the low 11 bits
//! selecting a register within the group. Unlike a RISC-V CSR file, most SPR
//! writes have side effects beyond simply storing the value — changing the
//! supervisor register changes which address translations and caches are
//! active, writing a TLB-entry register populates the software-managed MMU,
//! writing `PICSR` clears pending interrupts rather than setting them, and so
//! on. [`SprFile::write`] performs the masking and truncation every
//! register's family requires and returns a [`SprEffect`] describing any
//! side effect the caller (the CPU, which owns the MMU/cache/interrupt
//! controller these effects touch) must still apply.

use crate::common::constants::MAX_SPRS;

/// Number of bits of an SPR address that select the register within a group.
const GROUP_SHIFT: u32 = 11;

/// System control and status group.
pub const GROUP_SYS: u16 = 0;
/// Data MMU group.
pub const GROUP_DMMU: u16 = 1;
/// Instruction MMU group.
pub const GROUP_IMMU: u16 = 2;
/// Data cache group.
pub const GROUP_DC: u16 = 3;
/// Instruction cache group.
pub const GROUP_IC: u16 = 4;
/// Power management group.
pub const GROUP_PM: u16 = 5;
/// Programmable interrupt controller group.
pub const GROUP_PIC: u16 = 6;
/// Tick timer group.
pub const GROUP_TT: u16 = 7;
/// Debug unit group.
pub const GROUP_DEBUG: u16 = 8;
/// Performance-counter-unit group.
pub const GROUP_PCU: u16 = 9;

/// Version register: identifies the architecture revision. Read-only.
pub const SYS_VR: u16 = 0;
/// Unit-present register: which optional units this configuration includes.
/// Read-only.
pub const SYS_UPR: u16 = 1;
/// CPU configuration register. Read-only.
pub const SYS_CPUCFGR: u16 = 2;
/// Data MMU configuration register. Read-only.
pub const SYS_DMMUCFGR: u16 = 3;
/// Instruction MMU configuration register. Read-only.
pub const SYS_IMMUCFGR: u16 = 4;
/// Data cache configuration register. Read-only.
pub const SYS_DCCFGR: u16 = 5;
/// Instruction cache configuration register. Read-only.
pub const SYS_ICCFGR: u16 = 6;
/// Next program counter (the architectural `pc`, as opposed to `pc_next`).
pub const SYS_NPC: u16 = 16;
/// Supervisor register.
pub const SYS_SR: u16 = 17;
/// Previous program counter, saved on exception entry.
pub const SYS_PPC: u16 = 18;
/// Exception EA register, saved on exception entry.
pub const SYS_EEAR_BASE: u16 = 48;
/// Exception PC register (shadow `pc`), saved on exception entry.
pub const SYS_EPCR_BASE: u16 = 32;
/// Exception SR register (shadow `SR`), saved on exception entry.
pub const SYS_ESR_BASE: u16 = 64;
/// Base of the GPR shadow window, used by the debug unit to read/write
/// general-purpose registers through the SPR bus while the core is halted.
pub const SYS_GPR_BASE: u16 = 1024;

/// Supervisor-mode bit: 1 selects supervisor mode, 0 selects user mode.
pub const SR_SM: u32 = 1 << 0;
/// Tick-timer exception enable.
pub const SR_TEE: u32 = 1 << 1;
/// External-interrupt exception enable.
pub const SR_IEE: u32 = 1 << 2;
/// Data cache enable.
pub const SR_DCE: u32 = 1 << 3;
/// Instruction cache enable.
pub const SR_ICE: u32 = 1 << 4;
/// Data MMU enable.
pub const SR_DME: u32 = 1 << 5;
/// Instruction MMU enable.
pub const SR_IME: u32 = 1 << 6;
/// Condition flag, set by `l.sf*` compare instructions and tested by `l.bf`/`l.bnf`.
pub const SR_F: u32 = 1 << 9;
/// Delay-slot exception indicator: set in the shadow `ESR` when the trap
/// that saved it interrupted a delay-slot instruction, so `l.rfe` knows to
/// restore `delay_insn` rather than clearing it (§4.8 delay-slot re-entry).
pub const SR_DSX: u32 = 1 << 10;

/// Timer mode field shift within `TTMR`.
pub const TTMR_MODE_SHIFT: u32 = 30;
/// Timer mode: disabled.
pub const TTMR_MODE_DISABLED: u32 = 0b00;
/// Timer mode: restart automatically when it reaches the period.
pub const TTMR_MODE_RESTART: u32 = 0b01;
/// Timer mode: stop (one-shot) when it reaches the period.
pub const TTMR_MODE_ONE_SHOT: u32 = 0b10;
/// Timer mode: free-running, ignores the period.
pub const TTMR_MODE_CONTINUOUS: u32 = 0b11;
/// Interrupt-enable bit within `TTMR`.
pub const TTMR_IE: u32 = 1 << 29;
/// Interrupt-pending bit within `TTMR`, set on expiry, write-1-to-clear.
pub const TTMR_IP: u32 = 1 << 28;
/// Mask of the period field within `TTMR`.
pub const TTMR_PERIOD_MASK: u32 = (1 << 28) - 1;

/// A side effect that a register write performs beyond storing the value.
/// The SPR file itself has no access to the MMU, caches, or interrupt
/// controller; the CPU's trap/execute logic inspects this to apply the
/// effect to the right subsystem.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SprEffect {
    /// No side effect beyond the register write itself.
    None,
    /// The supervisor register changed; mode/cache/MMU enable bits may have
    /// flipped.
    SupervisorRegisterChanged,
    /// A data-MMU TLB-entry register was written at the given set/way.
    DataTlbEntryWritten {
        /// TLB set index.
        set: u32,
        /// TLB way index.
        way: u32,
    },
    /// An instruction-MMU TLB-entry register was written at the given set/way.
    InstructionTlbEntryWritten {
        /// TLB set index.
        set: u32,
        /// TLB way index.
        way: u32,
    },
    /// `PICMR` (interrupt mask) changed.
    InterruptMaskChanged,
    /// `PICSR` was written; the written bits clear the corresponding pending
    /// interrupts (write-1-to-clear).
    InterruptStatusCleared {
        /// Bitmask of lines cleared by this write.
        cleared: u32,
    },
    /// `TTMR` was written; mode or period changed and the tick timer should
    /// re-evaluate its next fire time.
    TickTimerReconfigured,
    /// The power-management register's doze bit was set; the core should
    /// halt until an unmasked interrupt arrives.
    PowerManagementHalt,
}

/// The special-purpose register file.
///
/// Backed by a flat, heap-allocated array so that every one of the 65536
/// possible addresses is directly indexable; most are unused in any given
/// configuration, mirroring the real architecture's sparse SPR space.
pub struct SprFile {
    regs: Box<[u32; MAX_SPRS]>,
}

impl SprFile {
    /// Creates a new SPR file with every register cleared, then applies the
    /// read-only identification registers from the supplied configuration.
    #[must_use]
    pub fn new(vr: u32, upr: u32, cpucfgr: u32) -> Self {
        let mut regs = Box::new([0u32; MAX_SPRS]);
        regs[usize::from(addr(GROUP_SYS, SYS_VR))] = vr;
        regs[usize::from(addr(GROUP_SYS, SYS_UPR))] = upr;
        regs[usize::from(addr(GROUP_SYS, SYS_CPUCFGR))] = cpucfgr;
        Self { regs }
    }

    /// Reads a register with no side effects.
    #[inline]
    #[must_use]
    pub fn read(&self, spr_addr: u16) -> u32 {
        self.regs[usize::from(spr_addr)]
    }

    /// Writes a register, applying the masking/truncation its family
    /// requires, and returns any side effect the caller must still apply.
    pub fn write(&mut self, spr_addr: u16, val: u32) -> SprEffect {
        let group = spr_addr >> GROUP_SHIFT;
        let index = spr_addr & ((1 << GROUP_SHIFT) - 1);
        match group {
            GROUP_SYS => self.write_sys(index, spr_addr, val),
            GROUP_DMMU => {
                self.regs[usize::from(spr_addr)] = val;
                let (set, way) = tlb_set_way(index);
                SprEffect::DataTlbEntryWritten { set, way }
            }
            GROUP_IMMU => {
                self.regs[usize::from(spr_addr)] = val;
                let (set, way) = tlb_set_way(index);
                SprEffect::InstructionTlbEntryWritten { set, way }
            }
            GROUP_PIC if index == 0 => {
                self.regs[usize::from(spr_addr)] = val;
                SprEffect::InterruptMaskChanged
            }
            GROUP_PIC if index == 1 => {
                let prior = self.regs[usize::from(spr_addr)];
                self.regs[usize::from(spr_addr)] = prior & !val;
                SprEffect::InterruptStatusCleared { cleared: val }
            }
            GROUP_TT if index == 0 => {
                self.regs[usize::from(spr_addr)] = val;
                SprEffect::TickTimerReconfigured
            }
            GROUP_TT if index == 1 => SprEffect::None,
            GROUP_PM => {
                self.regs[usize::from(spr_addr)] = val;
                if val & 1 != 0 {
                    SprEffect::PowerManagementHalt
                } else {
                    SprEffect::None
                }
            }
            _ => {
                self.regs[usize::from(spr_addr)] = val;
                SprEffect::None
            }
        }
    }

    fn write_sys(&mut self, index: u16, spr_addr: u16, val: u32) -> SprEffect {
        match index {
            SYS_VR | SYS_UPR | SYS_CPUCFGR | SYS_DMMUCFGR | SYS_IMMUCFGR | SYS_DCCFGR
            | SYS_ICCFGR => SprEffect::None,
            SYS_SR => {
                self.regs[usize::from(spr_addr)] = val;
                SprEffect::SupervisorRegisterChanged
            }
            _ => {
                self.regs[usize::from(spr_addr)] = val;
                SprEffect::None
            }
        }
    }

    /// Reads the supervisor register.
    #[must_use]
    pub fn sr(&self) -> u32 {
        self.read(addr(GROUP_SYS, SYS_SR))
    }

    /// Overwrites the supervisor register with no masking. Used by exception
    /// entry/`l.rfe`, which set the full register directly.
    pub fn set_sr(&mut self, val: u32) {
        self.regs[usize::from(addr(GROUP_SYS, SYS_SR))] = val;
    }

    /// Reads the shadow exception-PC register for the given shadow-register
    /// bank (always 0 in this configuration, which has one exception level).
    #[must_use]
    pub fn epcr(&self, bank: u16) -> u32 {
        self.read(addr(GROUP_SYS, SYS_EPCR_BASE + bank))
    }

    /// Writes the shadow exception-PC register.
    pub fn set_epcr(&mut self, bank: u16, val: u32) {
        self.regs[usize::from(addr(GROUP_SYS, SYS_EPCR_BASE + bank))] = val;
    }

    /// Reads the shadow exception effective-address register.
    #[must_use]
    pub fn eear(&self, bank: u16) -> u32 {
        self.read(addr(GROUP_SYS, SYS_EEAR_BASE + bank))
    }

    /// Writes the shadow exception effective-address register.
    pub fn set_eear(&mut self, bank: u16, val: u32) {
        self.regs[usize::from(addr(GROUP_SYS, SYS_EEAR_BASE + bank))] = val;
    }

    /// Reads the shadow exception-SR register.
    #[must_use]
    pub fn esr(&self, bank: u16) -> u32 {
        self.read(addr(GROUP_SYS, SYS_ESR_BASE + bank))
    }

    /// Writes the shadow exception-SR register.
    pub fn set_esr(&mut self, bank: u16, val: u32) {
        self.regs[usize::from(addr(GROUP_SYS, SYS_ESR_BASE + bank))] = val;
    }

    /// Reads the interrupt mask register (`PICMR`).
    #[must_use]
    pub fn picmr(&self) -> u32 {
        self.read(addr(GROUP_PIC, 0))
    }

    /// Reads the interrupt status register (`PICSR`).
    #[must_use]
    pub fn picsr(&self) -> u32 {
        self.read(addr(GROUP_PIC, 1))
    }

    /// Sets bits in the interrupt status register directly; used by the
    /// interrupt controller to report a newly pending line. Writes from the
    /// guest go through [`SprFile::write`] instead, which clears rather than
    /// sets.
    pub fn set_picsr_bits(&mut self, bits: u32) {
        let a = addr(GROUP_PIC, 1);
        self.regs[usize::from(a)] |= bits;
    }

    /// Reads the tick timer mode register (`TTMR`).
    #[must_use]
    pub fn ttmr(&self) -> u32 {
        self.read(addr(GROUP_TT, 0))
    }

    /// Reads the tick timer count register (`TTCR`).
    #[must_use]
    pub fn ttcr(&self) -> u32 {
        self.read(addr(GROUP_TT, 1))
    }

    /// Sets the tick timer count register directly; guest writes to `TTCR`
    /// are ignored per the architecture (only the scheduler advances it).
    pub fn set_ttcr(&mut self, val: u32) {
        self.regs[usize::from(addr(GROUP_TT, 1))] = val;
    }

    /// Sets the pending bit of `TTMR` directly, as the scheduler does on
    /// expiry.
    pub fn set_ttmr_pending(&mut self) {
        let a = addr(GROUP_TT, 0);
        self.regs[usize::from(a)] |= TTMR_IP;
    }

    /// Reads a performance-counter-unit register by index.
    #[must_use]
    pub fn pcu(&self, index: u16) -> u32 {
        self.read(addr(GROUP_PCU, index))
    }

    /// Sets a performance-counter-unit register by index directly; these are
    /// maintained by the statistics collector, not by guest writes.
    pub fn set_pcu(&mut self, index: u16, val: u32) {
        self.regs[usize::from(addr(GROUP_PCU, index))] = val;
    }
}

impl std::fmt::Debug for SprFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SprFile")
            .field("sr", &format_args!("{:#010x}", self.sr()))
            .finish_non_exhaustive()
    }
}

/// Builds a full 16-bit SPR address from a group and an in-group index.
#[must_use]
pub fn addr(group: u16, index: u16) -> u16 {
    (group << GROUP_SHIFT) | index
}

/// Splits a DMMU/IMMU in-group index into a (set, way) pair. The high bit of
/// the index selects the way; the remaining bits select the set, matching
/// the match-register/translate-register pairing used by the TLB-entry SPR
/// writes (§4.2).
fn tlb_set_way(index: u16) -> (u32, u32) {
    let way = u32::from(index >> 7);
    let set = u32::from(index & 0x7f);
    (set, way)
}
