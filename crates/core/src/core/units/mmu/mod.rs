//! Memory management unit (component B, §4.2).
//!
//! Separate instruction and data MMUs, each a set-associative TLB with no
//! hardware page-table walker: a miss is always a trap to the guest's
//! refill handler (§4.2 Non-goals). When disabled, translation is the
//! identity function and costs nothing.

/// The set-associative, software-refilled TLB.
pub mod tlb;

use crate::common::{PhysAddr, Trap, VirtAddr};
use crate::config::MmuConfig;
use crate::core::arch::mode::PrivilegeMode;
use tlb::Tlb;

/// The kind of access being translated, used to select which permission
/// bit the TLB entry must carry and which exception kind to raise.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    /// Instruction fetch.
    Fetch,
    /// Data read.
    Read,
    /// Data write.
    Write,
}

/// A successful translation: the physical address plus the cycles this
/// MMU charges for the lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Translated {
    /// The translated physical address.
    pub phys: PhysAddr,
    /// Cycles charged for this translation (hit or miss alike, §4.2).
    pub cycles: u32,
}

/// A single instruction or data MMU.
pub struct Mmu {
    /// Whether translation is active. When false, every address passes
    /// through unchanged at zero cost.
    pub enabled: bool,
    page_shift: u32,
    hit_delay: u32,
    tlb: Tlb,
    /// Count of translations that hit a resident TLB entry, for the §6A
    /// performance-counter-unit SPR bank.
    hits: u64,
    /// Count of translations that missed (trapped to the refill handler).
    misses: u64,
}

impl Mmu {
    /// Builds an MMU from an `immu`/`dmmu` configuration section.
    #[must_use]
    pub fn new(config: &MmuConfig) -> Self {
        let page_size = config.pagesize.max(32).next_power_of_two();
        Self {
            enabled: config.enabled,
            page_shift: page_size.trailing_zeros(),
            hit_delay: config.hit_delay,
            tlb: Tlb::new(config.nsets.max(1) as usize, config.nways.max(1) as usize, page_size),
            hits: 0,
            misses: 0,
        }
    }

    /// Translations that hit a resident TLB entry since construction.
    #[must_use]
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Translations that missed (trapped to the refill handler) since
    /// construction.
    #[must_use]
    pub fn misses(&self) -> u64 {
        self.misses
    }

    /// Translates `vaddr` for the given access kind and privilege mode.
    ///
    /// # Errors
    ///
    /// Returns [`Trap::DataTlbMiss`]/[`Trap::InstructionTlbMiss`] when no
    /// entry matches, or [`Trap::DataPageFault`]/
    /// [`Trap::InstructionPageFault`] when an entry matches but denies the
    /// requested permission.
    pub fn translate(
        &mut self,
        vaddr: VirtAddr,
        access: Access,
        privilege: PrivilegeMode,
    ) -> Result<Translated, Trap> {
        if !self.enabled {
            return Ok(Translated {
                phys: PhysAddr::new(vaddr.val()),
                cycles: 0,
            });
        }

        let vpn = vaddr.val() >> self.page_shift;
        let Some(t) = self.tlb.lookup(vpn) else {
            self.misses += 1;
            return Err(self.miss_trap(access, vaddr.val()));
        };
        self.hits += 1;

        let permitted = match access {
            Access::Fetch => t.executable,
            Access::Read => t.readable,
            Access::Write => t.writable,
        };
        if !permitted || (privilege == PrivilegeMode::User && !t.user) {
            return Err(self.fault_trap(access, vaddr.val()));
        }

        let offset = vaddr.val() & ((1 << self.page_shift) - 1);
        Ok(Translated {
            phys: PhysAddr::new(t.ppn_base | offset),
            cycles: self.hit_delay,
        })
    }

    fn miss_trap(&self, access: Access, addr: u32) -> Trap {
        match access {
            Access::Fetch => Trap::InstructionTlbMiss { addr },
            Access::Read | Access::Write => Trap::DataTlbMiss { addr },
        }
    }

    fn fault_trap(&self, access: Access, addr: u32) -> Trap {
        match access {
            Access::Fetch => Trap::InstructionPageFault { addr },
            Access::Read | Access::Write => Trap::DataPageFault { addr },
        }
    }

    /// Installs a TLB entry written by the guest for `set` (see
    /// `SprEffect::DataTlbEntryWritten`/`InstructionTlbEntryWritten`), into
    /// whichever way the TLB's own LRU state names as that set's victim.
    pub fn refill(&mut self, set: u32, raw: u32) {
        self.tlb.refill(set, raw);
    }

    /// Invalidates every TLB entry.
    pub fn flush(&mut self) {
        self.tlb.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> MmuConfig {
        MmuConfig {
            enabled: true,
            nways: 2,
            nsets: 4,
            pagesize: 0x2000,
            hit_delay: 1,
        }
    }

    #[test]
    fn disabled_mmu_is_identity() {
        let mut mmu = Mmu::new(&MmuConfig {
            enabled: false,
            ..config()
        });
        let t = mmu
            .translate(VirtAddr::new(0x1234), Access::Read, PrivilegeMode::User)
            .unwrap();
        assert_eq!(t.phys.val(), 0x1234);
        assert_eq!(t.cycles, 0);
    }

    #[test]
    fn unmapped_address_traps_with_tlb_miss() {
        let mut mmu = Mmu::new(&config());
        let err = mmu
            .translate(VirtAddr::new(0x4000), Access::Fetch, PrivilegeMode::Supervisor)
            .unwrap_err();
        assert_eq!(err, Trap::InstructionTlbMiss { addr: 0x4000 });
    }

    #[test]
    fn mapped_but_unwritable_page_traps_with_page_fault() {
        let mut mmu = Mmu::new(&config());
        let vaddr = VirtAddr::new(0x2000);
        let vpn = vaddr.val() >> 13;
        mmu.translate(vaddr, Access::Read, PrivilegeMode::Supervisor)
            .unwrap_err();
        mmu.refill((vpn as u32) % 4, 0x8000_0000 | 0b0011); // valid + read, no write
        let ok = mmu
            .translate(vaddr, Access::Read, PrivilegeMode::Supervisor)
            .unwrap();
        assert_eq!(ok.phys.val(), 0x8000_0000);
        let err = mmu
            .translate(vaddr, Access::Write, PrivilegeMode::Supervisor)
            .unwrap_err();
        assert_eq!(err, Trap::DataPageFault { addr: 0x2000 });
    }

    #[test]
    fn user_mode_denied_without_user_bit() {
        let mut mmu = Mmu::new(&config());
        let vaddr = VirtAddr::new(0x2000);
        let vpn = vaddr.val() >> 13;
        mmu.translate(vaddr, Access::Read, PrivilegeMode::User)
            .unwrap_err();
        mmu.refill((vpn as u32) % 4, 0x8000_0000 | 0b0011);
        let err = mmu
            .translate(vaddr, Access::Read, PrivilegeMode::User)
            .unwrap_err();
        assert_eq!(err, Trap::DataPageFault { addr: 0x2000 });
    }
}
