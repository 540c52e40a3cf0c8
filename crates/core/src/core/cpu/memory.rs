//! Load/store/fetch orchestration through the MMU, cache, and bus (§4.1-§4.3
//! composition).
//!
//! Every memory reference a CPU makes goes through the same three stages in
//! the same order: [`crate::core::units::mmu::Mmu::translate`] (may trap with
//! a TLB-miss or page-fault), the relevant [`crate::core::units::cache::CacheSim`]
//! (timing only — it never holds guest data), then
//! [`crate::soc::AddressSpace`] for the actual bytes. Every cycle any stage
//! charges is folded into [`Cpu::mem_cycles`], which the executor adds to the
//! global cycle count at retire (§4.8's "accumulated_mem_cycles").

use super::Cpu;
use crate::common::{Trap, VirtAddr};
use crate::core::units::mmu::Access;
use crate::soc::AddressSpace;

impl Cpu {
    /// Fetches the 32-bit instruction word at `self.pc` through the
    /// instruction MMU and instruction cache.
    ///
    /// # Errors
    ///
    /// [`Trap::InstructionTlbMiss`] or [`Trap::InstructionPageFault`] from
    /// the IMMU; [`Trap::Alignment`] or [`Trap::BusError`] from the bus (an
    /// unaligned `pc` can only happen via a guest-computed jump target).
    pub fn fetch32(&mut self, bus: &mut AddressSpace) -> Result<u32, Trap> {
        let phys = self.translate_charged(Access::Fetch, self.pc, true)?;
        self.cache_charge(false, phys, false);
        let (word, delay) = bus.read32_timed(phys)?;
        self.mem_cycles += delay;
        Ok(word)
    }

    /// Loads a zero- or sign-extended byte through the data MMU and data
    /// cache.
    ///
    /// # Errors
    ///
    /// [`Trap::DataTlbMiss`] or [`Trap::DataPageFault`] from the DMMU;
    /// [`Trap::BusError`] from the bus.
    pub fn load_byte(&mut self, bus: &mut AddressSpace, vaddr: u32) -> Result<u8, Trap> {
        let phys = self.translate_charged(Access::Read, vaddr, false)?;
        self.cache_charge(true, phys, false);
        let (byte, delay) = bus.read8_timed(phys)?;
        self.mem_cycles += delay;
        Ok(byte)
    }

    /// Loads a big-endian halfword through the data MMU and data cache.
    ///
    /// # Errors
    ///
    /// As [`Cpu::load_byte`], plus [`Trap::Alignment`] for an odd address.
    pub fn load_half(&mut self, bus: &mut AddressSpace, vaddr: u32) -> Result<u16, Trap> {
        let phys = self.translate_charged(Access::Read, vaddr, false)?;
        self.cache_charge(true, phys, false);
        let (half, delay) = bus.read16_timed(phys)?;
        self.mem_cycles += delay;
        Ok(half)
    }

    /// Loads a big-endian word through the data MMU and data cache.
    ///
    /// # Errors
    ///
    /// As [`Cpu::load_byte`], plus [`Trap::Alignment`] for a non-4-byte-aligned
    /// address.
    pub fn load_word(&mut self, bus: &mut AddressSpace, vaddr: u32) -> Result<u32, Trap> {
        let phys = self.translate_charged(Access::Read, vaddr, false)?;
        self.cache_charge(true, phys, false);
        let (word, delay) = bus.read32_timed(phys)?;
        self.mem_cycles += delay;
        Ok(word)
    }

    /// Stores a byte through the data MMU and data cache.
    ///
    /// # Errors
    ///
    /// As [`Cpu::load_byte`], with `Write` permission instead of `Read`.
    pub fn store_byte(&mut self, bus: &mut AddressSpace, vaddr: u32, val: u8) -> Result<(), Trap> {
        let phys = self.translate_charged(Access::Write, vaddr, false)?;
        self.cache_charge(true, phys, true);
        let delay = bus.write8_timed(phys, val)?;
        self.mem_cycles += delay;
        Ok(())
    }

    /// Stores a big-endian halfword through the data MMU and data cache.
    ///
    /// # Errors
    ///
    /// As [`Cpu::store_byte`], plus [`Trap::Alignment`] for an odd address.
    pub fn store_half(&mut self, bus: &mut AddressSpace, vaddr: u32, val: u16) -> Result<(), Trap> {
        let phys = self.translate_charged(Access::Write, vaddr, false)?;
        self.cache_charge(true, phys, true);
        let delay = bus.write16_timed(phys, val)?;
        self.mem_cycles += delay;
        Ok(())
    }

    /// Stores a big-endian word through the data MMU and data cache.
    ///
    /// # Errors
    ///
    /// As [`Cpu::store_byte`], plus [`Trap::Alignment`] for a
    /// non-4-byte-aligned address.
    pub fn store_word(&mut self, bus: &mut AddressSpace, vaddr: u32, val: u32) -> Result<(), Trap> {
        let phys = self.translate_charged(Access::Write, vaddr, false)?;
        self.cache_charge(true, phys, true);
        let delay = bus.write32_timed(phys, val)?;
        self.mem_cycles += delay;
        Ok(())
    }

    /// Translates `vaddr` via the instruction or data MMU, charging the
    /// translation's cycles into `mem_cycles`.
    fn translate_charged(&mut self, access: Access, vaddr: u32, is_fetch: bool) -> Result<u32, Trap> {
        let mmu = if is_fetch { &mut self.immu } else { &mut self.dmmu };
        let translated = mmu.translate(VirtAddr::new(vaddr), access, self.privilege)?;
        self.mem_cycles += translated.cycles;
        Ok(translated.phys.val())
    }

    /// Probes the instruction or data cache for `phys`, charging its timing
    /// into `mem_cycles`. The cache never holds guest data (§4.3 doc
    /// comment), so the actual access always still reaches the bus
    /// regardless of hit or miss; a miss that evicts a dirty line is logged
    /// but otherwise has no further effect here, since this cache model
    /// tracks timing only, not a real victim buffer to flush.
    fn cache_charge(&mut self, is_data: bool, phys: u32, is_write: bool) {
        let cache = if is_data { &mut self.dcache } else { &mut self.icache };
        let result = cache.access(phys, is_write);
        self.mem_cycles += result.cycles;
        if result.writeback {
            tracing::trace!(phys, is_data, "cache eviction would write back a dirty line");
        }
    }
}
