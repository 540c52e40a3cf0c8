//! Address-space map (component A, §4.1).
//!
//! A linear scan over registered [`MemoryRegion`]s: the first one (scanned
//! most-recently-registered first, so a memory-controller overlay
//! registered after its primary decode takes priority) whose range and
//! secondary `addr_mask`/`addr_compare` match is chosen. A region scan
//! rather than an interval tree is a deliberate match to §4.1's "linear or
//! interval-tree scan" — region counts in a typical configuration (RAM plus
//! a handful of peripherals) are too small for the tree to pay for itself.

use crate::common::Trap;
use crate::common::error::ConfigError;
use crate::soc::region::{MemoryRegion, Region};

/// The physical address-space map.
#[derive(Default)]
pub struct AddressSpace {
    regions: Vec<MemoryRegion>,
}

impl AddressSpace {
    /// Builds an address-space map with no regions registered.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `region`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ConflictingRegion`] if `region`'s range
    /// overlaps an already-registered region without being an exact-range
    /// overlay (same base and size — the memory-controller chip-select
    /// case §3 carves out).
    pub fn register(&mut self, region: MemoryRegion) -> Result<(), ConfigError> {
        for existing in &self.regions {
            let is_overlay = existing.base == region.base && existing.size == region.size;
            if !is_overlay && ranges_overlap(existing.base, existing.size, region.base, region.size) {
                return Err(ConfigError::ConflictingRegion {
                    new: region.name.clone(),
                    existing: existing.name.clone(),
                    base: region.base,
                    end: region.base.wrapping_add(region.size),
                });
            }
        }
        self.regions.push(region);
        Ok(())
    }

    fn find(&mut self, addr: u32) -> Option<&mut MemoryRegion> {
        self.regions.iter_mut().rev().find(|r| r.matches(addr))
    }

    /// Reads a byte, with no extra cycle accounting.
    ///
    /// # Errors
    ///
    /// Returns [`Trap::BusError`] if no region claims `addr`.
    pub fn read8(&mut self, addr: u32) -> Result<u8, Trap> {
        self.read8_timed(addr).map(|(v, _)| v)
    }

    /// Reads a big-endian halfword, with no extra cycle accounting.
    ///
    /// # Errors
    ///
    /// Returns [`Trap::Alignment`] if `addr` is odd, or [`Trap::BusError`]
    /// if no region claims it.
    pub fn read16(&mut self, addr: u32) -> Result<u16, Trap> {
        self.read16_timed(addr).map(|(v, _)| v)
    }

    /// Reads a big-endian word, with no extra cycle accounting.
    ///
    /// # Errors
    ///
    /// Returns [`Trap::Alignment`] if `addr` is not 4-byte aligned, or
    /// [`Trap::BusError`] if no region claims it.
    pub fn read32(&mut self, addr: u32) -> Result<u32, Trap> {
        self.read32_timed(addr).map(|(v, _)| v)
    }

    /// Writes a byte, with no extra cycle accounting.
    ///
    /// # Errors
    ///
    /// Returns [`Trap::BusError`] if no region claims `addr`.
    pub fn write8(&mut self, addr: u32, val: u8) -> Result<(), Trap> {
        self.write8_timed(addr, val).map(|_| ())
    }

    /// Writes a big-endian halfword, with no extra cycle accounting.
    ///
    /// # Errors
    ///
    /// Returns [`Trap::Alignment`] if `addr` is odd, or [`Trap::BusError`]
    /// if no region claims it.
    pub fn write16(&mut self, addr: u32, val: u16) -> Result<(), Trap> {
        self.write16_timed(addr, val).map(|_| ())
    }

    /// Writes a big-endian word, with no extra cycle accounting.
    ///
    /// # Errors
    ///
    /// Returns [`Trap::Alignment`] if `addr` is not 4-byte aligned, or
    /// [`Trap::BusError`] if no region claims it.
    pub fn write32(&mut self, addr: u32, val: u32) -> Result<(), Trap> {
        self.write32_timed(addr, val).map(|_| ())
    }

    /// Reads a byte, additionally returning the region's `delay_read`
    /// (§4.1's "a read that returns without error has consumed exactly
    /// `delay_read` memory cycles" invariant). The executor's memory path
    /// (`crate::core::cpu::memory`) uses this; [`AddressSpace::read8`] is
    /// the plain form JTAG and other out-of-band callers use.
    ///
    /// # Errors
    ///
    /// Returns [`Trap::BusError`] if no region claims `addr`.
    pub fn read8_timed(&mut self, addr: u32) -> Result<(u8, u32), Trap> {
        let region = self.find(addr).ok_or(Trap::BusError { addr })?;
        let delay = region.delay_read;
        let offset = addr - region.base;
        Ok((region.ops_mut().read8(offset)?, delay))
    }

    /// Reads a big-endian halfword with its region's `delay_read`.
    ///
    /// # Errors
    ///
    /// Returns [`Trap::Alignment`] if `addr` is odd, or [`Trap::BusError`]
    /// if no region claims it.
    pub fn read16_timed(&mut self, addr: u32) -> Result<(u16, u32), Trap> {
        if addr % 2 != 0 {
            return Err(Trap::Alignment { addr });
        }
        let region = self.find(addr).ok_or(Trap::BusError { addr })?;
        let delay = region.delay_read;
        let offset = addr - region.base;
        Ok((region.ops_mut().read16(offset)?, delay))
    }

    /// Reads a big-endian word with its region's `delay_read`.
    ///
    /// # Errors
    ///
    /// Returns [`Trap::Alignment`] if `addr` is not 4-byte aligned, or
    /// [`Trap::BusError`] if no region claims it.
    pub fn read32_timed(&mut self, addr: u32) -> Result<(u32, u32), Trap> {
        if addr % 4 != 0 {
            return Err(Trap::Alignment { addr });
        }
        let region = self.find(addr).ok_or(Trap::BusError { addr })?;
        let delay = region.delay_read;
        let offset = addr - region.base;
        Ok((region.ops_mut().read32(offset)?, delay))
    }

    /// Writes a byte with its region's `delay_write`.
    ///
    /// # Errors
    ///
    /// Returns [`Trap::BusError`] if no region claims `addr`.
    pub fn write8_timed(&mut self, addr: u32, val: u8) -> Result<u32, Trap> {
        let region = self.find(addr).ok_or(Trap::BusError { addr })?;
        let delay = region.delay_write;
        let offset = addr - region.base;
        region.ops_mut().write8(offset, val)?;
        Ok(delay)
    }

    /// Writes a big-endian halfword with its region's `delay_write`.
    ///
    /// # Errors
    ///
    /// Returns [`Trap::Alignment`] if `addr` is odd, or [`Trap::BusError`]
    /// if no region claims it.
    pub fn write16_timed(&mut self, addr: u32, val: u16) -> Result<u32, Trap> {
        if addr % 2 != 0 {
            return Err(Trap::Alignment { addr });
        }
        let region = self.find(addr).ok_or(Trap::BusError { addr })?;
        let delay = region.delay_write;
        let offset = addr - region.base;
        region.ops_mut().write16(offset, val)?;
        Ok(delay)
    }

    /// Writes a big-endian word with its region's `delay_write`.
    ///
    /// # Errors
    ///
    /// Returns [`Trap::Alignment`] if `addr` is not 4-byte aligned, or
    /// [`Trap::BusError`] if no region claims it.
    pub fn write32_timed(&mut self, addr: u32, val: u32) -> Result<u32, Trap> {
        if addr % 4 != 0 {
            return Err(Trap::Alignment { addr });
        }
        let region = self.find(addr).ok_or(Trap::BusError { addr })?;
        let delay = region.delay_write;
        let offset = addr - region.base;
        region.ops_mut().write32(offset, val)?;
        Ok(delay)
    }

    /// Writes `data` into whichever region claims `addr`, bypassing dirty
    /// tracking (§3's "program write"). Used by image loading. Silently a
    /// no-op if no region claims `addr`.
    pub fn load_binary_at(&mut self, addr: u32, data: &[u8]) {
        let Some(region) = self.find(addr) else {
            tracing::warn!(addr, len = data.len(), "load target address is unmapped");
            return;
        };
        let offset = addr - region.base;
        region.ops_mut().program_write(offset, data);
    }
}

fn ranges_overlap(a_base: u32, a_size: u32, b_base: u32, b_size: u32) -> bool {
    let a_end = u64::from(a_base) + u64::from(a_size);
    let b_end = u64::from(b_base) + u64::from(b_size);
    u64::from(a_base) < b_end && u64::from(b_base) < a_end
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::soc::region::RamRegion;
    use proptest::prelude::*;

    #[test]
    fn unmapped_address_is_bus_error() {
        let mut space = AddressSpace::new();
        assert_eq!(space.read32(0x1000), Err(Trap::BusError { addr: 0x1000 }));
    }

    #[test]
    fn misaligned_word_access_is_alignment_fault() {
        let mut space = AddressSpace::new();
        space
            .register(MemoryRegion::new(0x1000, 0x100, Box::new(RamRegion::new("ram", 0x100))))
            .unwrap();
        assert_eq!(space.read32(0x1001), Err(Trap::Alignment { addr: 0x1001 }));
    }

    #[test]
    fn registered_region_round_trips() {
        let mut space = AddressSpace::new();
        space
            .register(MemoryRegion::new(0x1000, 0x100, Box::new(RamRegion::new("ram", 0x100))))
            .unwrap();
        space.write32(0x1000, 0xcafe_babe).unwrap();
        assert_eq!(space.read32(0x1000), Ok(0xcafe_babe));
    }

    #[test]
    fn overlapping_non_identical_regions_are_rejected() {
        let mut space = AddressSpace::new();
        space
            .register(MemoryRegion::new(0x1000, 0x100, Box::new(RamRegion::new("ram", 0x100))))
            .unwrap();
        let err = space
            .register(MemoryRegion::new(0x1080, 0x100, Box::new(RamRegion::new("ram2", 0x100))))
            .unwrap_err();
        assert!(matches!(err, ConfigError::ConflictingRegion { .. }));
    }

    #[test]
    fn reads_are_translated_to_a_region_local_offset() {
        use crate::soc::region::MockRegion;

        let mut mock = MockRegion::new();
        mock.expect_name().return_const("mockdev".to_string());
        mock.expect_read32().withf(|&offset| offset == 0x10).returning(|_| Ok(0xface_cafe));

        let mut space = AddressSpace::new();
        space.register(MemoryRegion::new(0x2000, 0x100, Box::new(mock))).unwrap();
        assert_eq!(space.read32(0x2010), Ok(0xface_cafe));
    }

    proptest::proptest! {
        /// `store32(addr, v); load32(addr) == v`, and the byte/halfword
        /// views of that store agree with big-endian order, for any
        /// aligned address and value.
        #[test]
        fn endianness_round_trip(
            addr in (0u32..0x1000).prop_map(|a| a & !0x3),
            v in proptest::prelude::any::<u32>(),
        ) {
            let mut space = AddressSpace::new();
            space
                .register(MemoryRegion::new(0, 0x1000, Box::new(RamRegion::new("ram", 0x1000))))
                .unwrap();
            space.write32(addr, v).unwrap();
            prop_assert_eq!(space.read32(addr), Ok(v));
            prop_assert_eq!(space.read16(addr), Ok((v >> 16) as u16));
            prop_assert_eq!(space.read16(addr + 2), Ok(v as u16));
            let bytes = v.to_be_bytes();
            for i in 0..4u32 {
                prop_assert_eq!(space.read8(addr + i), Ok(bytes[i as usize]));
            }
        }
    }

    #[test]
    fn exact_range_overlay_replaces_primary_mapping() {
        let mut space = AddressSpace::new();
        space
            .register(MemoryRegion::new(0x1000, 0x100, Box::new(RamRegion::new("primary", 0x100))))
            .unwrap();
        space
            .register(MemoryRegion::new(0x1000, 0x100, Box::new(RamRegion::new("overlay", 0x100))))
            .unwrap();
        space.write32(0x1000, 0x1234).unwrap();
        assert_eq!(space.read32(0x1000), Ok(0x1234));
    }

    #[test]
    fn program_write_bypasses_rom_protection() {
        let mut space = AddressSpace::new();
        space
            .register(MemoryRegion::new(0x0, 0x10, Box::new(RamRegion::rom("rom", vec![0u8; 0x10]))))
            .unwrap();
        space.load_binary_at(0x0, &[1, 2, 3, 4]);
        assert_eq!(space.read32(0x0), Ok(0x0102_0304));
    }
}
