//! Address-space map and memory region descriptors (component A, §4.1).
//!
//! [`AddressSpace`] is the single physical-address router every instruction
//! fetch, load, and store passes through (after MMU translation and cache
//! timing); [`region`] defines the region descriptor and the two concrete
//! region kinds this core ships.

/// The physical address-space map.
pub mod address_space;

/// Memory region descriptors and implementations.
pub mod region;

pub use address_space::AddressSpace;
pub use region::{GenericPeripheral, MemoryRegion, RamRegion, Region};
