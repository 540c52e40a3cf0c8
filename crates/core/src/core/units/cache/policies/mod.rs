//! Cache and TLB replacement policy.
//!
//! The architecture this simulator targets specifies strict LRU replacement
//! for both caches and the MMU's TLBs (§4.2, §4.3); there is no
//! configurable alternative, so only [`lru`] is wired into
//! [`super::CacheSim`] and [`crate::core::units::mmu::tlb::Tlb`].

/// Least Recently Used replacement policy.
pub mod lru;

pub use lru::LruPolicy;

/// A per-set victim-selection policy for a set-associative structure.
pub trait ReplacementPolicy: Send + Sync {
    /// Updates the policy state when a line is accessed.
    fn update(&mut self, set: usize, way: usize);

    /// Selects a victim line to evict from a specific set.
    fn get_victim(&mut self, set: usize) -> usize;
}
