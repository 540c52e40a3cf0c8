//! Set-associative cache timing model (component C, §4.3).
//!
//! Models hit/miss timing only: the cache never stores guest data and is
//! never consulted for a load or store's actual bytes — every access still
//! reaches [`crate::soc::address_space::AddressSpace`] (§4.1).
//! [`CacheSim::access`] reports only how many extra cycles a reference
//! costs and whether an evicted line needs writing back. Replacement is
//! always strict LRU; there is no prefetcher and no configurable policy
//! (§4.3 Non-goals).

/// Cache (and TLB) replacement policy.
pub mod policies;

use self::policies::{LruPolicy, ReplacementPolicy};
use crate::config::{CacheConfig, CachePolicy};

#[derive(Clone, Copy, Default)]
struct Line {
    tag: u32,
    valid: bool,
    dirty: bool,
}

/// The result of a single cache access.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CacheAccess {
    /// Whether the line was already resident.
    pub hit: bool,
    /// Extra cycles this access costs, beyond reaching the next level.
    pub cycles: u32,
    /// Whether a dirty line was evicted and must be written back.
    pub writeback: bool,
}

/// A configurable set-associative cache timing model.
pub struct CacheSim {
    /// When false, every access is an unconditional miss with zero cost.
    pub enabled: bool,
    nsets: usize,
    ways: usize,
    line_bytes: u32,
    hit_delay: u32,
    miss_delay: u32,
    write_policy: CachePolicy,
    lines: Vec<Line>,
    replacement: LruPolicy,
    /// Count of accesses that hit a resident line, for the §6A
    /// performance-counter-unit SPR bank.
    hits: u64,
    /// Count of accesses that missed.
    misses: u64,
}

impl CacheSim {
    /// Builds a cache from a `dc`/`ic` configuration section.
    #[must_use]
    pub fn new(config: &CacheConfig) -> Self {
        let ways = config.nways.max(1) as usize;
        let nsets = config.nsets.max(1) as usize;
        let line_bytes = config.blocksize.max(1);
        Self {
            enabled: config.enabled,
            nsets,
            ways,
            line_bytes,
            hit_delay: config.hit_delay,
            miss_delay: config.miss_delay,
            write_policy: config.policy,
            lines: vec![Line::default(); nsets * ways],
            replacement: LruPolicy::new(nsets, ways),
            hits: 0,
            misses: 0,
        }
    }

    /// Accesses that hit a resident line since construction.
    #[must_use]
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Accesses that missed since construction.
    #[must_use]
    pub fn misses(&self) -> u64 {
        self.misses
    }

    fn locate(&self, addr: u32) -> (usize, u32) {
        let line_no = addr / self.line_bytes;
        let set = (line_no as usize) % self.nsets;
        let tag = line_no / self.nsets as u32;
        (set, tag)
    }

    /// Performs a cache access for `addr`, returning hit/miss timing.
    pub fn access(&mut self, addr: u32, is_write: bool) -> CacheAccess {
        if !self.enabled {
            return CacheAccess {
                hit: false,
                cycles: 0,
                writeback: false,
            };
        }

        let (set, tag) = self.locate(addr);
        let base = set * self.ways;

        for way in 0..self.ways {
            let idx = base + way;
            if self.lines[idx].valid && self.lines[idx].tag == tag {
                self.replacement.update(set, way);
                if is_write && self.write_policy == CachePolicy::WriteBack {
                    self.lines[idx].dirty = true;
                }
                self.hits += 1;
                return CacheAccess {
                    hit: true,
                    cycles: self.hit_delay,
                    writeback: false,
                };
            }
        }

        let victim = self.replacement.get_victim(set);
        let idx = base + victim;
        let writeback = self.lines[idx].valid && self.lines[idx].dirty;
        self.lines[idx] = Line {
            tag,
            valid: true,
            dirty: is_write && self.write_policy == CachePolicy::WriteBack,
        };
        self.replacement.update(set, victim);
        self.misses += 1;

        CacheAccess {
            hit: false,
            cycles: self.hit_delay + self.miss_delay,
            writeback,
        }
    }

    /// Invalidates whichever line currently holds `addr`, if any. This is
    /// the DMA-coherence side channel (§4.3): a peripheral performing DMA
    /// writes calls this on the data cache so a stale line is never served
    /// after the underlying memory has changed beneath it.
    pub fn invalidate(&mut self, addr: u32) {
        if !self.enabled {
            return;
        }
        let (set, tag) = self.locate(addr);
        let base = set * self.ways;
        for way in 0..self.ways {
            let idx = base + way;
            if self.lines[idx].valid && self.lines[idx].tag == tag {
                self.lines[idx].valid = false;
                self.lines[idx].dirty = false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(nways: u32, nsets: u32, blocksize: u32, policy: CachePolicy) -> CacheConfig {
        CacheConfig {
            enabled: true,
            nways,
            nsets,
            blocksize,
            ustates: 2,
            hit_delay: 1,
            miss_delay: 10,
            policy,
        }
    }

    #[test]
    fn second_access_to_same_line_is_a_hit() {
        let mut cache = CacheSim::new(&config(2, 4, 16, CachePolicy::WriteThrough));
        let first = cache.access(0x1000, false);
        assert!(!first.hit);
        let second = cache.access(0x1000, false);
        assert!(second.hit);
        assert_eq!(second.cycles, 1);
    }

    #[test]
    fn write_through_never_marks_lines_dirty() {
        let mut cache = CacheSim::new(&config(1, 1, 16, CachePolicy::WriteThrough));
        cache.access(0x0, true);
        // Evict by accessing a conflicting address in the same (only) set.
        let evict = cache.access(0x10, true);
        assert!(!evict.writeback);
    }

    #[test]
    fn write_back_defers_writeback_until_eviction() {
        let mut cache = CacheSim::new(&config(1, 1, 16, CachePolicy::WriteBack));
        cache.access(0x0, true);
        let evict = cache.access(0x10, true);
        assert!(evict.writeback);
    }

    #[test]
    fn invalidate_forces_next_access_to_miss() {
        let mut cache = CacheSim::new(&config(2, 4, 16, CachePolicy::WriteThrough));
        cache.access(0x1000, false);
        cache.invalidate(0x1000);
        let after = cache.access(0x1000, false);
        assert!(!after.hit);
    }

    #[test]
    fn disabled_cache_is_always_a_zero_cost_miss() {
        let mut cache = CacheSim::new(&CacheConfig {
            enabled: false,
            ..config(2, 4, 16, CachePolicy::WriteThrough)
        });
        let access = cache.access(0x1000, false);
        assert!(!access.hit);
        assert_eq!(access.cycles, 0);
    }
}
