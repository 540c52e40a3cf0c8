//! Translation Lookaside Buffer (component B, §4.2).
//!
//! Set-associative, strict LRU, populated entirely by software through
//! [`Tlb::refill`] — there is no hardware page-table walker (§4.2
//! Non-goals; every miss traps to the guest's refill handler). A miss
//! records which VPN was being looked up so the hardware can auto-fill the
//! tag half of the entry the refill handler writes, mirroring how this
//! architecture's single TLB-entry SPR carries only the physical page
//! number and permission bits, never the tag (see
//! [`crate::core::arch::spr`]'s `DataTlbEntryWritten`/
//! `InstructionTlbEntryWritten` side effects).
//!
//! The refill handler only ever names a *set*: which *way* within it gets
//! overwritten is the TLB's own call, not the guest's. [`Tlb::refill`] always
//! installs into the set's current LRU victim, so repeated refills into a
//! set cycle through its ways in strict LRU order regardless of which SPR
//! address the guest's handler happened to write.

use crate::core::units::cache::policies::{LruPolicy, ReplacementPolicy};

/// Valid bit within a packed TLB-entry word.
const PERM_VALID: u32 = 1 << 0;
/// Read-permission bit.
const PERM_READ: u32 = 1 << 1;
/// Write-permission bit.
const PERM_WRITE: u32 = 1 << 2;
/// Execute-permission bit.
const PERM_EXEC: u32 = 1 << 3;
/// User-mode-accessible bit.
const PERM_USER: u32 = 1 << 4;

#[derive(Clone, Copy, Default)]
struct Entry {
    valid: bool,
    tag_vpn: u32,
    raw: u32,
}

/// A single translation: the physical page base and the four permission
/// bits software packed into the entry's unused page-offset bits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Translation {
    /// Physical page base address (already page-aligned).
    pub ppn_base: u32,
    /// Read permission.
    pub readable: bool,
    /// Write permission.
    pub writable: bool,
    /// Execute permission.
    pub executable: bool,
    /// Accessible from user mode.
    pub user: bool,
}

/// A set-associative TLB.
pub struct Tlb {
    nsets: usize,
    ways: usize,
    page_mask: u32,
    entries: Vec<Entry>,
    lru: LruPolicy,
    pending_miss: Vec<Option<u32>>,
}

impl Tlb {
    /// Builds a TLB with `nsets` sets of `ways` entries each, for a given
    /// page size in bytes (must be a power of two, at least 32).
    #[must_use]
    pub fn new(nsets: usize, ways: usize, page_size: u32) -> Self {
        let nsets = nsets.max(1);
        let ways = ways.max(1);
        let page_size = page_size.max(32).next_power_of_two();
        Self {
            nsets,
            ways,
            page_mask: !(page_size - 1),
            entries: vec![Entry::default(); nsets * ways],
            lru: LruPolicy::new(nsets, ways),
            pending_miss: vec![None; nsets],
        }
    }

    fn set_of(&self, vpn: u32) -> usize {
        (vpn as usize) % self.nsets
    }

    /// Looks up `vpn`, returning its translation on a hit. On a miss,
    /// remembers `vpn` against this set so a subsequent [`Tlb::refill`]
    /// targeting the same set can recover the tag.
    pub fn lookup(&mut self, vpn: u32) -> Option<Translation> {
        let set = self.set_of(vpn);
        let base = set * self.ways;
        for way in 0..self.ways {
            let idx = base + way;
            if self.entries[idx].valid && self.entries[idx].tag_vpn == vpn {
                self.lru.update(set, way);
                return Some(decode_translation(self.entries[idx].raw, self.page_mask));
            }
        }
        self.pending_miss[set] = Some(vpn);
        None
    }

    /// Installs a raw packed SPR word into `set`'s current LRU victim way,
    /// recovering the tag from the most recent miss recorded against that
    /// set.
    pub fn refill(&mut self, set: u32, raw: u32) {
        let set = (set as usize) % self.nsets;
        let way = self.lru.get_victim(set);
        let tag_vpn = self.pending_miss[set].take().unwrap_or(0);
        self.entries[set * self.ways + way] = Entry {
            valid: raw & PERM_VALID != 0,
            tag_vpn,
            raw,
        };
        self.lru.update(set, way);
    }

    /// Invalidates every entry. Used when the MMU's enable bit changes and
    /// on a full simulator reset.
    pub fn flush(&mut self) {
        for e in &mut self.entries {
            e.valid = false;
        }
        for m in &mut self.pending_miss {
            *m = None;
        }
    }
}

fn decode_translation(raw: u32, page_mask: u32) -> Translation {
    Translation {
        ppn_base: raw & page_mask,
        readable: raw & PERM_READ != 0,
        writable: raw & PERM_WRITE != 0,
        executable: raw & PERM_EXEC != 0,
        user: raw & PERM_USER != 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn miss_then_refill_then_hit() {
        let mut tlb = Tlb::new(4, 2, 0x2000);
        assert!(tlb.lookup(10).is_none());
        let raw = 0x1000_0000 | PERM_VALID | PERM_READ | PERM_WRITE | PERM_EXEC;
        tlb.refill(10 % 4, raw);
        let t = tlb.lookup(10).expect("entry installed");
        assert_eq!(t.ppn_base, 0x1000_0000);
        assert!(t.readable && t.writable && t.executable);
        assert!(!t.user);
    }

    #[test]
    fn flush_invalidates_every_entry() {
        let mut tlb = Tlb::new(2, 1, 0x1000);
        tlb.lookup(1);
        tlb.refill(1 % 2, PERM_VALID);
        assert!(tlb.lookup(1).is_some());
        tlb.flush();
        assert!(tlb.lookup(1).is_none());
    }

    #[test]
    fn second_refill_targets_a_different_way_than_the_first() {
        // Two distinct misses into the same set, neither refill has touched
        // the other's way yet, so the second refill must land somewhere
        // that still leaves the first entry resident.
        let mut tlb = Tlb::new(1, 2, 0x1000);
        tlb.lookup(0);
        tlb.refill(0, PERM_VALID | 0x1000);
        tlb.lookup(1);
        tlb.refill(0, PERM_VALID | 0x2000);
        assert!(tlb.lookup(0).is_some());
        assert!(tlb.lookup(1).is_some());
    }

    #[test]
    fn lru_evicts_the_least_recently_used_way_first() {
        // vpn 0 and vpn 1 fill the set's two ways. Touching vpn 0 again
        // makes vpn 1 the LRU way, so the next miss must evict it.
        let mut tlb = Tlb::new(1, 2, 0x1000);
        tlb.lookup(0);
        tlb.refill(0, PERM_VALID | 0x1000);
        tlb.lookup(1);
        tlb.refill(0, PERM_VALID | 0x2000);
        tlb.lookup(0);
        tlb.lookup(2);
        tlb.refill(0, PERM_VALID | 0x3000);
        assert!(tlb.lookup(0).is_some());
        assert!(tlb.lookup(1).is_none());
        assert!(tlb.lookup(2).is_some());
    }

    /// After `N * ways` distinct translations miss into the same set, the
    /// first one installed is always the one evicted next: §8 property 7.
    #[test]
    fn n_times_ways_distinct_misses_evict_in_install_order() {
        for ways in 1..=4usize {
            let mut tlb = Tlb::new(1, ways, 0x1000);
            for vpn in 0..ways as u32 {
                tlb.lookup(vpn);
                tlb.refill(0, PERM_VALID | (vpn << 12));
            }
            for vpn in 0..ways as u32 {
                assert!(tlb.lookup(vpn).is_some(), "vpn {vpn} should still be resident");
            }
            // One more distinct miss must evict vpn 0, the least recently used.
            tlb.lookup(ways as u32);
            tlb.refill(0, PERM_VALID | ((ways as u32) << 12));
            assert!(tlb.lookup(0).is_none(), "vpn 0 should have been evicted");
            for vpn in 1..=ways as u32 {
                assert!(tlb.lookup(vpn).is_some());
            }
        }
    }

    proptest::proptest! {
        /// For any sequence of distinct-vpn misses into a single set, the
        /// resident set is always exactly the `ways` most recently missed
        /// vpns: strict LRU over an arbitrary access sequence.
        #[test]
        fn strict_lru_over_arbitrary_distinct_miss_sequences(
            ways in 1usize..=4,
            vpns in proptest::collection::vec(0u32..64, 1..40),
        ) {
            let mut tlb = Tlb::new(1, ways, 0x1000);
            let mut resident: Vec<u32> = Vec::new();
            for vpn in vpns {
                if resident.contains(&vpn) {
                    prop_assert!(tlb.lookup(vpn).is_some());
                    resident.retain(|&v| v != vpn);
                    resident.push(vpn);
                    continue;
                }
                prop_assert!(tlb.lookup(vpn).is_none());
                tlb.refill(0, PERM_VALID | (vpn << 12));
                if resident.len() == ways {
                    resident.remove(0);
                }
                resident.push(vpn);
            }
            for &vpn in &resident {
                prop_assert!(tlb.lookup(vpn).is_some(), "vpn {vpn} should be resident");
            }
        }
    }
}
