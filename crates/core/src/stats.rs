//! Simulation statistics collection and reporting (§6A performance-counter
//! unit).
//!
//! Tracks the cheap, derivable-from-existing-state counters the `pcu`
//! configuration section already expects: retired instructions and cycles,
//! per-cache (I/D) and per-MMU (I/D) hit/miss counts, and interrupt/
//! exception counts. [`crate::sim::simulator::Simulator::run`] latches these
//! into the SPR file's PCU bank (§4.6) after every retired instruction so a
//! guest can read them through `l.mfspr` like any other architectural
//! counter.

use std::time::Instant;

/// Simulation statistics: cycle/instruction counts plus the per-unit
/// hit/miss and event counters the PCU SPR bank exposes.
#[derive(Clone)]
pub struct SimStats {
    start_time: Instant,
    /// Total simulator cycles elapsed.
    pub cycles: u64,
    /// Number of instructions committed (retired).
    pub instructions_retired: u64,
    /// Instruction-cache hits.
    pub icache_hits: u64,
    /// Instruction-cache misses.
    pub icache_misses: u64,
    /// Data-cache hits.
    pub dcache_hits: u64,
    /// Data-cache misses.
    pub dcache_misses: u64,
    /// Instruction-MMU translation hits.
    pub immu_hits: u64,
    /// Instruction-MMU translation misses.
    pub immu_misses: u64,
    /// Data-MMU translation hits.
    pub dmmu_hits: u64,
    /// Data-MMU translation misses.
    pub dmmu_misses: u64,
    /// Interrupts delivered.
    pub interrupts_taken: u64,
    /// Architectural exceptions vectored (including delivered interrupts).
    pub exceptions_taken: u64,
}

impl Default for SimStats {
    fn default() -> Self {
        Self {
            start_time: Instant::now(),
            cycles: 0,
            instructions_retired: 0,
            icache_hits: 0,
            icache_misses: 0,
            dcache_hits: 0,
            dcache_misses: 0,
            immu_hits: 0,
            immu_misses: 0,
            dmmu_hits: 0,
            dmmu_misses: 0,
            interrupts_taken: 0,
            exceptions_taken: 0,
        }
    }
}

/// In-group PCU SPR indices (§6A), the layout [`SimStats::latch_into`]
/// writes and an embedder reads back with `l.mfspr`.
pub mod pcu_index {
    /// Retired instruction count.
    pub const INSTRUCTIONS: u16 = 0;
    /// Elapsed cycle count.
    pub const CYCLES: u16 = 1;
    /// Instruction-cache hits.
    pub const ICACHE_HITS: u16 = 2;
    /// Instruction-cache misses.
    pub const ICACHE_MISSES: u16 = 3;
    /// Data-cache hits.
    pub const DCACHE_HITS: u16 = 4;
    /// Data-cache misses.
    pub const DCACHE_MISSES: u16 = 5;
    /// Instruction-MMU hits.
    pub const IMMU_HITS: u16 = 6;
    /// Instruction-MMU misses.
    pub const IMMU_MISSES: u16 = 7;
    /// Data-MMU hits.
    pub const DMMU_HITS: u16 = 8;
    /// Data-MMU misses.
    pub const DMMU_MISSES: u16 = 9;
    /// Interrupts delivered.
    pub const INTERRUPTS: u16 = 10;
    /// Exceptions vectored.
    pub const EXCEPTIONS: u16 = 11;
}

impl SimStats {
    /// Writes every counter into the PCU SPR bank at its fixed index,
    /// truncating to 32 bits (the counters wrap rather than saturate,
    /// matching every other architectural counter in this core).
    pub fn latch_into(&self, sprs: &mut crate::core::arch::spr::SprFile) {
        sprs.set_pcu(pcu_index::INSTRUCTIONS, self.instructions_retired as u32);
        sprs.set_pcu(pcu_index::CYCLES, self.cycles as u32);
        sprs.set_pcu(pcu_index::ICACHE_HITS, self.icache_hits as u32);
        sprs.set_pcu(pcu_index::ICACHE_MISSES, self.icache_misses as u32);
        sprs.set_pcu(pcu_index::DCACHE_HITS, self.dcache_hits as u32);
        sprs.set_pcu(pcu_index::DCACHE_MISSES, self.dcache_misses as u32);
        sprs.set_pcu(pcu_index::IMMU_HITS, self.immu_hits as u32);
        sprs.set_pcu(pcu_index::IMMU_MISSES, self.immu_misses as u32);
        sprs.set_pcu(pcu_index::DMMU_HITS, self.dmmu_hits as u32);
        sprs.set_pcu(pcu_index::DMMU_MISSES, self.dmmu_misses as u32);
        sprs.set_pcu(pcu_index::INTERRUPTS, self.interrupts_taken as u32);
        sprs.set_pcu(pcu_index::EXCEPTIONS, self.exceptions_taken as u32);
    }

    /// Prints a human-readable summary to stdout.
    pub fn print(&self) {
        let seconds = self.start_time.elapsed().as_secs_f64();
        let cyc = self.cycles.max(1);
        let ipc = self.instructions_retired as f64 / cyc as f64;
        let mips = (self.instructions_retired as f64 / seconds) / 1_000_000.0;

        println!("==========================================================");
        println!("SIMULATION STATISTICS");
        println!("==========================================================");
        println!("host_seconds             {seconds:.4} s");
        println!("sim_cycles               {}", self.cycles);
        println!("sim_insts                {}", self.instructions_retired);
        println!("sim_ipc                  {ipc:.4}");
        println!("sim_mips                 {mips:.2}");
        println!("----------------------------------------------------------");
        println!("MEMORY HIERARCHY");
        print_cache("icache", self.icache_hits, self.icache_misses);
        print_cache("dcache", self.dcache_hits, self.dcache_misses);
        print_cache("immu", self.immu_hits, self.immu_misses);
        print_cache("dmmu", self.dmmu_hits, self.dmmu_misses);
        println!("----------------------------------------------------------");
        println!("interrupts_taken         {}", self.interrupts_taken);
        println!("exceptions_taken         {}", self.exceptions_taken);
        println!("==========================================================");
    }
}

fn print_cache(name: &str, hits: u64, misses: u64) {
    let total = hits + misses;
    let rate = if total > 0 { 100.0 * (hits as f64 / total as f64) } else { 0.0 };
    println!("  {name:<8} accesses: {total:<10} hits: {hits:<10} hit_rate: {rate:.2}%");
}
