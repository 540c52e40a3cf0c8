//! Configuration surface for the simulator core.
//!
//! Mirrors every section named in `SPEC_FULL.md` §6/§6A one-for-one. Parsing
//! a configuration *file* and any CLI/REPL front end are out of scope for
//! this crate (§1); what is in scope is the `Config` struct tree itself, its
//! `serde::Deserialize` implementation, and sensible defaults for every
//! field — together these form the boundary that `Simulator::init` takes.
//!
//! An embedder is free to build a `Config` by hand, deserialize it from TOML
//! or JSON, or start from [`Config::default`] and override individual
//! fields.

use serde::Deserialize;

/// Baseline hardware constants used when a section or field is omitted from
/// an embedder-supplied configuration.
mod defaults {
    /// Default number of TLB/cache ways.
    pub const NWAYS: u32 = 4;
    /// Default number of TLB/cache sets.
    pub const NSETS: u32 = 64;
    /// Default cache line size in bytes.
    pub const BLOCKSIZE: u32 = 16;
    /// Default MMU page size in bytes (8 KiB).
    pub const PAGESIZE: u32 = 8192;
    /// Default cache hit delay in cycles.
    pub const CACHE_HIT_DELAY: u32 = 1;
    /// Default cache miss delay in cycles, charged in addition to hit delay.
    pub const CACHE_MISS_DELAY: u32 = 16;
    /// Default MMU hit delay in cycles (both hit and miss cost this much).
    pub const MMU_HIT_DELAY: u32 = 1;
    /// Default clock period in picoseconds (100 MHz).
    pub const CLKCYCLE_PS: u64 = 10_000;
    /// Default JTAG clock period in picoseconds (10 MHz).
    pub const JTAGCYCLE_PS: u64 = 100_000;
    /// Default zero-delay scheduler cascade cap (§4.4).
    pub const SCHEDULER_CASCADE_CAP: u32 = 256;
}

/// `cpu` section: core identification and optional analysis toggles.
///
/// `superscalar`/`hazards`/`dependstats` are accepted for configuration
/// compatibility but have no effect on this core's single-issue executor;
/// cycle-exact superscalar modelling is an explicit Non-goal (§1).
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CpuConfig {
    /// Architecture version identification register value.
    pub ver: u32,
    /// Architecture configuration register value.
    pub cfg: u32,
    /// Architecture revision register value.
    pub rev: u32,
    /// Unit-present register value (UPR).
    pub upr: u32,
    /// CPU configuration register value (CPUCFGR).
    pub cfgr: u32,
    /// Initial supervisor register (SR) value at reset.
    pub sr: u32,
    /// Superscalar dispatch analysis toggle (statistics only, §1 Non-goals).
    pub superscalar: bool,
    /// Dependency-hazard analysis toggle (statistics only).
    pub hazards: bool,
    /// Dependency statistics toggle.
    pub dependstats: bool,
    /// Store buffer length; 0 disables store buffering.
    pub sbuf_len: u32,
    /// Whether hardware floating point is present (no FPU is implemented by
    /// this core; the field is retained for configuration compatibility).
    pub hardfloat: bool,
}

impl Default for CpuConfig {
    fn default() -> Self {
        Self {
            ver: 0x12,
            cfg: 0,
            rev: 0,
            upr: 0,
            cfgr: 0,
            // SM | DCE | ICE: reset with supervisor privilege and both
            // caches live but both MMUs off, so a guest with no TLB set up
            // yet still gets identity-mapped memory access by default.
            sr: 0x19,
            superscalar: false,
            hazards: false,
            dependstats: false,
            sbuf_len: 0,
            hardfloat: false,
        }
    }
}

/// Shared shape for the `dc`/`ic` (data/instruction cache) sections (§4.3).
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Whether this cache is enabled. When false, accesses bypass straight
    /// to the address-space map with no cache bookkeeping.
    pub enabled: bool,
    /// Number of ways per set.
    pub nways: u32,
    /// Number of sets.
    pub nsets: u32,
    /// Line size in bytes.
    pub blocksize: u32,
    /// Number of usage states tracked per line (retained for configuration
    /// compatibility with the original register-transfer-level model; this
    /// port's replacement policy is strict LRU regardless of this value).
    pub ustates: u32,
    /// Cycles charged on a hit.
    pub hit_delay: u32,
    /// Cycles charged on a miss, in addition to `hit_delay`.
    pub miss_delay: u32,
    /// Write policy.
    pub policy: CachePolicy,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            nways: defaults::NWAYS,
            nsets: defaults::NSETS,
            blocksize: defaults::BLOCKSIZE,
            ustates: 2,
            hit_delay: defaults::CACHE_HIT_DELAY,
            miss_delay: defaults::CACHE_MISS_DELAY,
            policy: CachePolicy::WriteThrough,
        }
    }
}

/// Cache write policy (§4.3).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CachePolicy {
    /// Writes are forwarded to the address-space map immediately, in
    /// addition to updating the line.
    WriteThrough,
    /// Writes only update the line; the line is flushed to memory on
    /// eviction if dirty.
    WriteBack,
}

impl Default for CachePolicy {
    fn default() -> Self {
        CachePolicy::WriteThrough
    }
}

/// Shared shape for the `immu`/`dmmu` (instruction/data MMU) sections (§4.2).
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MmuConfig {
    /// Whether this MMU is enabled. When false, translation is identity and
    /// no delay is charged.
    pub enabled: bool,
    /// Number of TLB ways per set.
    pub nways: u32,
    /// Number of TLB sets.
    pub nsets: u32,
    /// Page size in bytes; must be a power of two.
    pub pagesize: u32,
    /// Cycles charged on a translation, whether hit or miss.
    pub hit_delay: u32,
}

impl Default for MmuConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            nways: defaults::NWAYS,
            nsets: defaults::NSETS,
            pagesize: defaults::PAGESIZE,
            hit_delay: defaults::MMU_HIT_DELAY,
        }
    }
}

/// `pic` section: programmable interrupt controller (§4.5).
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PicConfig {
    /// Whether the interrupt controller is enabled.
    pub enabled: bool,
    /// Whether lines default to edge-triggered (vs. level-triggered) mode.
    pub edge_triggered: bool,
    /// Whether a non-maskable interrupt line is present.
    pub use_nmi: bool,
}

impl Default for PicConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            edge_triggered: false,
            use_nmi: false,
        }
    }
}

/// `pm` section: power management (§6A supplemented feature).
///
/// When enabled, a write to the power-management SPR's "doze" bit halts the
/// CPU (distinct from a debug-module halt) until any unmasked interrupt
/// arrives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Default)]
#[serde(default)]
pub struct PmConfig {
    /// Whether the power-management unit is present.
    pub enabled: bool,
}

/// `pcu` section: performance-counter unit (§6A supplemented feature).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Default)]
#[serde(default)]
pub struct PcuConfig {
    /// Whether the performance-counter unit is present.
    pub enabled: bool,
}

/// `sim` section: simulation-wide controls. Profiler/exe-log *output
/// formatting* is out of scope (§1); these flags are retained because the
/// executor still needs to know whether to pay the (small) bookkeeping cost
/// of tracking what they would report.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Clock period in picoseconds, used to derive `clock_rate()` (§6).
    pub clkcycle_ps: u64,
    /// Whether profiling bookkeeping is enabled.
    pub profile: bool,
    /// Whether execution-log bookkeeping is enabled.
    pub exe_log: bool,
    /// Suppress informational output.
    pub quiet: bool,
    /// Force verbose output.
    pub verbose: bool,
    /// Zero-delay scheduler cascade cap (§4.4).
    pub scheduler_cascade_cap: u32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            clkcycle_ps: defaults::CLKCYCLE_PS,
            profile: false,
            exe_log: false,
            quiet: false,
            verbose: false,
            scheduler_cascade_cap: defaults::SCHEDULER_CASCADE_CAP,
        }
    }
}

/// `debug` section: JTAG debug channel (§4.9).
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Whether the debug module is present.
    pub enabled: bool,
    /// RSP/GDB server port; retained for configuration compatibility. The
    /// RSP/GDB server itself is a CLI/REPL concern and out of scope (§1).
    pub rsp_port: u16,
    /// JTAG clock period in picoseconds.
    pub jtagcycle_ps: u64,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            rsp_port: 51000,
            jtagcycle_ps: defaults::JTAGCYCLE_PS,
        }
    }
}

/// One entry of the per-peripheral configuration list (§6). Specific
/// peripheral behaviours are out of scope (§1); this struct only carries the
/// generic fields every peripheral section shares, plus an open bag of
/// device-specific options for the peripheral's own upcall handler to
/// interpret.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct PeripheralConfig {
    /// Peripheral kind (e.g. `"memory"`, `"uart"`, `"eth"`, `"kbd"`, `"vga"`,
    /// `"fb"`, `"mc"`, `"gpio"`, `"generic"`).
    pub kind: String,
    /// Base physical address.
    pub baseaddr: u32,
    /// Size in bytes.
    pub size: u32,
    /// Whether this peripheral instance is active.
    pub enabled: bool,
    /// Interrupt line this peripheral raises, if any.
    pub irq: Option<u32>,
    /// Device-specific options, passed through uninterpreted to the
    /// generic-peripheral upcall handler (§6).
    #[serde(default)]
    pub options: std::collections::BTreeMap<String, serde_json::Value>,
}

/// Root configuration type for [`crate::sim::simulator::Simulator::init`].
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// `cpu` section.
    pub cpu: CpuConfig,
    /// `dc` section (data cache).
    pub dc: CacheConfig,
    /// `ic` section (instruction cache).
    pub ic: CacheConfig,
    /// `immu` section (instruction MMU).
    pub immu: MmuConfig,
    /// `dmmu` section (data MMU).
    pub dmmu: MmuConfig,
    /// `pic` section.
    pub pic: PicConfig,
    /// `pm` section.
    pub pm: PmConfig,
    /// `pcu` section.
    pub pcu: PcuConfig,
    /// `sim` section.
    pub sim: SimConfig,
    /// `debug` section.
    pub debug: DebugConfig,
    /// Per-peripheral sections.
    pub peripherals: Vec<PeripheralConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cpu: CpuConfig::default(),
            dc: CacheConfig::default(),
            ic: CacheConfig::default(),
            immu: MmuConfig::default(),
            dmmu: MmuConfig::default(),
            pic: PicConfig::default(),
            pm: PmConfig::default(),
            pcu: PcuConfig::default(),
            sim: SimConfig::default(),
            debug: DebugConfig::default(),
            peripherals: Vec::new(),
        }
    }
}

impl Config {
    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if `text` is not valid TOML or does not match the
    /// `Config` schema.
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_mmus_disabled_and_caches_enabled() {
        let cfg = Config::default();
        assert!(!cfg.immu.enabled);
        assert!(!cfg.dmmu.enabled);
        assert!(cfg.ic.enabled);
        assert!(cfg.dc.enabled);
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let cfg = Config::from_toml("[dmmu]\nenabled = true\nnways = 2\n").unwrap();
        assert!(cfg.dmmu.enabled);
        assert_eq!(cfg.dmmu.nways, 2);
        assert_eq!(cfg.dmmu.nsets, defaults::NSETS);
        assert!(cfg.pic.enabled);
    }
}
