//! Architectural and host error taxonomies.
//!
//! [`Trap`] covers the architectural exceptions of §7: always recoverable by
//! the guest, each with a fixed vector offset. [`ConfigError`] and
//! [`SimError`] cover host-level configuration and runtime errors: fatal,
//! reported to the embedder rather than vectored to guest code.
//!
//! The original implementation escapes from deep inside memory accesses back
//! to the instruction dispatcher with `setjmp`/`longjmp`. This port instead
//! bubbles a `Result<_, Trap>` with `?` through every memory-access and
//! execute-stage function, collapsed exactly once per instruction in
//! [`crate::core::cpu::execution`].

use crate::common::constants::EXCEPTION_BASE;

/// An architectural exception. Always recoverable by the guest: the executor
/// vectors to `exception_base + vector_offset()` rather than propagating the
/// error past the current instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Trap {
    /// CPU reset.
    #[error("reset")]
    Reset,
    /// No region matched the accessed address.
    #[error("bus error at {addr:#010x}")]
    BusError {
        /// The address that missed every registered region.
        addr: u32,
    },
    /// Data MMU permission violation (TLB hit, permission bits denied).
    #[error("data page fault at {addr:#010x}")]
    DataPageFault {
        /// The faulting virtual address.
        addr: u32,
    },
    /// Instruction MMU permission violation (TLB hit, permission bits denied).
    #[error("instruction page fault at {addr:#010x}")]
    InstructionPageFault {
        /// The faulting virtual address.
        addr: u32,
    },
    /// The architectural tick timer has fired.
    #[error("tick timer")]
    TickTimer,
    /// An unaligned access to a width that requires alignment.
    #[error("alignment fault at {addr:#010x}")]
    Alignment {
        /// The misaligned effective address.
        addr: u32,
    },
    /// The decoder produced the distinguished "illegal" opcode index.
    #[error("illegal instruction")]
    IllegalInstruction,
    /// An external interrupt line was delivered.
    #[error("external interrupt on line {line}")]
    ExternalInterrupt {
        /// The interrupt line number that was delivered.
        line: u32,
    },
    /// Data MMU miss: no TLB entry matched.
    #[error("data TLB miss at {addr:#010x}")]
    DataTlbMiss {
        /// The virtual address that missed the data TLB.
        addr: u32,
    },
    /// Instruction MMU miss: no TLB entry matched.
    #[error("instruction TLB miss at {addr:#010x}")]
    InstructionTlbMiss {
        /// The virtual address that missed the instruction TLB.
        addr: u32,
    },
    /// A range violation (e.g. division by zero).
    #[error("range exception")]
    Range,
    /// `l.sys` — a guest system call.
    #[error("system call")]
    Syscall,
    /// Reserved for a future floating-point unit; never raised by this core.
    #[error("floating point exception")]
    FloatingPoint,
    /// `l.trap` — guest-requested trap, conditional on an immediate match.
    #[error("trap")]
    Trap,
}

impl Trap {
    /// Returns the fixed vector offset for this exception kind (§4.8).
    ///
    /// The executor jumps to `EXCEPTION_BASE + vector_offset()` on entry.
    #[must_use]
    pub fn vector_offset(&self) -> u32 {
        match self {
            Trap::Reset => 0x100,
            Trap::BusError { .. } => 0x200,
            Trap::DataPageFault { .. } => 0x300,
            Trap::InstructionPageFault { .. } => 0x400,
            Trap::TickTimer => 0x500,
            Trap::Alignment { .. } => 0x600,
            Trap::IllegalInstruction => 0x700,
            Trap::ExternalInterrupt { .. } => 0x800,
            Trap::DataTlbMiss { .. } => 0x900,
            Trap::InstructionTlbMiss { .. } => 0xa00,
            Trap::Range => 0xb00,
            Trap::Syscall => 0xc00,
            Trap::FloatingPoint => 0xd00,
            Trap::Trap => 0xe00,
        }
    }

    /// Returns the absolute vector address this exception jumps to.
    #[must_use]
    pub fn vector_address(&self) -> u32 {
        EXCEPTION_BASE.wrapping_add(self.vector_offset())
    }

    /// Returns the effective address recorded in EEAR for this exception, if
    /// the exception kind carries one.
    #[must_use]
    pub fn effective_address(&self) -> Option<u32> {
        match self {
            Trap::BusError { addr }
            | Trap::DataPageFault { addr }
            | Trap::InstructionPageFault { addr }
            | Trap::Alignment { addr }
            | Trap::DataTlbMiss { addr }
            | Trap::InstructionTlbMiss { addr } => Some(*addr),
            _ => None,
        }
    }
}

/// A host-level configuration error (§7). Fatal: reported to the embedder at
/// `init()` time, never vectored to guest code.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A configuration section named an option this core does not recognise.
    #[error("unknown configuration option `{section}.{option}`")]
    UnknownOption {
        /// The section the unknown option was found in.
        section: String,
        /// The unrecognised option name.
        option: String,
    },
    /// Two region registrations overlap without a valid chip-select overlay.
    #[error("region `{new}` at {base:#010x}..{end:#010x} conflicts with `{existing}`")]
    ConflictingRegion {
        /// Name of the region being registered.
        new: String,
        /// Name of the already-registered region it conflicts with.
        existing: String,
        /// Base address of the conflicting range.
        base: u32,
        /// Exclusive end address of the conflicting range.
        end: u32,
    },
    /// A file named in the configuration could not be found.
    #[error("file not found: {0}")]
    FileNotFound(String),
    /// Allocation failed while building the initial simulator state.
    #[error("out of memory during initialisation")]
    OutOfMemory,
}

/// A host-level runtime error (§7). Fatal: the simulator flushes state and
/// the embedder should exit with a diagnostic.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// A configuration error surfaced during `init()`.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// A region's read/write callback failed in a way that is not a
    /// recoverable architectural bus error (host-side bug).
    #[error("region callback `{region}` failed: {reason}")]
    RegionCallback {
        /// Name of the region whose callback failed.
        region: String,
        /// Human-readable failure reason.
        reason: String,
    },
    /// Dynamic allocation failed after initialisation (narrow: caches and
    /// TLBs are fixed-size and never allocate after `init()`).
    #[error("out of memory")]
    OutOfMemory,
    /// The scheduler's zero-delay cascade cap (§4.4) was exceeded within a
    /// single tick, indicating a misbehaving event re-scheduling itself.
    #[error("scheduler zero-delay cascade exceeded {limit} re-entries in one tick")]
    SchedulerCascadeOverflow {
        /// The configured cascade cap that was exceeded.
        limit: u32,
    },
}
