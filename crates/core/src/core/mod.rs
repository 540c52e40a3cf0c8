//! Core processor implementation.
//!
//! Architectural state ([`arch`]), the single-issue execution loop
//! ([`cpu`]), and the timing/peripheral units each CPU access routes
//! through ([`units`]).

/// Architecture-specific components (privilege modes, the SPR file).
pub mod arch;

/// CPU core implementation and the single-issue execution loop.
pub mod cpu;

/// Reset/teardown hook registry (component J, §2, §9).
pub mod reset;

/// Execution and timing units (ALU, cache, MMU, scheduler, interrupt, debug).
pub mod units;

pub use self::cpu::Cpu;
