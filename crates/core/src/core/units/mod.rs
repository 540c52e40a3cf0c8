//! Execution and timing units.
//!
//! - [`alu`]: integer arithmetic, logic, shifts, and the `l.sf*` compare
//!   family.
//! - [`cache`]: set-associative cache timing model (component C, §4.3).
//! - [`mmu`]: set-associative, strict-LRU TLB with no hardware page-table
//!   walker (component B, §4.2).
//! - [`scheduler`]: the event-driven scheduler (component D, §4.4).
//! - [`interrupt`]: the programmable interrupt controller (component E,
//!   §4.5).
//! - [`debug`]: the JTAG TAP debug channel (component I, §4.9).

/// Arithmetic logic unit: arithmetic, logic, shifts, compares.
pub mod alu;

/// Set-associative cache timing model.
pub mod cache;

/// JTAG TAP debug channel.
pub mod debug;

/// Programmable interrupt controller.
pub mod interrupt;

/// Memory management unit (TLB-only, no page-table walker).
pub mod mmu;

/// Event-driven scheduler.
pub mod scheduler;
