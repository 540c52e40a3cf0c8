//! A cycle-aware simulator core for a 32-bit delay-slot RISC architecture.
//!
//! This crate implements the tightly-coupled subsystems that together
//! produce a simulated execution timeline indistinguishable from the
//! modelled hardware:
//! 1. **Core:** single-issue, in-order fetch/decode/execute/retire loop,
//!    GPR and SPR state, the ALU, delay-slot tracking, and exception
//!    vectoring.
//! 2. **Memory:** address-space map, set-associative MMU/TLB and cache
//!    models with configurable latency.
//! 3. **Scheduling:** a priority event queue driving timers and peripheral
//!    state machines, and a programmable interrupt controller.
//! 4. **Debug:** a JTAG TAP exposing CPU registers and bus memory while the
//!    core is halted.

/// Common types and constants (addresses, registers, traps, access kinds).
pub mod common;
/// Simulator configuration (defaults and hierarchical config structures).
pub mod config;
/// CPU core (architectural state, execution, memory, trap, and units).
pub mod core;
/// Instruction set (decode, instruction, opcode table, disassembly).
pub mod isa;
/// Simulation: `Simulator`, the embedding API, and the memory-image loader.
pub mod sim;
/// Address-space map and memory region descriptors.
pub mod soc;
/// Simulation statistics collection and reporting.
pub mod stats;

/// Root configuration type; use `Config::default()` or deserialize from TOML/JSON.
pub use crate::config::Config;
/// Main CPU type; holds architectural state, the SPR file, and the ALU.
pub use crate::core::cpu::Cpu;
/// Top-level simulator; owns the CPU and every subsystem it depends on.
pub use crate::sim::simulator::Simulator;
