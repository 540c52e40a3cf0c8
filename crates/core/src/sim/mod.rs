//! Simulation utilities and program loading.
//!
//! [`simulator`] is the top-level embedding API (§6); [`loader`] places an
//! already-converted memory image into an [`crate::soc::AddressSpace`]
//! before `Simulator::run` begins.

/// Raw memory-image loading.
pub mod loader;

/// Top-level `Simulator`, wiring every subsystem together (§2, §6).
pub mod simulator;
