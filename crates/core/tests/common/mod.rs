//! Shared test infrastructure: instruction-word builders, JTAG frame
//! builders, and a [`Simulator`](orisc_core::sim::simulator::Simulator)
//! test-harness builder, used by every scenario under `tests/scenarios`.

pub mod encode;
pub mod harness;
pub mod jtag_frame;

/// Installs a `tracing` subscriber (respecting `RUST_LOG`) and an
/// `env_logger` bridge for the handful of dependencies that still log
/// through the `log` facade, so a scenario can be run under `RUST_LOG=trace`
/// to see per-cycle detail. Safe to call from every test; only the first
/// call takes effect.
pub fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).try_init();
        let _ = env_logger::try_init();
        log::debug!("test tracing initialised");
    });
}
