//! Shared end-to-end test scaffolding: a fluent builder around
//! [`orisc_core::sim::simulator::Simulator`] so scenario tests describe
//! "what memory, what config, what program" without repeating
//! `Simulator::init`'s plumbing at every call site.

use orisc_core::config::{Config, PeripheralConfig};
use orisc_core::sim::simulator::{RunResult, Simulator};

/// Builds a [`Simulator`] wired to a single flat RAM region holding the
/// test program, with whatever config overrides the scenario needs.
pub struct SimBuilder {
    config: Config,
    image: Vec<u8>,
    ram_size: u32,
}

impl SimBuilder {
    /// Starts from [`Config::default`] and a RAM region of `ram_size` bytes
    /// at physical address 0.
    #[must_use]
    pub fn new(ram_size: u32) -> Self {
        Self {
            config: Config::default(),
            image: Vec::new(),
            ram_size,
        }
    }

    /// Applies an arbitrary override to the configuration before `build`.
    #[must_use]
    pub fn with_config(mut self, f: impl FnOnce(&mut Config)) -> Self {
        f(&mut self.config);
        self
    }

    /// Sets the raw memory image loaded at address 0.
    #[must_use]
    pub fn with_image(mut self, image: Vec<u8>) -> Self {
        self.image = image;
        self
    }

    /// Builds the simulator, registering the single RAM peripheral and
    /// loading the image.
    #[must_use]
    pub fn build(mut self) -> Simulator {
        self.config.peripherals.push(PeripheralConfig {
            kind: "memory".to_string(),
            baseaddr: 0,
            size: self.ram_size,
            enabled: true,
            irq: None,
            options: std::collections::BTreeMap::new(),
        });
        Simulator::init(&self.config, &self.image, 0, Vec::new()).expect("harness config is self-consistent")
    }
}

/// Runs `sim` until the `l.nop` exit hook fires or `max_seconds` of
/// simulated time elapses, panicking on the latter so a runaway test
/// program fails loudly instead of silently passing.
pub fn run_to_exit(sim: &mut Simulator, max_seconds: f64) -> u32 {
    let result = sim.run(max_seconds);
    assert_eq!(result, RunResult::Brkpt, "program did not reach its exit hook within budget");
    sim.take_exit().expect("Brkpt implies an exit code was recorded")
}
