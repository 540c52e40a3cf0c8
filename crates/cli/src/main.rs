//! Minimal embedder binary for `orisc-core`: loads a raw memory image and an
//! optional TOML configuration, runs the simulator for a cycle budget, and
//! reports exit code and statistics.
//!
//! Everything this binary does — config parsing, image loading, the run
//! loop — is exactly what `orisc-core`'s docs describe as the embedder's
//! job (§1/§6 of the core's own design notes); this crate adds no
//! simulation behaviour of its own.

use std::collections::BTreeMap;
use std::process::ExitCode;

use clap::Parser;
use orisc_core::config::{Config, PeripheralConfig};
use orisc_core::sim::simulator::RunResult;

#[derive(Parser, Debug)]
#[command(name = "orisc-sim", author, version, about = "A cycle-aware simulator for a 32-bit delay-slot RISC core")]
struct Cli {
    /// Raw memory image to load (already objcopy'd/assembled; no ELF parsing).
    image: String,

    /// TOML configuration file. Falls back to built-in defaults for any
    /// section it omits.
    #[arg(short, long)]
    config: Option<String>,

    /// Physical address the image is loaded at.
    #[arg(long, default_value_t = 0)]
    base: u32,

    /// Size in bytes of the RAM region backing the image, registered at
    /// `--base` alongside whatever peripherals the config file declares.
    #[arg(long, default_value_t = 0x0100_0000)]
    ram_size: u32,

    /// Simulated seconds to run before giving up and reporting a timeout.
    #[arg(long, default_value_t = 10.0)]
    max_seconds: f64,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    tracing::info!(image = %cli.image, base = cli.base, "loading image");

    let mut config = match &cli.config {
        Some(path) => match load_config(path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("error: {path}: {err}");
                return ExitCode::FAILURE;
            }
        },
        None => Config::default(),
    };
    config.peripherals.push(PeripheralConfig {
        kind: "memory".to_string(),
        baseaddr: cli.base,
        size: cli.ram_size,
        enabled: true,
        irq: None,
        options: BTreeMap::new(),
    });

    let image = match std::fs::read(&cli.image) {
        Ok(image) => image,
        Err(err) => {
            eprintln!("error: {}: {err}", cli.image);
            return ExitCode::FAILURE;
        }
    };

    let mut sim = match orisc_core::sim::simulator::Simulator::init(&config, &image, cli.base, Vec::new()) {
        Ok(sim) => sim,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    let result = sim.run(cli.max_seconds);
    sim.stats().print();

    match result {
        RunResult::Brkpt => match sim.take_exit() {
            Some(code) => {
                println!("exit code {code}");
                ExitCode::from((code & 0xff) as u8)
            }
            None => {
                eprintln!("stopped (JTAG stall) before the time budget elapsed");
                ExitCode::FAILURE
            }
        },
        RunResult::Ok => {
            eprintln!("timed out after {} simulated seconds", cli.max_seconds);
            ExitCode::FAILURE
        }
    }
}

fn load_config(path: &str) -> Result<Config, String> {
    let text = std::fs::read_to_string(path).map_err(|err| err.to_string())?;
    toml::from_str(&text).map_err(|err| err.to_string())
}
