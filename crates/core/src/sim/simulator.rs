//! Top-level `Simulator` (§2, §5, §6): the embedding API, wiring every
//! subsystem together.
//!
//! `Cpu` only ever sees its own architectural state and the address-space
//! map; it has no reference back to the scheduler, the interrupt
//! controller, or the JTAG channel, because those are shared state more
//! than one CPU-owned subsystem can touch at once. `Simulator` is the one
//! place that holds all of it, and the only thing that drives the
//! per-cycle loop: poll the interrupt controller, step the CPU, run due
//! scheduler events, drain whatever simulator-owned [`SprEffect`] the CPU
//! deferred (§9).
//!
//! The scheduling model is single-threaded and cooperative (§5): one clock,
//! one instruction at a time, one scheduler. The two suspension points —
//! the top of the per-cycle loop, where `interrupt`/`interrupt_set`/
//! `interrupt_clear` may be called, and the JTAG methods, which must only
//! run while `run()` is not on the stack — are the embedder's
//! responsibility to serialise; this core does not take a lock itself.

use crate::common::{SimError, Trap};
use crate::config::Config;
use crate::core::arch::spr::{self, SprEffect};
use crate::core::cpu::execution::NopHook;
use crate::core::cpu::Cpu;
use crate::core::reset::ResetBus;
use crate::core::units::debug::Jtag;
use crate::core::units::interrupt::InterruptController;
use crate::core::units::scheduler::{EventId, Scheduler};
use crate::sim::loader;
use crate::soc::region::{GenericPeripheral, PeripheralUpcall};
use crate::soc::{AddressSpace, MemoryRegion, RamRegion};
use crate::stats::SimStats;

/// Outcome of [`Simulator::run`]: either the requested budget elapsed, or
/// execution stopped early at a breakpoint — a guest-requested exit via the
/// `l.nop` testbench hook (§6A), or a JTAG-asserted CPU stall.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunResult {
    /// The time budget elapsed with no breakpoint.
    Ok,
    /// Execution stopped before the budget elapsed.
    Brkpt,
}

/// The top-level simulator: every subsystem in §2's component list, wired
/// together behind the §6 embedding API.
pub struct Simulator {
    /// CPU architectural state.
    pub cpu: Cpu,
    /// The physical address-space map.
    pub bus: AddressSpace,
    config: Config,
    scheduler: Scheduler<Simulator>,
    pic: InterruptController,
    jtag: Jtag,
    reset_bus: ResetBus<Simulator>,
    stats: SimStats,
    tick_timer_event: Option<EventId>,
    remaining_cycles: u64,
    time_point_cycles: u64,
    exit_code: Option<u32>,
}

impl Simulator {
    /// Builds a simulator from `config`, loads `image` at `image_base`, and
    /// wires up every `"generic"` peripheral section in `config.peripherals`
    /// to the matching entry of `peripheral_upcalls` (matched by the
    /// `name` option, falling back to `kind` if a section sets none).
    ///
    /// Concrete peripheral kinds other than `"memory"` and `"generic"`
    /// (`"uart"`, `"eth"`, `"vga"`, ...) are logged and left unmapped:
    /// modelling specific device behaviour is out of scope (§1) and an
    /// access to one simply bus-errors like any other unmapped address.
    ///
    /// # Errors
    ///
    /// Returns [`SimError`] if a peripheral's configured region conflicts
    /// with one already registered.
    pub fn init(
        config: &Config,
        image: &[u8],
        image_base: u32,
        peripheral_upcalls: Vec<(String, PeripheralUpcall)>,
    ) -> Result<Self, SimError> {
        let cpu = Cpu::new(config);
        let mut bus = AddressSpace::new();
        register_peripherals(&mut bus, config, peripheral_upcalls)?;
        loader::load_image(&mut bus, image_base, image);

        let scheduler = Scheduler::new(config.sim.scheduler_cascade_cap);
        let pic = InterruptController::new(&config.pic);
        let jtag = Jtag::new();

        let mut reset_bus: ResetBus<Simulator> = ResetBus::new();
        let reset_config = config.clone();
        reset_bus.register(move |sim: &mut Simulator| {
            sim.cpu.reset(&reset_config);
            sim.jtag.reset();
        });

        let mut sim = Self {
            cpu,
            bus,
            config: config.clone(),
            scheduler,
            pic,
            jtag,
            reset_bus,
            stats: SimStats::default(),
            tick_timer_event: None,
            remaining_cycles: 0,
            time_point_cycles: 0,
            exit_code: None,
        };
        sim.reconfigure_tick_timer();
        Ok(sim)
    }

    /// Runs a guest-triggered (or embedder-triggered) reset: every hook on
    /// [`ResetBus`] fires in registration order, returning the CPU and JTAG
    /// channel to their post-reset state. The address-space map and its
    /// registered regions are untouched — re-registering peripherals is the
    /// embedder's job via a fresh `init`, not a reset concern.
    pub fn reset(&mut self) {
        if let Some(id) = self.tick_timer_event.take() {
            self.scheduler.cancel(id);
        }
        let mut tmp = std::mem::replace(&mut self.reset_bus, ResetBus::new());
        tmp.run_reset(self);
        self.reset_bus = tmp;
    }

    /// Runs for up to `seconds` of simulated time (negative means
    /// unbounded), converted to cycles via [`Simulator::clock_rate`] and
    /// held in `remaining_cycles` for the duration of the loop. Returns
    /// [`RunResult::Brkpt`] if the guest halted via the `l.nop` exit hook
    /// before the budget elapsed.
    ///
    /// The budget is live: a scheduler event fired from inside this loop
    /// (§5's per-cycle suspension point) can call [`Simulator::reset_duration`]
    /// to shrink it, and the very next iteration sees the new value.
    pub fn run(&mut self, seconds: f64) -> RunResult {
        self.remaining_cycles = self.seconds_to_cycles(seconds);
        while self.remaining_cycles > 0 {
            self.tick();
            if self.exit_code.is_some() {
                return RunResult::Brkpt;
            }
        }
        RunResult::Ok
    }

    /// Takes the guest's exit code, if `run` stopped because of the `l.nop`
    /// testbench exit hook rather than the time budget.
    pub fn take_exit(&mut self) -> Option<u32> {
        self.exit_code.take()
    }

    /// Shrinks the remaining run budget; meaningful only between `run()`
    /// calls or at the top of the per-cycle loop (§5's suspension points).
    /// A call from inside a scheduler event fired by the current `run()`
    /// takes effect on the very next cycle, since `run()`'s loop re-reads
    /// `remaining_cycles` every iteration.
    pub fn reset_duration(&mut self, seconds: f64) {
        self.remaining_cycles = self.seconds_to_cycles(seconds);
    }

    /// Converts simulated seconds to a cycle count (`u64::MAX` for negative,
    /// i.e. unbounded, seconds) at the current clock rate.
    fn seconds_to_cycles(&self, seconds: f64) -> u64 {
        if seconds < 0.0 {
            u64::MAX
        } else {
            (seconds * self.clock_rate()).round() as u64
        }
    }

    /// Marks the current cycle count as the reference point for a later
    /// [`Simulator::get_time_period`] call.
    pub fn set_time_point(&mut self) {
        self.time_point_cycles = self.stats.cycles;
    }

    /// Returns simulated seconds elapsed since the last
    /// [`Simulator::set_time_point`] call.
    #[must_use]
    pub fn get_time_period(&self) -> f64 {
        let elapsed = self.stats.cycles.saturating_sub(self.time_point_cycles);
        elapsed as f64 / self.clock_rate()
    }

    /// Always `false`: this core models a big-endian architecture only
    /// (§3's big-endian load/store byte ordering).
    #[must_use]
    pub fn is_le(&self) -> bool {
        false
    }

    /// Clock rate in Hz, derived from `sim.clkcycle_ps`.
    #[must_use]
    pub fn clock_rate(&self) -> f64 {
        1.0e12 / self.config.sim.clkcycle_ps as f64
    }

    /// A reference to the accumulated simulation statistics.
    #[must_use]
    pub fn stats(&self) -> &SimStats {
        &self.stats
    }

    /// Delivers an edge-triggered interrupt pulse on `line`. Logged and
    /// ignored, per §7's interrupt-assertion-error policy, if the
    /// controller is configured level-triggered.
    pub fn interrupt(&mut self, line: u32) {
        if !self.pic.is_edge_triggered() {
            tracing::warn!(line, "edge interrupt pulse on a level-configured controller, ignored");
            return;
        }
        self.pic.raise(line);
    }

    /// Asserts a level-triggered interrupt on `line`, held until
    /// [`Simulator::interrupt_clear`]. Logged and ignored if the controller
    /// is configured edge-triggered.
    pub fn interrupt_set(&mut self, line: u32) {
        if self.pic.is_edge_triggered() {
            tracing::warn!(line, "level interrupt assert on an edge-configured controller, ignored");
            return;
        }
        self.pic.raise(line);
    }

    /// Deasserts a level-triggered interrupt on `line`.
    pub fn interrupt_clear(&mut self, line: u32) {
        self.pic.clear(line);
    }

    /// Resets the JTAG TAP state machine. Must only be called while `run`
    /// is not on the stack (§5).
    pub fn jtag_reset(&mut self) {
        self.jtag.reset();
    }

    /// Shifts `nbits` of `reg` into the JTAG instruction register.
    pub fn jtag_shift_ir(&mut self, reg: &[u8], nbits: usize) {
        self.jtag.shift_ir(reg, nbits);
    }

    /// Shifts `nbits` through the JTAG data register selected by the last
    /// `jtag_shift_ir`, reading and writing CPU registers or bus memory
    /// directly while the CPU is stalled (§4.9 scenario: a JTAG memory read
    /// while the cycle loop is suspended).
    pub fn jtag_shift_dr(&mut self, reg: &mut [u8], nbits: usize) {
        self.jtag.shift_dr(reg, nbits, &mut self.cpu, &mut self.bus);
    }

    /// Runs exactly one cycle of the per-cycle loop (§4.8, §5): poll
    /// interrupts before fetch, step the CPU (or do nothing if the JTAG
    /// channel has it stalled or held in reset), fold memory-access cycles
    /// into the clock, drain any deferred `SprEffect`, and run due
    /// scheduler events.
    fn tick(&mut self) {
        if self.jtag.cpu_stalled() || self.jtag.cpu_in_reset() {
            self.advance_clock(1);
            return;
        }

        let mut retired = false;
        let global_enable = self.cpu.sprs.sr() & spr::SR_IEE != 0;
        if let Some(line) = self.pic.poll(global_enable) {
            self.cpu.sprs.set_picsr_bits(1 << line);
            self.cpu.enter_exception(Trap::ExternalInterrupt { line });
            self.stats.interrupts_taken += 1;
        } else {
            match self.cpu.step(&mut self.bus) {
                Some(NopHook::Exit(code)) => self.exit_code = Some(code),
                Some(NopHook::Report(value)) => tracing::info!(value, "guest report hook"),
                None => {}
            }
            retired = !self.cpu.halted;
            if let Some(effect) = self.cpu.pending_sim_effect.take() {
                self.apply_pending_effect(effect);
            }
        }

        let mem_cycles = self.cpu.mem_cycles;
        self.advance_clock(1 + u64::from(mem_cycles));
        if retired {
            self.stats.instructions_retired += 1;
        }
        self.sync_stats();
    }

    /// Advances the cycle count by `cycles`, shrinks the live `run()`
    /// budget by the same amount, and runs every scheduler event now due.
    fn advance_clock(&mut self, cycles: u64) {
        self.stats.cycles += cycles;
        self.remaining_cycles = self.remaining_cycles.saturating_sub(cycles);
        let now = self.stats.cycles;
        if let Err(err) = self.scheduler.run_due(now, self) {
            tracing::error!(%err, "scheduler cascade overflow, dropping further events due this cycle");
        }
    }

    /// Copies per-unit hit/miss counters and the running exception count
    /// from the CPU, and latches everything into the PCU SPR bank if
    /// enabled (§4.6, §6A).
    fn sync_stats(&mut self) {
        self.stats.icache_hits = self.cpu.icache.hits();
        self.stats.icache_misses = self.cpu.icache.misses();
        self.stats.dcache_hits = self.cpu.dcache.hits();
        self.stats.dcache_misses = self.cpu.dcache.misses();
        self.stats.immu_hits = self.cpu.immu.hits();
        self.stats.immu_misses = self.cpu.immu.misses();
        self.stats.dmmu_hits = self.cpu.dmmu.hits();
        self.stats.dmmu_misses = self.cpu.dmmu.misses();
        self.stats.exceptions_taken = self.cpu.exceptions_taken;
        if self.config.pcu.enabled {
            self.stats.latch_into(&mut self.cpu.sprs);
        }
    }

    /// Routes a simulator-owned [`SprEffect`] the CPU could not apply
    /// itself to whichever subsystem owns it (§9).
    fn apply_pending_effect(&mut self, effect: SprEffect) {
        match effect {
            SprEffect::InterruptMaskChanged => self.pic.set_mask(self.cpu.sprs.picmr()),
            SprEffect::InterruptStatusCleared { cleared } => {
                for line in 0..32u32 {
                    if cleared & (1 << line) != 0 {
                        self.pic.clear(line);
                    }
                }
            }
            SprEffect::TickTimerReconfigured => self.reconfigure_tick_timer(),
            SprEffect::None
            | SprEffect::SupervisorRegisterChanged
            | SprEffect::DataTlbEntryWritten { .. }
            | SprEffect::InstructionTlbEntryWritten { .. }
            | SprEffect::PowerManagementHalt => {
                unreachable!("Cpu::apply_spr_effect only defers simulator-owned effects")
            }
        }
    }

    /// Cancels any pending tick-timer event and, if `TTMR`'s mode field is
    /// not disabled, schedules a new one at the configured period (§6A
    /// supplemented feature: mode-aware tick timer).
    fn reconfigure_tick_timer(&mut self) {
        if let Some(id) = self.tick_timer_event.take() {
            self.scheduler.cancel(id);
        }
        let ttmr = self.cpu.sprs.ttmr();
        let mode = ttmr & (3 << spr::TTMR_MODE_SHIFT);
        if mode == spr::TTMR_MODE_DISABLED << spr::TTMR_MODE_SHIFT {
            return;
        }
        let period = u64::from(ttmr & spr::TTMR_PERIOD_MASK).max(1);
        let fire_at = self.stats.cycles + period;
        let mode_bits = mode >> spr::TTMR_MODE_SHIFT;
        let id = self
            .scheduler
            .add(fire_at, move |sim: &mut Simulator| sim.fire_tick_timer(mode_bits, period));
        self.tick_timer_event = Some(id);
    }

    /// The tick timer's scheduler callback: sets `TTMR`'s pending bit,
    /// vectors a [`Trap::TickTimer`] if the guest enabled it, and
    /// reschedules itself unless the mode is one-shot.
    fn fire_tick_timer(&mut self, mode_bits: u32, period: u64) -> Option<u64> {
        self.cpu.sprs.set_ttmr_pending();
        self.cpu.sprs.set_ttcr(0);
        let ttmr = self.cpu.sprs.ttmr();
        if ttmr & spr::TTMR_IE != 0 && self.cpu.sprs.sr() & spr::SR_TEE != 0 {
            self.cpu.enter_exception(Trap::TickTimer);
        }
        match mode_bits {
            m if m == spr::TTMR_MODE_RESTART || m == spr::TTMR_MODE_CONTINUOUS => Some(self.stats.cycles + period),
            _ => None,
        }
    }
}

/// Registers every enabled section of `config.peripherals` into `bus`.
/// `"memory"` becomes a writable [`RamRegion`]; `"generic"` is matched
/// against `upcalls` by name (or `kind`, if a section sets none) and wired
/// to a [`GenericPeripheral`]; any other kind is logged and left unmapped
/// (§1 Non-goal: specific peripheral behaviour).
fn register_peripherals(
    bus: &mut AddressSpace,
    config: &Config,
    mut upcalls: Vec<(String, PeripheralUpcall)>,
) -> Result<(), SimError> {
    for periph in &config.peripherals {
        if !periph.enabled {
            continue;
        }
        match periph.kind.as_str() {
            "memory" => {
                let region = MemoryRegion::new(
                    periph.baseaddr,
                    periph.size,
                    Box::new(RamRegion::new("memory", periph.size)),
                );
                bus.register(region)?;
            }
            "generic" => {
                let name = peripheral_name(periph);
                if let Some(pos) = upcalls.iter().position(|(n, _)| *n == name) {
                    let (_, upcall) = upcalls.remove(pos);
                    let region =
                        MemoryRegion::new(periph.baseaddr, periph.size, Box::new(GenericPeripheral::new(name, upcall)));
                    bus.register(region)?;
                } else {
                    tracing::warn!(base = periph.baseaddr, name, "generic peripheral has no matching upcall, left unmapped");
                }
            }
            other => {
                tracing::debug!(kind = other, base = periph.baseaddr, "peripheral kind has no built-in model, left unmapped");
            }
        }
    }
    Ok(())
}

fn peripheral_name(periph: &crate::config::PeripheralConfig) -> String {
    periph
        .options
        .get("name")
        .and_then(|v| v.as_str())
        .map_or_else(|| periph.kind.clone(), ToString::to_string)
}
