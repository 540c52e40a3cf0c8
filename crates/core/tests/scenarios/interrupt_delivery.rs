//! A guest unmasks a PIC line via `PICMR`, spins with interrupts globally
//! enabled, and the host asserts a level-triggered external interrupt from
//! outside (the embedding API, §4.5/§6A). Delivery preempts the spin loop,
//! the handler reads `PICSR` to identify the line, acks it by writing the
//! same bits back (write-to-clear), and reports the line mask as its exit
//! code.

use crate::common::encode::{self, *};
use crate::common::harness::{run_to_exit, SimBuilder};
use orisc_core::core::arch::spr;
use orisc_core::sim::simulator::RunResult;

const PICMR: u16 = 0x3000;
const PICSR: u16 = 0x3001;
const LINE: u32 = 3;

#[test]
fn level_interrupt_preempts_the_spin_loop_and_reports_its_line() {
    let mut image = Vec::new();

    encode::push(&mut image, ri(OP_MOVHI, 6, 0, 0xFFFF)); // r6 = 0xFFFF0000
    encode::push(&mut image, ri(OP_ORI, 6, 6, 0xFFFF)); // r6 = 0xFFFFFFFF
    encode::push(&mut image, ri(OP_MTSPR, 6, 0, PICMR)); // PICMR = all lines unmasked
    encode::push(&mut image, encode::jump(OP_J, 0)); // spin: l.j self
    encode::push(&mut image, ri(OP_NOP, 0, 0, 0)); // delay slot, re-executed every iteration

    // ExternalInterrupt vector (EXCEPTION_BASE 0x100 + offset 0x800).
    encode::pad_to(&mut image, 0x900);
    encode::push(&mut image, ri(OP_MFSPR, 3, 0, PICSR)); // r3 = served line bitmap
    encode::push(&mut image, ri(OP_MTSPR, 3, 0, PICSR)); // ack: clear those bits
    encode::push(&mut image, ri(OP_NOP, 0, 0, NOP_EXIT)); // exit with r3

    let mut sim = SimBuilder::new(0x1000)
        .with_config(|cfg| cfg.cpu.sr |= spr::SR_IEE)
        .with_image(image)
        .build();

    // Enough cycles to run the three setup instructions and settle into the
    // spin loop, not enough to do anything else.
    let warmup = sim.run(0.000_001);
    assert_eq!(warmup, RunResult::Ok, "must not have exited before the interrupt was even asserted");

    sim.interrupt_set(LINE);

    let exit = run_to_exit(&mut sim, 1.0);
    assert_eq!(exit, 1 << LINE, "handler must report the line it was served");
    assert_eq!(sim.stats().interrupts_taken, 1);
}
