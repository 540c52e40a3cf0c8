//! A fault raised by a branch's own delay-slot instruction must save
//! `EPCR` as the *branch's* PC, not the delay slot's, so `l.rfe` replays
//! the branch and its delay slot together rather than resuming one
//! instruction late (§9 delay-slot re-entry). `cpu::trap` unit-tests this
//! directly against `Cpu::enter_exception`; this drives the same behaviour
//! through a real fetch/decode/execute/trap/rfe loop.

use crate::common::encode::{self, *};
use crate::common::harness::{run_to_exit, SimBuilder};

const SYS_EPCR_BANK0: u16 = 0x20;

#[test]
fn fault_in_delay_slot_reports_the_branchs_own_pc() {
    let mut image = Vec::new();

    encode::push(&mut image, ri(OP_ADDI, 2, 0, 0x2003)); // r2 = 0x2003 (misaligned word addr)
    encode::push(&mut image, encode::jump(OP_J, 8)); // l.j +8, target = this pc + 8
    encode::push(&mut image, ri(OP_LWZ, 4, 2, 0)); // delay slot: l.lwz r4,0(r2) <- Alignment fault
    encode::push(&mut image, ri(OP_NOP, 0, 0, NOP_EXIT)); // landed on after the retried jump

    // Alignment vector (EXCEPTION_BASE 0x100 + offset 0x600).
    encode::pad_to(&mut image, 0x700);
    encode::push(&mut image, ri(OP_MFSPR, 3, 0, SYS_EPCR_BANK0)); // r3 = EPCR
    encode::push(&mut image, ri(OP_ANDI, 2, 2, 0xFFFC)); // align r2 so the retry doesn't re-fault
    encode::push(&mut image, encode::rfe());

    encode::pad_to(&mut image, 0x2004);
    image[0x2000..0x2004].copy_from_slice(&0xDEAD_BEEFu32.to_be_bytes());

    let mut sim = SimBuilder::new(0x3000).with_image(image).build();

    let exit = run_to_exit(&mut sim, 1.0);
    assert_eq!(exit, 4, "EPCR must hold the l.j's own PC, not the delay slot's");
    assert_eq!(sim.stats().exceptions_taken, 1, "the retried load must not fault again");
}
