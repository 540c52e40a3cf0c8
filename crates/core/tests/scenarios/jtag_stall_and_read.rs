//! Stalling the CPU over JTAG freezes the fetch/execute loop entirely
//! (§4.9/§5); a Wishbone read issued while stalled still reaches memory
//! directly, and releasing the stall lets the program resume exactly where
//! it left off.

use crate::common::encode::{self, *};
use crate::common::harness::SimBuilder;
use crate::common::jtag_frame::*;
use orisc_core::core::units::debug::status;
use orisc_core::sim::simulator::RunResult;

const KNOWN_WORD_ADDR: u32 = 0x40;
const KNOWN_WORD: u32 = 0xABCD_1234;

#[test]
fn wishbone_read_works_while_stalled_and_program_resumes_after_release() {
    crate::common::init_tracing();

    let mut image = Vec::new();
    encode::push(&mut image, ri(OP_NOP, 0, 0, NOP_EXIT)); // r3 is still 0 here: exit(0)
    encode::pad_to(&mut image, KNOWN_WORD_ADDR as usize + 4);
    image[KNOWN_WORD_ADDR as usize..KNOWN_WORD_ADDR as usize + 4].copy_from_slice(&KNOWN_WORD.to_be_bytes());

    let mut sim = SimBuilder::new(0x1000).with_image(image).build();

    sim.jtag_shift_ir(&[0x8], 4); // load the DEBUG instruction

    let (mut reg, nbits) = select_module(MODULE_WISHBONE);
    sim.jtag_shift_dr(&mut reg, nbits);
    assert_eq!(parse_response(&reg, 0).1, status::OK);

    let (mut reg, nbits) = write_control(1 << CONTROL_STALL_BIT);
    sim.jtag_shift_dr(&mut reg, nbits);
    assert_eq!(parse_response(&reg, 0).1, status::OK);

    // While stalled, the cycle loop doesn't even reach the CPU.
    sim.run(0.000_001);
    assert_eq!(sim.stats().instructions_retired, 0, "a stalled CPU must not retire anything");

    let (mut reg, nbits) = write_command(ACCESS_READ32, KNOWN_WORD_ADDR, 0);
    sim.jtag_shift_dr(&mut reg, nbits);
    assert_eq!(parse_response(&reg, 0).1, status::OK);

    let (mut reg, nbits) = go_command_read(32);
    sim.jtag_shift_dr(&mut reg, nbits);
    let (value, go_status) = parse_response(&reg, 32);
    assert_eq!(go_status, status::OK);
    assert_eq!(value as u32, KNOWN_WORD, "a stalled-CPU Wishbone read must still see live memory");

    let (mut reg, nbits) = write_control(0); // release the stall
    sim.jtag_shift_dr(&mut reg, nbits);

    let result = sim.run(1.0);
    assert_eq!(result, RunResult::Brkpt, "the program must resume and hit its exit hook");
    assert_eq!(sim.take_exit(), Some(0));
    assert!(sim.stats().instructions_retired >= 1, "releasing the stall must let the CPU retire again");
}
