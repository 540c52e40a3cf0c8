//! A data access misses the DMMU's TLB, traps to `0xA00`, the handler
//! writes a DTLBMR/DTLBTR-equivalent entry via `l.mtspr` and returns with
//! `l.rfe`, and the retried load now succeeds against the freshly-mapped
//! physical page.

use crate::common::encode::{self, *};
use crate::common::harness::{run_to_exit, SimBuilder};
use orisc_core::config::MmuConfig;
use orisc_core::core::arch::spr;

const DMMU_SET3_WAY0: u16 = 0x803;
const TLB_ENTRY: u16 = 0x4007; // ppn_base 0x4000 | valid | read | write

#[test]
fn miss_then_refill_via_rfe_retries_the_faulting_load() {
    let mut image = Vec::new();

    // Main program at 0x0000.
    encode::push(&mut image, ri(OP_ADDI, 2, 0, 0x6000)); // r2 = 0x6000
    encode::push(&mut image, ri(OP_LWZ, 4, 2, 0)); // r4 = [r2]   <- faults once
    encode::push(&mut image, rr(OP_ADD, 3, 4, 0)); // r3 = r4
    encode::push(&mut image, ri(OP_NOP, 0, 0, NOP_EXIT));

    // DataTlbMiss handler at 0xA00.
    encode::pad_to(&mut image, 0xA00);
    encode::push(&mut image, ri(OP_ORI, 5, 0, DMMU_SET3_WAY0));
    encode::push(&mut image, ri(OP_ORI, 6, 0, TLB_ENTRY));
    encode::push(&mut image, ri(OP_MTSPR, 6, 5, 0)); // l.mtspr r5(addr),r6(value),0
    encode::push(&mut image, encode::rfe());

    // The physical page the handler maps the fault to.
    encode::pad_to(&mut image, 0x4000);
    image[0x4000..0x4004].copy_from_slice(&0xCAFE_BABEu32.to_be_bytes());

    let mut sim = SimBuilder::new(0x8000)
        .with_config(|cfg| {
            cfg.dmmu = MmuConfig {
                enabled: true,
                nways: 2,
                nsets: 4,
                pagesize: 0x2000,
                hit_delay: 1,
            };
            // The default reset SR leaves DME off (identity-mapped data
            // access until a guest sets up its own TLB); this scenario
            // needs the DMMU actually live from the first access.
            cfg.cpu.sr |= spr::SR_DME;
        })
        .with_image(image)
        .build();

    let exit = run_to_exit(&mut sim, 1.0);
    assert_eq!(exit, 0xCAFE_BABE);
    assert!(sim.stats().dmmu_misses >= 1, "the load must have missed the TLB at least once");
    assert!(sim.stats().exceptions_taken >= 1, "the miss must have raised DataTlbMiss");
}
