//! Stores and loads of every width agree on big-endian byte order: the
//! most-significant byte lands at the lowest address (§3's byte-ordering
//! property, tested here across byte/halfword/word widths together rather
//! than each in isolation).

use crate::common::encode::{self, *};
use crate::common::harness::{run_to_exit, SimBuilder};

#[test]
fn stores_and_loads_agree_on_big_endian_byte_order() {
    let mut image = Vec::new();

    encode::push(&mut image, ri(OP_ADDI, 2, 0, 0x1000)); // r2 = 0x1000
    encode::push(&mut image, ri(OP_MOVHI, 4, 0, 0x1122)); // r4 = 0x11220000
    encode::push(&mut image, ri(OP_ORI, 4, 4, 0x3344)); // r4 = 0x11223344
    encode::push(&mut image, ri(OP_SW, 4, 2, 0)); // [0x1000..0x1004] = r4, big-endian

    encode::push(&mut image, ri(OP_LBZ, 5, 2, 0)); // r5 = byte at +0, expect 0x11
    encode::push(&mut image, ri(OP_XORI, 5, 5, 0x11));
    encode::push(&mut image, ri(OP_LBZ, 6, 2, 1)); // r6 = byte at +1, expect 0x22
    encode::push(&mut image, ri(OP_XORI, 6, 6, 0x22));
    encode::push(&mut image, ri(OP_LHZ, 7, 2, 2)); // r7 = halfword at +2, expect 0x3344
    encode::push(&mut image, ri(OP_XORI, 7, 7, 0x3344));
    encode::push(&mut image, ri(OP_LWZ, 8, 2, 0)); // r8 = word at +0, expect 0x11223344
    encode::push(&mut image, rr(OP_XOR, 9, 8, 4)); // r9 = r8 ^ r4 (r4 still holds the original word)

    encode::push(&mut image, rr(OP_OR, 3, 5, 6));
    encode::push(&mut image, rr(OP_OR, 3, 3, 7));
    encode::push(&mut image, rr(OP_OR, 3, 3, 9));
    encode::push(&mut image, ri(OP_NOP, 0, 0, NOP_EXIT));

    let mut sim = SimBuilder::new(0x2000).with_image(image).build();

    let exit = run_to_exit(&mut sim, 1.0);
    assert_eq!(exit, 0, "every byte/halfword/word view of the stored word must agree");
}
