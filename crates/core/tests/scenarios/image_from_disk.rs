//! An image assembled in memory, written to disk, and read back byte-for-byte
//! runs identically to building the simulator directly from the in-memory
//! bytes — the embedder's own load path (`std::fs::read`, §6A) round-trips.

use crate::common::encode::{self, *};
use crate::common::harness::{run_to_exit, SimBuilder};
use std::io::Write;

#[test]
fn image_round_trips_through_a_file_before_loading() {
    let mut image = Vec::new();
    encode::push(&mut image, ri(OP_ADDI, 3, 0, 7));
    encode::push(&mut image, ri(OP_NOP, 0, 0, NOP_EXIT));

    let mut file = tempfile::NamedTempFile::new().expect("create temp image file");
    file.write_all(&image).expect("write image to disk");

    let loaded = std::fs::read(file.path()).expect("read image back from disk");
    assert_eq!(loaded, image, "bytes read back must match what was written");

    let mut sim = SimBuilder::new(0x1000).with_image(loaded).build();
    let exit = run_to_exit(&mut sim, 1.0);
    assert_eq!(exit, 7);
}
