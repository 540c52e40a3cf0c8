//! Builds valid DEBUG-instruction data-register frames for
//! `Simulator::jtag_shift_dr`.
//!
//! The CRC-32 (poly `0x04c1_1db7`, init all-ones, MSB-first bit-at-a-time)
//! and the bit-packing order are private to `orisc_core`'s `debug` module,
//! so this duplicates rather than imports them — the same approach already
//! used by `sim::simulator`'s own inline JTAG tests, grounded on
//! `orisc_core::core::units::debug::mod`'s `crc` submodule and its own
//! `select_wishbone`/`write_control_sets_stall_bit` unit tests, which fix
//! the exact field order every frame below follows.

/// `ModuleId::Wishbone` (the only module this suite's scenarios select).
pub const MODULE_WISHBONE: u64 = 0;
/// `JtagAccess::Read32`.
pub const ACCESS_READ32: u64 = 6;
/// Control-register `STALL` bit position within a `WRITE_CONTROL` payload.
pub const CONTROL_STALL_BIT: u32 = 50;

const CRC_INIT: u32 = 0xffff_ffff;
const CRC_POLY: u32 = 0x04c1_1db7;

fn crc_update_bit(crc: u32, bit: u64) -> u32 {
    let top = (crc >> 31) & 1;
    let crc = crc << 1;
    if top ^ (bit as u32) == 1 {
        crc ^ CRC_POLY
    } else {
        crc
    }
}

fn crc_update(mut crc: u32, value: u64, nbits: u32) -> u32 {
    for i in (0..nbits).rev() {
        crc = crc_update_bit(crc, (value >> i) & 1);
    }
    crc
}

/// MSB-first bit writer into a byte buffer, matching `debug::BitWriter`.
pub struct FrameBuilder {
    buf: Vec<u8>,
    pos: usize,
    crc: u32,
}

impl FrameBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: Vec::new(),
            pos: 0,
            crc: CRC_INIT,
        }
    }

    fn write_bit(&mut self, bit: bool) {
        let byte_idx = self.pos / 8;
        if byte_idx >= self.buf.len() {
            self.buf.push(0);
        }
        if bit {
            self.buf[byte_idx] |= 1 << (7 - (self.pos % 8));
        }
        self.pos += 1;
    }

    /// Writes `nbits` of `value`, MS-bit first, folding them into the
    /// running CRC.
    pub fn field(&mut self, value: u64, nbits: u32) -> &mut Self {
        for i in (0..nbits).rev() {
            self.write_bit((value >> i) & 1 == 1);
        }
        self.crc = crc_update(self.crc, value, nbits);
        self
    }

    /// Closes the frame with the accumulated CRC-32 and returns the buffer
    /// plus its bit length.
    #[must_use]
    pub fn finish(mut self) -> (Vec<u8>, usize) {
        let crc = u64::from(self.crc);
        for i in (0..32).rev() {
            self.write_bit((crc >> i) & 1 == 1);
        }
        (self.buf, self.pos)
    }
}

/// `SELECT_MODULE` frame selecting the given 4-bit module id.
#[must_use]
pub fn select_module(module_id: u64) -> (Vec<u8>, usize) {
    FrameBuilder::new().field(1, 1).field(module_id, 4).finish()
}

/// `WRITE_CONTROL` frame carrying a 52-bit control payload.
#[must_use]
pub fn write_control(payload: u64) -> (Vec<u8>, usize) {
    FrameBuilder::new().field(0, 1).field(4, 3).field(payload, 52).finish()
}

/// `WRITE_COMMAND` frame that arms a pending Wishbone access.
#[must_use]
pub fn write_command(acc_type: u64, addr: u32, len_minus1: u16) -> (Vec<u8>, usize) {
    FrameBuilder::new()
        .field(0, 1)
        .field(2, 3)
        .field(acc_type, 4)
        .field(u64::from(addr), 32)
        .field(u64::from(len_minus1), 16)
        .finish()
}

/// `GO_COMMAND` frame with no trailing payload (used to execute a
/// previously-armed read). The response is wider than the request for a
/// read of `response_width_bits` bits (payload + 4-bit status + 32-bit
/// CRC), so the returned buffer is pre-sized to fit the response too;
/// `debug::Jtag::shift_dr` writes its reply into the same buffer it read
/// the request from.
#[must_use]
pub fn go_command_read(response_width_bits: u32) -> (Vec<u8>, usize) {
    let (mut buf, nbits) = FrameBuilder::new().field(0, 1).field(0, 3).finish();
    let response_bytes = (response_width_bits as usize + 4 + 32).div_ceil(8);
    if buf.len() < response_bytes {
        buf.resize(response_bytes, 0);
    }
    (buf, nbits)
}

/// Reads the `nbits`-long response packed by `debug::respond`: the payload
/// (`width_bits` wide), a 4-bit status, and a discarded CRC.
#[must_use]
pub fn parse_response(reg: &[u8], width_bits: u32) -> (u64, u8) {
    let mut pos = 0usize;
    let mut read = |n: u32| -> u64 {
        let mut v = 0u64;
        for _ in 0..n {
            let byte = reg.get(pos / 8).copied().unwrap_or(0);
            let bit = (byte >> (7 - (pos % 8))) & 1;
            v = (v << 1) | u64::from(bit);
            pos += 1;
        }
        v
    };
    let value = read(width_bits);
    let status = read(4) as u8;
    (value, status)
}
