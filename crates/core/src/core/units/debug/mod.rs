//! JTAG Test Access Port debug channel (component I, §4.9).
//!
//! A second, asynchronous control surface over the CPU and the bus,
//! independent of the fetch/decode/execute loop (component H). Two shift
//! operations move data across the TAP:
//!
//! - [`Jtag::shift_ir`] loads a 4-bit JTAG instruction. Only [`JtagInstr::Debug`]
//!   gates meaningful [`Jtag::shift_dr`] traffic; every other instruction is
//!   accepted (so a host scanning the chain doesn't wedge) but logged.
//! - [`Jtag::shift_dr`] loads or drains a data register. While `DEBUG` is
//!   loaded, the first bits of the shifted-in data select either
//!   `SELECT_MODULE` or one of the five DEBUG commands (§4.9's table); every
//!   command frame ends in a 32-bit CRC over the fields that preceded it,
//!   verified before any write effect is applied.
//!
//! Grounded on `examples/original_source/debug/jtag.h` for the instruction,
//! module, command, access-type, status, and control-bit enumerations, and
//! on `examples/original_source/debug/jtag.c` for the command framing order
//! and CRC placement. The exact byte-packing of the shift register is this
//! port's own: what the architecture actually constrains is the semantics
//! (CRC coverage, command effects, status bits), not a wire-compatible bit
//! layout, so the frames below are a self-consistent design rather than a
//! byte-for-byte port of the original's in-place register shuffle.

mod crc;

use crate::common::{AccessType as MemAccess, MAX_SPRS};
use crate::core::cpu::Cpu;
use crate::soc::address_space::AddressSpace;

/// JTAG instruction (loaded via [`Jtag::shift_ir`]).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JtagInstr {
    /// No recognised instruction has been loaded (or a reserved encoding).
    #[default]
    Undefined,
    /// `EXTEST`.
    Extest,
    /// `SAMPLE`/`PRELOAD`.
    SamplePreload,
    /// `IDCODE`.
    Idcode,
    /// `DEBUG` — the only instruction that gates meaningful DR traffic.
    Debug,
    /// `MBIST`.
    Mbist,
    /// `BYPASS`.
    Bypass,
}

impl JtagInstr {
    fn from_bits(v: u64) -> Self {
        match v {
            0x0 => Self::Extest,
            0x1 => Self::SamplePreload,
            0x2 => Self::Idcode,
            0x8 => Self::Debug,
            0x9 => Self::Mbist,
            0xf => Self::Bypass,
            _ => Self::Undefined,
        }
    }
}

/// Debug sub-module selected by `SELECT_MODULE`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ModuleId {
    /// No module selected yet, or an out-of-range selection.
    #[default]
    Undefined,
    /// The Wishbone bus (plain memory access, §4.1).
    Wishbone,
    /// CPU0's SPR file.
    Cpu0,
    /// CPU1's SPR file. This core models a single hart, so CPU1 is always
    /// reported as missing.
    Cpu1,
}

impl ModuleId {
    fn from_bits(v: u64) -> Self {
        match v {
            0 => Self::Wishbone,
            1 => Self::Cpu0,
            2 => Self::Cpu1,
            _ => Self::Undefined,
        }
    }
}

impl From<ModuleId> for u64 {
    fn from(id: ModuleId) -> u64 {
        match id {
            ModuleId::Wishbone => 0,
            ModuleId::Cpu0 => 1,
            ModuleId::Cpu1 => 2,
            ModuleId::Undefined => 0xf,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum Command {
    #[default]
    Undefined,
    GoCommand,
    ReadCommand,
    WriteCommand,
    ReadControl,
    WriteControl,
}

impl Command {
    fn from_bits(v: u64) -> Self {
        match v {
            0 => Self::GoCommand,
            1 => Self::ReadCommand,
            2 => Self::WriteCommand,
            3 => Self::ReadControl,
            4 => Self::WriteControl,
            _ => Self::Undefined,
        }
    }
}

impl From<Command> for u64 {
    fn from(cmd: Command) -> u64 {
        match cmd {
            Command::GoCommand => 0,
            Command::ReadCommand => 1,
            Command::WriteCommand => 2,
            Command::ReadControl => 3,
            Command::WriteControl => 4,
            Command::Undefined => 0x7,
        }
    }
}

/// Access type carried by `WRITE_COMMAND` (§4.9).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum JtagAccess {
    #[default]
    Undefined,
    Write8,
    Write16,
    Write32,
    Read8,
    Read16,
    Read32,
}

impl JtagAccess {
    fn from_bits(v: u64) -> Self {
        match v {
            0 => Self::Write8,
            1 => Self::Write16,
            2 => Self::Write32,
            4 => Self::Read8,
            5 => Self::Read16,
            6 => Self::Read32,
            _ => Self::Undefined,
        }
    }

    fn is_read(self) -> bool {
        matches!(self, Self::Read8 | Self::Read16 | Self::Read32)
    }

    fn width(self) -> Option<u32> {
        match self {
            Self::Write8 | Self::Read8 => Some(1),
            Self::Write16 | Self::Read16 => Some(2),
            Self::Write32 | Self::Read32 => Some(4),
            Self::Undefined => None,
        }
    }
}

impl From<JtagAccess> for u64 {
    fn from(acc: JtagAccess) -> u64 {
        match acc {
            JtagAccess::Write8 => 0,
            JtagAccess::Write16 => 1,
            JtagAccess::Write32 => 2,
            JtagAccess::Read8 => 4,
            JtagAccess::Read16 => 5,
            JtagAccess::Read32 => 6,
            JtagAccess::Undefined => 0xf,
        }
    }
}

/// Status-register bits returned with every DEBUG response (§4.9, §7).
pub mod status {
    /// No error.
    pub const OK: u8 = 0x0;
    /// The supplied CRC did not match the computed one; the command's write
    /// effect (if any) was discarded.
    pub const CRC_IN_ERROR: u8 = 0x1;
    /// The selected module does not exist.
    pub const MODULE_MISSING: u8 = 0x2;
    /// A Wishbone access violated alignment or size-multiple-of-width.
    pub const WISHBONE_ERROR: u8 = 0x4;
    /// An access size was invalid for the selected module (e.g. a non-32-bit
    /// access to the CPU0 SPR module, testable property 9), or the command
    /// ran without a preceding `WRITE_COMMAND`.
    pub const OVER_UNDERRUN: u8 = 0x8;
}

/// Control bits carried by `WRITE_CONTROL`/`READ_CONTROL` (§4.9).
mod control_bit {
    pub const RESET: u32 = 51;
    pub const STALL: u32 = 50;
}

/// The JTAG Test Access Port. Owns only TAP-local state; CPU and bus access
/// are passed in explicitly by [`crate::sim::simulator::Simulator`] so this
/// type has no back-pointer into the rest of the simulator (§9).
#[derive(Debug, Default)]
pub struct Jtag {
    instr: JtagInstr,
    mod_id: ModuleId,
    write_cmd_defined: bool,
    acc_type: JtagAccess,
    addr: u32,
    /// Number of `acc_type`-width units in the pending burst.
    size: u32,
    cpu_reset: bool,
    cpu_stall: bool,
}

impl Jtag {
    /// Builds a fresh TAP with no instruction loaded and no module selected.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets TAP-local state (but not CPU reset/stall, which persist across
    /// a TAP reset the way or1ksim's `jtag_reset` leaves them).
    pub fn reset(&mut self) {
        self.instr = JtagInstr::Undefined;
        self.mod_id = ModuleId::Undefined;
        self.write_cmd_defined = false;
        self.acc_type = JtagAccess::Undefined;
        self.addr = 0;
        self.size = 0;
    }

    /// Whether the selected CPU is currently held in debug stall (§5's
    /// "CPU is stalled (debug)" suspension point, checked at the top of the
    /// executor's per-cycle loop).
    #[must_use]
    pub fn cpu_stalled(&self) -> bool {
        self.cpu_stall
    }

    /// Whether the selected CPU is currently held in debug reset.
    #[must_use]
    pub fn cpu_in_reset(&self) -> bool {
        self.cpu_reset
    }

    /// Loads a JTAG instruction. `reg` holds at least `nbits` bits, MS-bit
    /// first; this architecture's IR is 4 bits wide.
    pub fn shift_ir(&mut self, reg: &[u8], nbits: usize) {
        let mut r = BitReader::new(reg, nbits);
        let value = r.read_bits(nbits.min(4) as u32);
        self.instr = JtagInstr::from_bits(value);
        if self.instr == JtagInstr::Undefined {
            tracing::debug!(value, "jtag: non-architectural IR value loaded");
        }
    }

    /// Loads or drains a data register. Only meaningful while `DEBUG` is the
    /// loaded instruction (§4.9); otherwise the shift is accepted and
    /// logged, with no state change and a zeroed response.
    pub fn shift_dr(&mut self, reg: &mut [u8], nbits: usize, cpu: &mut Cpu, bus: &mut AddressSpace) {
        if self.instr != JtagInstr::Debug {
            tracing::trace!(instr = ?self.instr, "jtag: DR shift ignored outside DEBUG instruction");
            reg.fill(0);
            return;
        }

        let mut r = BitReader::new(reg, nbits);
        let mut running_crc = crc::INIT;

        let select_module = r.read_bit();
        running_crc = crc::update(running_crc, u64::from(select_module), 1);

        if select_module {
            let mod_bits = r.read_bits(4);
            running_crc = crc::update(running_crc, mod_bits, 4);
            let crc_in = r.read_bits(32);
            let status = if u64::from(running_crc) != crc_in {
                status::CRC_IN_ERROR
            } else {
                self.mod_id = ModuleId::from_bits(mod_bits);
                if self.mod_id == ModuleId::Undefined {
                    status::MODULE_MISSING
                } else {
                    status::OK
                }
            };
            respond(reg, &[], status);
            return;
        }

        let cmd_bits = r.read_bits(3);
        running_crc = crc::update(running_crc, cmd_bits, 3);
        let command = Command::from_bits(cmd_bits);

        match command {
            Command::WriteCommand => {
                let acc_bits = r.read_bits(4);
                let addr = r.read_bits(32);
                let len_minus1 = r.read_bits(16);
                running_crc = crc::update(running_crc, acc_bits, 4);
                running_crc = crc::update(running_crc, addr, 32);
                running_crc = crc::update(running_crc, len_minus1, 16);
                let crc_in = r.read_bits(32);

                if u64::from(running_crc) != crc_in {
                    respond(reg, &[], status::CRC_IN_ERROR);
                    return;
                }
                let acc_type = JtagAccess::from_bits(acc_bits);
                let mut status = status::OK;
                if acc_type == JtagAccess::Undefined {
                    status |= status::OVER_UNDERRUN;
                } else if self.mod_id == ModuleId::Cpu0 && acc_type.width() != Some(4) {
                    // Testable property 9: CPU0 (SPR) access is 32-bit only.
                    status |= status::OVER_UNDERRUN;
                }
                if status == status::OK {
                    self.acc_type = acc_type;
                    self.addr = addr as u32;
                    self.size = len_minus1 as u32 + 1;
                    self.write_cmd_defined = true;
                }
                respond(reg, &[], status);
            }

            Command::ReadCommand => {
                let crc_in = r.read_bits(32);
                if u64::from(running_crc) != crc_in {
                    respond(reg, &[], status::CRC_IN_ERROR);
                    return;
                }
                let acc_bits = u64::from(self.acc_type);
                let len_minus1 = u64::from(self.size.saturating_sub(1));
                respond(
                    reg,
                    &[(acc_bits, 4), (u64::from(self.addr), 32), (len_minus1, 16)],
                    status::OK,
                );
            }

            Command::GoCommand => {
                if !self.write_cmd_defined {
                    // Still need to consume the trailing CRC field to keep
                    // framing consistent, even though there is nothing to do.
                    let _ = r.read_bits(32);
                    respond(reg, &[], status::OVER_UNDERRUN);
                    return;
                }
                if self.acc_type.is_read() {
                    let crc_in = r.read_bits(32);
                    if u64::from(running_crc) != crc_in {
                        respond(reg, &[], status::CRC_IN_ERROR);
                        return;
                    }
                    match self.perform_read(cpu, bus) {
                        Ok(value) => {
                            let width_bits = self.acc_type.width().unwrap_or(4) * 8;
                            respond(reg, &[(u64::from(value), width_bits)], status::OK);
                        }
                        Err(status) => respond(reg, &[], status),
                    }
                } else {
                    let width_bits = self.acc_type.width().unwrap_or(4) * 8;
                    let payload = r.read_bits(width_bits);
                    running_crc = crc::update(running_crc, payload, width_bits);
                    let crc_in = r.read_bits(32);
                    if u64::from(running_crc) != crc_in {
                        respond(reg, &[], status::CRC_IN_ERROR);
                        return;
                    }
                    match self.perform_write(cpu, bus, payload as u32) {
                        Ok(()) => respond(reg, &[], status::OK),
                        Err(status) => respond(reg, &[], status),
                    }
                }
            }

            Command::WriteControl => {
                let payload = r.read_bits(52);
                running_crc = crc::update(running_crc, payload, 52);
                let crc_in = r.read_bits(32);
                if u64::from(running_crc) != crc_in {
                    respond(reg, &[], status::CRC_IN_ERROR);
                    return;
                }
                if self.mod_id == ModuleId::Cpu1 {
                    respond(reg, &[], status::MODULE_MISSING);
                    return;
                }
                self.cpu_reset = (payload >> control_bit::RESET) & 1 == 1;
                self.cpu_stall = (payload >> control_bit::STALL) & 1 == 1;
                respond(reg, &[], status::OK);
            }

            Command::ReadControl => {
                let crc_in = r.read_bits(32);
                if u64::from(running_crc) != crc_in {
                    respond(reg, &[], status::CRC_IN_ERROR);
                    return;
                }
                if self.mod_id == ModuleId::Cpu1 {
                    respond(reg, &[], status::MODULE_MISSING);
                    return;
                }
                let mut payload = 0u64;
                if self.cpu_reset {
                    payload |= 1 << control_bit::RESET;
                }
                if self.cpu_stall {
                    payload |= 1 << control_bit::STALL;
                }
                respond(reg, &[(payload, 52)], status::OK);
            }

            Command::Undefined => {
                respond(reg, &[], status::OVER_UNDERRUN);
            }
        }
    }

    fn perform_read(&self, cpu: &mut Cpu, bus: &mut AddressSpace) -> Result<u32, u8> {
        match self.mod_id {
            ModuleId::Cpu0 => Ok(cpu.sprs.read((self.addr % MAX_SPRS as u32) as u16)),
            ModuleId::Cpu1 | ModuleId::Undefined => Err(status::MODULE_MISSING),
            ModuleId::Wishbone => {
                let width = self.acc_type.width().ok_or(status::WISHBONE_ERROR)?;
                if self.addr % width != 0 {
                    return Err(status::WISHBONE_ERROR);
                }
                match width {
                    1 => bus.read8(self.addr).map(u32::from),
                    2 => bus.read16(self.addr).map(u32::from),
                    _ => bus.read32(self.addr),
                }
                .map_err(|_| status::WISHBONE_ERROR)
            }
        }
    }

    fn perform_write(&mut self, cpu: &mut Cpu, bus: &mut AddressSpace, value: u32) -> Result<(), u8> {
        match self.mod_id {
            ModuleId::Cpu0 => {
                let addr = (self.addr % MAX_SPRS as u32) as u16;
                if self.addr >= MAX_SPRS as u32 {
                    tracing::warn!(addr = self.addr, "jtag: SPR address truncated modulo MAX_SPRS");
                }
                let effect = cpu.sprs.write(addr, value);
                cpu.apply_spr_effect(effect);
                Ok(())
            }
            ModuleId::Cpu1 | ModuleId::Undefined => Err(status::MODULE_MISSING),
            ModuleId::Wishbone => {
                let width = self.acc_type.width().ok_or(status::WISHBONE_ERROR)?;
                if self.addr % width != 0 {
                    return Err(status::WISHBONE_ERROR);
                }
                let result = match width {
                    1 => bus.write8(self.addr, value as u8),
                    2 => bus.write16(self.addr, value as u16),
                    _ => bus.write32(self.addr, value),
                };
                result.map_err(|_| status::WISHBONE_ERROR)
            }
        }
    }
}

/// Writes a DEBUG response: `payload` fields (each `(value, nbits)`), a
/// 4-bit status, then a 32-bit CRC computed over payload and status.
fn respond(reg: &mut [u8], payload: &[(u64, u32)], status: u8) {
    let mut w = BitWriter::new(reg);
    let mut crc = crc::INIT;
    for &(value, nbits) in payload {
        w.write_bits(value, nbits);
        crc = crc::update(crc, value, nbits);
    }
    w.write_bits(u64::from(status), 4);
    crc = crc::update(crc, u64::from(status), 4);
    w.write_bits(u64::from(crc), 32);
}

/// A trivial use of [`MemAccess`] to keep the import grounded: the address
/// space's width-typed operations are themselves classified by access kind
/// even though the TAP only ever issues plain reads/writes, never fetches.
const _: fn() -> MemAccess = || MemAccess::Read;

struct BitReader<'a> {
    buf: &'a [u8],
    pos: usize,
    max: usize,
}

impl<'a> BitReader<'a> {
    fn new(buf: &'a [u8], nbits: usize) -> Self {
        Self { buf, pos: 0, max: nbits }
    }

    fn read_bit(&mut self) -> bool {
        if self.pos >= self.max {
            return false;
        }
        let byte = self.buf.get(self.pos / 8).copied().unwrap_or(0);
        let bit_idx = 7 - (self.pos % 8);
        self.pos += 1;
        (byte >> bit_idx) & 1 == 1
    }

    fn read_bits(&mut self, n: u32) -> u64 {
        let mut v = 0u64;
        for _ in 0..n {
            v = (v << 1) | u64::from(self.read_bit());
        }
        v
    }
}

struct BitWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> BitWriter<'a> {
    fn new(buf: &'a mut [u8]) -> Self {
        buf.fill(0);
        Self { buf, pos: 0 }
    }

    fn write_bit(&mut self, bit: bool) {
        if let Some(byte) = self.buf.get_mut(self.pos / 8) {
            let bit_idx = 7 - (self.pos % 8);
            if bit {
                *byte |= 1 << bit_idx;
            }
        }
        self.pos += 1;
    }

    fn write_bits(&mut self, value: u64, n: u32) {
        for i in (0..n).rev() {
            self.write_bit((value >> i) & 1 == 1);
        }
    }
}
