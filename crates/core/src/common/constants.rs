//! Global system constants.
//!
//! 1. **SPR space:** the size of the 16-bit-addressed special-purpose
//!    register file.
//! 2. **Memory constants:** default page/line sizes.
//! 3. **Simulation constants:** the scheduler's zero-delay cascade cap.

/// Size of the 16-bit-addressed SPR file (one entry per possible SPR number).
pub const MAX_SPRS: usize = 1 << 16;

/// Default page size in bytes (8 KiB), used when a config omits `pagesize`.
pub const DEFAULT_PAGE_SIZE: u32 = 8192;

/// Number of bits to shift to convert between bytes and the default page size.
pub const PAGE_SHIFT: u32 = 13;

/// Default cache line size in bytes, used when a config omits `blocksize`.
pub const DEFAULT_LINE_SIZE: u32 = 16;

/// Maximum number of zero-delay scheduler cascades permitted within a single
/// tick before `do_scheduler` reports a hard error (§4.4).
pub const MAX_ZERO_DELAY_CASCADE: u32 = 256;

/// Base address of the exception vector table; `exception_base + vector_offset`
/// is where the executor jumps to on exception entry (§4.8).
pub const EXCEPTION_BASE: u32 = 0x100;

/// Link register used by `jal`/`jalr` to store the return address.
pub const LINK_REGISTER: usize = 9;
