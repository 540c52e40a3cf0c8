//! General-purpose register file.
//!
//! Thirty-two 32-bit registers. Register 0 is hardwired to zero: reads
//! always return zero and writes are silently discarded (§3, testable
//! property 1).

/// The flat general-purpose register file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegisterFile {
    gpr: [u32; 32],
}

impl RegisterFile {
    /// Creates a new register file with every register initialised to zero.
    pub fn new() -> Self {
        Self { gpr: [0; 32] }
    }

    /// Reads a general-purpose register. Register 0 always reads as zero.
    #[inline]
    pub fn read(&self, idx: usize) -> u32 {
        if idx == 0 { 0 } else { self.gpr[idx] }
    }

    /// Writes a general-purpose register. Writes to register 0 are discarded.
    #[inline]
    pub fn write(&mut self, idx: usize, val: u32) {
        if idx != 0 {
            self.gpr[idx] = val;
        }
    }

    /// Dumps all register contents to stderr, for debugging.
    pub fn dump(&self) {
        for (i, v) in self.gpr.iter().enumerate() {
            eprintln!("r{i:<2} = {v:#010x}");
        }
    }
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn register_zero_is_hardwired() {
        let mut regs = RegisterFile::new();
        regs.write(0, 0xdead_beef);
        assert_eq!(regs.read(0), 0);
    }

    #[test]
    fn other_registers_round_trip() {
        let mut regs = RegisterFile::new();
        regs.write(5, 42);
        assert_eq!(regs.read(5), 42);
    }

    #[test]
    fn two_register_files_built_the_same_way_are_equal() {
        use pretty_assertions::assert_eq;

        let mut a = RegisterFile::new();
        let mut b = RegisterFile::new();
        for (idx, val) in [(1, 10), (5, 50), (31, 0xdead_beef)] {
            a.write(idx, val);
            b.write(idx, val);
        }
        assert_eq!(a, b);
    }

    proptest::proptest! {
        /// For every write sequence, `gpr[0]` still reads zero.
        #[test]
        fn register_zero_stays_zero_under_any_write_sequence(
            writes in proptest::collection::vec((0usize..32, proptest::prelude::any::<u32>()), 0..64)
        ) {
            let mut regs = RegisterFile::new();
            for (idx, val) in writes {
                regs.write(idx, val);
            }
            prop_assert_eq!(regs.read(0), 0);
        }
    }
}
