//! Flags - per-instruction library flags and per-slot memory flags
//!
//! ## Library flags (8 bits, per instruction-set entry)
//! ```text
//! [NOP:1][LABEL:1][NULL:1][DEFAULT:1][READS_LABEL:1][DIVIDE:1][RESERVED:2]
//! ```
//!
//! ## Memory flags (per genome slot)
//! Five independent booleans set only by the engine: copied, mutated,
//! point-mutated, copy-mutated, executed.

use serde::{Deserialize, Serialize};

/// Library flags attached to an instruction entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct InstFlags(pub u8);

impl InstFlags {
    /// Instruction is a no-op that can serve as a modifier
    pub const NOP: u8 = 0b0000_0001;
    /// Instruction marks the start of a label
    pub const LABEL: u8 = 0b0000_0010;
    /// Designated null instruction (unknown opcodes dispatch here)
    pub const NULL: u8 = 0b0000_0100;
    /// Designated default instruction (fills fresh memory)
    pub const DEFAULT: u8 = 0b0000_1000;
    /// Instruction consumes the no-ops that follow it as a label operand
    pub const READS_LABEL: u8 = 0b0001_0000;
    /// Instruction can trigger the division pipeline
    pub const DIVIDE: u8 = 0b0010_0000;

    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn nop(self) -> bool {
        (self.0 & Self::NOP) != 0
    }

    pub fn label(self) -> bool {
        (self.0 & Self::LABEL) != 0
    }

    pub fn null(self) -> bool {
        (self.0 & Self::NULL) != 0
    }

    pub fn default_inst(self) -> bool {
        (self.0 & Self::DEFAULT) != 0
    }

    pub fn reads_label(self) -> bool {
        (self.0 & Self::READS_LABEL) != 0
    }

    pub fn divide(self) -> bool {
        (self.0 & Self::DIVIDE) != 0
    }

    pub const fn with_nop(mut self) -> Self {
        self.0 |= Self::NOP;
        self
    }

    pub const fn with_label(mut self) -> Self {
        self.0 |= Self::LABEL;
        self
    }

    pub const fn with_null(mut self) -> Self {
        self.0 |= Self::NULL;
        self
    }

    pub const fn with_default(mut self) -> Self {
        self.0 |= Self::DEFAULT;
        self
    }

    pub const fn with_reads_label(mut self) -> Self {
        self.0 |= Self::READS_LABEL;
        self
    }

    pub const fn with_divide(mut self) -> Self {
        self.0 |= Self::DIVIDE;
        self
    }
}

/// Which memory flag to touch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MemFlag {
    Copied,
    Mutated,
    PointMutated,
    CopyMutated,
    Executed,
}

impl MemFlag {
    pub const ALL: [MemFlag; 5] = [
        MemFlag::Copied,
        MemFlag::Mutated,
        MemFlag::PointMutated,
        MemFlag::CopyMutated,
        MemFlag::Executed,
    ];
}

/// Per-slot flags of instruction memory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub struct MemoryFlags {
    pub copied: bool,
    pub mutated: bool,
    pub point_mutated: bool,
    pub copy_mutated: bool,
    pub executed: bool,
}

impl MemoryFlags {
    pub fn get(&self, flag: MemFlag) -> bool {
        match flag {
            MemFlag::Copied => self.copied,
            MemFlag::Mutated => self.mutated,
            MemFlag::PointMutated => self.point_mutated,
            MemFlag::CopyMutated => self.copy_mutated,
            MemFlag::Executed => self.executed,
        }
    }

    pub fn set(&mut self, flag: MemFlag, value: bool) {
        match flag {
            MemFlag::Copied => self.copied = value,
            MemFlag::Mutated => self.mutated = value,
            MemFlag::PointMutated => self.point_mutated = value,
            MemFlag::CopyMutated => self.copy_mutated = value,
            MemFlag::Executed => self.executed = value,
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn any(&self) -> bool {
        self.copied || self.mutated || self.point_mutated || self.copy_mutated || self.executed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inst_flags_builders() {
        let flags = InstFlags::empty().with_nop().with_default();
        assert!(flags.nop());
        assert!(flags.default_inst());
        assert!(!flags.label());
        assert!(!flags.null());
        assert!(!InstFlags::empty().with_divide().reads_label());
    }

    #[test]
    fn test_memory_flags_independent() {
        let mut flags = MemoryFlags::default();
        assert!(!flags.any());
        for flag in MemFlag::ALL {
            flags.set(flag, true);
            assert!(flags.get(flag));
            for other in MemFlag::ALL.iter().filter(|f| **f != flag) {
                assert!(!flags.get(*other), "{:?} leaked into {:?}", flag, other);
            }
            flags.set(flag, false);
        }
        flags.set(MemFlag::Executed, true);
        flags.clear();
        assert!(!flags.any());
    }
}
