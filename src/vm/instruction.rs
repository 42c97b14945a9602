//! Instruction - one genome slot
//!
//! An instruction is nothing more than an opcode into the active instruction
//! set. Everything else (handler, class, nop modifier) is looked up through
//! the [`InstSet`](super::InstSet) at dispatch time, so two instructions are
//! equal exactly when their opcodes are.
//!
//! ## Symbols
//!
//! ```text
//! opcode  0-25  -> 'a'-'z'
//! opcode 26-51  -> 'A'-'Z'
//! opcode 52-61  -> '0'-'9'
//! opcode 255    -> '_'   (error sentinel)
//! ```

use crate::error::{HardwareError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single genome instruction (opcode only)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Instruction(pub u8);

impl Instruction {
    /// Sentinel returned when reading past the end of memory
    pub const ERROR: Self = Self(255);

    /// Highest opcode that has a printable symbol
    pub const MAX_SYMBOL_OP: u8 = 61;

    pub const fn new(op: u8) -> Self {
        Self(op)
    }

    /// Raw opcode
    pub const fn op(&self) -> u8 {
        self.0
    }

    pub const fn is_error(&self) -> bool {
        self.0 == Self::ERROR.0
    }

    /// Compact symbol used by the genome string form
    pub fn symbol(&self) -> char {
        match self.0 {
            op @ 0..=25 => (b'a' + op) as char,
            op @ 26..=51 => (b'A' + op - 26) as char,
            op @ 52..=61 => (b'0' + op - 52) as char,
            255 => '_',
            _ => '?',
        }
    }

    /// Parse a symbol back into an instruction
    pub fn from_symbol(c: char) -> Result<Self> {
        let op = match c {
            'a'..='z' => c as u8 - b'a',
            'A'..='Z' => c as u8 - b'A' + 26,
            '0'..='9' => c as u8 - b'0' + 52,
            '_' => return Ok(Self::ERROR),
            _ => return Err(HardwareError::Symbol(c)),
        };
        Ok(Self(op))
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl From<u8> for Instruction {
    fn from(op: u8) -> Self {
        Self(op)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_ranges() {
        assert_eq!(Instruction(0).symbol(), 'a');
        assert_eq!(Instruction(25).symbol(), 'z');
        assert_eq!(Instruction(26).symbol(), 'A');
        assert_eq!(Instruction(51).symbol(), 'Z');
        assert_eq!(Instruction(52).symbol(), '0');
        assert_eq!(Instruction(61).symbol(), '9');
        assert_eq!(Instruction::ERROR.symbol(), '_');
        assert_eq!(Instruction(100).symbol(), '?');
    }

    #[test]
    fn test_from_symbol() {
        assert_eq!(Instruction::from_symbol('c').unwrap(), Instruction(2));
        assert_eq!(Instruction::from_symbol('B').unwrap(), Instruction(27));
        assert_eq!(Instruction::from_symbol('7').unwrap(), Instruction(59));
        assert!(Instruction::from_symbol('_').unwrap().is_error());
        assert!(matches!(
            Instruction::from_symbol('!'),
            Err(HardwareError::Symbol('!'))
        ));
    }

    #[test]
    fn test_equality_is_opcode() {
        assert_eq!(Instruction::new(4), Instruction::from(4u8));
        assert_ne!(Instruction::new(4), Instruction::new(5));
    }
}
