//! Error types for headcpu
//!
//! Only configuration-time problems are errors. Everything an organism can do
//! to itself at run time (bad opcodes, unmatched labels, runaway heads, failed
//! divides) is recovered inside the engine and never reaches this type.

use thiserror::Error;

/// headcpu error type
#[derive(Debug, Error)]
pub enum HardwareError {
    /// Malformed instruction-set definition
    #[error("Instruction set error: {0}")]
    InstSet(String),

    /// Instruction name not present in the library
    #[error("Unknown instruction '{name}' (line {line})")]
    UnknownInstruction { name: String, line: usize },

    /// Instruction library registration failure
    #[error("Library error: {0}")]
    Library(#[from] LibraryError),

    /// Genome length outside the configured bounds
    #[error("Genome length {len} outside [{min}, {max}]")]
    GenomeLength { len: usize, min: usize, max: usize },

    /// Symbol that does not map onto any opcode
    #[error("Invalid genome symbol '{0}'")]
    Symbol(char),

    /// Inconsistent hardware configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Error produced while building an instruction library.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LibraryError {
    /// An instruction with this name is already registered.
    #[error("instruction '{0}' already registered")]
    DuplicateName(String),
    /// The named null or default instruction does not exist.
    #[error("designated instruction '{0}' not found in library")]
    MissingDesignated(String),
    /// No-op modifiers must address a real or virtual register.
    #[error("instruction '{name}' has out-of-range nop modifier {nop_mod}")]
    BadNopMod { name: String, nop_mod: u8 },
}

pub type Result<T> = std::result::Result<T, HardwareError>;
