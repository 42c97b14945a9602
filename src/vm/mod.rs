//! Headcpu VM - per-organism virtual hardware
//!
//! Every organism runs on its own engine. The engine interprets the
//! organism's genome one instruction at a time, moving four heads over a
//! resizable instruction memory and splitting off offspring when the
//! genome asks for it.
//!
//! ## Memory and heads
//!
//! ```text
//! memory:  [ a  w  z  c  a  g  c  ...  v  f  c  a  x  g  a  b ]
//!            ^IP         ^read                  ^write    ^flow
//! ```
//!
//! Each slot carries five flags: copied, mutated, point-mutated,
//! copy-mutated, executed. Heads are normalized back into
//! `[0, len)` after every positional write.
//!
//! ## Registers
//!
//! ```text
//! Real     (0-7):  AX BX CX DX EX FX GX HX      stored per thread
//! Virtual  (8-12): random cycle sense cell threads   computed on read
//! ```
//!
//! Register values carry provenance: when they were made, the oldest value
//! they were derived from, and whether the environment or a sensor fed them.
//!
//! ## Example genome (`.org`)
//!
//! ```text
//! h-alloc     # child space
//! h-search    # flow head to the end label
//! nop-C
//! nop-A
//! mov-head    # write head to the child space
//! nop-C
//! h-search    # copy loop start
//! h-copy
//! if-label
//! nop-C
//! nop-A
//! h-divide
//! mov-head
//! nop-A
//! nop-B
//! ```

mod context;
pub mod dialects;
mod divide;
mod flags;
mod hardware;
mod head;
mod inst_set;
mod instruction;
mod interpreter;
mod label;
mod library;
mod memory;
pub mod mutation;
mod register;
mod stack;
mod stats;
mod thread;

pub use context::{
    BirthCollector, BirthInfo, BirthMediator, BufferEnvironment, CollectFeedback, Context,
    Environment, Feedback, LogFeedback, NullEnvironment, Offspring, OrganismInfo,
};
pub use divide::{split_regions, DivideFailure, DivideRegions, SplitInput, ViabilityLimits};
pub use flags::{InstFlags, MemFlag, MemoryFlags};
pub use hardware::Hardware;
pub use head::{Head, HeadRole};
pub use inst_set::{InstSet, InstSetEntry, MAX_INST_SET_SIZE};
pub use instruction::Instruction;
pub use interpreter::HeadsCpu;
pub use label::Label;
pub use library::{InstClass, InstEntry, InstLib, InstMethod};
pub use memory::InstMemory;
pub use register::{
    DataValue, Register, ValueSource, VirtualRegister, NUM_REGISTERS, NUM_VIRTUAL_REGISTERS,
};
pub use stack::{Stack, StackSelect};
pub use stats::HardwareStats;
pub use thread::{Thread, ThreadState, WaitComparison, WaitCondition, NUM_HEADS};
