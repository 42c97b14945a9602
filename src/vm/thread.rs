//! Thread - one cooperative execution context inside an organism
//!
//! A thread owns its registers, its four heads, a local stack and the state
//! of the two label readers:
//!
//! - `next_label`: the operand captured after a `label` instruction. While
//!   `capturing_label` is set, dispatch stores no-ops here instead of running
//!   them.
//! - `read_seq`: the run of nops most recently passed over by `h-copy` or
//!   `h-read`, used by `if-label` to detect the end of a copy loop.
//! - `read_label`: the nops read right after a `label` instruction. Reading
//!   anything else ends it.

use super::head::{Head, HeadRole};
use super::label::Label;
use super::register::{DataValue, Register, NUM_REGISTERS};
use super::stack::{Stack, StackSelect};
use std::fmt;

/// Number of heads per thread
pub const NUM_HEADS: usize = 4;

/// Comparison a waiting thread applies to its watched register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WaitComparison {
    Equal,
    Less,
    Greater,
}

impl WaitComparison {
    /// Does `actual` satisfy the comparison against `operand`?
    pub fn holds(self, actual: i32, operand: i32) -> bool {
        match self {
            Self::Equal => actual == operand,
            Self::Less => actual < operand,
            Self::Greater => actual > operand,
        }
    }
}

impl fmt::Display for WaitComparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Equal => "==",
            Self::Less => "<",
            Self::Greater => ">",
        };
        write!(f, "{}", s)
    }
}

/// A blocked thread's wake-up condition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitCondition {
    /// Register watched in other threads
    pub reg: Register,
    pub cmp: WaitComparison,
    pub operand: i32,
    /// Register of the waiting thread that receives the satisfying value
    pub dst: Register,
}

impl WaitCondition {
    pub fn is_met_by(&self, reg: Register, value: i32) -> bool {
        self.reg == reg && self.cmp.holds(value, self.operand)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThreadState {
    #[default]
    Active,
    Waiting(WaitCondition),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thread {
    id: usize,
    pub regs: [DataValue; NUM_REGISTERS],
    pub heads: [Head; NUM_HEADS],
    pub stack: Stack,
    pub cur_stack: StackSelect,
    pub capturing_label: bool,
    pub next_label: Label,
    pub read_seq: Label,
    pub read_label: Label,
    pub reading_label: bool,
    pub state: ThreadState,
}

impl Thread {
    pub fn new(id: usize, stack_size: usize, max_label_size: usize) -> Self {
        Self {
            id,
            regs: [DataValue::default(); NUM_REGISTERS],
            heads: [Head::new(id); NUM_HEADS],
            stack: Stack::new(stack_size),
            cur_stack: StackSelect::Local,
            capturing_label: false,
            next_label: Label::new(max_label_size),
            read_seq: Label::new(max_label_size),
            read_label: Label::new(max_label_size),
            reading_label: false,
            state: ThreadState::Active,
        }
    }

    /// Full copy of `self` under a new id
    pub fn fork(&self, id: usize) -> Self {
        let mut t = self.clone();
        t.set_id(id);
        t
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn set_id(&mut self, id: usize) {
        self.id = id;
        for head in &mut self.heads {
            head.set_thread(id);
        }
    }

    pub fn head(&self, role: HeadRole) -> &Head {
        &self.heads[role.index()]
    }

    pub fn head_mut(&mut self, role: HeadRole) -> &mut Head {
        &mut self.heads[role.index()]
    }

    pub fn ip(&self) -> &Head {
        self.head(HeadRole::Ip)
    }

    pub fn ip_mut(&mut self) -> &mut Head {
        self.head_mut(HeadRole::Ip)
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, ThreadState::Active)
    }

    pub fn wait_condition(&self) -> Option<&WaitCondition> {
        match &self.state {
            ThreadState::Waiting(cond) => Some(cond),
            ThreadState::Active => None,
        }
    }

    /// Real register value; virtual ids read as zero here
    pub fn reg(&self, reg: Register) -> DataValue {
        self.regs.get(reg.index()).copied().unwrap_or_default()
    }

    /// Store into a real register; virtual ids are ignored
    pub fn store(&mut self, reg: Register, value: DataValue) {
        if let Some(slot) = self.regs.get_mut(reg.index()) {
            *slot = value;
        }
    }

    /// Feed one instruction passed by the read head to both read trackers.
    /// `nop` is its modifier value, if it is a nop.
    pub fn note_read(&mut self, nop: Option<u8>, is_label: bool) {
        match nop {
            Some(n) => {
                self.read_seq.push(n);
                if self.reading_label {
                    self.read_label.push(n);
                }
            }
            None => {
                self.read_seq.clear();
                self.read_label.clear();
                self.reading_label = is_label;
            }
        }
    }

    /// Positions of all heads, for revalidation after memory edits
    pub fn heads_mut(&mut self) -> impl Iterator<Item = &mut Head> {
        self.heads.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vm::register::ValueSource;

    #[test]
    fn test_new_thread_defaults() {
        let t = Thread::new(3, 10, 10);
        assert_eq!(t.id(), 3);
        assert!(t.is_active());
        assert!(!t.reading_label);
        assert_eq!(t.cur_stack, StackSelect::Local);
        assert!(t.heads.iter().all(|h| h.thread() == 3 && h.position() == 0));
        assert_eq!(t.stack.capacity(), 10);
    }

    #[test]
    fn test_fork_copies_everything_but_id() {
        let mut t = Thread::new(0, 10, 10);
        t.store(Register::CX, DataValue::new(42, 7, ValueSource::Environment));
        t.head_mut(HeadRole::Flow).set(5, 20);
        t.stack.push(DataValue::new(1, 1, ValueSource::Internal));
        let f = t.fork(1);
        assert_eq!(f.id(), 1);
        assert_eq!(f.reg(Register::CX), t.reg(Register::CX));
        assert_eq!(f.head(HeadRole::Flow).position(), 5);
        assert_eq!(f.head(HeadRole::Flow).thread(), 1);
        assert_eq!(f.stack, t.stack);
    }

    #[test]
    fn test_virtual_store_ignored() {
        let mut t = Thread::new(0, 4, 4);
        t.store(Register(9), DataValue::new(5, 0, ValueSource::Internal));
        assert!(t.regs.iter().all(|r| r.value == 0));
        assert_eq!(t.reg(Register(9)).value, 0);
    }

    #[test]
    fn test_read_trackers() {
        let mut t = Thread::new(0, 4, 4);
        t.note_read(Some(1), false);
        t.note_read(None, true);
        t.note_read(Some(0), false);
        t.note_read(Some(2), false);
        assert_eq!(t.read_seq.nops(), &[0, 2]);
        assert_eq!(t.read_label.nops(), &[0, 2]);

        // A plain instruction ends the label and does not start another
        t.note_read(None, false);
        t.note_read(Some(1), false);
        assert_eq!(t.read_seq.nops(), &[1]);
        assert!(t.read_label.is_empty());
        assert!(!t.reading_label);
    }

    #[test]
    fn test_wait_condition() {
        let cond = WaitCondition {
            reg: Register::BX,
            cmp: WaitComparison::Equal,
            operand: 5,
            dst: Register::CX,
        };
        assert!(cond.is_met_by(Register::BX, 5));
        assert!(!cond.is_met_by(Register::BX, 4));
        assert!(!cond.is_met_by(Register::AX, 5));
        assert!(WaitComparison::Less.holds(3, 5));
        assert!(WaitComparison::Greater.holds(6, 5));
        assert!(!WaitComparison::Greater.holds(5, 5));
    }
}
