//! Head - position cursor over instruction memory
//!
//! Every positional write goes through [`Head::adjust`]:
//!
//! ```text
//! 0 <= pos < len      -> unchanged
//! len == 0 || pos < 0 -> 0
//! pos < 2 * len       -> pos - len
//! otherwise           -> pos % len
//! ```
//!
//! The one exception is [`Head::abs_jump`], which leaves normalization to the
//! caller.

use super::flags::MemFlag;
use super::instruction::Instruction;
use super::memory::InstMemory;
use std::fmt;

/// The four head roles every thread owns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum HeadRole {
    Ip = 0,
    Read = 1,
    Write = 2,
    Flow = 3,
}

impl HeadRole {
    pub const ALL: [HeadRole; 4] = [HeadRole::Ip, HeadRole::Read, HeadRole::Write, HeadRole::Flow];

    /// Role addressed by a nop modifier; out-of-range ids fall back to IP
    pub const fn from_id(id: usize) -> Self {
        match id {
            1 => Self::Read,
            2 => Self::Write,
            3 => Self::Flow,
            _ => Self::Ip,
        }
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Ip => "IP",
            Self::Read => "READ",
            Self::Write => "WRITE",
            Self::Flow => "FLOW",
        }
    }
}

impl fmt::Display for HeadRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A cursor owned by one thread. Equal when owner and position match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Head {
    thread: usize,
    pos: i32,
}

fn len_i32(len: usize) -> i32 {
    i32::try_from(len).unwrap_or(i32::MAX)
}

impl Head {
    pub const fn new(thread: usize) -> Self {
        Self { thread, pos: 0 }
    }

    pub const fn thread(&self) -> usize {
        self.thread
    }

    pub fn set_thread(&mut self, thread: usize) {
        self.thread = thread;
    }

    pub const fn position(&self) -> i32 {
        self.pos
    }

    /// Position as an index; only meaningful after `adjust`
    pub fn index(&self) -> usize {
        usize::try_from(self.pos).unwrap_or(0)
    }

    /// Normalize into `[0, len)`
    pub fn adjust(&mut self, len: usize) {
        let len = len_i32(len);
        if self.pos >= 0 && self.pos < len {
            return;
        }
        if len == 0 || self.pos < 0 {
            self.pos = 0;
        } else if self.pos < len.saturating_mul(2) {
            self.pos -= len;
        } else {
            self.pos %= len;
        }
    }

    /// Move to `pos` and normalize
    pub fn set(&mut self, pos: i32, len: usize) {
        self.pos = pos;
        self.adjust(len);
    }

    /// Copy another head's owner and position
    pub fn set_to(&mut self, other: &Head) {
        *self = *other;
    }

    /// Absolute jump: no normalization
    pub fn abs_jump(&mut self, offset: i32) {
        self.pos = self.pos.wrapping_add(offset);
    }

    /// Absolute set: no normalization
    pub fn abs_set(&mut self, pos: i32) {
        self.pos = pos;
    }

    /// Relative jump with normalization
    pub fn jump(&mut self, offset: i32, len: usize) {
        self.pos = self.pos.wrapping_add(offset);
        self.adjust(len);
    }

    pub fn advance(&mut self, len: usize) {
        self.jump(1, len);
    }

    pub fn retreat(&mut self, len: usize) {
        self.jump(-1, len);
    }

    pub fn at_end(&self, len: usize) -> bool {
        self.pos.wrapping_add(1) == len_i32(len)
    }

    pub fn inst(&self, mem: &InstMemory) -> Instruction {
        mem.get(self.index())
    }

    pub fn set_inst(&self, mem: &mut InstMemory, inst: Instruction) {
        mem.set(self.index(), inst);
    }

    /// Instruction after this one; the error sentinel at the last slot
    pub fn next_inst(&self, mem: &InstMemory) -> Instruction {
        if self.at_end(mem.len()) {
            return Instruction::ERROR;
        }
        mem.get(self.index() + 1)
    }

    /// Instruction before this one, wrapping to the last slot
    pub fn prev_inst(&self, mem: &InstMemory) -> Instruction {
        if mem.is_empty() {
            return Instruction::ERROR;
        }
        let pos = self.index();
        if pos == 0 {
            mem.get(mem.len() - 1)
        } else {
            mem.get(pos - 1)
        }
    }

    pub fn flag(&self, mem: &InstMemory, flag: MemFlag) -> bool {
        mem.flag(self.index(), flag)
    }

    pub fn set_flag(&self, mem: &mut InstMemory, flag: MemFlag) {
        mem.set_flag(self.index(), flag);
    }

    pub fn clear_flag(&self, mem: &mut InstMemory, flag: MemFlag) {
        mem.clear_flag(self.index(), flag);
    }
}

impl fmt::Display for Head {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}@{}", self.thread, self.pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_adjust_branches() {
        let mut h = Head::new(0);
        h.abs_set(4);
        h.adjust(10);
        assert_eq!(h.position(), 4);

        h.abs_set(-3);
        h.adjust(10);
        assert_eq!(h.position(), 0);

        h.abs_set(19);
        h.adjust(10);
        assert_eq!(h.position(), 9);

        h.abs_set(20);
        h.adjust(10);
        assert_eq!(h.position(), 0);

        h.abs_set(57);
        h.adjust(10);
        assert_eq!(h.position(), 7);

        h.abs_set(57);
        h.adjust(0);
        assert_eq!(h.position(), 0);
    }

    #[test]
    fn test_abs_jump_skips_adjust() {
        let mut h = Head::new(0);
        h.abs_jump(25);
        assert_eq!(h.position(), 25);
        h.jump(0, 10);
        assert_eq!(h.position(), 5);
    }

    #[test]
    fn test_next_and_prev_asymmetry() {
        let mem = InstMemory::from_insts(vec![Instruction(0), Instruction(1), Instruction(2)]);
        let mut h = Head::new(0);
        assert_eq!(h.next_inst(&mem), Instruction(1));
        assert_eq!(h.prev_inst(&mem), Instruction(2));
        h.set(2, mem.len());
        assert!(h.next_inst(&mem).is_error());
        assert_eq!(h.prev_inst(&mem), Instruction(1));
    }

    #[test]
    fn test_flags_delegate_to_memory() {
        let mut mem = InstMemory::from_insts(vec![Instruction(0); 4]);
        let mut h = Head::new(0);
        h.set(2, mem.len());
        h.set_flag(&mut mem, MemFlag::Copied);
        assert!(mem.flag(2, MemFlag::Copied));
        assert!(h.flag(&mem, MemFlag::Copied));
        h.clear_flag(&mut mem, MemFlag::Copied);
        assert!(!mem.flag(2, MemFlag::Copied));
    }

    #[test]
    fn test_equality_is_owner_and_position() {
        let mut a = Head::new(0);
        let mut b = Head::new(1);
        a.set(3, 10);
        b.set(3, 10);
        assert_ne!(a, b);
        b.set_thread(0);
        assert_eq!(a, b);
    }

    proptest! {
        #[test]
        fn prop_advance_wraps_to_modulo(len in 1usize..500, steps in 0usize..2000) {
            let mut h = Head::new(0);
            for _ in 0..steps {
                h.advance(len);
            }
            prop_assert_eq!(h.index(), steps % len);
        }

        #[test]
        fn prop_adjust_at_double_length(len in 1i32..10_000) {
            let mut h = Head::new(0);
            h.abs_set(2 * len - 1);
            h.adjust(len as usize);
            prop_assert_eq!(h.position(), (2 * len - 1) % len);

            h.abs_set(2 * len);
            h.adjust(len as usize);
            prop_assert_eq!(h.position(), 0);
        }

        #[test]
        fn prop_adjust_lands_in_range(pos in any::<i32>(), len in 1usize..100_000) {
            let mut h = Head::new(0);
            h.abs_set(pos);
            h.adjust(len);
            prop_assert!(h.position() >= 0 && (h.position() as usize) < len);
        }
    }
}
