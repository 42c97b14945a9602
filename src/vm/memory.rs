//! Instruction memory - genome storage with per-slot flags
//!
//! `insts` and `flags` always have the same length. Edits that shift contents
//! (insert/remove) move the flags with their instructions. Memory knows nothing
//! about heads; the engine revalidates heads after every shifting edit.

use super::flags::{MemFlag, MemoryFlags};
use super::instruction::Instruction;
use serde::{Deserialize, Serialize};

/// Genome storage plus one [`MemoryFlags`] per slot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstMemory {
    insts: Vec<Instruction>,
    flags: Vec<MemoryFlags>,
}

impl InstMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh memory holding `insts` with all flags cleared
    pub fn from_insts(insts: Vec<Instruction>) -> Self {
        let flags = vec![MemoryFlags::default(); insts.len()];
        Self { insts, flags }
    }

    pub fn len(&self) -> usize {
        self.insts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.insts.is_empty()
    }

    pub fn insts(&self) -> &[Instruction] {
        &self.insts
    }

    /// Read without touching flags. Out-of-range reads yield the error sentinel.
    pub fn get(&self, pos: usize) -> Instruction {
        self.insts.get(pos).copied().unwrap_or(Instruction::ERROR)
    }

    /// Overwrite the instruction at `pos`; out-of-range writes are dropped.
    pub fn set(&mut self, pos: usize, inst: Instruction) {
        if let Some(slot) = self.insts.get_mut(pos) {
            *slot = inst;
        }
    }

    /// Insert before `pos` (clamped to the end), shifting later slots right
    pub fn insert(&mut self, pos: usize, inst: Instruction) {
        let pos = pos.min(self.insts.len());
        self.insts.insert(pos, inst);
        self.flags.insert(pos, MemoryFlags::default());
    }

    /// Remove the slot at `pos`, shifting later slots left
    pub fn remove(&mut self, pos: usize) -> Option<Instruction> {
        if pos >= self.insts.len() {
            return None;
        }
        self.flags.remove(pos);
        Some(self.insts.remove(pos))
    }

    /// Grow or shrink to `len`, filling new slots with `fill`
    pub fn resize(&mut self, len: usize, fill: Instruction) {
        self.insts.resize(len, fill);
        self.flags.resize(len, MemoryFlags::default());
    }

    /// Append one instruction with cleared flags
    pub fn push(&mut self, inst: Instruction) {
        self.insts.push(inst);
        self.flags.push(MemoryFlags::default());
    }

    pub fn truncate(&mut self, len: usize) {
        self.insts.truncate(len);
        self.flags.truncate(len);
    }

    /// Keep only `[start, end)`
    pub fn crop(&mut self, start: usize, end: usize) {
        let end = end.min(self.insts.len());
        let start = start.min(end);
        self.insts.truncate(end);
        self.flags.truncate(end);
        self.insts.drain(..start);
        self.flags.drain(..start);
    }

    /// Split off `[at, len)` into a new memory, keeping `[0, at)`
    pub fn split_off(&mut self, at: usize) -> InstMemory {
        let at = at.min(self.insts.len());
        InstMemory {
            insts: self.insts.split_off(at),
            flags: self.flags.split_off(at),
        }
    }

    pub fn flags(&self, pos: usize) -> MemoryFlags {
        self.flags.get(pos).copied().unwrap_or_default()
    }

    pub fn flag(&self, pos: usize, flag: MemFlag) -> bool {
        self.flags(pos).get(flag)
    }

    pub fn set_flag(&mut self, pos: usize, flag: MemFlag) {
        if let Some(f) = self.flags.get_mut(pos) {
            f.set(flag, true);
        }
    }

    pub fn clear_flag(&mut self, pos: usize, flag: MemFlag) {
        if let Some(f) = self.flags.get_mut(pos) {
            f.set(flag, false);
        }
    }

    /// Clear one flag kind over the whole memory
    pub fn clear_flag_all(&mut self, flag: MemFlag) {
        for f in &mut self.flags {
            f.set(flag, false);
        }
    }

    /// Clear every flag of every slot
    pub fn clear_all_flags(&mut self) {
        for f in &mut self.flags {
            f.clear();
        }
    }

    /// Number of slots in `[start, end)` with `flag` set
    pub fn count_flag(&self, flag: MemFlag, start: usize, end: usize) -> usize {
        let end = end.min(self.flags.len());
        let start = start.min(end);
        self.flags[start..end].iter().filter(|f| f.get(flag)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mem(ops: &[u8]) -> InstMemory {
        InstMemory::from_insts(ops.iter().map(|&op| Instruction(op)).collect())
    }

    #[test]
    fn test_read_has_no_side_effects() {
        let m = mem(&[1, 2, 3]);
        assert_eq!(m.get(1), Instruction(2));
        assert!(!m.flags(1).any());
        assert!(m.get(3).is_error());
    }

    #[test]
    fn test_insert_remove_shift_flags() {
        let mut m = mem(&[1, 2, 3]);
        m.set_flag(1, MemFlag::Executed);
        m.insert(0, Instruction(9));
        assert_eq!(m.insts(), &[Instruction(9), Instruction(1), Instruction(2), Instruction(3)]);
        assert!(m.flag(2, MemFlag::Executed));
        assert!(!m.flag(1, MemFlag::Executed));

        assert_eq!(m.remove(0), Some(Instruction(9)));
        assert!(m.flag(1, MemFlag::Executed));
        assert_eq!(m.remove(10), None);
        assert_eq!(m.len(), 3);
    }

    #[test]
    fn test_count_and_clear() {
        let mut m = mem(&[0; 6]);
        for pos in [0, 2, 4] {
            m.set_flag(pos, MemFlag::Copied);
        }
        assert_eq!(m.count_flag(MemFlag::Copied, 0, 6), 3);
        assert_eq!(m.count_flag(MemFlag::Copied, 1, 4), 1);
        assert_eq!(m.count_flag(MemFlag::Copied, 4, 100), 1);
        m.clear_flag(2, MemFlag::Copied);
        assert_eq!(m.count_flag(MemFlag::Copied, 0, 6), 2);
        m.clear_flag_all(MemFlag::Copied);
        assert_eq!(m.count_flag(MemFlag::Copied, 0, 6), 0);
    }

    #[test]
    fn test_split_and_crop() {
        let mut m = mem(&[0, 1, 2, 3, 4]);
        m.set_flag(3, MemFlag::Copied);
        let child = m.split_off(3);
        assert_eq!(m.len(), 3);
        assert_eq!(child.insts(), &[Instruction(3), Instruction(4)]);
        assert!(child.flag(0, MemFlag::Copied));

        let mut m = mem(&[0, 1, 2, 3, 4]);
        m.crop(1, 3);
        assert_eq!(m.insts(), &[Instruction(1), Instruction(2)]);
    }

    #[test]
    fn test_resize_fills() {
        let mut m = mem(&[7]);
        m.resize(3, Instruction(0));
        assert_eq!(m.insts(), &[Instruction(7), Instruction(0), Instruction(0)]);
        m.truncate(1);
        assert_eq!(m.len(), 1);
    }

    #[test]
    fn test_serde_keeps_flags() {
        let mut m = mem(&[3, 0, 9]);
        m.set_flag(2, MemFlag::Copied);
        let json = serde_json::to_string(&m).unwrap();
        assert!(json.contains("[3,0,9]"));
        let back: InstMemory = serde_json::from_str(&json).unwrap();
        assert_eq!(back, m);
        assert!(back.flag(2, MemFlag::Copied));
    }
}
