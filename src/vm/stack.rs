//! Stack - fixed-capacity circular value stack
//!
//! ```text
//! push: sp = (sp - 1) mod cap; slot[sp] = v      (overwrites when full)
//! pop:  v = slot[sp]; slot[sp] = 0; sp = (sp + 1) mod cap
//! get(d): slot[(sp + d) mod cap]
//! ```
//!
//! There is no empty or full state. Every slot always holds a value; popping
//! an untouched slot yields zero with empty provenance.

use super::register::DataValue;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stack {
    slots: Vec<DataValue>,
    sp: usize,
}

impl Stack {
    /// New stack; a zero capacity is bumped to one
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![DataValue::default(); capacity.max(1)],
            sp: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn push(&mut self, value: DataValue) {
        self.sp = if self.sp == 0 { self.slots.len() - 1 } else { self.sp - 1 };
        self.slots[self.sp] = value;
    }

    pub fn pop(&mut self) -> DataValue {
        let value = std::mem::take(&mut self.slots[self.sp]);
        self.sp += 1;
        if self.sp == self.slots.len() {
            self.sp = 0;
        }
        value
    }

    pub fn peek(&self) -> DataValue {
        self.slots[self.sp]
    }

    /// Value `depth` slots below the top
    pub fn get(&self, depth: usize) -> DataValue {
        self.slots[(self.sp + depth) % self.slots.len()]
    }

    /// Reverse the stack contents in place
    pub fn flip(&mut self) {
        let cap = self.slots.len();
        let ordered: Vec<DataValue> = (0..cap).map(|d| self.get(d)).collect();
        for (d, value) in ordered.into_iter().rev().enumerate() {
            self.slots[(self.sp + d) % cap] = value;
        }
    }

    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            slot.clear();
        }
        self.sp = 0;
    }
}

/// Which stack a thread currently operates on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StackSelect {
    #[default]
    Local,
    Global,
}

impl StackSelect {
    pub fn toggled(self) -> Self {
        match self {
            Self::Local => Self::Global,
            Self::Global => Self::Local,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vm::register::ValueSource;
    use proptest::prelude::*;

    fn val(v: i32) -> DataValue {
        DataValue::new(v, v as u64, ValueSource::Internal)
    }

    #[test]
    fn test_push_pop_lifo() {
        let mut s = Stack::new(4);
        s.push(val(1));
        s.push(val(2));
        assert_eq!(s.peek().value, 2);
        assert_eq!(s.get(1).value, 1);
        assert_eq!(s.pop().value, 2);
        assert_eq!(s.pop().value, 1);
        assert_eq!(s.pop(), DataValue::default());
    }

    #[test]
    fn test_overflow_loses_oldest() {
        let mut s = Stack::new(3);
        for v in 1..=4 {
            s.push(val(v));
        }
        assert_eq!(s.get(0).value, 4);
        assert_eq!(s.get(2).value, 2);
        let popped: Vec<i32> = (0..3).map(|_| s.pop().value).collect();
        assert_eq!(popped, vec![4, 3, 2]);
        assert!((0..3).all(|d| s.get(d).value != 1));
    }

    #[test]
    fn test_pop_clears_slot() {
        let mut s = Stack::new(2);
        s.push(DataValue::new(9, 3, ValueSource::Environment));
        s.pop();
        // Walk back over the vacated slot.
        s.push(val(0));
        s.pop();
        assert_eq!(s.get(1), DataValue::default());
        assert!((0..2).all(|d| !s.get(d).env_component));
    }

    #[test]
    fn test_flip() {
        let mut s = Stack::new(3);
        for v in 1..=3 {
            s.push(val(v));
        }
        s.flip();
        assert_eq!(s.pop().value, 1);
        assert_eq!(s.pop().value, 2);
        assert_eq!(s.pop().value, 3);
    }

    #[test]
    fn test_select_toggle() {
        assert_eq!(StackSelect::Local.toggled(), StackSelect::Global);
        assert_eq!(StackSelect::Global.toggled(), StackSelect::Local);
    }

    proptest! {
        #[test]
        fn prop_round_trip_reverses(
            cap in 1usize..16,
            values in proptest::collection::vec((any::<i32>(), 0u64..500, any::<bool>()), 0..16),
        ) {
            let values: Vec<DataValue> = values
                .into_iter()
                .take(cap)
                .map(|(v, c, env)| {
                    let src = if env { ValueSource::Environment } else { ValueSource::Internal };
                    DataValue::new(v, c, src)
                })
                .collect();
            let mut s = Stack::new(cap);
            for v in &values {
                s.push(*v);
            }
            let popped: Vec<DataValue> = (0..values.len()).map(|_| s.pop()).collect();
            let expected: Vec<DataValue> = values.iter().rev().copied().collect();
            prop_assert_eq!(popped, expected);
        }
    }
}
