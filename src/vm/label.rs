//! Label - a run of no-op modifiers used as an address pattern

use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered nop modifiers, bounded by a maximum length
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Label {
    nops: Vec<u8>,
    max_len: usize,
}

impl Label {
    pub fn new(max_len: usize) -> Self {
        Self {
            nops: Vec::with_capacity(max_len),
            max_len,
        }
    }

    /// Build from explicit nops, ignoring the length bound
    pub fn from_nops(nops: &[u8]) -> Self {
        Self {
            nops: nops.to_vec(),
            max_len: nops.len(),
        }
    }

    pub fn len(&self) -> usize {
        self.nops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nops.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.nops.len() >= self.max_len
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    pub fn nops(&self) -> &[u8] {
        &self.nops
    }

    /// Append a nop; returns false once the label is full
    pub fn push(&mut self, nop: u8) -> bool {
        if self.is_full() {
            return false;
        }
        self.nops.push(nop);
        true
    }

    pub fn clear(&mut self) {
        self.nops.clear();
    }

    /// Shift every nop by `rot` modulo `base`
    pub fn rotate(&mut self, rot: u8, base: u8) {
        if base == 0 {
            return;
        }
        for nop in &mut self.nops {
            *nop = ((*nop as u16 + rot as u16) % base as u16) as u8;
        }
    }

    /// Complement: each nop rotated by one within the nop alphabet
    pub fn complement(&self, base: u8) -> Self {
        let mut out = self.clone();
        out.rotate(1, base);
        out
    }

    /// Same nops, ignoring the length bound
    pub fn matches(&self, other: &Label) -> bool {
        self.nops == other.nops
    }

    /// Nops read as digits of a base-`base` number
    pub fn as_int(&self, base: u8) -> i32 {
        self.nops
            .iter()
            .fold(0i32, |acc, &n| acc.wrapping_mul(base as i32).wrapping_add(n as i32))
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &nop in &self.nops {
            write!(f, "{}", (b'A' + nop.min(25)) as char)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_respects_max() {
        let mut l = Label::new(2);
        assert!(l.push(0));
        assert!(l.push(1));
        assert!(!l.push(2));
        assert_eq!(l.len(), 2);
        assert!(l.is_full());
        l.clear();
        assert!(l.is_empty());
    }

    #[test]
    fn test_complement_rotates() {
        let l = Label::from_nops(&[0, 1, 2]);
        assert_eq!(l.complement(3).nops(), &[1, 2, 0]);
        assert_eq!(l.complement(4).nops(), &[1, 2, 3]);
        assert!(l.complement(3).complement(3).complement(3).matches(&l));
    }

    #[test]
    fn test_display_and_int() {
        let l = Label::from_nops(&[1, 0, 2]);
        assert_eq!(l.to_string(), "BAC");
        assert_eq!(l.as_int(3), 11);
    }
}
