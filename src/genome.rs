//! Genome - an organism's instruction sequence
//!
//! Genomes cross the library boundary in one of two text forms:
//!
//! - the symbol string, one character per instruction (see
//!   [`Instruction::symbol`]), which is also the serde form;
//! - the `.org` listing, one instruction name per line with `#` comments,
//!   resolved through an instruction set.

use crate::error::{HardwareError, Result};
use crate::vm::{InstSet, Instruction};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Genome {
    insts: Vec<Instruction>,
}

impl Genome {
    pub fn new(insts: Vec<Instruction>) -> Self {
        Self { insts }
    }

    pub fn from_symbols(symbols: &str) -> Result<Self> {
        let insts = symbols
            .trim()
            .chars()
            .map(Instruction::from_symbol)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { insts })
    }

    pub fn to_symbols(&self) -> String {
        self.insts.iter().map(Instruction::symbol).collect()
    }

    /// Parse an `.org` listing against `set`
    pub fn parse_org<H>(source: &str, set: &InstSet<H>) -> Result<Self> {
        let mut insts = Vec::new();
        for (idx, line) in source.lines().enumerate() {
            let line = match line.find('#') {
                Some(pos) => &line[..pos],
                None => line,
            }
            .trim();
            if line.is_empty() {
                continue;
            }
            let inst = set.inst_of(line).ok_or_else(|| HardwareError::UnknownInstruction {
                name: line.to_string(),
                line: idx + 1,
            })?;
            insts.push(inst);
        }
        Ok(Self { insts })
    }

    /// Render as an `.org` listing
    pub fn to_org<H>(&self, set: &InstSet<H>) -> String {
        let mut out = String::new();
        for inst in &self.insts {
            out.push_str(set.inst_name(*inst));
            out.push('\n');
        }
        out
    }

    /// Number of opcodes that `set` does not define; each is logged
    pub fn check_against<H>(&self, set: &InstSet<H>) -> usize {
        let mut bad = 0;
        for (pos, inst) in self.insts.iter().enumerate() {
            if !set.is_valid(*inst) {
                log::warn!(
                    "genome position {}: opcode {} not in instruction set '{}'",
                    pos,
                    inst.op(),
                    set.name()
                );
                bad += 1;
            }
        }
        bad
    }

    /// Reject lengths outside `[min, max]`
    pub fn check_len(&self, min: usize, max: usize) -> Result<()> {
        let len = self.insts.len();
        if len < min || len > max {
            return Err(HardwareError::GenomeLength { len, min, max });
        }
        Ok(())
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

    pub fn into_insts(self) -> Vec<Instruction> {
        self.insts
    }
}

impl From<Vec<Instruction>> for Genome {
    fn from(insts: Vec<Instruction>) -> Self {
        Self::new(insts)
    }
}

impl FromStr for Genome {
    type Err = HardwareError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_symbols(s)
    }
}

impl fmt::Display for Genome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_symbols())
    }
}

impl Serialize for Genome {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_symbols())
    }
}

impl<'de> Deserialize<'de> for Genome {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Genome::from_symbols(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vm::dialects::heads;

    #[test]
    fn test_symbol_string() {
        let g = Genome::from_symbols("abcA9").unwrap();
        assert_eq!(g.len(), 5);
        assert_eq!(g.insts()[3], Instruction(26));
        assert_eq!(g.to_symbols(), "abcA9");
        assert_eq!(g.to_string(), "abcA9");
        assert!("ab!".parse::<Genome>().is_err());
    }

    #[test]
    fn test_serde_as_string() {
        let g = Genome::from_symbols("aab").unwrap();
        let json = serde_json::to_string(&g).unwrap();
        assert_eq!(json, "\"aab\"");
        let back: Genome = serde_json::from_str(&json).unwrap();
        assert_eq!(back, g);
        assert!(serde_json::from_str::<Genome>("\"a-b\"").is_err());
    }

    #[test]
    fn test_org_listing() {
        let lib = heads::library().unwrap();
        let set = heads::default_inst_set(&lib).unwrap();
        let g = Genome::parse_org("# ancestor\nh-alloc\nnop-A  # pad\n\nh-divide\n", &set).unwrap();
        assert_eq!(g.len(), 3);
        assert_eq!(g.insts()[0], set.inst_of("h-alloc").unwrap());
        let text = g.to_org(&set);
        assert_eq!(Genome::parse_org(&text, &set).unwrap(), g);

        let err = Genome::parse_org("nop-A\nnot-an-inst\n", &set).unwrap_err();
        assert!(matches!(err, HardwareError::UnknownInstruction { line: 2, .. }));
    }

    #[test]
    fn test_check_len_and_set() {
        let lib = heads::library().unwrap();
        let set = heads::default_inst_set(&lib).unwrap();
        let g = Genome::new(vec![Instruction(0), Instruction(200)]);
        assert_eq!(g.check_against(&set), 1);
        assert!(g.check_len(1, 5).is_ok());
        assert!(matches!(
            g.check_len(3, 5),
            Err(HardwareError::GenomeLength { len: 2, min: 3, max: 5 })
        ));
    }
}
