//! Instruction Set - the opcode table an organism actually runs
//!
//! An instruction set picks entries out of an [`InstLib`] and numbers them:
//! the n-th listed instruction gets opcode n. It is built once, then shared
//! read-only by every engine that uses it.
//!
//! ## Text format
//!
//! ```text
//! # comment
//! INSTSET heads_default
//! INST nop-A
//! INST h-copy:redundancy=2
//! INST h-divide:prob_fail=0.1
//! ```
//!
//! `redundancy` weights the instruction in random draws made by mutations
//! (default 1). `prob_fail` is the chance the instruction silently does
//! nothing when executed (default 0).

use super::flags::InstFlags;
use super::instruction::Instruction;
use super::library::{InstClass, InstEntry, InstLib, InstMethod};
use super::register::NUM_REGISTERS;
use crate::error::{HardwareError, Result};
use rand::{Rng, RngCore};
use std::collections::HashMap;
use std::fmt;

/// Most opcodes a set can hold; 255 is the error sentinel
pub const MAX_INST_SET_SIZE: usize = 255;

/// One numbered instruction
pub struct InstSetEntry<H> {
    pub entry: InstEntry<H>,
    pub redundancy: u32,
    pub prob_fail: f64,
}

impl<H> Clone for InstSetEntry<H> {
    fn clone(&self) -> Self {
        Self {
            entry: self.entry,
            redundancy: self.redundancy,
            prob_fail: self.prob_fail,
        }
    }
}

impl<H> fmt::Debug for InstSetEntry<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstSetEntry")
            .field("name", &self.entry.name)
            .field("redundancy", &self.redundancy)
            .field("prob_fail", &self.prob_fail)
            .finish()
    }
}

/// The numbered instruction table of one dialect configuration
pub struct InstSet<H> {
    name: String,
    entries: Vec<InstSetEntry<H>>,
    by_name: HashMap<&'static str, Instruction>,
    mutation_chart: Vec<Instruction>,
    null_entry: InstEntry<H>,
    default_inst: Instruction,
    num_nops: usize,
}

impl<H> InstSet<H> {
    /// Build a set from `(name, redundancy, prob_fail)` triples in opcode order
    pub fn from_spec(
        name: &str,
        lib: &InstLib<H>,
        spec: &[(&str, u32, f64)],
    ) -> Result<Self> {
        let mut set = Self {
            name: name.to_string(),
            entries: Vec::with_capacity(spec.len()),
            by_name: HashMap::new(),
            mutation_chart: Vec::new(),
            null_entry: *lib.null_entry(),
            default_inst: Instruction(0),
            num_nops: 0,
        };
        for (idx, (inst_name, redundancy, prob_fail)) in spec.iter().enumerate() {
            set.add(lib, inst_name, *redundancy, *prob_fail, idx + 1)?;
        }
        set.finish(lib)?;
        Ok(set)
    }

    /// Build a set listing `names` with default attributes
    pub fn from_names(name: &str, lib: &InstLib<H>, names: &[&str]) -> Result<Self> {
        let spec: Vec<(&str, u32, f64)> = names.iter().map(|n| (*n, 1, 0.0)).collect();
        Self::from_spec(name, lib, &spec)
    }

    /// Parse the text format
    pub fn parse(source: &str, lib: &InstLib<H>) -> Result<Self> {
        let mut set = Self {
            name: String::from("unnamed"),
            entries: Vec::new(),
            by_name: HashMap::new(),
            mutation_chart: Vec::new(),
            null_entry: *lib.null_entry(),
            default_inst: Instruction(0),
            num_nops: 0,
        };

        for (idx, line) in source.lines().enumerate() {
            let line_number = idx + 1;
            let line = match line.find('#') {
                Some(pos) => &line[..pos],
                None => line,
            }
            .trim();
            if line.is_empty() {
                continue;
            }

            let mut parts = line.splitn(2, char::is_whitespace);
            let keyword = parts.next().unwrap_or("").to_uppercase();
            let rest = parts.next().map(str::trim).unwrap_or("");

            match keyword.as_str() {
                "INSTSET" => {
                    if rest.is_empty() {
                        return Err(HardwareError::InstSet(format!(
                            "line {}: INSTSET needs a name",
                            line_number
                        )));
                    }
                    set.name = rest.to_string();
                }
                "INST" => {
                    let (inst_name, redundancy, prob_fail) = parse_inst_line(rest, line_number)?;
                    set.add(lib, inst_name, redundancy, prob_fail, line_number)?;
                }
                other => {
                    return Err(HardwareError::InstSet(format!(
                        "line {}: unknown directive '{}'",
                        line_number, other
                    )));
                }
            }
        }

        set.finish(lib)?;
        Ok(set)
    }

    fn add(
        &mut self,
        lib: &InstLib<H>,
        name: &str,
        redundancy: u32,
        prob_fail: f64,
        line: usize,
    ) -> Result<()> {
        let entry = lib.get(name).ok_or_else(|| HardwareError::UnknownInstruction {
            name: name.to_string(),
            line,
        })?;
        if self.entries.len() >= MAX_INST_SET_SIZE {
            return Err(HardwareError::InstSet(format!(
                "more than {} instructions",
                MAX_INST_SET_SIZE
            )));
        }
        if !(0.0..=1.0).contains(&prob_fail) {
            return Err(HardwareError::InstSet(format!(
                "line {}: prob_fail {} outside [0, 1]",
                line, prob_fail
            )));
        }
        let inst = Instruction(self.entries.len() as u8);
        if self.by_name.contains_key(entry.name) {
            log::warn!(
                "instruction set '{}': '{}' listed more than once (opcode {})",
                self.name,
                entry.name,
                inst.op()
            );
        } else {
            self.by_name.insert(entry.name, inst);
        }
        self.entries.push(InstSetEntry {
            entry: *entry,
            redundancy,
            prob_fail,
        });
        Ok(())
    }

    fn finish(&mut self, lib: &InstLib<H>) -> Result<()> {
        if self.entries.is_empty() {
            return Err(HardwareError::InstSet(format!(
                "instruction set '{}' is empty",
                self.name
            )));
        }
        self.mutation_chart.clear();
        for (op, e) in self.entries.iter().enumerate() {
            for _ in 0..e.redundancy {
                self.mutation_chart.push(Instruction(op as u8));
            }
        }
        self.num_nops = self
            .entries
            .iter()
            .filter(|e| e.entry.flags.nop())
            .filter(|e| e.entry.nop_mod.map_or(false, |m| (m as usize) < NUM_REGISTERS))
            .count();
        self.default_inst = match self.by_name.get(lib.default_entry().name) {
            Some(inst) => *inst,
            None => {
                log::warn!(
                    "instruction set '{}' lacks default instruction '{}', using opcode 0",
                    self.name,
                    lib.default_entry().name
                );
                Instruction(0)
            }
        };
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_valid(&self, inst: Instruction) -> bool {
        (inst.op() as usize) < self.entries.len()
    }

    pub fn entry(&self, inst: Instruction) -> Option<&InstSetEntry<H>> {
        self.entries.get(inst.op() as usize)
    }

    pub fn entries(&self) -> &[InstSetEntry<H>] {
        &self.entries
    }

    fn lib_entry(&self, inst: Instruction) -> &InstEntry<H> {
        self.entry(inst).map_or(&self.null_entry, |e| &e.entry)
    }

    /// Handler for `inst`; unknown opcodes get the null handler
    pub fn handler(&self, inst: Instruction) -> InstMethod<H> {
        self.lib_entry(inst).handler
    }

    pub fn flags(&self, inst: Instruction) -> InstFlags {
        self.lib_entry(inst).flags
    }

    pub fn class(&self, inst: Instruction) -> InstClass {
        self.lib_entry(inst).class
    }

    pub fn is_nop(&self, inst: Instruction) -> bool {
        self.entry(inst).map_or(false, |e| e.entry.flags.nop())
    }

    pub fn is_label(&self, inst: Instruction) -> bool {
        self.entry(inst).map_or(false, |e| e.entry.flags.label())
    }

    /// Modifier carried by a no-op
    pub fn nop_mod(&self, inst: Instruction) -> Option<u8> {
        self.entry(inst)
            .filter(|e| e.entry.flags.nop())
            .and_then(|e| e.entry.nop_mod)
    }

    pub fn prob_fail(&self, inst: Instruction) -> f64 {
        self.entry(inst).map_or(0.0, |e| e.prob_fail)
    }

    pub fn redundancy(&self, inst: Instruction) -> u32 {
        self.entry(inst).map_or(0, |e| e.redundancy)
    }

    pub fn inst_name(&self, inst: Instruction) -> &'static str {
        match self.entry(inst) {
            Some(e) => e.entry.name,
            None => "(unknown)",
        }
    }

    pub fn inst_of(&self, name: &str) -> Option<Instruction> {
        self.by_name.get(name).copied()
    }

    /// Count of register no-ops, the alphabet size for label complements
    pub fn num_nops(&self) -> usize {
        self.num_nops
    }

    pub fn default_inst(&self) -> Instruction {
        self.default_inst
    }

    pub fn error_inst(&self) -> Instruction {
        Instruction::ERROR
    }

    /// Random opcode weighted by redundancy
    pub fn random_inst(&self, rng: &mut dyn RngCore) -> Instruction {
        if self.mutation_chart.is_empty() {
            return self.default_inst;
        }
        self.mutation_chart[rng.gen_range(0..self.mutation_chart.len())]
    }

    /// Render back into the text format
    pub fn to_text(&self) -> String {
        let mut out = format!("INSTSET {}\n", self.name);
        for e in &self.entries {
            out.push_str("INST ");
            out.push_str(e.entry.name);
            if e.redundancy != 1 {
                out.push_str(&format!(":redundancy={}", e.redundancy));
            }
            if e.prob_fail != 0.0 {
                out.push_str(&format!(":prob_fail={}", e.prob_fail));
            }
            out.push('\n');
        }
        out
    }
}

impl<H> fmt::Debug for InstSet<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InstSet(\"{}\", {} instructions)", self.name, self.entries.len())
    }
}

fn parse_inst_line(rest: &str, line: usize) -> Result<(&str, u32, f64)> {
    let mut fields = rest.split(':');
    let name = fields.next().map(str::trim).unwrap_or("");
    if name.is_empty() {
        return Err(HardwareError::InstSet(format!("line {}: INST needs a name", line)));
    }
    let mut redundancy = 1u32;
    let mut prob_fail = 0.0f64;
    for attr in fields {
        let (key, value) = attr.split_once('=').ok_or_else(|| {
            HardwareError::InstSet(format!("line {}: malformed attribute '{}'", line, attr))
        })?;
        let value = value.trim();
        match key.trim().to_lowercase().as_str() {
            "redundancy" => {
                redundancy = value.parse().map_err(|_| {
                    HardwareError::InstSet(format!("line {}: invalid redundancy '{}'", line, value))
                })?;
            }
            "prob_fail" => {
                prob_fail = value.parse().map_err(|_| {
                    HardwareError::InstSet(format!("line {}: invalid prob_fail '{}'", line, value))
                })?;
            }
            other => {
                return Err(HardwareError::InstSet(format!(
                    "line {}: unknown attribute '{}'",
                    line, other
                )));
            }
        }
    }
    Ok((name, redundancy, prob_fail))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vm::context::Context;
    use rand::SeedableRng;

    struct Dummy;

    fn ok(_: &mut Dummy, _: &mut Context<'_>) -> bool {
        true
    }

    fn lib() -> InstLib<Dummy> {
        InstLib::build(
            "dummy",
            vec![
                InstEntry::new("nop-A", ok, InstClass::Nop, "").nop(0),
                InstEntry::new("nop-B", ok, InstClass::Nop, "").nop(1),
                InstEntry::new("nop-rand", ok, InstClass::Nop, "").nop(8),
                InstEntry::new("nop-X", ok, InstClass::Nop, ""),
                InstEntry::new("inc", ok, InstClass::Arithmetic, ""),
            ],
            "nop-X",
            "nop-A",
        )
        .unwrap()
    }

    #[test]
    fn test_parse_text() {
        let text = "# test set\nINSTSET tiny\nINST nop-A\nINST nop-B:redundancy=3\nINST inc:prob_fail=0.25 # trailing\n";
        let set = InstSet::parse(text, &lib()).unwrap();
        assert_eq!(set.name(), "tiny");
        assert_eq!(set.len(), 3);
        assert_eq!(set.inst_of("inc"), Some(Instruction(2)));
        assert_eq!(set.redundancy(Instruction(1)), 3);
        assert_eq!(set.prob_fail(Instruction(2)), 0.25);
        assert_eq!(set.nop_mod(Instruction(1)), Some(1));
        assert_eq!(set.nop_mod(Instruction(2)), None);
        assert_eq!(set.num_nops(), 2);
        assert_eq!(set.default_inst(), Instruction(0));
    }

    #[test]
    fn test_parse_errors() {
        let l = lib();
        assert!(matches!(
            InstSet::parse("INST frobnicate\n", &l),
            Err(HardwareError::UnknownInstruction { line: 1, .. })
        ));
        assert!(matches!(
            InstSet::parse("INST inc:speed=3\n", &l),
            Err(HardwareError::InstSet(_))
        ));
        assert!(matches!(
            InstSet::parse("INST inc:prob_fail=2\n", &l),
            Err(HardwareError::InstSet(_))
        ));
        assert!(matches!(InstSet::parse("# nothing\n", &l), Err(HardwareError::InstSet(_))));
        assert!(matches!(InstSet::parse("BOGUS x\n", &l), Err(HardwareError::InstSet(_))));
    }

    #[test]
    fn test_unknown_opcode_uses_null() {
        let set = InstSet::from_names("s", &lib(), &["nop-A", "inc"]).unwrap();
        assert!(!set.is_valid(Instruction(9)));
        assert!(set.flags(Instruction(9)).null());
        assert_eq!(set.inst_name(Instruction(9)), "(unknown)");
        assert!(!set.is_nop(Instruction(9)));
    }

    #[test]
    fn test_virtual_nop_not_counted() {
        let set = InstSet::from_names("s", &lib(), &["nop-A", "nop-rand", "inc"]).unwrap();
        assert_eq!(set.num_nops(), 1);
        assert_eq!(set.nop_mod(Instruction(1)), Some(8));
    }

    #[test]
    fn test_random_inst_respects_redundancy() {
        let set = InstSet::from_spec("s", &lib(), &[("nop-A", 0, 0.0), ("inc", 1, 0.0)]).unwrap();
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(7);
        for _ in 0..50 {
            assert_eq!(set.random_inst(&mut rng), Instruction(1));
        }
    }

    #[test]
    fn test_text_round_trip() {
        let l = lib();
        let set = InstSet::from_spec("s", &l, &[("nop-A", 1, 0.0), ("inc", 2, 0.5)]).unwrap();
        let again = InstSet::parse(&set.to_text(), &l).unwrap();
        assert_eq!(again.name(), "s");
        assert_eq!(again.redundancy(Instruction(1)), 2);
        assert_eq!(again.prob_fail(Instruction(1)), 0.5);
    }
}
