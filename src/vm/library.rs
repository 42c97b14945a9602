//! Instruction Library - name-indexed table of instruction handlers
//!
//! A library lists every instruction a dialect knows how to run. It is built
//! once by the host, checked for duplicate names and for designated null and
//! default entries, and then used to assemble one or more
//! [`InstSet`](super::InstSet)s. Nothing here is global: hosts own their
//! libraries and pass them where needed.

use super::context::Context;
use super::flags::InstFlags;
use super::register::{NUM_REGISTERS, NUM_VIRTUAL_REGISTERS};
use crate::error::LibraryError;
use std::collections::HashMap;
use std::fmt;

/// Instruction handler: returns whether the instruction succeeded.
pub type InstMethod<H> = fn(&mut H, &mut Context<'_>) -> bool;

/// Coarse classification used for statistics and documentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstClass {
    Nop,
    FlowControl,
    Conditional,
    Stack,
    Arithmetic,
    Environment,
    Replication,
    Thread,
    Other,
}

impl InstClass {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Nop => "nop",
            Self::FlowControl => "flow",
            Self::Conditional => "conditional",
            Self::Stack => "stack",
            Self::Arithmetic => "arithmetic",
            Self::Environment => "environment",
            Self::Replication => "replication",
            Self::Thread => "thread",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for InstClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One library entry.
pub struct InstEntry<H> {
    pub name: &'static str,
    pub handler: InstMethod<H>,
    pub class: InstClass,
    pub flags: InstFlags,
    /// Register (or head) addressed when this instruction is read as a modifier
    pub nop_mod: Option<u8>,
    pub description: &'static str,
}

impl<H> InstEntry<H> {
    pub const fn new(
        name: &'static str,
        handler: InstMethod<H>,
        class: InstClass,
        description: &'static str,
    ) -> Self {
        Self {
            name,
            handler,
            class,
            flags: InstFlags::empty(),
            nop_mod: None,
            description,
        }
    }

    /// Mark as a no-op modifier for register `nop_mod`
    pub const fn nop(mut self, nop_mod: u8) -> Self {
        self.flags = self.flags.with_nop();
        self.nop_mod = Some(nop_mod);
        self
    }

    pub const fn flags(mut self, flags: InstFlags) -> Self {
        self.flags = InstFlags(self.flags.0 | flags.0);
        self
    }
}

impl<H> Clone for InstEntry<H> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<H> Copy for InstEntry<H> {}

impl<H> fmt::Debug for InstEntry<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstEntry")
            .field("name", &self.name)
            .field("class", &self.class)
            .field("flags", &self.flags)
            .field("nop_mod", &self.nop_mod)
            .finish()
    }
}

/// A dialect's instruction library.
pub struct InstLib<H> {
    name: &'static str,
    entries: Vec<InstEntry<H>>,
    by_name: HashMap<&'static str, usize>,
    null_index: usize,
    default_index: usize,
}

impl<H> InstLib<H> {
    /// Build a library from its entries and the names of its designated null
    /// and default instructions.
    ///
    /// # Errors
    /// Duplicate names, out-of-range nop modifiers and missing designated
    /// entries are rejected.
    pub fn build(
        name: &'static str,
        entries: Vec<InstEntry<H>>,
        null_name: &str,
        default_name: &str,
    ) -> Result<Self, LibraryError> {
        let mut lib = Self {
            name,
            entries: Vec::with_capacity(entries.len()),
            by_name: HashMap::new(),
            null_index: 0,
            default_index: 0,
        };
        for entry in entries {
            lib.register(entry)?;
        }
        lib.null_index = lib
            .index_of(null_name)
            .ok_or_else(|| LibraryError::MissingDesignated(null_name.to_string()))?;
        lib.default_index = lib
            .index_of(default_name)
            .ok_or_else(|| LibraryError::MissingDesignated(default_name.to_string()))?;
        lib.entries[lib.null_index].flags = lib.entries[lib.null_index].flags.with_null();
        lib.entries[lib.default_index].flags = lib.entries[lib.default_index].flags.with_default();
        Ok(lib)
    }

    fn register(&mut self, entry: InstEntry<H>) -> Result<(), LibraryError> {
        if self.by_name.contains_key(entry.name) {
            return Err(LibraryError::DuplicateName(entry.name.to_string()));
        }
        if let Some(nop_mod) = entry.nop_mod {
            if nop_mod as usize >= NUM_REGISTERS + NUM_VIRTUAL_REGISTERS {
                return Err(LibraryError::BadNopMod {
                    name: entry.name.to_string(),
                    nop_mod,
                });
            }
        }
        if entry.flags.nop() && entry.nop_mod.is_none() {
            log::warn!("instruction '{}' is flagged nop without a modifier", entry.name);
        }
        self.by_name.insert(entry.name, self.entries.len());
        self.entries.push(entry);
        Ok(())
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    pub fn get(&self, name: &str) -> Option<&InstEntry<H>> {
        self.index_of(name).map(|idx| &self.entries[idx])
    }

    pub fn entry(&self, idx: usize) -> Option<&InstEntry<H>> {
        self.entries.get(idx)
    }

    pub fn null_entry(&self) -> &InstEntry<H> {
        &self.entries[self.null_index]
    }

    pub fn default_entry(&self) -> &InstEntry<H> {
        &self.entries[self.default_index]
    }

    pub fn entries(&self) -> &[InstEntry<H>] {
        &self.entries
    }

    /// Registered names in registration order
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|e| e.name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<H> fmt::Debug for InstLib<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InstLib(\"{}\", {} instructions)", self.name, self.entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Dummy;

    fn ok(_: &mut Dummy, _: &mut Context<'_>) -> bool {
        true
    }

    fn entries() -> Vec<InstEntry<Dummy>> {
        vec![
            InstEntry::new("nop-A", ok, InstClass::Nop, "").nop(0),
            InstEntry::new("nop-X", ok, InstClass::Nop, ""),
            InstEntry::new("inc", ok, InstClass::Arithmetic, ""),
        ]
    }

    #[test]
    fn test_build_designates_entries() {
        let lib = InstLib::build("dummy", entries(), "nop-X", "nop-A").unwrap();
        assert_eq!(lib.len(), 3);
        assert_eq!(lib.null_entry().name, "nop-X");
        assert!(lib.null_entry().flags.null());
        assert!(lib.default_entry().flags.default_inst());
        assert_eq!(lib.index_of("inc"), Some(2));
        assert_eq!(lib.get("nop-A").and_then(|e| e.nop_mod), Some(0));
        assert_eq!(lib.names().collect::<Vec<_>>(), vec!["nop-A", "nop-X", "inc"]);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut list = entries();
        list.push(InstEntry::new("inc", ok, InstClass::Arithmetic, ""));
        let err = InstLib::build("dummy", list, "nop-X", "nop-A").unwrap_err();
        assert_eq!(err, LibraryError::DuplicateName("inc".into()));
    }

    #[test]
    fn test_missing_designated_rejected() {
        let err = InstLib::build("dummy", entries(), "nop-Z", "nop-A").unwrap_err();
        assert_eq!(err, LibraryError::MissingDesignated("nop-Z".into()));
    }

    #[test]
    fn test_bad_nop_mod_rejected() {
        let mut list = entries();
        list.push(InstEntry::new("nop-Q", ok, InstClass::Nop, "").nop(40));
        assert!(matches!(
            InstLib::build("dummy", list, "nop-X", "nop-A"),
            Err(LibraryError::BadNopMod { nop_mod: 40, .. })
        ));
    }
}
