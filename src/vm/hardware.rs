//! Hardware - the contract every CPU dialect implements
//!
//! Dialects differ in their instruction library and handlers, not in how a
//! host drives them. A population scheduler only needs this trait.

use super::context::Context;
use super::head::{Head, HeadRole};
use super::instruction::Instruction;
use super::memory::InstMemory;
use super::register::{DataValue, Register};
use super::stats::HardwareStats;
use crate::genome::Genome;

pub trait Hardware {
    /// Restore the organism to its birth state (current genome, one thread)
    fn reset(&mut self);

    /// Spend one cycle. Returns whether the organism is still executing.
    fn single_process(&mut self, ctx: &mut Context<'_>) -> bool;

    /// Execute `inst` outside normal cycle accounting. The IP does not move.
    fn process_bonus_inst(&mut self, ctx: &mut Context<'_>, inst: Instruction) -> bool;

    /// Register of the current thread. Virtual registers that need the
    /// context (random, sensors) read as zero here.
    fn register(&self, reg: Register) -> DataValue;

    /// Head of the current thread
    fn head(&self, role: HeadRole) -> Head;

    fn memory(&self) -> &InstMemory;

    fn thread_count(&self) -> usize;

    fn is_executing(&self) -> bool;

    /// Per-site cosmic-ray substitutions over live memory. Returns the count.
    fn point_mutate(&mut self, ctx: &mut Context<'_>, rate: f64) -> usize;

    /// The genome the organism resets to
    fn genome(&self) -> &Genome;

    fn stats(&self) -> &HardwareStats;

    /// Spend up to `budget` cycles. Returns how many were used.
    fn run(&mut self, ctx: &mut Context<'_>, budget: usize) -> usize {
        let mut used = 0;
        while used < budget && self.is_executing() {
            self.single_process(ctx);
            used += 1;
        }
        used
    }
}
