//! Replication: allocation, copying, division
//!
//! ```text
//! h-alloc    memory grows by up to range x size; AX = old size
//! h-copy     memory[write] = memory[read]; flag copied; advance both
//! h-read     BX = memory[read]; advance read
//! h-write    memory[write] = BX; flag copied; advance write
//! h-divide   split -> count -> mutate -> check -> commit | roll back
//! ```
//!
//! Mutation and the viability check work on scratch copies of both halves,
//! so a refused divide leaves nothing to undo beyond the allocation itself.

use super::HeadsCpu;
use crate::config::{AllocMethod, DivideMethod};
use crate::genome::Genome;
use crate::vm::context::{BirthInfo, Context, Offspring};
use crate::vm::divide::{split_regions, DivideFailure, SplitInput, ViabilityLimits};
use crate::vm::flags::MemFlag;
use crate::vm::head::HeadRole;
use crate::vm::instruction::Instruction;
use crate::vm::memory::InstMemory;
use crate::vm::mutation;
use crate::vm::register::{Register, ValueSource};

impl HeadsCpu {
    // =========================================================================
    // Allocation
    // =========================================================================

    pub(crate) fn inst_h_alloc(&mut self, ctx: &mut Context<'_>) -> bool {
        let old_size = self.memory.len();
        let grow = (self.config.offspring_size_range * old_size as f64) as usize;
        let size = grow.min(self.config.max_genome_len.saturating_sub(old_size));
        match self.allocate(ctx, size) {
            Ok(()) => {
                self.set_reg(Register::AX, old_size as i32, ValueSource::Internal);
                true
            }
            Err(failure) => {
                self.fault(ctx, &format!("h-alloc: {}", failure));
                false
            }
        }
    }

    /// Append `size` slots of child space
    fn allocate(&mut self, ctx: &mut Context<'_>, size: usize) -> Result<(), DivideFailure> {
        if self.mal_active {
            return Err(DivideFailure::AlreadyAllocated);
        }
        let old_size = self.memory.len();
        let new_size = old_size + size;
        let range = self.config.offspring_size_range;
        if size == 0
            || new_size > self.config.max_genome_len
            || new_size < self.config.min_genome_len
            || size as f64 > old_size as f64 * range
            || old_size as f64 > size as f64 * range
        {
            return Err(DivideFailure::BadAllocation { size });
        }

        match self.config.alloc_method {
            AllocMethod::Default => self.memory.resize(new_size, self.inst_set.default_inst()),
            AllocMethod::Necro => {
                let fill = self.inst_set.default_inst();
                for i in 0..size {
                    let inst = self.necro.get(i).copied().unwrap_or(fill);
                    self.memory.push(inst);
                }
            }
            AllocMethod::Random => {
                for _ in 0..size {
                    let inst = self.inst_set.random_inst(ctx.rng);
                    self.memory.push(inst);
                }
            }
        }
        self.mal_active = true;
        self.alloc_base = old_size;
        Ok(())
    }

    // =========================================================================
    // Copying
    // =========================================================================

    /// Copy one instruction from the read head to the write head. Nops read
    /// on the way build up the thread's read trackers for `if-label`.
    pub(crate) fn inst_h_copy(&mut self, _ctx: &mut Context<'_>) -> bool {
        let len = self.memory.len();
        let t = &mut self.threads[self.cur_thread];
        t.head_mut(HeadRole::Read).adjust(len);
        t.head_mut(HeadRole::Write).adjust(len);
        let read = t.head(HeadRole::Read).index();
        let write = t.head(HeadRole::Write).index();

        let inst = self.memory.get(read);
        t.note_read(self.inst_set.nop_mod(inst), self.inst_set.is_label(inst));

        self.memory.set(write, inst);
        self.memory.set_flag(write, MemFlag::Copied);
        t.head_mut(HeadRole::Read).advance(len);
        t.head_mut(HeadRole::Write).advance(len);
        true
    }

    /// BX = opcode under the chosen head (read head), then advance it
    pub(crate) fn inst_h_read(&mut self, _ctx: &mut Context<'_>) -> bool {
        let role = self.find_modified_head(HeadRole::Read);
        let len = self.memory.len();
        let t = &mut self.threads[self.cur_thread];
        t.head_mut(role).adjust(len);
        let inst = t.head(role).inst(&self.memory);
        t.note_read(self.inst_set.nop_mod(inst), self.inst_set.is_label(inst));
        t.head_mut(role).advance(len);
        self.set_reg(Register::BX, inst.op() as i32, ValueSource::Internal);
        true
    }

    /// Write the opcode in BX under the chosen head (write head), then
    /// advance it. Opcodes outside the set write opcode 0.
    pub(crate) fn inst_h_write(&mut self, _ctx: &mut Context<'_>) -> bool {
        let role = self.find_modified_head(HeadRole::Write);
        let value = self.cur().reg(Register::BX).value;
        let inst = match u8::try_from(value) {
            Ok(op) if (op as usize) < self.inst_set.len() => Instruction(op),
            _ => Instruction(0),
        };
        let len = self.memory.len();
        let t = &mut self.threads[self.cur_thread];
        t.head_mut(role).adjust(len);
        let pos = t.head(role).index();
        self.memory.set(pos, inst);
        self.memory.set_flag(pos, MemFlag::Copied);
        t.head_mut(role).advance(len);
        true
    }

    // =========================================================================
    // Division
    // =========================================================================

    pub(crate) fn inst_h_divide(&mut self, ctx: &mut Context<'_>) -> bool {
        self.stats.divide_attempts += 1;
        if self.config.require_allocate && !self.mal_active {
            return self.divide_failed(ctx, DivideFailure::NoAllocation);
        }
        self.adjust_heads();

        let t = self.cur();
        let input = SplitInput {
            len: self.memory.len(),
            read: t.head(HeadRole::Read).index(),
            write: t.head(HeadRole::Write).index(),
            alloc_base: self.mal_active.then_some(self.alloc_base),
        };
        let regions = split_regions(self.config.split_policy, input, ctx.rng);

        let executed = self.memory.count_flag(MemFlag::Executed, 0, regions.split);
        let copied = self.memory.count_flag(MemFlag::Copied, regions.split, regions.end);

        let mut parent = self.memory.clone();
        let mut child = parent.split_off(regions.split);
        child.truncate(regions.child_size());
        self.finish_divide(ctx, parent, child, executed, copied)
    }

    /// Copy the whole genome into a child and divide at once
    pub(crate) fn inst_repro(&mut self, ctx: &mut Context<'_>) -> bool {
        self.stats.divide_attempts += 1;
        let parent_len = if self.mal_active { self.alloc_base } else { self.memory.len() };

        let mut parent = self.memory.clone();
        parent.truncate(parent_len);
        let executed = parent.count_flag(MemFlag::Executed, 0, parent_len);

        let mut child = InstMemory::from_insts(parent.insts().to_vec());
        for pos in 0..child.len() {
            child.set_flag(pos, MemFlag::Copied);
        }
        let copied = child.len();
        self.finish_divide(ctx, parent, child, executed, copied)
    }

    pub(crate) fn inst_die(&mut self, _ctx: &mut Context<'_>) -> bool {
        self.executing = false;
        self.advance_ip = false;
        true
    }

    /// Mutate both halves, check viability, then commit or roll back
    fn finish_divide(
        &mut self,
        ctx: &mut Context<'_>,
        mut parent: InstMemory,
        mut child: InstMemory,
        executed: usize,
        copied: usize,
    ) -> bool {
        let mutations = self.mutate_offspring(ctx, &mut parent, &mut child);
        let limits = ViabilityLimits::new(&self.config, self.genome.len());
        if let Err(failure) = limits.check(parent.len(), child.len(), executed, copied) {
            return self.divide_failed(ctx, failure);
        }
        self.commit_divide(ctx, parent, child, executed, copied, mutations)
    }

    fn mutate_offspring(&self, ctx: &mut Context<'_>, parent: &mut InstMemory, child: &mut InstMemory) -> usize {
        let rates = self.config.mutation;
        let (min_len, max_len) = (self.config.min_genome_len, self.config.max_genome_len);
        let set = &*self.inst_set;
        let rng = &mut *ctx.rng;

        mutation::copy_mutations(child, set, rates.copy, rng)
            + mutation::divide_substitution(child, set, rates.divide_sub, rng)
            + mutation::divide_insertion(child, set, rates.divide_ins, max_len, rng)
            + mutation::divide_deletion(child, rates.divide_del, min_len, rng)
            + mutation::point_mutations(child, set, rates.point, rng)
            + mutation::insertions(child, set, rates.insert, max_len, rng)
            + mutation::deletions(child, rates.delete, min_len, rng)
            + mutation::point_mutations(parent, set, rates.parent_point, rng)
    }

    fn commit_divide(
        &mut self,
        ctx: &mut Context<'_>,
        parent: InstMemory,
        child: InstMemory,
        executed: usize,
        copied: usize,
        mutations: usize,
    ) -> bool {
        let parent_len = parent.len();
        self.necro = self.memory.insts().get(parent_len..).unwrap_or_default().to_vec();
        self.memory = parent;
        self.memory.clear_flag_all(MemFlag::Copied);
        self.genome = Genome::new(self.memory.insts().to_vec());
        self.mal_active = false;
        self.alloc_base = parent_len;

        self.stats.offspring += 1;
        self.stats.mutations += mutations as u64;
        self.stats.last_copied_size = copied;
        self.stats.last_executed_size = executed;
        self.stats.last_child_size = child.len();
        log::debug!(
            "org {}: divided into {} + {} ({} mutations)",
            self.info.id,
            parent_len,
            child.len(),
            mutations
        );

        let offspring = Offspring {
            genome: Genome::new(child.insts().to_vec()),
            info: BirthInfo {
                parent_id: self.info.id,
                group: self.info.group,
                cell: self.info.cell,
                parent_len,
                copied_size: copied,
                executed_size: executed,
                mutations,
            },
        };
        if !ctx.births.submit_offspring(offspring) {
            self.executing = false;
            self.advance_ip = false;
            return true;
        }

        match self.config.divide_method {
            DivideMethod::KeepState => self.adjust_heads(),
            DivideMethod::Reset => {
                self.reset_state();
                self.advance_ip = false;
            }
            DivideMethod::ResetThread => {
                let id = self.cur().id();
                let fresh = self.new_thread(id);
                self.threads[self.cur_thread] = fresh;
                self.adjust_heads();
                self.advance_ip = false;
            }
            DivideMethod::Terminate => {
                self.executing = false;
                self.advance_ip = false;
            }
        }
        true
    }

    /// Count the failure and drop the copy buffer; threads and stacks stay
    fn divide_failed(&mut self, ctx: &mut Context<'_>, failure: DivideFailure) -> bool {
        self.stats.divide_failures += 1;
        if self.mal_active {
            self.memory.truncate(self.alloc_base);
            self.mal_active = false;
        }
        self.memory.clear_flag_all(MemFlag::Copied);
        self.adjust_heads();
        self.fault(ctx, &format!("divide failed: {}", failure));
        false
    }
}
