//! HeadsCpu - execution engine for the heads architecture
//!
//! One engine per organism. It owns the organism's instruction memory, the
//! global stack and its threads, and executes one instruction per scheduled
//! thread per cycle.
//!
//! ## Dispatch
//!
//! ```text
//! pick thread (round robin | parallel)
//!   -> adjust IP, fetch
//!   -> capturing label? nop goes into next_label, done
//!   -> flag executed, prob_fail draw, handler(self, ctx)
//!   -> advance IP unless the handler moved it
//! ```
//!
//! Handlers live in the `ops_*` files and are bound to opcodes through the
//! instruction set built from [`crate::vm::dialects::heads`].

mod ops_flow;
mod ops_io;
mod ops_math;
mod ops_replication;
mod ops_stack;
mod ops_thread;


use super::context::{Context, OrganismInfo};
use super::flags::MemFlag;
use super::hardware::Hardware;
use super::head::{Head, HeadRole};
use super::inst_set::InstSet;
use super::instruction::Instruction;
use super::label::Label;
use super::memory::InstMemory;
use super::mutation;
use super::register::{DataValue, Register, ValueSource, VirtualRegister};
use super::stack::{Stack, StackSelect};
use super::stats::HardwareStats;
use super::thread::{Thread, ThreadState, NUM_HEADS};
use crate::config::{HardwareConfig, ThreadSlicing};
use crate::error::Result;
use crate::genome::Genome;
use rand::Rng;
use std::sync::Arc;

/// Which instructions a label search considers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LabelScan {
    /// The label anywhere inside a nop run, scanning from the start of memory
    NopRun,
    /// `label`-anchored, scanning from the start of memory
    Start,
    /// `label`-anchored, scanning forward from the IP
    Forward,
    /// `label`-anchored, scanning backward from the IP
    Backward,
    /// A whole nop run equal to the label, scanning from the start of memory
    SeqStart,
    /// A whole nop run equal to the label, scanning forward from the IP
    SeqForward,
    /// A whole nop run equal to the label, scanning backward from the IP
    SeqBackward,
}

impl LabelScan {
    /// Does a match start right after a `label` instruction?
    pub(crate) fn anchored(self) -> bool {
        matches!(self, Self::Start | Self::Forward | Self::Backward)
    }
}

/// The heads-architecture CPU
#[derive(Debug, Clone)]
pub struct HeadsCpu {
    inst_set: Arc<InstSet<HeadsCpu>>,
    config: Arc<HardwareConfig>,
    info: OrganismInfo,
    genome: Genome,
    memory: InstMemory,
    global_stack: Stack,
    threads: Vec<Thread>,
    thread_id_chart: u64,
    cur_thread: usize,
    cycle_count: u64,
    waiting_threads: usize,
    advance_ip: bool,
    executing: bool,
    mal_active: bool,
    alloc_base: usize,
    necro: Vec<Instruction>,
    stats: HardwareStats,
}

impl HeadsCpu {
    /// Build an engine for `genome`.
    ///
    /// # Errors
    /// Rejects an invalid configuration and genomes outside the configured
    /// length bounds.
    pub fn new(
        genome: Genome,
        inst_set: Arc<InstSet<HeadsCpu>>,
        config: Arc<HardwareConfig>,
        info: OrganismInfo,
    ) -> Result<Self> {
        config.validate()?;
        genome.check_len(config.min_genome_len, config.max_genome_len)?;
        genome.check_against(&inst_set);

        let stats = HardwareStats::new(inst_set.len());
        let mut cpu = Self {
            global_stack: Stack::new(config.stack_size),
            inst_set,
            config,
            info,
            genome,
            memory: InstMemory::new(),
            threads: Vec::new(),
            thread_id_chart: 0,
            cur_thread: 0,
            cycle_count: 0,
            waiting_threads: 0,
            advance_ip: true,
            executing: true,
            mal_active: false,
            alloc_base: 0,
            necro: Vec::new(),
            stats,
        };
        cpu.reset_state();
        Ok(cpu)
    }

    fn reset_state(&mut self) {
        self.memory = InstMemory::from_insts(self.genome.insts().to_vec());
        self.global_stack = Stack::new(self.config.stack_size);
        self.threads = vec![self.new_thread(0)];
        self.thread_id_chart = 1;
        self.cur_thread = 0;
        self.cycle_count = 0;
        self.waiting_threads = 0;
        self.advance_ip = true;
        self.executing = true;
        self.mal_active = false;
        self.alloc_base = self.memory.len();
    }

    fn new_thread(&self, id: usize) -> Thread {
        Thread::new(id, self.config.stack_size, self.config.max_label_size)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn inst_set(&self) -> &Arc<InstSet<HeadsCpu>> {
        &self.inst_set
    }

    pub fn config(&self) -> &Arc<HardwareConfig> {
        &self.config
    }

    pub fn info(&self) -> OrganismInfo {
        self.info
    }

    pub fn cycle_count(&self) -> u64 {
        self.cycle_count
    }

    /// Index of the thread that runs (or last ran)
    pub fn cur_thread(&self) -> usize {
        self.cur_thread
    }

    pub fn threads(&self) -> &[Thread] {
        &self.threads
    }

    pub fn global_stack(&self) -> &Stack {
        &self.global_stack
    }

    /// Threads currently blocked on a wait condition
    pub fn waiting_threads(&self) -> usize {
        self.waiting_threads
    }

    /// Is child space allocated and not yet divided off?
    pub fn is_allocated(&self) -> bool {
        self.mal_active
    }

    /// Mutable head of the current thread; the position is normalized
    /// again before the next fetch
    pub fn head_mut(&mut self, role: HeadRole) -> &mut Head {
        self.threads[self.cur_thread].head_mut(role)
    }

    /// Write a real register of the current thread from outside, waking
    /// any thread waiting on it
    pub fn set_register(&mut self, reg: Register, value: DataValue) {
        self.store_reg(reg, value);
    }

    /// Stop execution (organism death)
    pub fn kill(&mut self) {
        self.executing = false;
    }

    pub fn reset_stats(&mut self) {
        self.stats = HardwareStats::new(self.inst_set.len());
    }

    // =========================================================================
    // Memory edits
    // =========================================================================

    /// Insert before `pos`, shifting every head at or past it
    pub fn insert_inst(&mut self, pos: usize, inst: Instruction) {
        let pos = pos.min(self.memory.len());
        self.memory.insert(pos, inst);
        let len = self.memory.len();
        let edit = pos as i32;
        for head in self.threads.iter_mut().flat_map(|t| t.heads_mut()) {
            if head.position() >= edit {
                head.jump(1, len);
            } else {
                head.adjust(len);
            }
        }
        if self.mal_active && pos <= self.alloc_base {
            self.alloc_base += 1;
        }
    }

    /// Remove the slot at `pos`, shifting every head past it
    pub fn remove_inst(&mut self, pos: usize) -> Option<Instruction> {
        let removed = self.memory.remove(pos)?;
        let len = self.memory.len();
        let edit = pos as i32;
        for head in self.threads.iter_mut().flat_map(|t| t.heads_mut()) {
            if head.position() > edit {
                head.jump(-1, len);
            } else {
                head.adjust(len);
            }
        }
        if self.mal_active && pos < self.alloc_base {
            self.alloc_base -= 1;
        }
        Some(removed)
    }

    fn adjust_heads(&mut self) {
        let len = self.memory.len();
        for head in self.threads.iter_mut().flat_map(|t| t.heads_mut()) {
            head.adjust(len);
        }
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    fn next_active_thread(&self) -> Option<usize> {
        let n = self.threads.len();
        (1..=n)
            .map(|k| (self.cur_thread + k) % n)
            .find(|&i| self.threads[i].is_active())
    }

    fn step_thread(&mut self, ctx: &mut Context<'_>) {
        self.advance_ip = true;
        let cur = self.cur_thread;
        let len = self.memory.len();
        self.threads[cur].ip_mut().adjust(len);
        let pos = self.threads[cur].ip().index();
        let inst = self.memory.get(pos);

        if self.threads[cur].capturing_label {
            if self.capture_label_nop(inst, pos) {
                return;
            }
            self.threads[cur].capturing_label = false;
        }

        self.memory.set_flag(pos, MemFlag::Executed);
        self.execute_inst(ctx, inst);

        if self.advance_ip && self.executing {
            let len = self.memory.len();
            if let Some(t) = self.threads.get_mut(self.cur_thread) {
                t.ip_mut().advance(len);
            }
        }
    }

    /// Store a nop into the pending label. False once the label is complete.
    fn capture_label_nop(&mut self, inst: Instruction, pos: usize) -> bool {
        let Some(nop) = self.inst_set.nop_mod(inst) else {
            return false;
        };
        let exe = self.config.max_label_exe_size;
        let len = self.memory.len();
        let t = &mut self.threads[self.cur_thread];
        if !t.next_label.push(nop) {
            return false;
        }
        if t.next_label.len() <= exe {
            self.memory.set_flag(pos, MemFlag::Executed);
        }
        t.ip_mut().advance(len);
        true
    }

    fn execute_inst(&mut self, ctx: &mut Context<'_>, inst: Instruction) -> bool {
        let prob_fail = self.inst_set.prob_fail(inst);
        if prob_fail > 0.0 && ctx.rng.gen::<f64>() < prob_fail {
            log::trace!("org {}: {} failed by chance", self.info.id, self.inst_set.inst_name(inst));
            self.stats.record(inst.op(), false);
            return false;
        }
        log::trace!(
            "org {} t{} @{}: {}",
            self.info.id,
            self.threads[self.cur_thread].id(),
            self.threads[self.cur_thread].ip().position(),
            self.inst_set.inst_name(inst)
        );
        let handler = self.inst_set.handler(inst);
        let ok = handler(self, ctx);
        self.stats.record(inst.op(), ok);
        ok
    }

    /// Record an organism-local fault. Never fatal.
    fn fault(&mut self, ctx: &mut Context<'_>, msg: &str) {
        self.stats.faults += 1;
        ctx.feedback
            .notify(&format!("organism {}: {}", self.info.id, msg));
    }

    // =========================================================================
    // Registers
    // =========================================================================

    fn cur(&self) -> &Thread {
        &self.threads[self.cur_thread]
    }

    fn cur_mut(&mut self) -> &mut Thread {
        &mut self.threads[self.cur_thread]
    }

    /// Read a register of the current thread, computing virtual ones
    fn reg_value(&mut self, reg: Register, ctx: &mut Context<'_>) -> DataValue {
        let Some(kind) = reg.virtual_kind() else {
            return self.cur().reg(reg);
        };
        let value = match kind {
            VirtualRegister::Random => ctx.rng.gen_range(0..i32::MAX),
            VirtualRegister::Cycle => self.cycle_count as i32,
            VirtualRegister::Sense => ctx.environment.sense_resource(0),
            VirtualRegister::Cell => ctx.environment.read_faced_cell(),
            VirtualRegister::Threads => self.threads.len() as i32,
        };
        DataValue::new(value, self.cycle_count, kind.source())
    }

    fn store_reg(&mut self, reg: Register, value: DataValue) {
        if !reg.is_real() {
            return;
        }
        self.cur_mut().store(reg, value);
        if self.waiting_threads > 0 {
            self.check_waiting_threads(self.cur_thread, reg);
        }
    }

    /// Fresh value with explicit provenance
    fn set_reg(&mut self, reg: Register, value: i32, source: ValueSource) {
        let v = DataValue::new(value, self.cycle_count, source);
        self.store_reg(reg, v);
    }

    /// Value derived from one operand
    fn set_reg_from(&mut self, reg: Register, value: i32, src: &DataValue) {
        let v = DataValue::derived(value, self.cycle_count, src);
        self.store_reg(reg, v);
    }

    /// Value derived from two operands
    fn set_reg_merged(&mut self, reg: Register, value: i32, a: &DataValue, b: &DataValue) {
        let v = DataValue::merged(value, self.cycle_count, a, b);
        self.store_reg(reg, v);
    }

    /// Wake every other thread whose wait condition `reg` in `setter` now
    /// satisfies. Woken threads receive the value and may wake others.
    fn check_waiting_threads(&mut self, setter: usize, reg: Register) {
        let src = self.threads[setter].reg(reg);
        for i in 0..self.threads.len() {
            if i == setter {
                continue;
            }
            let Some(cond) = self.threads[i].wait_condition().copied() else {
                continue;
            };
            if !cond.is_met_by(reg, src.value) {
                continue;
            }
            let woken = DataValue::derived(src.value, self.cycle_count, &src);
            let t = &mut self.threads[i];
            t.state = ThreadState::Active;
            t.store(cond.dst, woken);
            self.waiting_threads -= 1;
            log::trace!("org {}: thread {} woken by {}", self.info.id, t.id(), reg);
            if self.waiting_threads > 0 {
                self.check_waiting_threads(i, cond.dst);
            }
        }
    }

    // =========================================================================
    // Modifiers and labels
    // =========================================================================

    /// Consume the nop after the IP, if there is one
    fn next_nop_mod(&mut self) -> Option<u8> {
        let next = self.cur().ip().next_inst(&self.memory);
        let nop = self.inst_set.nop_mod(next)?;
        let len = self.memory.len();
        let t = &mut self.threads[self.cur_thread];
        t.ip_mut().advance(len);
        self.memory.set_flag(t.ip().index(), MemFlag::Executed);
        Some(nop)
    }

    fn find_modified_register(&mut self, default: Register) -> Register {
        self.next_nop_mod().map(Register).unwrap_or(default)
    }

    fn find_modified_head(&mut self, default: HeadRole) -> HeadRole {
        match self.next_nop_mod() {
            Some(m) if (m as usize) < NUM_HEADS => HeadRole::from_id(m as usize),
            _ => default,
        }
    }

    /// Read the nops following the IP into the current thread's label
    fn read_label(&mut self) {
        let max = self.config.max_label_size;
        let exe = self.config.max_label_exe_size;
        let len = self.memory.len();
        let cur = self.cur_thread;
        self.threads[cur].next_label.clear();
        while self.threads[cur].next_label.len() < max {
            let next = self.threads[cur].ip().next_inst(&self.memory);
            let Some(nop) = self.inst_set.nop_mod(next) else {
                break;
            };
            let t = &mut self.threads[cur];
            t.ip_mut().advance(len);
            t.next_label.push(nop);
            if t.next_label.len() <= exe {
                self.memory.set_flag(t.ip().index(), MemFlag::Executed);
            }
        }
    }

    /// Do the nops starting at `pos` spell out `label`?
    fn label_matches_at(&self, pos: usize, label: &Label) -> bool {
        label.nops().iter().enumerate().all(|(k, &nop)| {
            pos + k < self.memory.len() && self.inst_set.nop_mod(self.memory.get(pos + k)) == Some(nop)
        })
    }

    /// Is `pos..pos + n` a complete run of nops, bounded by non-nops or the
    /// ends of memory?
    fn is_whole_run(&self, pos: usize, n: usize) -> bool {
        let len = self.memory.len();
        let is_nop = |p: usize| self.inst_set.is_nop(self.memory.get(p));
        (pos == 0 || !is_nop(pos - 1)) && (pos + n >= len || !is_nop(pos + n))
    }

    /// Position of the last nop of the first match, if any. `ip` sits on
    /// the last nop of the searching instruction's own label.
    fn find_label(&self, label: &Label, scan: LabelScan, ip: usize) -> Option<usize> {
        if label.is_empty() {
            return None;
        }
        let len = self.memory.len();
        let n = label.len();
        let anchored = |p: usize| self.inst_set.is_label(self.memory.get(p)) && self.label_matches_at(p + 1, label);
        let whole = |p: usize| self.is_whole_run(p, n) && self.label_matches_at(p, label);
        // The searching instruction's own label run is never a match
        let origin = ip.saturating_sub(n);
        match scan {
            LabelScan::NopRun => (0..len).find(|&p| self.label_matches_at(p, label)).map(|p| p + n - 1),
            LabelScan::Start => (0..len).find(|&p| anchored(p)).map(|p| p + n),
            LabelScan::Forward => (ip.saturating_add(1)..len).find(|&p| anchored(p)).map(|p| p + n),
            LabelScan::Backward => (0..ip.min(len)).rev().find(|&p| anchored(p)).map(|p| p + n),
            LabelScan::SeqStart => (0..len).find(|&p| p != origin + 1 && whole(p)).map(|p| p + n - 1),
            LabelScan::SeqForward => (ip.saturating_add(1)..len).find(|&p| whole(p)).map(|p| p + n - 1),
            LabelScan::SeqBackward => (0..origin.min(len))
                .rev()
                .find(|&p| p + n <= origin && whole(p))
                .map(|p| p + n - 1),
        }
    }
}

impl Hardware for HeadsCpu {
    fn reset(&mut self) {
        self.reset_state();
    }

    fn single_process(&mut self, ctx: &mut Context<'_>) -> bool {
        if !self.executing {
            return false;
        }
        self.cycle_count += 1;
        self.stats.cycles += 1;

        match self.config.thread_slicing {
            ThreadSlicing::RoundRobin => match self.next_active_thread() {
                Some(t) => {
                    self.cur_thread = t;
                    self.step_thread(ctx);
                }
                None => log::trace!("org {}: every thread is waiting", self.info.id),
            },
            ThreadSlicing::Parallel => {
                // Threads born this cycle start running next cycle
                let slots = self.threads.len();
                for i in 0..slots {
                    if !self.executing || i >= self.threads.len() {
                        break;
                    }
                    if self.threads[i].is_active() {
                        self.cur_thread = i;
                        self.step_thread(ctx);
                    }
                }
            }
        }
        self.executing
    }

    fn process_bonus_inst(&mut self, ctx: &mut Context<'_>, inst: Instruction) -> bool {
        if !self.executing {
            return false;
        }
        self.advance_ip = true;
        self.execute_inst(ctx, inst)
    }

    fn register(&self, reg: Register) -> DataValue {
        match reg.virtual_kind() {
            None => self.cur().reg(reg),
            Some(VirtualRegister::Cycle) => {
                DataValue::new(self.cycle_count as i32, self.cycle_count, ValueSource::Internal)
            }
            Some(VirtualRegister::Threads) => {
                DataValue::new(self.threads.len() as i32, self.cycle_count, ValueSource::Internal)
            }
            Some(_) => DataValue::default(),
        }
    }

    fn head(&self, role: HeadRole) -> Head {
        *self.cur().head(role)
    }

    fn memory(&self) -> &InstMemory {
        &self.memory
    }

    fn thread_count(&self) -> usize {
        self.threads.len()
    }

    fn is_executing(&self) -> bool {
        self.executing
    }

    fn point_mutate(&mut self, ctx: &mut Context<'_>, rate: f64) -> usize {
        let rate = if rate.is_finite() { rate.clamp(0.0, 1.0) } else { 0.0 };
        let count = mutation::point_mutations(&mut self.memory, &*self.inst_set, rate, ctx.rng);
        self.stats.mutations += count as u64;
        count
    }

    fn genome(&self) -> &Genome {
        &self.genome
    }

    fn stats(&self) -> &HardwareStats {
        &self.stats
    }
}

impl HeadsCpu {
    /// Stack the current thread is bound to
    fn stack_mut(&mut self) -> &mut Stack {
        let cur = self.cur_thread;
        match self.threads[cur].cur_stack {
            StackSelect::Local => &mut self.threads[cur].stack,
            StackSelect::Global => &mut self.global_stack,
        }
    }
}
