//! Thread lifecycle and register waits

use super::HeadsCpu;
use crate::config::MAX_THREADS_LIMIT;
use crate::vm::context::Context;
use crate::vm::head::HeadRole;
use crate::vm::register::{Register, ValueSource};
use crate::vm::thread::{Thread, ThreadState, WaitComparison, WaitCondition};

impl HeadsCpu {
    /// Lowest id not in use
    fn free_thread_id(&self) -> Option<usize> {
        (0..MAX_THREADS_LIMIT).find(|&id| self.thread_id_chart & (1u64 << id) == 0)
    }

    fn add_thread(&mut self, thread: Thread) {
        self.thread_id_chart |= 1u64 << thread.id();
        self.threads.push(thread);
    }

    fn thread_capacity_left(&self) -> bool {
        self.threads.len() < self.config.max_threads
    }

    /// Duplicate the current thread. The IP is moved past the fork first, so
    /// the new thread runs the next instruction and the issuer skips it.
    pub(crate) fn inst_fork_thread(&mut self, ctx: &mut Context<'_>) -> bool {
        let len = self.memory.len();
        self.cur_mut().ip_mut().advance(len);
        let id = match self.free_thread_id() {
            Some(id) if self.thread_capacity_left() => id,
            _ => {
                self.fault(ctx, "fork-thread: thread limit reached");
                return true;
            }
        };
        let forked = self.cur().fork(id);
        self.add_thread(forked);
        true
    }

    /// Start a fresh thread whose IP sits at the chosen head (flow)
    pub(crate) fn inst_thread_create(&mut self, ctx: &mut Context<'_>) -> bool {
        let role = self.find_modified_head(HeadRole::Flow);
        let id = match self.free_thread_id() {
            Some(id) if self.thread_capacity_left() => id,
            _ => {
                self.fault(ctx, "thread-create: thread limit reached");
                return false;
            }
        };
        let start = self.cur().head(role).position();
        let len = self.memory.len();
        let mut thread = self.new_thread(id);
        thread.ip_mut().set(start, len);
        self.add_thread(thread);
        true
    }

    /// Remove the current thread. The last thread exiting stops the organism.
    pub(crate) fn inst_exit_thread(&mut self, _ctx: &mut Context<'_>) -> bool {
        self.advance_ip = false;
        if self.threads.len() == 1 {
            self.executing = false;
            return true;
        }
        let cur = self.cur_thread;
        let gone = self.threads.swap_remove(cur);
        self.thread_id_chart &= !(1u64 << gone.id());
        let n = self.threads.len();
        // The thread swapped into `cur` runs next.
        self.cur_thread = (cur + n - 1) % n;
        true
    }

    pub(crate) fn inst_id_thread(&mut self, _ctx: &mut Context<'_>) -> bool {
        let reg = self.find_modified_register(Register::BX);
        let id = self.cur().id() as i32;
        self.set_reg(reg, id, ValueSource::Internal);
        true
    }

    /// Block until another thread's register (DX) compares against the
    /// value in BX. The satisfying value lands in the register named by the
    /// wait-value modifier.
    fn wait_on(&mut self, ctx: &mut Context<'_>, cmp: WaitComparison) -> bool {
        let wait_value = self.find_modified_register(Register::BX);
        let check_reg = self.find_modified_register(Register::DX);
        let dst = self.find_modified_register(wait_value);
        let operand = self.reg_value(wait_value, ctx).value;

        let cur = self.cur_thread;
        let ready = self
            .threads
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != cur)
            .map(|(_, t)| t.reg(check_reg))
            .find(|v| cmp.holds(v.value, operand));
        if let Some(src) = ready {
            self.set_reg_from(dst, src.value, &src);
            return true;
        }

        self.cur_mut().state = ThreadState::Waiting(WaitCondition {
            reg: check_reg,
            cmp,
            operand,
            dst,
        });
        self.waiting_threads += 1;
        log::trace!(
            "org {}: thread {} waits for {} {} {}",
            self.info.id,
            self.cur().id(),
            check_reg,
            cmp,
            operand
        );
        true
    }

    pub(crate) fn inst_wait_equ(&mut self, ctx: &mut Context<'_>) -> bool {
        self.wait_on(ctx, WaitComparison::Equal)
    }

    pub(crate) fn inst_wait_less(&mut self, ctx: &mut Context<'_>) -> bool {
        self.wait_on(ctx, WaitComparison::Less)
    }

    pub(crate) fn inst_wait_gtr(&mut self, ctx: &mut Context<'_>) -> bool {
        self.wait_on(ctx, WaitComparison::Greater)
    }
}
