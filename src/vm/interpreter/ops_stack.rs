//! Stack and register shuffling

use super::HeadsCpu;
use crate::vm::context::Context;
use crate::vm::register::{Register, NUM_REGISTERS};

impl HeadsCpu {
    /// Pop the current stack into a register (BX); provenance travels along
    pub(crate) fn inst_pop(&mut self, _ctx: &mut Context<'_>) -> bool {
        let reg = self.find_modified_register(Register::BX);
        let value = self.stack_mut().pop();
        self.store_reg(reg, value);
        true
    }

    pub(crate) fn inst_push(&mut self, ctx: &mut Context<'_>) -> bool {
        let reg = self.find_modified_register(Register::BX);
        let value = self.reg_value(reg, ctx);
        self.stack_mut().push(value);
        true
    }

    pub(crate) fn inst_swap_stk(&mut self, _ctx: &mut Context<'_>) -> bool {
        let t = self.cur_mut();
        t.cur_stack = t.cur_stack.toggled();
        true
    }

    /// Exchange a register (BX) with the one after it
    pub(crate) fn inst_swap(&mut self, ctx: &mut Context<'_>) -> bool {
        let op1 = self.find_modified_register(Register::BX);
        let op2 = op1.next();
        let a = self.reg_value(op1, ctx);
        let b = self.reg_value(op2, ctx);
        self.store_reg(op1, b);
        self.store_reg(op2, a);
        true
    }

    /// Real registers from the chosen one (AX) onward, wrapping
    fn register_ring(&mut self) -> Vec<Register> {
        let start = self.find_modified_register(Register::AX).index() % NUM_REGISTERS;
        (0..NUM_REGISTERS).map(|k| Register(((start + k) % NUM_REGISTERS) as u8)).collect()
    }

    /// Push all eight registers, starting at the chosen one (AX)
    pub(crate) fn inst_push_all(&mut self, _ctx: &mut Context<'_>) -> bool {
        for reg in self.register_ring() {
            let value = self.cur().reg(reg);
            self.stack_mut().push(value);
        }
        true
    }

    /// Pop into all eight registers, starting at the chosen one (AX)
    pub(crate) fn inst_pop_all(&mut self, _ctx: &mut Context<'_>) -> bool {
        for reg in self.register_ring() {
            let value = self.stack_mut().pop();
            self.store_reg(reg, value);
        }
        true
    }

    /// Exchange the tops of the local and global stacks
    pub(crate) fn inst_swap_stk_top(&mut self, _ctx: &mut Context<'_>) -> bool {
        let cur = self.cur_thread;
        let local = self.threads[cur].stack.pop();
        let global = self.global_stack.pop();
        self.threads[cur].stack.push(global);
        self.global_stack.push(local);
        true
    }
}
