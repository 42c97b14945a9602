//! Arithmetic and logic on registers
//!
//! Unary ops act on one register (BX). Binary ops read `op1` (the
//! destination, BX) and the register after it, and merge both operands'
//! provenance into the result.

use super::HeadsCpu;
use crate::vm::context::Context;
use crate::vm::register::{Register, ValueSource};
use rand::Rng;

impl HeadsCpu {
    fn unary(&mut self, ctx: &mut Context<'_>, op: fn(i32) -> i32) -> bool {
        let reg = self.find_modified_register(Register::BX);
        let src = self.reg_value(reg, ctx);
        self.set_reg_from(reg, op(src.value), &src);
        true
    }

    fn binary(&mut self, ctx: &mut Context<'_>, op: fn(i32, i32) -> Option<i32>, name: &str) -> bool {
        let dst = self.find_modified_register(Register::BX);
        let op1 = self.find_modified_register(dst);
        let op2 = self.find_modified_register(op1.next());
        let a = self.reg_value(op1, ctx);
        let b = self.reg_value(op2, ctx);
        match op(a.value, b.value) {
            Some(result) => {
                self.set_reg_merged(dst, result, &a, &b);
                true
            }
            None => {
                self.fault(ctx, &format!("{} of {} by {} is undefined", name, a.value, b.value));
                false
            }
        }
    }

    pub(crate) fn inst_shift_r(&mut self, ctx: &mut Context<'_>) -> bool {
        self.unary(ctx, |v| v >> 1)
    }

    pub(crate) fn inst_shift_l(&mut self, ctx: &mut Context<'_>) -> bool {
        self.unary(ctx, |v| v.wrapping_shl(1))
    }

    pub(crate) fn inst_inc(&mut self, ctx: &mut Context<'_>) -> bool {
        self.unary(ctx, |v| v.wrapping_add(1))
    }

    pub(crate) fn inst_dec(&mut self, ctx: &mut Context<'_>) -> bool {
        self.unary(ctx, |v| v.wrapping_sub(1))
    }

    pub(crate) fn inst_mult100(&mut self, ctx: &mut Context<'_>) -> bool {
        self.unary(ctx, |v| v.wrapping_mul(100))
    }

    pub(crate) fn inst_zero(&mut self, _ctx: &mut Context<'_>) -> bool {
        let reg = self.find_modified_register(Register::BX);
        self.set_reg(reg, 0, ValueSource::Internal);
        true
    }

    pub(crate) fn inst_one(&mut self, _ctx: &mut Context<'_>) -> bool {
        let reg = self.find_modified_register(Register::BX);
        self.set_reg(reg, 1, ValueSource::Internal);
        true
    }

    pub(crate) fn inst_rand(&mut self, ctx: &mut Context<'_>) -> bool {
        let reg = self.find_modified_register(Register::BX);
        let value = ctx.rng.gen_range(0..i32::MAX);
        self.set_reg(reg, value, ValueSource::Internal);
        true
    }

    pub(crate) fn inst_add(&mut self, ctx: &mut Context<'_>) -> bool {
        self.binary(ctx, |a, b| Some(a.wrapping_add(b)), "add")
    }

    pub(crate) fn inst_sub(&mut self, ctx: &mut Context<'_>) -> bool {
        self.binary(ctx, |a, b| Some(a.wrapping_sub(b)), "sub")
    }

    pub(crate) fn inst_mult(&mut self, ctx: &mut Context<'_>) -> bool {
        self.binary(ctx, |a, b| Some(a.wrapping_mul(b)), "mult")
    }

    /// Division by zero (and `i32::MIN / -1`) faults
    pub(crate) fn inst_div(&mut self, ctx: &mut Context<'_>) -> bool {
        self.binary(ctx, i32::checked_div, "div")
    }

    pub(crate) fn inst_mod(&mut self, ctx: &mut Context<'_>) -> bool {
        self.binary(ctx, i32::checked_rem, "mod")
    }

    pub(crate) fn inst_nand(&mut self, ctx: &mut Context<'_>) -> bool {
        self.binary(ctx, |a, b| Some(!(a & b)), "nand")
    }
}
