//! Environment I/O: task inputs and outputs, sensors, the faced cell

use super::HeadsCpu;
use crate::vm::context::Context;
use crate::vm::register::{DataValue, Register, ValueSource};

impl HeadsCpu {
    /// Output a register (BX), then replace it with the next input
    pub(crate) fn inst_io(&mut self, ctx: &mut Context<'_>) -> bool {
        let reg = self.find_modified_register(Register::BX);
        let out = self.reg_value(reg, ctx);
        ctx.environment.output(&out);
        let input = ctx.environment.input(ctx.rng);
        self.set_reg(reg, input, ValueSource::Environment);
        true
    }

    pub(crate) fn inst_input(&mut self, ctx: &mut Context<'_>) -> bool {
        let reg = self.find_modified_register(Register::BX);
        let input = ctx.environment.input(ctx.rng);
        self.set_reg(reg, input, ValueSource::Environment);
        true
    }

    pub(crate) fn inst_output(&mut self, ctx: &mut Context<'_>) -> bool {
        let reg = self.find_modified_register(Register::BX);
        let out = self.reg_value(reg, ctx);
        ctx.environment.output(&out);
        true
    }

    /// Output a register (BX), then clear it
    pub(crate) fn inst_output_zero(&mut self, ctx: &mut Context<'_>) -> bool {
        let reg = self.find_modified_register(Register::BX);
        let out = self.reg_value(reg, ctx);
        ctx.environment.output(&out);
        self.store_reg(reg, DataValue::default());
        true
    }

    /// Replace a resource id (BX) with the sensed quantity of that resource
    pub(crate) fn inst_sense(&mut self, ctx: &mut Context<'_>) -> bool {
        let reg = self.find_modified_register(Register::BX);
        let resource = self.reg_value(reg, ctx).value;
        let amount = ctx.environment.sense_resource(resource);
        self.set_reg(reg, amount, ValueSource::Sensor);
        true
    }

    pub(crate) fn inst_read_cell(&mut self, ctx: &mut Context<'_>) -> bool {
        let reg = self.find_modified_register(Register::BX);
        let value = ctx.environment.read_faced_cell();
        self.set_reg(reg, value, ValueSource::Sensor);
        true
    }

    pub(crate) fn inst_write_cell(&mut self, ctx: &mut Context<'_>) -> bool {
        let reg = self.find_modified_register(Register::BX);
        let value = self.reg_value(reg, ctx).value;
        ctx.environment.write_faced_cell(value);
        true
    }
}
