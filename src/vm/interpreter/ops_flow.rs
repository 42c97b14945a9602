//! Flow control: no-ops, conditionals, head movement, label search, jumps

use super::{HeadsCpu, LabelScan};
use crate::vm::context::Context;
use crate::vm::flags::MemFlag;
use crate::vm::head::HeadRole;
use crate::vm::register::{Register, ValueSource};

impl HeadsCpu {
    pub(crate) fn inst_nop(&mut self, _ctx: &mut Context<'_>) -> bool {
        true
    }

    /// Unknown opcodes land here
    pub(crate) fn inst_null(&mut self, _ctx: &mut Context<'_>) -> bool {
        self.stats.null_executions += 1;
        true
    }

    /// Start capturing the following nops into the thread's next label
    pub(crate) fn inst_label(&mut self, _ctx: &mut Context<'_>) -> bool {
        let t = self.cur_mut();
        t.next_label.clear();
        t.capturing_label = true;
        true
    }

    fn skip_next(&mut self) {
        let len = self.memory.len();
        self.cur_mut().ip_mut().advance(len);
    }

    fn if_compare(&mut self, ctx: &mut Context<'_>, holds: fn(i32, i32) -> bool) -> bool {
        let op1 = self.find_modified_register(Register::BX);
        let op2 = op1.next();
        let a = self.reg_value(op1, ctx).value;
        let b = self.reg_value(op2, ctx).value;
        if !holds(a, b) {
            self.skip_next();
        }
        true
    }

    fn if_zero_test(&mut self, ctx: &mut Context<'_>, holds: fn(i32) -> bool) -> bool {
        let reg = self.find_modified_register(Register::BX);
        let v = self.reg_value(reg, ctx).value;
        if !holds(v) {
            self.skip_next();
        }
        true
    }

    pub(crate) fn inst_if_n_equ(&mut self, ctx: &mut Context<'_>) -> bool {
        self.if_compare(ctx, |a, b| a != b)
    }

    pub(crate) fn inst_if_less(&mut self, ctx: &mut Context<'_>) -> bool {
        self.if_compare(ctx, |a, b| a < b)
    }

    pub(crate) fn inst_if_not_0(&mut self, ctx: &mut Context<'_>) -> bool {
        self.if_zero_test(ctx, |v| v != 0)
    }

    pub(crate) fn inst_if_equ_0(&mut self, ctx: &mut Context<'_>) -> bool {
        self.if_zero_test(ctx, |v| v == 0)
    }

    pub(crate) fn inst_if_gtr_0(&mut self, ctx: &mut Context<'_>) -> bool {
        self.if_zero_test(ctx, |v| v > 0)
    }

    pub(crate) fn inst_if_less_0(&mut self, ctx: &mut Context<'_>) -> bool {
        self.if_zero_test(ctx, |v| v < 0)
    }

    // =========================================================================
    // Heads
    // =========================================================================

    /// Move the chosen head (IP) to the flow head
    pub(crate) fn inst_mov_head(&mut self, _ctx: &mut Context<'_>) -> bool {
        let role = self.find_modified_head(HeadRole::Ip);
        let t = self.cur_mut();
        let flow = *t.head(HeadRole::Flow);
        t.head_mut(role).set_to(&flow);
        if role == HeadRole::Ip {
            self.advance_ip = false;
        }
        true
    }

    /// Move the chosen head (IP) by CX
    pub(crate) fn inst_jmp_head(&mut self, _ctx: &mut Context<'_>) -> bool {
        let role = self.find_modified_head(HeadRole::Ip);
        let offset = self.cur().reg(Register::CX).value;
        let len = self.memory.len();
        self.cur_mut().head_mut(role).jump(offset, len);
        true
    }

    /// CX = position of the chosen head (IP)
    pub(crate) fn inst_get_head(&mut self, _ctx: &mut Context<'_>) -> bool {
        let role = self.find_modified_head(HeadRole::Ip);
        let pos = self.cur().head(role).position();
        self.set_reg(Register::CX, pos, ValueSource::Internal);
        true
    }

    /// Flow head = value of the chosen register (CX)
    pub(crate) fn inst_set_flow(&mut self, ctx: &mut Context<'_>) -> bool {
        let reg = self.find_modified_register(Register::CX);
        let target = self.reg_value(reg, ctx).value;
        let len = self.memory.len();
        self.cur_mut().head_mut(HeadRole::Flow).set(target, len);
        true
    }

    /// Read the following label and skip the next instruction unless it
    /// equals (or complements) what the read head last passed over: the
    /// trailing nop run, or the nops right after a `label`.
    fn if_copied(&mut self, complement: bool, seq: bool) -> bool {
        self.read_label();
        let base = self.inst_set.num_nops() as u8;
        let t = self.cur_mut();
        if complement {
            t.next_label.rotate(1, base);
        }
        let read = if seq { &t.read_seq } else { &t.read_label };
        let matched = t.next_label.matches(read);
        if !matched {
            self.skip_next();
        }
        true
    }

    /// Skip the next instruction unless the last nops passed over by
    /// `h-copy` are the complement of the following label
    pub(crate) fn inst_if_label(&mut self, _ctx: &mut Context<'_>) -> bool {
        self.if_copied(true, true)
    }

    pub(crate) fn inst_if_copied_comp_label(&mut self, _ctx: &mut Context<'_>) -> bool {
        self.if_copied(true, false)
    }

    pub(crate) fn inst_if_copied_direct_label(&mut self, _ctx: &mut Context<'_>) -> bool {
        self.if_copied(false, false)
    }

    pub(crate) fn inst_if_copied_comp_seq(&mut self, _ctx: &mut Context<'_>) -> bool {
        self.if_copied(true, true)
    }

    pub(crate) fn inst_if_copied_direct_seq(&mut self, _ctx: &mut Context<'_>) -> bool {
        self.if_copied(false, true)
    }

    /// Number spelled by the following label: start at 1, nop-A doubles,
    /// nop-B adds one, nop-C negates
    fn label_value(&mut self) -> i32 {
        self.read_label();
        self.cur().next_label.nops().iter().fold(1i32, |v, &nop| match nop {
            0 => v.wrapping_mul(2),
            1 => v.wrapping_add(1),
            2 => v.wrapping_neg(),
            _ => v,
        })
    }

    /// Skip the next instruction unless BX > the label's value
    pub(crate) fn inst_if_gtr_x(&mut self, _ctx: &mut Context<'_>) -> bool {
        let x = self.label_value();
        if self.cur().reg(Register::BX).value <= x {
            self.skip_next();
        }
        true
    }

    /// Skip the next instruction unless BX == the label's value
    pub(crate) fn inst_if_equ_x(&mut self, _ctx: &mut Context<'_>) -> bool {
        let x = self.label_value();
        if self.cur().reg(Register::BX).value != x {
            self.skip_next();
        }
        true
    }

    // =========================================================================
    // Conditional jumps
    // =========================================================================

    /// Operands of a conditional head move: a register (BX) and the
    /// register named by the next modifier (the one after it)
    fn cond_operands(&mut self, ctx: &mut Context<'_>) -> (i32, i32) {
        let op1 = self.find_modified_register(Register::BX);
        let op2 = self.find_modified_register(op1.next());
        let a = self.reg_value(op1, ctx).value;
        let b = self.reg_value(op2, ctx).value;
        (a, b)
    }

    fn mov_head_if(&mut self, ctx: &mut Context<'_>, holds: fn(i32, i32) -> bool) -> bool {
        let (a, b) = self.cond_operands(ctx);
        let role = self.find_modified_head(HeadRole::Ip);
        if holds(a, b) {
            let t = self.cur_mut();
            let flow = *t.head(HeadRole::Flow);
            t.head_mut(role).set_to(&flow);
            if role == HeadRole::Ip {
                self.advance_ip = false;
            }
        }
        true
    }

    pub(crate) fn inst_mov_head_if_n_equ(&mut self, ctx: &mut Context<'_>) -> bool {
        self.mov_head_if(ctx, |a, b| a != b)
    }

    pub(crate) fn inst_mov_head_if_less(&mut self, ctx: &mut Context<'_>) -> bool {
        self.mov_head_if(ctx, |a, b| a < b)
    }

    /// Jump to the end of the `label`-anchored complement of the following
    /// label; execution resumes after it. No match falls through.
    fn goto_label(&mut self, taken: bool) -> bool {
        self.read_label();
        if !taken {
            return true;
        }
        let base = self.inst_set.num_nops() as u8;
        let label = self.cur().next_label.complement(base);
        let ip = self.cur().ip().index();
        if let Some(end) = self.find_label(&label, LabelScan::Start, ip) {
            self.mark_label_executed(end, label.len());
            let len = self.memory.len();
            self.cur_mut().ip_mut().set(end as i32, len);
        }
        true
    }

    pub(crate) fn inst_goto(&mut self, _ctx: &mut Context<'_>) -> bool {
        self.goto_label(true)
    }

    pub(crate) fn inst_goto_if_n_equ(&mut self, ctx: &mut Context<'_>) -> bool {
        let (a, b) = self.cond_operands(ctx);
        self.goto_label(a != b)
    }

    pub(crate) fn inst_goto_if_less(&mut self, ctx: &mut Context<'_>) -> bool {
        let (a, b) = self.cond_operands(ctx);
        self.goto_label(a < b)
    }

    // =========================================================================
    // Label search
    // =========================================================================

    /// Read the following label and move the flow head just past its match.
    /// BX = distance from the IP, CX = label size. No match leaves the flow
    /// head on the instruction after the IP. Only `label`-anchored matches
    /// are flagged executed.
    fn search_label(&mut self, complement: bool, scan: LabelScan) -> bool {
        self.read_label();
        if complement {
            let base = self.inst_set.num_nops() as u8;
            self.cur_mut().next_label.rotate(1, base);
        }
        let label = self.cur().next_label.clone();
        let ip = self.cur().ip().index();
        let found = self.find_label(&label, scan, ip);

        if let Some(end) = found {
            if scan.anchored() {
                self.mark_label_executed(end, label.len());
            }
        }

        let target = found.unwrap_or(ip);
        self.set_reg(Register::BX, target as i32 - ip as i32, ValueSource::Internal);
        self.set_reg(Register::CX, label.len() as i32, ValueSource::Internal);
        let len = self.memory.len();
        let flow = self.cur_mut().head_mut(HeadRole::Flow);
        flow.set(target as i32, len);
        flow.advance(len);
        true
    }

    /// Flag the `label` instruction and the leading nops of a found label
    fn mark_label_executed(&mut self, end: usize, size: usize) {
        let start = end + 1 - size;
        let exe = self.config.max_label_exe_size;
        self.memory.set_flag(start - 1, MemFlag::Executed);
        for pos in start..start + size.min(exe) {
            self.memory.set_flag(pos, MemFlag::Executed);
        }
    }

    pub(crate) fn inst_h_search(&mut self, _ctx: &mut Context<'_>) -> bool {
        self.search_label(true, LabelScan::NopRun)
    }

    pub(crate) fn inst_search_f(&mut self, _ctx: &mut Context<'_>) -> bool {
        self.search_label(true, LabelScan::Forward)
    }

    pub(crate) fn inst_search_b(&mut self, _ctx: &mut Context<'_>) -> bool {
        self.search_label(true, LabelScan::Backward)
    }

    pub(crate) fn inst_search_direct_s(&mut self, _ctx: &mut Context<'_>) -> bool {
        self.search_label(false, LabelScan::Start)
    }

    pub(crate) fn inst_search_direct_f(&mut self, _ctx: &mut Context<'_>) -> bool {
        self.search_label(false, LabelScan::Forward)
    }

    pub(crate) fn inst_search_direct_b(&mut self, _ctx: &mut Context<'_>) -> bool {
        self.search_label(false, LabelScan::Backward)
    }

    pub(crate) fn inst_search_seq_comp_s(&mut self, _ctx: &mut Context<'_>) -> bool {
        self.search_label(true, LabelScan::SeqStart)
    }

    pub(crate) fn inst_search_seq_comp_f(&mut self, _ctx: &mut Context<'_>) -> bool {
        self.search_label(true, LabelScan::SeqForward)
    }

    pub(crate) fn inst_search_seq_comp_b(&mut self, _ctx: &mut Context<'_>) -> bool {
        self.search_label(true, LabelScan::SeqBackward)
    }

    pub(crate) fn inst_search_seq_direct_s(&mut self, _ctx: &mut Context<'_>) -> bool {
        self.search_label(false, LabelScan::SeqStart)
    }

    pub(crate) fn inst_search_seq_direct_f(&mut self, _ctx: &mut Context<'_>) -> bool {
        self.search_label(false, LabelScan::SeqForward)
    }

    pub(crate) fn inst_search_seq_direct_b(&mut self, _ctx: &mut Context<'_>) -> bool {
        self.search_label(false, LabelScan::SeqBackward)
    }
}
