//! Heads dialect - instruction library for [`HeadsCpu`]
//!
//! Register modifiers: `nop-A`..`nop-H` address AX..HX, the virtual nops
//! address computed registers. Head modifiers reuse the first four nops
//! (A = IP, B = read, C = write, D = flow).
//!
//! [`DEFAULT_INST_SET`] is the classic 26-instruction heads set, in symbol
//! order `a`..`z`.

use crate::error::{LibraryError, Result};
use crate::vm::flags::InstFlags;
use crate::vm::inst_set::InstSet;
use crate::vm::interpreter::HeadsCpu;
use crate::vm::library::{InstClass, InstEntry, InstLib};

type E = InstEntry<HeadsCpu>;
use InstClass::*;

/// Null instruction; unknown opcodes dispatch here
pub const NULL_INST: &str = "nop-X";
/// Fills freshly allocated memory
pub const DEFAULT_INST: &str = "nop-A";

/// The classic heads instruction set
pub const DEFAULT_INST_SET: &str = "\
# Classic heads instruction set
INSTSET heads_default
INST nop-A
INST nop-B
INST nop-C
INST if-n-equ
INST if-less
INST if-label
INST mov-head
INST jmp-head
INST get-head
INST set-flow
INST shift-r
INST shift-l
INST inc
INST dec
INST push
INST pop
INST swap-stk
INST swap
INST add
INST sub
INST nand
INST h-copy
INST h-alloc
INST h-divide
INST IO
INST h-search
";

fn entries() -> Vec<E> {
    let reads_label = InstFlags::empty().with_reads_label();
    let divide = InstFlags::empty().with_divide();
    vec![
        // Nops
        E::new("nop-A", HeadsCpu::inst_nop, Nop, "no-op; modifier AX / IP").nop(0),
        E::new("nop-B", HeadsCpu::inst_nop, Nop, "no-op; modifier BX / read head").nop(1),
        E::new("nop-C", HeadsCpu::inst_nop, Nop, "no-op; modifier CX / write head").nop(2),
        E::new("nop-D", HeadsCpu::inst_nop, Nop, "no-op; modifier DX / flow head").nop(3),
        E::new("nop-E", HeadsCpu::inst_nop, Nop, "no-op; modifier EX").nop(4),
        E::new("nop-F", HeadsCpu::inst_nop, Nop, "no-op; modifier FX").nop(5),
        E::new("nop-G", HeadsCpu::inst_nop, Nop, "no-op; modifier GX").nop(6),
        E::new("nop-H", HeadsCpu::inst_nop, Nop, "no-op; modifier HX").nop(7),
        E::new("nop-rand", HeadsCpu::inst_nop, Nop, "no-op; modifier random register").nop(8),
        E::new("nop-cycle", HeadsCpu::inst_nop, Nop, "no-op; modifier cycle register").nop(9),
        E::new("nop-sense", HeadsCpu::inst_nop, Nop, "no-op; modifier sensor register").nop(10),
        E::new("nop-cell", HeadsCpu::inst_nop, Nop, "no-op; modifier faced-cell register").nop(11),
        E::new("nop-threads", HeadsCpu::inst_nop, Nop, "no-op; modifier thread-count register").nop(12),
        E::new(NULL_INST, HeadsCpu::inst_null, Nop, "null instruction"),
        E::new("label", HeadsCpu::inst_label, FlowControl, "capture following nops as the next label")
            .flags(InstFlags::empty().with_label()),
        // Conditionals
        E::new("if-n-equ", HeadsCpu::inst_if_n_equ, Conditional, "skip next if ?BX? == next register"),
        E::new("if-less", HeadsCpu::inst_if_less, Conditional, "skip next unless ?BX? < next register"),
        E::new("if-not-0", HeadsCpu::inst_if_not_0, Conditional, "skip next if ?BX? == 0"),
        E::new("if-equ-0", HeadsCpu::inst_if_equ_0, Conditional, "skip next if ?BX? != 0"),
        E::new("if-gtr-0", HeadsCpu::inst_if_gtr_0, Conditional, "skip next unless ?BX? > 0"),
        E::new("if-less-0", HeadsCpu::inst_if_less_0, Conditional, "skip next unless ?BX? < 0"),
        E::new("if-gtr-x", HeadsCpu::inst_if_gtr_x, Conditional, "skip next unless BX > value of label")
            .flags(reads_label),
        E::new("if-equ-x", HeadsCpu::inst_if_equ_x, Conditional, "skip next unless BX == value of label")
            .flags(reads_label),
        // Stack
        E::new("pop", HeadsCpu::inst_pop, Stack, "?BX? = pop current stack"),
        E::new("push", HeadsCpu::inst_push, Stack, "push ?BX? onto current stack"),
        E::new("swap-stk", HeadsCpu::inst_swap_stk, Stack, "toggle local / global stack"),
        E::new("swap", HeadsCpu::inst_swap, Stack, "swap ?BX? with next register"),
        E::new("push-all", HeadsCpu::inst_push_all, Stack, "push every register, from ?AX? on"),
        E::new("pop-all", HeadsCpu::inst_pop_all, Stack, "pop into every register, from ?AX? on"),
        E::new("swap-stk-top", HeadsCpu::inst_swap_stk_top, Stack, "exchange local and global stack tops"),
        // Arithmetic
        E::new("shift-r", HeadsCpu::inst_shift_r, Arithmetic, "?BX? >>= 1"),
        E::new("shift-l", HeadsCpu::inst_shift_l, Arithmetic, "?BX? <<= 1"),
        E::new("inc", HeadsCpu::inst_inc, Arithmetic, "?BX? += 1"),
        E::new("dec", HeadsCpu::inst_dec, Arithmetic, "?BX? -= 1"),
        E::new("zero", HeadsCpu::inst_zero, Arithmetic, "?BX? = 0"),
        E::new("one", HeadsCpu::inst_one, Arithmetic, "?BX? = 1"),
        E::new("rand", HeadsCpu::inst_rand, Arithmetic, "?BX? = random"),
        E::new("add", HeadsCpu::inst_add, Arithmetic, "?BX? = op1 + op2"),
        E::new("sub", HeadsCpu::inst_sub, Arithmetic, "?BX? = op1 - op2"),
        E::new("mult", HeadsCpu::inst_mult, Arithmetic, "?BX? = op1 * op2"),
        E::new("mult100", HeadsCpu::inst_mult100, Arithmetic, "?BX? *= 100"),
        E::new("div", HeadsCpu::inst_div, Arithmetic, "?BX? = op1 / op2; faults on zero"),
        E::new("mod", HeadsCpu::inst_mod, Arithmetic, "?BX? = op1 % op2; faults on zero"),
        E::new("nand", HeadsCpu::inst_nand, Arithmetic, "?BX? = !(op1 & op2)"),
        // Environment
        E::new("IO", HeadsCpu::inst_io, Environment, "output ?BX?, then ?BX? = next input"),
        E::new("input", HeadsCpu::inst_input, Environment, "?BX? = next input"),
        E::new("output", HeadsCpu::inst_output, Environment, "output ?BX?"),
        E::new("output-zero", HeadsCpu::inst_output_zero, Environment, "output ?BX?, then ?BX? = 0"),
        E::new("sense", HeadsCpu::inst_sense, Environment, "?BX? = amount of resource ?BX?"),
        E::new("read-cell", HeadsCpu::inst_read_cell, Environment, "?BX? = faced cell value"),
        E::new("write-cell", HeadsCpu::inst_write_cell, Environment, "faced cell = ?BX?"),
        // Replication
        E::new("h-alloc", HeadsCpu::inst_h_alloc, Replication, "allocate child space; AX = old size"),
        E::new("h-copy", HeadsCpu::inst_h_copy, Replication, "copy read head to write head, advance both"),
        E::new("h-read", HeadsCpu::inst_h_read, Replication, "BX = opcode at ?read head?, advance it"),
        E::new("h-write", HeadsCpu::inst_h_write, Replication, "write opcode BX at ?write head?, advance it"),
        E::new("h-divide", HeadsCpu::inst_h_divide, Replication, "divide off the child").flags(divide),
        E::new("repro", HeadsCpu::inst_repro, Replication, "copy the whole genome and divide").flags(divide),
        E::new("die", HeadsCpu::inst_die, Replication, "stop executing"),
        // Heads
        E::new("mov-head", HeadsCpu::inst_mov_head, FlowControl, "?IP? = flow head"),
        E::new("jmp-head", HeadsCpu::inst_jmp_head, FlowControl, "?IP? += CX"),
        E::new("get-head", HeadsCpu::inst_get_head, FlowControl, "CX = position of ?IP?"),
        E::new("set-flow", HeadsCpu::inst_set_flow, FlowControl, "flow head = ?CX?"),
        E::new("mov-head-if-n-equ", HeadsCpu::inst_mov_head_if_n_equ, FlowControl, "?IP? = flow head if ?BX? != ?CX?"),
        E::new("mov-head-if-less", HeadsCpu::inst_mov_head_if_less, FlowControl, "?IP? = flow head if ?BX? < ?CX?"),
        E::new("goto", HeadsCpu::inst_goto, FlowControl, "jump past the label-anchored complement label")
            .flags(reads_label),
        E::new("goto-if-n-equ", HeadsCpu::inst_goto_if_n_equ, FlowControl, "goto if ?BX? != ?CX?")
            .flags(reads_label),
        E::new("goto-if-less", HeadsCpu::inst_goto_if_less, FlowControl, "goto if ?BX? < ?CX?")
            .flags(reads_label),
        E::new("if-label", HeadsCpu::inst_if_label, Conditional, "skip next unless last copied nops are the complement")
            .flags(reads_label),
        E::new("if-copied-comp-label", HeadsCpu::inst_if_copied_comp_label, Conditional, "skip next unless last copied label is the complement")
            .flags(reads_label),
        E::new("if-copied-direct-label", HeadsCpu::inst_if_copied_direct_label, Conditional, "skip next unless last copied label matches")
            .flags(reads_label),
        E::new("if-copied-comp-seq", HeadsCpu::inst_if_copied_comp_seq, Conditional, "skip next unless last copied nops are the complement")
            .flags(reads_label),
        E::new("if-copied-direct-seq", HeadsCpu::inst_if_copied_direct_seq, Conditional, "skip next unless last copied nops match")
            .flags(reads_label),
        // Label search
        E::new("h-search", HeadsCpu::inst_h_search, FlowControl, "flow head past complement label (anywhere in a nop run)")
            .flags(reads_label),
        E::new("search-f", HeadsCpu::inst_search_f, FlowControl, "flow head past complement label, forward")
            .flags(reads_label),
        E::new("search-b", HeadsCpu::inst_search_b, FlowControl, "flow head past complement label, backward")
            .flags(reads_label),
        E::new("search-direct-s", HeadsCpu::inst_search_direct_s, FlowControl, "flow head past label, from start")
            .flags(reads_label),
        E::new("search-direct-f", HeadsCpu::inst_search_direct_f, FlowControl, "flow head past label, forward")
            .flags(reads_label),
        E::new("search-direct-b", HeadsCpu::inst_search_direct_b, FlowControl, "flow head past label, backward")
            .flags(reads_label),
        E::new("search-seq-comp-s", HeadsCpu::inst_search_seq_comp_s, FlowControl, "flow head past nop run equal to complement, from start")
            .flags(reads_label),
        E::new("search-seq-comp-f", HeadsCpu::inst_search_seq_comp_f, FlowControl, "flow head past nop run equal to complement, forward")
            .flags(reads_label),
        E::new("search-seq-comp-b", HeadsCpu::inst_search_seq_comp_b, FlowControl, "flow head past nop run equal to complement, backward")
            .flags(reads_label),
        E::new("search-seq-direct-s", HeadsCpu::inst_search_seq_direct_s, FlowControl, "flow head past nop run equal to label, from start")
            .flags(reads_label),
        E::new("search-seq-direct-f", HeadsCpu::inst_search_seq_direct_f, FlowControl, "flow head past nop run equal to label, forward")
            .flags(reads_label),
        E::new("search-seq-direct-b", HeadsCpu::inst_search_seq_direct_b, FlowControl, "flow head past nop run equal to label, backward")
            .flags(reads_label),
        // Threads
        E::new("fork-thread", HeadsCpu::inst_fork_thread, Thread, "duplicate this thread"),
        E::new("thread-create", HeadsCpu::inst_thread_create, Thread, "new thread starting at ?flow head?"),
        E::new("exit-thread", HeadsCpu::inst_exit_thread, Thread, "end this thread"),
        E::new("id-thread", HeadsCpu::inst_id_thread, Thread, "?BX? = thread id"),
        E::new("wait-equ", HeadsCpu::inst_wait_equ, Thread, "sleep until another thread's ?DX? == ?BX?"),
        E::new("wait-less", HeadsCpu::inst_wait_less, Thread, "sleep until another thread's ?DX? < ?BX?"),
        E::new("wait-gtr", HeadsCpu::inst_wait_gtr, Thread, "sleep until another thread's ?DX? > ?BX?"),
    ]
}

/// Build the heads instruction library
pub fn library() -> std::result::Result<InstLib<HeadsCpu>, LibraryError> {
    InstLib::build("heads", entries(), NULL_INST, DEFAULT_INST)
}

/// The classic 26-instruction set
pub fn default_inst_set(lib: &InstLib<HeadsCpu>) -> Result<InstSet<HeadsCpu>> {
    InstSet::parse(DEFAULT_INST_SET, lib)
}

/// Every instruction the library knows, in library order
pub fn full_inst_set(lib: &InstLib<HeadsCpu>) -> Result<InstSet<HeadsCpu>> {
    let names: Vec<&str> = lib.names().collect();
    InstSet::from_names("heads_full", lib, &names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vm::instruction::Instruction;

    #[test]
    fn test_library_builds() {
        let lib = library().unwrap();
        assert_eq!(lib.len(), 91);
        assert!(lib.null_entry().flags.null());
        assert_eq!(lib.default_entry().name, "nop-A");
        assert!(lib.get("h-divide").unwrap().flags.divide());
        assert!(lib.get("label").unwrap().flags.label());
        assert!(lib.get("h-search").unwrap().flags.reads_label());
        assert!(lib.get("goto-if-less").unwrap().flags.reads_label());
        assert!(!lib.get("h-read").unwrap().flags.reads_label());
    }

    #[test]
    fn test_default_set_symbols() {
        let lib = library().unwrap();
        let set = default_inst_set(&lib).unwrap();
        assert_eq!(set.name(), "heads_default");
        assert_eq!(set.len(), 26);
        assert_eq!(set.num_nops(), 3);
        assert_eq!(set.default_inst(), Instruction(0));
        assert_eq!(set.inst_of("h-copy").map(|i| i.symbol()), Some('v'));
        assert_eq!(set.inst_of("h-alloc").map(|i| i.symbol()), Some('w'));
        assert_eq!(set.inst_of("h-divide").map(|i| i.symbol()), Some('x'));
        assert_eq!(set.inst_of("h-search").map(|i| i.symbol()), Some('z'));
    }

    #[test]
    fn test_full_set() {
        let lib = library().unwrap();
        let set = full_inst_set(&lib).unwrap();
        assert_eq!(set.len(), lib.len());
        assert_eq!(set.num_nops(), 8);
        assert!(set.flags(set.inst_of(NULL_INST).unwrap()).null());
    }
}
