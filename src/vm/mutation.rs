//! Mutation operators
//!
//! Each operator works on an [`InstMemory`], draws from the shared generator,
//! flags what it touches and returns how many mutations it made. A rate of
//! zero draws nothing.

use super::flags::MemFlag;
use super::inst_set::InstSet;
use super::memory::InstMemory;
use rand::{Rng, RngCore};

fn hit(rng: &mut dyn RngCore, rate: f64) -> bool {
    rate > 0.0 && rng.gen_bool(rate.min(1.0))
}

fn mark(mem: &mut InstMemory, pos: usize, kind: MemFlag) {
    mem.set_flag(pos, MemFlag::Mutated);
    mem.set_flag(pos, kind);
}

/// Per-site substitution over slots flagged copied
pub fn copy_mutations<H>(
    mem: &mut InstMemory,
    set: &InstSet<H>,
    rate: f64,
    rng: &mut dyn RngCore,
) -> usize {
    if rate <= 0.0 {
        return 0;
    }
    let mut count = 0;
    for pos in 0..mem.len() {
        if mem.flag(pos, MemFlag::Copied) && hit(rng, rate) {
            mem.set(pos, set.random_inst(rng));
            mark(mem, pos, MemFlag::CopyMutated);
            count += 1;
        }
    }
    count
}

/// Per-site substitution over every slot
pub fn point_mutations<H>(
    mem: &mut InstMemory,
    set: &InstSet<H>,
    rate: f64,
    rng: &mut dyn RngCore,
) -> usize {
    if rate <= 0.0 {
        return 0;
    }
    let mut count = 0;
    for pos in 0..mem.len() {
        if hit(rng, rate) {
            mem.set(pos, set.random_inst(rng));
            mark(mem, pos, MemFlag::PointMutated);
            count += 1;
        }
    }
    count
}

/// Per-site insertion; each original site is tested once and the length
/// never exceeds `max_len`
pub fn insertions<H>(
    mem: &mut InstMemory,
    set: &InstSet<H>,
    rate: f64,
    max_len: usize,
    rng: &mut dyn RngCore,
) -> usize {
    if rate <= 0.0 {
        return 0;
    }
    let mut count = 0;
    let mut pos = 0;
    while pos < mem.len() {
        if mem.len() < max_len && hit(rng, rate) {
            mem.insert(pos, set.random_inst(rng));
            mem.set_flag(pos, MemFlag::Mutated);
            pos += 1;
            count += 1;
        }
        pos += 1;
    }
    count
}

/// Per-site deletion; each original site is tested once and the length
/// never drops below `min_len`
pub fn deletions(mem: &mut InstMemory, rate: f64, min_len: usize, rng: &mut dyn RngCore) -> usize {
    if rate <= 0.0 {
        return 0;
    }
    let mut count = 0;
    let mut pos = 0;
    while pos < mem.len() {
        if mem.len() > min_len && hit(rng, rate) {
            mem.remove(pos);
            count += 1;
        } else {
            pos += 1;
        }
    }
    count
}

/// At most one substitution at a random site
pub fn divide_substitution<H>(
    mem: &mut InstMemory,
    set: &InstSet<H>,
    rate: f64,
    rng: &mut dyn RngCore,
) -> usize {
    if mem.is_empty() || !hit(rng, rate) {
        return 0;
    }
    let pos = rng.gen_range(0..mem.len());
    mem.set(pos, set.random_inst(rng));
    mark(mem, pos, MemFlag::PointMutated);
    1
}

/// At most one insertion at a random site
pub fn divide_insertion<H>(
    mem: &mut InstMemory,
    set: &InstSet<H>,
    rate: f64,
    max_len: usize,
    rng: &mut dyn RngCore,
) -> usize {
    if mem.len() >= max_len || !hit(rng, rate) {
        return 0;
    }
    let pos = rng.gen_range(0..=mem.len());
    mem.insert(pos, set.random_inst(rng));
    mem.set_flag(pos, MemFlag::Mutated);
    1
}

/// At most one deletion at a random site
pub fn divide_deletion(mem: &mut InstMemory, rate: f64, min_len: usize, rng: &mut dyn RngCore) -> usize {
    if mem.is_empty() || mem.len() <= min_len || !hit(rng, rate) {
        return 0;
    }
    let pos = rng.gen_range(0..mem.len());
    mem.remove(pos);
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vm::dialects::heads;
    use crate::vm::instruction::Instruction;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn nops(n: usize) -> InstMemory {
        InstMemory::from_insts(vec![Instruction(0); n])
    }

    #[test]
    fn test_zero_rates_do_nothing() {
        let lib = heads::library().unwrap();
        let set = heads::default_inst_set(&lib).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut mem = nops(20);
        let before = mem.clone();
        assert_eq!(point_mutations(&mut mem, &set, 0.0, &mut rng), 0);
        assert_eq!(insertions(&mut mem, &set, 0.0, 100, &mut rng), 0);
        assert_eq!(deletions(&mut mem, 0.0, 0, &mut rng), 0);
        assert_eq!(divide_substitution(&mut mem, &set, 0.0, &mut rng), 0);
        assert_eq!(mem, before);
    }

    #[test]
    fn test_copy_mutations_only_touch_copied() {
        let lib = heads::library().unwrap();
        let set = heads::default_inst_set(&lib).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut mem = nops(10);
        for pos in 0..5 {
            mem.set_flag(pos, MemFlag::Copied);
        }
        let n = copy_mutations(&mut mem, &set, 1.0, &mut rng);
        assert_eq!(n, 5);
        assert_eq!(mem.count_flag(MemFlag::CopyMutated, 0, 5), 5);
        assert_eq!(mem.count_flag(MemFlag::Mutated, 5, 10), 0);
    }

    #[test]
    fn test_certain_point_mutation_flags_all() {
        let lib = heads::library().unwrap();
        let set = heads::default_inst_set(&lib).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut mem = nops(8);
        assert_eq!(point_mutations(&mut mem, &set, 1.0, &mut rng), 8);
        assert_eq!(mem.count_flag(MemFlag::PointMutated, 0, 8), 8);
        assert_eq!(mem.count_flag(MemFlag::Mutated, 0, 8), 8);
    }

    #[test]
    fn test_length_bounds_hold() {
        let lib = heads::library().unwrap();
        let set = heads::default_inst_set(&lib).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(4);

        let mut mem = nops(10);
        assert_eq!(insertions(&mut mem, &set, 1.0, 13, &mut rng), 3);
        assert_eq!(mem.len(), 13);
        assert_eq!(divide_insertion(&mut mem, &set, 1.0, 13, &mut rng), 0);

        let mut mem = nops(10);
        assert_eq!(deletions(&mut mem, 1.0, 7, &mut rng), 3);
        assert_eq!(mem.len(), 7);
        assert_eq!(divide_deletion(&mut mem, 1.0, 7, &mut rng), 0);
    }

    #[test]
    fn test_single_events() {
        let lib = heads::library().unwrap();
        let set = heads::default_inst_set(&lib).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut mem = nops(10);
        assert_eq!(divide_insertion(&mut mem, &set, 1.0, 100, &mut rng), 1);
        assert_eq!(mem.len(), 11);
        assert_eq!(divide_deletion(&mut mem, 1.0, 1, &mut rng), 1);
        assert_eq!(mem.len(), 10);
        assert_eq!(divide_substitution(&mut mem, &set, 1.0, &mut rng), 1);
        assert_eq!(mem.count_flag(MemFlag::PointMutated, 0, 10), 1);
    }
}
