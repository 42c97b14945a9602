//! Division support - split points and viability checks
//!
//! A divide carves memory into three regions:
//!
//! ```text
//! [0, split)       parent keeps
//! [split, end)     child
//! [end, len)       discarded (unwritten allocation)
//! ```

use crate::config::{HardwareConfig, SplitPolicy};
use rand::{Rng, RngCore};
use thiserror::Error;

/// Where memory is cut for one divide
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DivideRegions {
    pub split: usize,
    pub end: usize,
}

impl DivideRegions {
    pub fn parent_size(&self) -> usize {
        self.split
    }

    pub fn child_size(&self) -> usize {
        self.end.saturating_sub(self.split)
    }
}

/// Head positions and allocation state a split policy may consult
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitInput {
    pub len: usize,
    pub read: usize,
    pub write: usize,
    /// Memory size before the active allocation, if any
    pub alloc_base: Option<usize>,
}

/// Apply `policy` to the current memory layout
pub fn split_regions(policy: SplitPolicy, input: SplitInput, rng: &mut dyn RngCore) -> DivideRegions {
    let len = input.len;
    let regions = match policy {
        SplitPolicy::WriteHead => match input.alloc_base {
            Some(base) => DivideRegions {
                split: base,
                end: if input.write > base { input.write } else { len },
            },
            None => DivideRegions { split: input.write, end: len },
        },
        SplitPolicy::ReadWrite => DivideRegions {
            split: input.read,
            end: if input.write == 0 { len } else { input.write },
        },
        SplitPolicy::Half => DivideRegions { split: len / 2, end: len },
        SplitPolicy::Fixed(n) => DivideRegions {
            split: len.saturating_sub(n),
            end: len,
        },
        SplitPolicy::Random => DivideRegions {
            split: if len > 1 { rng.gen_range(1..len) } else { 0 },
            end: len,
        },
    };
    DivideRegions {
        split: regions.split.min(len),
        end: regions.end.min(len).max(regions.split.min(len)),
    }
}

/// Why a divide was refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DivideFailure {
    #[error("divide requires a prior allocation")]
    NoAllocation,
    #[error("an allocation is already active")]
    AlreadyAllocated,
    #[error("offspring length {size} outside [{min}, {max}]")]
    ChildSize { size: usize, min: usize, max: usize },
    #[error("post-divide parent length {size} outside [{min}, {max}]")]
    ParentSize { size: usize, min: usize, max: usize },
    #[error("too few executed lines ({executed} < {required})")]
    TooFewExecuted { executed: usize, required: usize },
    #[error("too few copied lines ({copied} < {required})")]
    TooFewCopied { copied: usize, required: usize },
    #[error("allocation of {size} lines refused")]
    BadAllocation { size: usize },
}

/// Size and fraction limits for one organism
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViabilityLimits {
    pub min_size: usize,
    pub max_size: usize,
    pub min_copied_fraction: f64,
    pub min_executed_fraction: f64,
}

impl ViabilityLimits {
    /// Limits for an organism born with `genome_len` instructions
    pub fn new(config: &HardwareConfig, genome_len: usize) -> Self {
        let range = config.offspring_size_range;
        let min_size = config
            .min_genome_len
            .max((genome_len as f64 / range) as usize);
        let max_size = config
            .max_genome_len
            .min((genome_len as f64 * range) as usize);
        Self {
            min_size,
            max_size,
            min_copied_fraction: config.min_copied_fraction,
            min_executed_fraction: config.min_executed_fraction,
        }
    }

    /// Check the sizes of both halves and the copy/execute fractions
    pub fn check(
        &self,
        parent_size: usize,
        child_size: usize,
        executed: usize,
        copied: usize,
    ) -> Result<(), DivideFailure> {
        if child_size < self.min_size || child_size > self.max_size {
            return Err(DivideFailure::ChildSize {
                size: child_size,
                min: self.min_size,
                max: self.max_size,
            });
        }
        if parent_size < self.min_size || parent_size > self.max_size {
            return Err(DivideFailure::ParentSize {
                size: parent_size,
                min: self.min_size,
                max: self.max_size,
            });
        }
        let required = (parent_size as f64 * self.min_executed_fraction) as usize;
        if executed < required {
            return Err(DivideFailure::TooFewExecuted { executed, required });
        }
        let required = (child_size as f64 * self.min_copied_fraction) as usize;
        if copied < required {
            return Err(DivideFailure::TooFewCopied { copied, required });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn input(len: usize, read: usize, write: usize, alloc_base: Option<usize>) -> SplitInput {
        SplitInput { len, read, write, alloc_base }
    }

    #[test]
    fn test_write_head_split() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let r = split_regions(SplitPolicy::WriteHead, input(10, 0, 6, None), &mut rng);
        assert_eq!(r, DivideRegions { split: 6, end: 10 });
        assert_eq!(r.parent_size() + r.child_size(), 10);

        // Allocation: child runs from the base to the write head.
        let r = split_regions(SplitPolicy::WriteHead, input(30, 10, 20, Some(10)), &mut rng);
        assert_eq!(r, DivideRegions { split: 10, end: 20 });

        // Write head wrapped to the start: child takes the rest.
        let r = split_regions(SplitPolicy::WriteHead, input(20, 10, 0, Some(10)), &mut rng);
        assert_eq!(r, DivideRegions { split: 10, end: 20 });
    }

    #[test]
    fn test_other_policies() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert_eq!(
            split_regions(SplitPolicy::ReadWrite, input(30, 10, 0, None), &mut rng),
            DivideRegions { split: 10, end: 30 }
        );
        assert_eq!(
            split_regions(SplitPolicy::Half, input(11, 0, 0, None), &mut rng),
            DivideRegions { split: 5, end: 11 }
        );
        assert_eq!(
            split_regions(SplitPolicy::Fixed(4), input(10, 0, 0, None), &mut rng),
            DivideRegions { split: 6, end: 10 }
        );
        assert_eq!(
            split_regions(SplitPolicy::Fixed(40), input(10, 0, 0, None), &mut rng),
            DivideRegions { split: 0, end: 10 }
        );
        for _ in 0..20 {
            let r = split_regions(SplitPolicy::Random, input(10, 0, 0, None), &mut rng);
            assert!(r.split >= 1 && r.split < 10);
            assert_eq!(r.end, 10);
        }
    }

    #[test]
    fn test_end_never_before_split() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let r = split_regions(SplitPolicy::ReadWrite, input(10, 8, 3, None), &mut rng);
        assert_eq!(r.child_size(), 0);
        assert!(r.end >= r.split);
    }

    #[test]
    fn test_viability_limits() {
        let cfg = HardwareConfig {
            min_genome_len: 4,
            max_genome_len: 100,
            offspring_size_range: 2.0,
            min_copied_fraction: 0.5,
            min_executed_fraction: 0.5,
            ..HardwareConfig::default()
        };
        let limits = ViabilityLimits::new(&cfg, 20);
        assert_eq!(limits.min_size, 10);
        assert_eq!(limits.max_size, 40);

        assert!(limits.check(20, 20, 10, 10).is_ok());
        assert!(matches!(limits.check(20, 9, 20, 9), Err(DivideFailure::ChildSize { .. })));
        assert!(matches!(limits.check(41, 20, 41, 20), Err(DivideFailure::ParentSize { .. })));
        assert!(matches!(limits.check(20, 20, 9, 20), Err(DivideFailure::TooFewExecuted { .. })));
        assert!(matches!(limits.check(20, 20, 20, 9), Err(DivideFailure::TooFewCopied { .. })));
    }
}
