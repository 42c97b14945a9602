//! Hardware configuration
//!
//! One [`HardwareConfig`] is shared (read-only) by every engine in a run.
//! Serializes to JSON; see [`crate::loader::load_config`].

use crate::error::{HardwareError, Result};
use serde::{Deserialize, Serialize};

/// Hard limit on threads per organism (size of the thread id chart)
pub const MAX_THREADS_LIMIT: usize = 64;

/// How an organism's threads share its cycles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreadSlicing {
    /// One thread runs per cycle, in rotation
    #[default]
    RoundRobin,
    /// Every active thread runs once per cycle
    Parallel,
}

/// Where a divide splits memory into parent and child
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitPolicy {
    /// Child is `[write, end)`. A write head that wrapped to 0 splits at the
    /// start of allocated space.
    #[default]
    WriteHead,
    /// Parent keeps `[0, read)`, child is `[read, write)`; anything past the
    /// write head is discarded
    ReadWrite,
    /// Split memory in half
    Half,
    /// Child is the last `n` instructions
    Fixed(usize),
    /// Uniformly random split point
    Random,
}

/// What happens to the parent after a successful divide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DivideMethod {
    /// Parent continues with its state untouched
    KeepState,
    /// Parent restarts from scratch
    #[default]
    Reset,
    /// Only the dividing thread restarts
    ResetThread,
    /// Parent stops executing
    Terminate,
}

/// How freshly allocated memory is filled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocMethod {
    /// The instruction set's default instruction
    #[default]
    Default,
    /// Whatever the previous child left behind, then the default instruction
    Necro,
    /// Random instructions
    Random,
}

/// Mutation probabilities applied by the divide pipeline
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MutationRates {
    /// Per copied child site at divide: substitution
    pub copy: f64,
    /// Per child site at divide: substitution
    pub point: f64,
    /// Per child site at divide: insertion
    pub insert: f64,
    /// Per child site at divide: deletion
    pub delete: f64,
    /// Once per divide: one substitution in the child
    pub divide_sub: f64,
    /// Once per divide: one insertion in the child
    pub divide_ins: f64,
    /// Once per divide: one deletion in the child
    pub divide_del: f64,
    /// Per parent site at divide: substitution
    pub parent_point: f64,
}

impl Default for MutationRates {
    fn default() -> Self {
        Self {
            copy: 0.0075,
            point: 0.0,
            insert: 0.0,
            delete: 0.0,
            divide_sub: 0.0,
            divide_ins: 0.05,
            divide_del: 0.05,
            parent_point: 0.0,
        }
    }
}

impl MutationRates {
    /// All rates zero
    pub fn none() -> Self {
        Self {
            copy: 0.0,
            point: 0.0,
            insert: 0.0,
            delete: 0.0,
            divide_sub: 0.0,
            divide_ins: 0.0,
            divide_del: 0.0,
            parent_point: 0.0,
        }
    }

    fn named(&self) -> [(&'static str, f64); 8] {
        [
            ("copy", self.copy),
            ("point", self.point),
            ("insert", self.insert),
            ("delete", self.delete),
            ("divide_sub", self.divide_sub),
            ("divide_ins", self.divide_ins),
            ("divide_del", self.divide_del),
            ("parent_point", self.parent_point),
        ]
    }
}

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HardwareConfig {
    /// Threads an organism may run at once
    pub max_threads: usize,
    /// Capacity of each stack
    pub stack_size: usize,
    /// Longest label read after an instruction
    pub max_label_size: usize,
    /// Label nops within this prefix are flagged executed when read
    pub max_label_exe_size: usize,
    pub min_genome_len: usize,
    pub max_genome_len: usize,
    /// Parent and child may differ in size by at most this factor
    pub offspring_size_range: f64,
    /// Fraction of the child that must have been copied
    pub min_copied_fraction: f64,
    /// Fraction of the parent that must have been executed
    pub min_executed_fraction: f64,
    /// Divide refuses to run without a prior `h-alloc`
    pub require_allocate: bool,
    pub split_policy: SplitPolicy,
    pub divide_method: DivideMethod,
    pub alloc_method: AllocMethod,
    pub thread_slicing: ThreadSlicing,
    pub mutation: MutationRates,
}

impl Default for HardwareConfig {
    fn default() -> Self {
        Self {
            max_threads: 1,
            stack_size: 10,
            max_label_size: 10,
            max_label_exe_size: 1,
            min_genome_len: 8,
            max_genome_len: 2048,
            offspring_size_range: 2.0,
            min_copied_fraction: 0.5,
            min_executed_fraction: 0.5,
            require_allocate: true,
            split_policy: SplitPolicy::WriteHead,
            divide_method: DivideMethod::Reset,
            alloc_method: AllocMethod::Default,
            thread_slicing: ThreadSlicing::RoundRobin,
            mutation: MutationRates::default(),
        }
    }
}

impl HardwareConfig {
    /// Tight viability checks, no mutation.
    pub fn strict() -> Self {
        Self {
            offspring_size_range: 1.5,
            min_copied_fraction: 0.9,
            min_executed_fraction: 0.75,
            mutation: MutationRates::none(),
            ..Self::default()
        }
    }

    /// Every viability floor disabled, full threading, no mutation.
    pub fn permissive() -> Self {
        Self {
            max_threads: MAX_THREADS_LIMIT,
            min_genome_len: 1,
            max_genome_len: 1 << 16,
            offspring_size_range: 1e6,
            min_copied_fraction: 0.0,
            min_executed_fraction: 0.0,
            require_allocate: false,
            mutation: MutationRates::none(),
            ..Self::default()
        }
    }

    /// Reject inconsistent values.
    pub fn validate(&self) -> Result<()> {
        if self.max_threads == 0 || self.max_threads > MAX_THREADS_LIMIT {
            return Err(HardwareError::Config(format!(
                "max_threads {} outside [1, {}]",
                self.max_threads, MAX_THREADS_LIMIT
            )));
        }
        if self.stack_size == 0 {
            return Err(HardwareError::Config("stack_size must be positive".into()));
        }
        if self.max_label_size == 0 {
            return Err(HardwareError::Config("max_label_size must be positive".into()));
        }
        if self.min_genome_len == 0 || self.min_genome_len > self.max_genome_len {
            return Err(HardwareError::Config(format!(
                "genome length bounds [{}, {}] are inconsistent",
                self.min_genome_len, self.max_genome_len
            )));
        }
        if !(self.offspring_size_range >= 1.0) {
            return Err(HardwareError::Config(format!(
                "offspring_size_range {} must be at least 1",
                self.offspring_size_range
            )));
        }
        for (name, value) in [
            ("min_copied_fraction", self.min_copied_fraction),
            ("min_executed_fraction", self.min_executed_fraction),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(HardwareError::Config(format!("{} {} outside [0, 1]", name, value)));
            }
        }
        for (name, rate) in self.mutation.named() {
            if !(0.0..=1.0).contains(&rate) {
                return Err(HardwareError::Config(format!(
                    "mutation rate {} = {} outside [0, 1]",
                    name, rate
                )));
            }
        }
        if let SplitPolicy::Fixed(0) = self.split_policy {
            return Err(HardwareError::Config("fixed split of zero instructions".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_validate() {
        assert!(HardwareConfig::default().validate().is_ok());
        assert!(HardwareConfig::strict().validate().is_ok());
        assert!(HardwareConfig::permissive().validate().is_ok());
        assert_eq!(HardwareConfig::permissive().mutation, MutationRates::none());
    }

    #[test]
    fn test_validate_rejects() {
        let bad = [
            HardwareConfig { max_threads: 0, ..HardwareConfig::default() },
            HardwareConfig { max_threads: 65, ..HardwareConfig::default() },
            HardwareConfig { stack_size: 0, ..HardwareConfig::default() },
            HardwareConfig { min_genome_len: 50, max_genome_len: 10, ..HardwareConfig::default() },
            HardwareConfig { offspring_size_range: 0.5, ..HardwareConfig::default() },
            HardwareConfig { offspring_size_range: f64::NAN, ..HardwareConfig::default() },
            HardwareConfig { min_copied_fraction: 1.5, ..HardwareConfig::default() },
            HardwareConfig { split_policy: SplitPolicy::Fixed(0), ..HardwareConfig::default() },
            HardwareConfig {
                mutation: MutationRates { copy: -0.1, ..MutationRates::none() },
                ..HardwareConfig::default()
            },
        ];
        for cfg in bad {
            assert!(
                matches!(cfg.validate(), Err(HardwareError::Config(_))),
                "accepted {:?}",
                cfg
            );
        }
    }

    #[test]
    fn test_json_round_trip_and_defaults() {
        let cfg = HardwareConfig {
            split_policy: SplitPolicy::Fixed(12),
            thread_slicing: ThreadSlicing::Parallel,
            ..HardwareConfig::permissive()
        };
        let json = serde_json::to_string(&cfg).unwrap();
        let back: HardwareConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cfg);

        let partial: HardwareConfig =
            serde_json::from_str(r#"{ "max_threads": 4, "divide_method": "terminate" }"#).unwrap();
        assert_eq!(partial.max_threads, 4);
        assert_eq!(partial.divide_method, DivideMethod::Terminate);
        assert_eq!(partial.stack_size, 10);
    }
}
