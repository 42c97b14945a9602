//! Execution context and host-side interfaces
//!
//! The engine owns no external resources. Everything outside the organism
//! (randomness, diagnostics, the world it senses and writes to, the
//! population that receives its offspring) arrives through a [`Context`]
//! built by the host for each call into the engine.

use super::register::DataValue;
use crate::genome::Genome;
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Execution context passed to every engine call and instruction handler.
pub struct Context<'a> {
    /// Shared pseudo-random generator
    pub rng: &'a mut dyn RngCore,
    /// Error/warning sink
    pub feedback: &'a mut dyn Feedback,
    /// The organism's view of its surroundings
    pub environment: &'a mut dyn Environment,
    /// Receives offspring from successful divisions
    pub births: &'a mut dyn BirthMediator,
}

/// Diagnostic sink for organism-level events.
pub trait Feedback {
    fn error(&mut self, msg: &str);
    fn warning(&mut self, msg: &str);
    fn notify(&mut self, msg: &str);
}

/// Forwards feedback to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogFeedback;

impl Feedback for LogFeedback {
    fn error(&mut self, msg: &str) {
        log::error!("{}", msg);
    }

    fn warning(&mut self, msg: &str) {
        log::warn!("{}", msg);
    }

    fn notify(&mut self, msg: &str) {
        log::debug!("{}", msg);
    }
}

/// Keeps every message, for hosts that want to inspect them later.
#[derive(Debug, Default, Clone)]
pub struct CollectFeedback {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub notes: Vec<String>,
}

impl Feedback for CollectFeedback {
    fn error(&mut self, msg: &str) {
        self.errors.push(msg.to_string());
    }

    fn warning(&mut self, msg: &str) {
        self.warnings.push(msg.to_string());
    }

    fn notify(&mut self, msg: &str) {
        self.notes.push(msg.to_string());
    }
}

/// The organism-environment interface.
///
/// Defaults describe an empty world: no inputs, no resources, an empty cell.
pub trait Environment {
    /// Next task input value
    fn input(&mut self, _rng: &mut dyn RngCore) -> i32 {
        0
    }

    /// Submit an output value for task evaluation
    fn output(&mut self, _value: &DataValue) {}

    /// Quantity of a resource at the organism's location
    fn sense_resource(&mut self, _resource: i32) -> i32 {
        0
    }

    /// Value stored in the cell the organism faces
    fn read_faced_cell(&mut self) -> i32 {
        0
    }

    fn write_faced_cell(&mut self, _value: i32) {}
}

/// Environment with nothing in it
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEnvironment;

impl Environment for NullEnvironment {}

/// Environment backed by plain buffers.
///
/// Inputs are handed out in order and cycle once exhausted; outputs are
/// recorded with their provenance.
#[derive(Debug, Default, Clone)]
pub struct BufferEnvironment {
    pub inputs: Vec<i32>,
    pub next_input: usize,
    pub outputs: Vec<DataValue>,
    pub resources: Vec<i32>,
    pub faced_cell: i32,
}

impl BufferEnvironment {
    pub fn with_inputs(inputs: Vec<i32>) -> Self {
        Self {
            inputs,
            ..Self::default()
        }
    }
}

impl Environment for BufferEnvironment {
    fn input(&mut self, _rng: &mut dyn RngCore) -> i32 {
        if self.inputs.is_empty() {
            return 0;
        }
        let value = self.inputs[self.next_input % self.inputs.len()];
        self.next_input = (self.next_input + 1) % self.inputs.len();
        value
    }

    fn output(&mut self, value: &DataValue) {
        self.outputs.push(*value);
    }

    fn sense_resource(&mut self, resource: i32) -> i32 {
        usize::try_from(resource)
            .ok()
            .and_then(|idx| self.resources.get(idx).copied())
            .unwrap_or(0)
    }

    fn read_faced_cell(&mut self) -> i32 {
        self.faced_cell
    }

    fn write_faced_cell(&mut self, value: i32) {
        self.faced_cell = value;
    }
}

/// Identity of the organism running on an engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OrganismInfo {
    pub id: u64,
    pub group: i32,
    pub cell: i32,
}

/// Lineage metadata attached to an offspring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BirthInfo {
    pub parent_id: u64,
    pub group: i32,
    pub cell: i32,
    pub parent_len: usize,
    pub copied_size: usize,
    pub executed_size: usize,
    pub mutations: usize,
}

/// A successfully divided child
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offspring {
    pub genome: Genome,
    pub info: BirthInfo,
}

/// Receives offspring from successful divisions.
pub trait BirthMediator {
    /// Take ownership of a new child. Returns whether the parent keeps
    /// running; `false` stops the parent's execution.
    fn submit_offspring(&mut self, offspring: Offspring) -> bool;
}

/// Collects offspring into a vector
#[derive(Debug, Clone)]
pub struct BirthCollector {
    pub offspring: Vec<Offspring>,
    pub parent_survives: bool,
}

impl BirthCollector {
    pub fn new() -> Self {
        Self {
            offspring: Vec::new(),
            parent_survives: true,
        }
    }
}

impl Default for BirthCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl BirthMediator for BirthCollector {
    fn submit_offspring(&mut self, offspring: Offspring) -> bool {
        self.offspring.push(offspring);
        self.parent_survives
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vm::register::ValueSource;
    use rand::SeedableRng;

    #[test]
    fn test_buffer_environment_cycles_inputs() {
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(1);
        let mut env = BufferEnvironment::with_inputs(vec![3, 5]);
        assert_eq!(env.input(&mut rng), 3);
        assert_eq!(env.input(&mut rng), 5);
        assert_eq!(env.input(&mut rng), 3);
        env.output(&DataValue::new(8, 0, ValueSource::Internal));
        assert_eq!(env.outputs.len(), 1);
    }

    #[test]
    fn test_buffer_environment_resources_and_cell() {
        let mut env = BufferEnvironment {
            resources: vec![10, 20],
            ..BufferEnvironment::default()
        };
        assert_eq!(env.sense_resource(1), 20);
        assert_eq!(env.sense_resource(-1), 0);
        assert_eq!(env.sense_resource(9), 0);
        env.write_faced_cell(4);
        assert_eq!(env.read_faced_cell(), 4);
    }

    #[test]
    fn test_null_environment_is_empty() {
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(1);
        let mut env = NullEnvironment;
        assert_eq!(env.input(&mut rng), 0);
        assert_eq!(env.sense_resource(0), 0);
    }

    #[test]
    fn test_collect_feedback() {
        let mut fb = CollectFeedback::default();
        fb.warning("w");
        fb.error("e");
        assert_eq!(fb.warnings, vec!["w".to_string()]);
        assert_eq!(fb.errors.len(), 1);
        assert!(fb.notes.is_empty());
    }
}
