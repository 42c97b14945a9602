//! # Headcpu - Heads-Architecture Virtual CPU
//!
//! Execution engine for self-replicating digital organisms. Each organism's
//! genome is a sequence of instructions run on its own virtual CPU: eight
//! registers with value provenance, four heads over a resizable memory, a
//! local and a global stack, and cooperative threads.
//!
//! ## Core Components
//!
//! - **InstLib / InstSet**: named instruction handlers, numbered into an opcode table
//! - **HeadsCpu**: the engine; one cycle = one instruction per scheduled thread
//! - **Division pipeline**: split, count, mutate, check viability, emit offspring
//! - **Context**: everything outside the organism (randomness, environment, births)
//!
//! ## Design Principles
//!
//! - **Never halts on organism input**: bad opcodes, empty labels and stray
//!   heads degrade to well-defined defaults
//! - **Reproducible**: all randomness comes from the caller's generator
//! - **No globals**: libraries, sets and configs are plain values the host owns
//!
//! ## Example
//!
//! ```ignore
//! use headcpu::vm::dialects::heads;
//! use headcpu::{HeadsCpu, Hardware, HardwareConfig, Genome};
//!
//! let lib = heads::library()?;
//! let set = Arc::new(heads::default_inst_set(&lib)?);
//! let genome = Genome::parse_org(include_str!("ancestor.org"), &set)?;
//! let mut cpu = HeadsCpu::new(genome, set, Arc::new(HardwareConfig::default()), info)?;
//!
//! let mut ctx = Context { rng: &mut rng, feedback: &mut LogFeedback, environment: &mut env, births: &mut births };
//! cpu.run(&mut ctx, 1000);
//! ```

pub mod config;
pub mod error;
pub mod genome;
pub mod loader;
pub mod vm;

pub use config::{
    AllocMethod, DivideMethod, HardwareConfig, MutationRates, SplitPolicy, ThreadSlicing,
    MAX_THREADS_LIMIT,
};
pub use error::{HardwareError, LibraryError, Result};
pub use genome::Genome;
pub use vm::{
    // Engine
    Context, Hardware, HeadsCpu,
    // Instruction tables
    InstLib, InstSet, Instruction,
    // Host interfaces
    BirthCollector, BirthMediator, Environment, Feedback, LogFeedback, Offspring, OrganismInfo,
    // Observability
    HardwareStats,
};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Reproducible generator for a run
pub fn seeded_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}
