//! Observability counters
//!
//! Hosts poll these; the engine never pushes events.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardwareStats {
    /// Cycles granted to the organism
    pub cycles: u64,
    /// Successful executions per opcode
    pub exec_counts: Vec<u64>,
    /// Failed executions per opcode
    pub fail_counts: Vec<u64>,
    /// Executions of the null instruction (including unknown opcodes)
    pub null_executions: u64,
    /// Organism-local faults (recovered)
    pub faults: u64,
    pub divide_attempts: u64,
    pub divide_failures: u64,
    pub offspring: u64,
    /// Mutations applied by divides and point mutation
    pub mutations: u64,
    pub last_copied_size: usize,
    pub last_executed_size: usize,
    pub last_child_size: usize,
}

impl HardwareStats {
    pub fn new(num_insts: usize) -> Self {
        Self {
            exec_counts: vec![0; num_insts],
            fail_counts: vec![0; num_insts],
            ..Self::default()
        }
    }

    /// Tally one execution; opcodes outside the table are ignored
    pub fn record(&mut self, op: u8, success: bool) {
        let counts = if success {
            &mut self.exec_counts
        } else {
            &mut self.fail_counts
        };
        if let Some(c) = counts.get_mut(op as usize) {
            *c += 1;
        }
    }

    /// Total instructions executed, successful or not
    pub fn total_executed(&self) -> u64 {
        self.exec_counts.iter().sum::<u64>() + self.fail_counts.iter().sum::<u64>()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record() {
        let mut s = HardwareStats::new(3);
        s.record(1, true);
        s.record(1, true);
        s.record(2, false);
        s.record(200, true);
        assert_eq!(s.exec_counts, vec![0, 2, 0]);
        assert_eq!(s.fail_counts, vec![0, 0, 1]);
        assert_eq!(s.total_executed(), 3);
    }

    #[test]
    fn test_json() {
        let mut s = HardwareStats::new(2);
        s.cycles = 9;
        let json = s.to_json().unwrap();
        let back: HardwareStats = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }
}
