//! Register - register ids and provenance-carrying values
//!
//! ## Register ids
//!
//! ```text
//! 0-7   AX..HX   real registers, stored per thread
//! 8     RAND     random draw                (internal)
//! 9     CYCLE    engine cycle counter       (internal)
//! 10    SENSE    sensed resource 0          (sensor)
//! 11    CELL     faced-cell value           (sensor)
//! 12    THREADS  live thread count          (internal)
//! ```
//!
//! Virtual registers are computed on every read and never stored. Writes to
//! them are dropped.
//!
//! ## Provenance
//!
//! Every value remembers the cycle it was produced (`originated`), the oldest
//! cycle any of its inputs came from (`oldest_component`), and whether it or
//! any input came from the environment or a sensor.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of real registers per thread
pub const NUM_REGISTERS: usize = 8;

/// Number of virtual register ids after the real ones
pub const NUM_VIRTUAL_REGISTERS: usize = 5;

/// A register id (real or virtual)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Register(pub u8);

impl Register {
    pub const AX: Self = Self(0);
    pub const BX: Self = Self(1);
    pub const CX: Self = Self(2);
    pub const DX: Self = Self(3);
    pub const EX: Self = Self(4);
    pub const FX: Self = Self(5);
    pub const GX: Self = Self(6);
    pub const HX: Self = Self(7);

    pub const fn index(&self) -> usize {
        self.0 as usize
    }

    pub const fn is_real(&self) -> bool {
        (self.0 as usize) < NUM_REGISTERS
    }

    pub const fn is_virtual(&self) -> bool {
        !self.is_real()
    }

    /// Register following this one, cycling through the real registers
    pub const fn next(&self) -> Self {
        Self(((self.0 as usize + 1) % NUM_REGISTERS) as u8)
    }

    /// Virtual register kind, if this id names one
    pub const fn virtual_kind(&self) -> Option<VirtualRegister> {
        VirtualRegister::from_id(self.0 as usize)
    }

    pub fn name(&self) -> &'static str {
        const NAMES: [&str; NUM_REGISTERS] = ["AX", "BX", "CX", "DX", "EX", "FX", "GX", "HX"];
        match self.virtual_kind() {
            Some(v) => v.name(),
            None => NAMES.get(self.index()).copied().unwrap_or("??"),
        }
    }

    /// Parse "AX".."HX" or a virtual register name
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_uppercase();
        if s.len() == 2 && s.ends_with('X') {
            let c = s.as_bytes()[0];
            if (b'A'..=b'H').contains(&c) {
                return Some(Self(c - b'A'));
            }
        }
        VirtualRegister::TABLE
            .iter()
            .find(|v| v.name() == s)
            .map(|v| Self(*v as u8))
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl From<u8> for Register {
    fn from(id: u8) -> Self {
        Self(id)
    }
}

/// Computed registers, resolved by the engine on read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum VirtualRegister {
    Random = 8,
    Cycle = 9,
    Sense = 10,
    Cell = 11,
    Threads = 12,
}

impl VirtualRegister {
    pub const TABLE: [VirtualRegister; NUM_VIRTUAL_REGISTERS] = [
        VirtualRegister::Random,
        VirtualRegister::Cycle,
        VirtualRegister::Sense,
        VirtualRegister::Cell,
        VirtualRegister::Threads,
    ];

    pub const fn from_id(id: usize) -> Option<Self> {
        if id < NUM_REGISTERS || id >= NUM_REGISTERS + NUM_VIRTUAL_REGISTERS {
            return None;
        }
        Some(Self::TABLE[id - NUM_REGISTERS])
    }

    /// Provenance stamped onto values read from this register
    pub const fn source(self) -> ValueSource {
        match self {
            Self::Sense | Self::Cell => ValueSource::Sensor,
            Self::Random | Self::Cycle | Self::Threads => ValueSource::Internal,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Random => "RAND",
            Self::Cycle => "CYCLE",
            Self::Sense => "SENSE",
            Self::Cell => "CELL",
            Self::Threads => "THREADS",
        }
    }
}

/// Where a freshly produced value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ValueSource {
    #[default]
    Internal,
    Environment,
    Sensor,
}

/// A register value with provenance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DataValue {
    pub value: i32,
    pub originated: u64,
    pub oldest_component: u64,
    pub from_env: bool,
    pub env_component: bool,
    pub from_sensor: bool,
    pub sensor_component: bool,
}

impl DataValue {
    /// Fresh value with no inputs
    pub fn new(value: i32, cycle: u64, source: ValueSource) -> Self {
        let from_env = source == ValueSource::Environment;
        let from_sensor = source == ValueSource::Sensor;
        Self {
            value,
            originated: cycle,
            oldest_component: cycle,
            from_env,
            env_component: from_env,
            from_sensor,
            sensor_component: from_sensor,
        }
    }

    /// Value computed from a single operand
    pub fn derived(value: i32, cycle: u64, src: &DataValue) -> Self {
        Self {
            value,
            originated: cycle,
            oldest_component: src.oldest_component,
            from_env: false,
            env_component: src.env_component,
            from_sensor: false,
            sensor_component: src.sensor_component,
        }
    }

    /// Value computed from two operands
    pub fn merged(value: i32, cycle: u64, a: &DataValue, b: &DataValue) -> Self {
        Self {
            value,
            originated: cycle,
            oldest_component: a.oldest_component.min(b.oldest_component),
            from_env: false,
            env_component: a.env_component || b.env_component,
            from_sensor: false,
            sensor_component: a.sensor_component || b.sensor_component,
        }
    }

    /// Reset to zero with empty provenance
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn arb_value() -> impl Strategy<Value = DataValue> {
        (any::<i32>(), 0u64..1000, 0u64..1000, any::<bool>(), any::<bool>()).prop_map(
            |(value, a, b, env, sensor)| DataValue {
                value,
                originated: a.max(b),
                oldest_component: a.min(b),
                from_env: env,
                env_component: env,
                from_sensor: sensor,
                sensor_component: sensor,
            },
        )
    }

    #[test]
    fn test_register_names() {
        assert_eq!(Register::AX.to_string(), "AX");
        assert_eq!(Register::HX.to_string(), "HX");
        assert_eq!(Register(8).to_string(), "RAND");
        assert_eq!(Register(12).to_string(), "THREADS");
        assert_eq!(Register::parse("cx"), Some(Register::CX));
        assert_eq!(Register::parse("cycle"), Some(Register(9)));
        assert_eq!(Register::parse("IX"), None);
    }

    #[test]
    fn test_next_register_wraps() {
        assert_eq!(Register::BX.next(), Register::CX);
        assert_eq!(Register::HX.next(), Register::AX);
        assert!(Register(9).next().is_real());
    }

    #[test]
    fn test_virtual_table() {
        assert_eq!(VirtualRegister::from_id(7), None);
        assert_eq!(VirtualRegister::from_id(8), Some(VirtualRegister::Random));
        assert_eq!(VirtualRegister::from_id(11), Some(VirtualRegister::Cell));
        assert_eq!(VirtualRegister::from_id(13), None);
        assert_eq!(VirtualRegister::Sense.source(), ValueSource::Sensor);
    }

    #[test]
    fn test_fresh_provenance() {
        let v = DataValue::new(5, 40, ValueSource::Environment);
        assert_eq!(v.originated, 40);
        assert_eq!(v.oldest_component, 40);
        assert!(v.from_env && v.env_component);
        assert!(!v.from_sensor);

        let d = DataValue::derived(6, 50, &v);
        assert_eq!(d.oldest_component, 40);
        assert!(!d.from_env);
        assert!(d.env_component);
    }

    #[test]
    fn test_merge_ignores_current_cycle() {
        let a = DataValue { oldest_component: 40, originated: 40, ..DataValue::default() };
        let b = DataValue { oldest_component: 30, originated: 35, env_component: true, ..DataValue::default() };
        let m = DataValue::merged(3, 5, &a, &b);
        assert_eq!(m.originated, 5);
        assert_eq!(m.oldest_component, 30);
        assert!(m.env_component);
        assert_eq!(DataValue::derived(3, 5, &a).oldest_component, 40);
    }

    proptest! {
        #[test]
        fn prop_merge_takes_min_and_or(a in arb_value(), b in arb_value(), cycle in 0u64..2000) {
            let m = DataValue::merged(1, cycle, &a, &b);
            prop_assert_eq!(m.originated, cycle);
            prop_assert_eq!(m.oldest_component, a.oldest_component.min(b.oldest_component));
            prop_assert_eq!(m.env_component, a.env_component || b.env_component);
            prop_assert_eq!(m.sensor_component, a.sensor_component || b.sensor_component);
            prop_assert!(!m.from_env && !m.from_sensor);
        }

        #[test]
        fn prop_derived_keeps_oldest(a in arb_value(), cycle in 0u64..2000) {
            let d = DataValue::derived(1, cycle, &a);
            prop_assert_eq!(d.oldest_component, a.oldest_component);
            prop_assert_eq!(d.env_component, a.env_component);
        }
    }
}
