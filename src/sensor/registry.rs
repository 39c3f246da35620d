//! Unit registry: insertion-ordered, capacity-bounded, one entry per
//! monitored piece of equipment.

use super::health::SensorSnapshot;
use crate::error::RegisterError;

const MAX_UNIT_ID_LEN: usize = 31;

/// Configured at registration; sampling state is ephemeral and mutated only
/// by the acquisition thread and by [`MonitoredUnit::evaluate_and_reset`].
pub struct MonitoredUnit {
    pub unit_id: String,
    pub vib_pin: u32,
    pub sound_pin: u32,
    pub temp_pin: u32,

    pub vib_pulse_count: u64,
    pub sound_high_samples: u64,
    pub total_samples: u64,

    pub last_temperature_c: f64,
    pub last_current_a: f64,
}

impl MonitoredUnit {
    fn new(unit_id: String, vib_pin: u32, sound_pin: u32, temp_pin: u32) -> Self {
        MonitoredUnit {
            unit_id,
            vib_pin,
            sound_pin,
            temp_pin,
            vib_pulse_count: 0,
            sound_high_samples: 0,
            total_samples: 0,
            last_temperature_c: 0.0,
            last_current_a: 0.0,
        }
    }

    /// Normalizes the fast-cadence counters into a snapshot and resets them,
    /// retaining the slow-cadence values.
    pub fn evaluate_and_reset(&mut self) -> SensorSnapshot {
        let vib = if self.total_samples > 0 {
            self.vib_pulse_count as f64 * (1000.0 / self.total_samples as f64)
        } else {
            0.0
        };
        let snd = if self.total_samples > 0 {
            self.sound_high_samples as f64 * 100.0 / self.total_samples as f64
        } else {
            0.0
        };

        let snapshot = SensorSnapshot {
            vibration_level: vib,
            sound_level: snd,
            temperature_c: self.last_temperature_c,
            current_a: self.last_current_a,
            timestamp: super::now_wall_clock(),
        };

        self.vib_pulse_count = 0;
        self.sound_high_samples = 0;
        self.total_samples = 0;

        snapshot
    }
}

pub struct Registry {
    units: Vec<MonitoredUnit>,
    capacity: usize,
}

impl Registry {
    pub fn new(capacity: usize) -> Self {
        Registry {
            units: Vec::new(),
            capacity,
        }
    }

    pub fn register(
        &mut self,
        unit_id: &str,
        vib_pin: u32,
        sound_pin: u32,
        temp_pin: u32,
    ) -> Result<(), RegisterError> {
        if self.units.iter().any(|u| u.unit_id == unit_id) {
            return Err(RegisterError::Duplicate);
        }
        if self.units.len() >= self.capacity {
            return Err(RegisterError::Full);
        }
        let truncated: String = unit_id.chars().take(MAX_UNIT_ID_LEN).collect();
        self.units.push(MonitoredUnit::new(truncated, vib_pin, sound_pin, temp_pin));
        Ok(())
    }

    pub fn ids(&self) -> Vec<String> {
        self.units.iter().map(|u| u.unit_id.clone()).collect()
    }

    pub fn get_mut(&mut self, unit_id: &str) -> Option<&mut MonitoredUnit> {
        self.units.iter_mut().find(|u| u.unit_id == unit_id)
    }

    pub fn units_mut(&mut self) -> impl Iterator<Item = &mut MonitoredUnit> {
        self.units.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_rejected_by_byte_exact_comparison() {
        let mut reg = Registry::new(4);
        reg.register("Unit-A", 1, 2, 3).unwrap();
        assert_eq!(reg.register("Unit-A", 4, 5, 6), Err(RegisterError::Duplicate));
        // Trailing whitespace is significant.
        assert!(reg.register("Unit-A ", 4, 5, 6).is_ok());
    }

    #[test]
    fn unit_id_truncated_to_31_chars() {
        let mut reg = Registry::new(4);
        let long_id = "x".repeat(64);
        reg.register(&long_id, 1, 2, 3).unwrap();
        assert_eq!(reg.ids()[0].len(), MAX_UNIT_ID_LEN);
    }
}
