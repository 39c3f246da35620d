//! Deterministic hardware double for host testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::RwLock;

use super::{HardwareAccess, Pin, PinDirection};
use crate::error::HardwareError;

/// Fixed/programmable readings a test can mutate mid-run. Temperature and
/// current are stored as bit patterns in `AtomicU64` so they can be updated
/// from another thread without a mutex.
pub struct MockHardware {
    digital: RwLock<HashMap<Pin, u8>>,
    directions: RwLock<HashMap<Pin, PinDirection>>,
    temperature_bits: AtomicU64,
    current_bits: AtomicU64,
    initialized: AtomicBool,
}

impl MockHardware {
    pub fn new() -> Self {
        MockHardware {
            digital: RwLock::new(HashMap::new()),
            directions: RwLock::new(HashMap::new()),
            temperature_bits: AtomicU64::new(0f64.to_bits()),
            current_bits: AtomicU64::new(0f64.to_bits()),
            initialized: AtomicBool::new(false),
        }
    }

    /// Builds a mock with fixed temperature/current values and all digital
    /// pins reading low, matching the "Healthy query" end-to-end scenario.
    pub fn with_readings(temperature_c: f64, current_a: f64) -> Self {
        let hw = MockHardware::new();
        hw.set_temperature(temperature_c);
        hw.set_current(current_a);
        hw
    }

    pub fn set_digital(&self, pin: Pin, level: u8) {
        self.digital.write().unwrap().insert(pin, level);
    }

    pub fn set_temperature(&self, celsius: f64) {
        self.temperature_bits.store(celsius.to_bits(), Ordering::Relaxed);
    }

    pub fn set_current(&self, amperes: f64) {
        self.current_bits.store(amperes.to_bits(), Ordering::Relaxed);
    }

    pub fn pin_direction(&self, pin: Pin) -> Option<PinDirection> {
        self.directions.read().unwrap().get(&pin).copied()
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl HardwareAccess for MockHardware {
    fn init(&self) -> Result<(), HardwareError> {
        self.initialized.store(true, Ordering::Release);
        Ok(())
    }

    fn read_digital(&self, pin: Pin) -> u8 {
        self.digital.read().unwrap().get(&pin).copied().unwrap_or(0)
    }

    fn configure_pin(&self, pin: Pin, direction: PinDirection) {
        self.directions.write().unwrap().insert(pin, direction);
    }

    fn write_digital(&self, pin: Pin, level: u8) {
        self.digital.write().unwrap().insert(pin, level);
    }

    fn read_current_bus(&self) -> f64 {
        f64::from_bits(self.current_bits.load(Ordering::Relaxed))
    }

    fn read_temperature_wire(&self, _pin: Pin) -> f64 {
        f64::from_bits(self.temperature_bits.load(Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_digital_pin_reads_zero() {
        let hw = MockHardware::new();
        assert_eq!(hw.read_digital(17), 0);
    }

    #[test]
    fn set_digital_is_observed_by_read() {
        let hw = MockHardware::new();
        hw.set_digital(17, 1);
        assert_eq!(hw.read_digital(17), 1);
    }

    #[test]
    fn init_is_idempotent() {
        let hw = MockHardware::new();
        assert!(hw.init().is_ok());
        assert!(hw.init().is_ok());
    }

    #[test]
    fn with_readings_sets_slow_cadence_values() {
        let hw = MockHardware::with_readings(35.2, 10.5);
        assert_eq!(hw.read_temperature_wire(4), 35.2);
        assert_eq!(hw.read_current_bus(), 10.5);
    }
}
