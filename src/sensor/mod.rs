//! `SensorEngine` — registry of monitored units plus the single background
//! acquisition thread that polls them.
//!
//! One mutex guards all shared state; the acquisition thread only ever
//! holds it for the duration of a single tick's counter updates, releasing
//! it across the inter-tick sleep.

mod health;
mod registry;

pub use health::{EquipmentHealth, HealthStatus, SensorSnapshot};
pub use registry::MonitoredUnit;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, SystemTime};

use log::{debug, info, warn};

use crate::config::HealthThresholds;
use crate::error::{HardwareError, RegisterError};
use crate::hardware::HardwareAccess;
use registry::Registry;

/// Fast-cadence tick period (~1 kHz).
const TICK_PERIOD: Duration = Duration::from_millis(1);
/// Every this-many-th tick, also refresh the slow-cadence (analog/bus) readings.
const SLOW_CADENCE_TICKS: u64 = 1000;

pub struct SensorEngine {
    registry: Mutex<Registry>,
    hardware: Arc<dyn HardwareAccess>,
    thresholds: HealthThresholds,
    running: Arc<AtomicBool>,
    acquisition: Mutex<Option<JoinHandle<()>>>,
}

impl SensorEngine {
    pub fn new(hardware: Arc<dyn HardwareAccess>, capacity: usize, thresholds: HealthThresholds) -> Arc<Self> {
        Arc::new(SensorEngine {
            registry: Mutex::new(Registry::new(capacity)),
            hardware,
            thresholds,
            running: Arc::new(AtomicBool::new(false)),
            acquisition: Mutex::new(None),
        })
    }

    /// Initializes hardware access and starts the acquisition thread.
    /// Idempotent: a second call is a no-op.
    pub fn init(self: &Arc<Self>) -> Result<(), HardwareError> {
        if self.running.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        if let Err(e) = self.hardware.init() {
            self.running.store(false, Ordering::Release);
            return Err(e);
        }

        let engine = self.clone();
        let handle = thread::spawn(move || engine.acquisition_loop());
        *self.acquisition.lock().unwrap_or_else(|e| e.into_inner()) = Some(handle);
        info!("sensor engine started");
        Ok(())
    }

    /// Signals the acquisition thread to stop and waits for it.
    pub fn shutdown(&self) {
        self.running.store(false, Ordering::Release);
        let handle = self
            .acquisition
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(handle) = handle {
            let _ = handle.join();
        }
        info!("sensor engine stopped");
    }

    pub fn register_unit(
        &self,
        unit_id: &str,
        vib_pin: u32,
        sound_pin: u32,
        temp_pin: u32,
    ) -> Result<(), RegisterError> {
        let mut reg = self.registry.lock().unwrap_or_else(|e| e.into_inner());
        reg.register(unit_id, vib_pin, sound_pin, temp_pin)
    }

    /// Insertion-order snapshot of registered unit ids.
    pub fn list_units(&self) -> Vec<String> {
        let reg = self.registry.lock().unwrap_or_else(|e| e.into_inner());
        reg.ids()
    }

    /// Evaluates and returns the unit's health, resetting its fast-cadence
    /// counters as a side effect. `None` for an unknown id.
    pub fn get_health(&self, unit_id: &str) -> Option<EquipmentHealth> {
        let mut reg = self.registry.lock().unwrap_or_else(|e| e.into_inner());
        let unit = reg.get_mut(unit_id)?;
        let snapshot = unit.evaluate_and_reset();
        let (status, message) = health::evaluate(&snapshot, &self.thresholds);
        Some(EquipmentHealth {
            unit_id: unit_id.to_string(),
            status,
            snapshot,
            message,
        })
    }

    fn acquisition_loop(&self) {
        let mut tick: u64 = 0;
        while self.running.load(Ordering::Acquire) {
            let refresh_slow = tick % SLOW_CADENCE_TICKS == 0;
            {
                let mut reg = self.registry.lock().unwrap_or_else(|e| e.into_inner());
                for unit in reg.units_mut() {
                    if self.hardware.read_digital(unit.vib_pin) == 1 {
                        unit.vib_pulse_count += 1;
                    }
                    if self.hardware.read_digital(unit.sound_pin) == 1 {
                        unit.sound_high_samples += 1;
                    }
                    unit.total_samples += 1;

                    if refresh_slow {
                        unit.last_temperature_c = self.hardware.read_temperature_wire(unit.temp_pin);
                        unit.last_current_a = self.hardware.read_current_bus();
                    }
                }
            }
            if refresh_slow && tick > 0 {
                debug!("slow-cadence refresh at tick {tick}");
            }
            tick = tick.wrapping_add(1);
            thread::sleep(TICK_PERIOD);
        }
    }
}

pub(crate) fn now_wall_clock() -> SystemTime {
    SystemTime::now()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::MockHardware;

    fn engine_with(hw: MockHardware) -> Arc<SensorEngine> {
        let engine = SensorEngine::new(Arc::new(hw), 4, HealthThresholds::default());
        engine.init().unwrap();
        engine
    }

    #[test]
    fn register_then_list_preserves_insertion_order() {
        let engine = engine_with(MockHardware::new());
        engine.register_unit("Sentinel-RT", 17, 27, 4).unwrap();
        engine.register_unit("Sentinel-Aux", 5, 6, 7).unwrap();
        assert_eq!(engine.list_units(), vec!["Sentinel-RT", "Sentinel-Aux"]);
        engine.shutdown();
    }

    #[test]
    fn duplicate_registration_is_rejected_without_mutation() {
        let engine = engine_with(MockHardware::new());
        engine.register_unit("Sentinel-RT", 17, 27, 4).unwrap();
        let err = engine.register_unit("Sentinel-RT", 1, 2, 3).unwrap_err();
        assert_eq!(err, RegisterError::Duplicate);
        assert_eq!(engine.list_units(), vec!["Sentinel-RT"]);
        engine.shutdown();
    }

    #[test]
    fn registry_rejects_past_capacity() {
        let engine = engine_with(MockHardware::new());
        for i in 0..4 {
            engine.register_unit(&format!("unit-{i}"), 1, 2, 3).unwrap();
        }
        assert_eq!(
            engine.register_unit("overflow", 1, 2, 3).unwrap_err(),
            RegisterError::Full
        );
        engine.shutdown();
    }

    #[test]
    fn get_health_on_unknown_unit_returns_none() {
        let engine = engine_with(MockHardware::new());
        assert!(engine.get_health("nope").is_none());
        engine.shutdown();
    }

    #[test]
    fn snapshot_resets_fast_cadence_counters() {
        let hw = MockHardware::with_readings(35.2, 10.5);
        hw.set_digital(17, 1);
        let engine = engine_with(hw);
        engine.register_unit("Sentinel-RT", 17, 27, 4).unwrap();
        thread::sleep(Duration::from_millis(100));
        let first = engine.get_health("Sentinel-RT").unwrap();
        assert!(first.snapshot.vibration_level > 0.0);
        // Calling again immediately starts a fresh, near-empty window: the
        // prior window's pulse count must not leak into this one.
        let second = engine.get_health("Sentinel-RT").unwrap();
        assert!(second.snapshot.vibration_level < first.snapshot.vibration_level);
        engine.shutdown();
    }

    #[test]
    fn healthy_scenario_matches_spec_example() {
        let hw = MockHardware::with_readings(35.2, 10.5);
        let engine = engine_with(hw);
        engine.register_unit("Sentinel-RT", 17, 27, 4).unwrap();
        thread::sleep(Duration::from_millis(1200));
        let health = engine.get_health("Sentinel-RT").unwrap();
        assert_eq!(health.status, HealthStatus::Healthy);
        assert_eq!(health.message, "");
        engine.shutdown();
    }

    #[test]
    fn critical_via_current_matches_spec_example() {
        let hw = MockHardware::with_readings(35.2, 16.0);
        let engine = engine_with(hw);
        engine.register_unit("Sentinel-RT", 17, 27, 4).unwrap();
        thread::sleep(Duration::from_millis(1200));
        let health = engine.get_health("Sentinel-RT").unwrap();
        assert_eq!(health.status, HealthStatus::Critical);
        assert_eq!(health.message, "CRITICAL FAULT DETECTED");
        engine.shutdown();
    }
}
