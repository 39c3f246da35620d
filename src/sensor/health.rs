//! Health evaluation: normalized rates against the configured threshold
//! table. `Critical` checks come first — first match wins.

use std::time::SystemTime;

use crate::config::HealthThresholds;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    Warning,
    Critical,
    /// Reserved for future hardware-read-failure signaling; the evaluator
    /// never produces this today.
    Fault,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "HEALTHY",
            HealthStatus::Warning => "WARNING",
            HealthStatus::Critical => "CRITICAL",
            HealthStatus::Fault => "FAULT",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SensorSnapshot {
    pub vibration_level: f64,
    pub sound_level: f64,
    pub temperature_c: f64,
    pub current_a: f64,
    pub timestamp: SystemTime,
}

#[derive(Debug, Clone)]
pub struct EquipmentHealth {
    pub unit_id: String,
    pub status: HealthStatus,
    pub snapshot: SensorSnapshot,
    pub message: String,
}

const CRITICAL_MESSAGE: &str = "CRITICAL FAULT DETECTED";

/// Applies the threshold table in Critical → Warning → Healthy order.
pub fn evaluate(snapshot: &SensorSnapshot, t: &HealthThresholds) -> (HealthStatus, String) {
    if snapshot.vibration_level > t.vibration_crit
        || snapshot.sound_level > t.sound_crit
        || snapshot.current_a > t.current_crit
        || snapshot.temperature_c > t.temperature_crit
    {
        return (HealthStatus::Critical, CRITICAL_MESSAGE.to_string());
    }
    if snapshot.vibration_level > t.vibration_warn
        || snapshot.sound_level > t.sound_warn
        || snapshot.current_a > t.current_warn
        || snapshot.temperature_c > t.temperature_warn
    {
        return (HealthStatus::Warning, String::new());
    }
    (HealthStatus::Healthy, String::new())
}
