//! Real hardware backend. Concrete register layouts are explicitly a
//! collaborator concern, not core engineering, so this talks to
//! the kernel's sysfs GPIO/1-Wire/I2C interfaces rather than poking memory
//! directly — enough to be a genuine implementation of the trait without
//! pulling in a board-specific HAL crate this workspace has no target board
//! for.

use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, warn};

use super::{HardwareAccess, Pin, PinDirection};
use crate::error::HardwareError;

const GPIO_SYSFS_ROOT: &str = "/sys/class/gpio";
const W1_SYSFS_ROOT: &str = "/sys/bus/w1/devices";
const IIO_CURRENT_SENSOR: &str = "/sys/bus/iio/devices/iio:device0/in_current_raw";

pub struct GpioHardware {
    initialized: AtomicBool,
}

impl GpioHardware {
    pub fn new() -> Self {
        GpioHardware {
            initialized: AtomicBool::new(false),
        }
    }

    fn gpio_value_path(pin: Pin) -> PathBuf {
        PathBuf::from(GPIO_SYSFS_ROOT).join(format!("gpio{pin}")).join("value")
    }
}

impl Default for GpioHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl HardwareAccess for GpioHardware {
    fn init(&self) -> Result<(), HardwareError> {
        if self.initialized.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        if !cfg!(target_os = "linux") {
            self.initialized.store(false, Ordering::Release);
            return Err(HardwareError::Unsupported);
        }
        if !PathBuf::from(GPIO_SYSFS_ROOT).exists() {
            self.initialized.store(false, Ordering::Release);
            return Err(HardwareError::InitFailed(format!(
                "{GPIO_SYSFS_ROOT} is not present on this host"
            )));
        }
        debug!("gpio hardware initialized");
        Ok(())
    }

    fn read_digital(&self, pin: Pin) -> u8 {
        match fs::read_to_string(Self::gpio_value_path(pin)) {
            Ok(s) => if s.trim() == "1" { 1 } else { 0 },
            Err(e) => {
                warn!("read_digital(pin={pin}) failed: {e}; reporting 0");
                0
            }
        }
    }

    fn configure_pin(&self, pin: Pin, direction: PinDirection) {
        let export = PathBuf::from(GPIO_SYSFS_ROOT).join("export");
        let _ = fs::write(export, pin.to_string());
        let dir_path = PathBuf::from(GPIO_SYSFS_ROOT).join(format!("gpio{pin}")).join("direction");
        let dir_str = match direction {
            PinDirection::Input => "in",
            PinDirection::Output => "out",
        };
        if let Err(e) = fs::write(&dir_path, dir_str) {
            warn!("configure_pin(pin={pin}, {direction:?}) failed: {e}");
        }
    }

    fn write_digital(&self, pin: Pin, level: u8) {
        let value = if level != 0 { "1" } else { "0" };
        if let Err(e) = fs::write(Self::gpio_value_path(pin), value) {
            warn!("write_digital(pin={pin}) failed: {e}");
        }
    }

    fn read_current_bus(&self) -> f64 {
        match fs::read_to_string(IIO_CURRENT_SENSOR) {
            Ok(s) => s.trim().parse::<f64>().unwrap_or(0.0) / 1000.0,
            Err(e) => {
                warn!("read_current_bus failed: {e}; reporting 0.0");
                0.0
            }
        }
    }

    fn read_temperature_wire(&self, pin: Pin) -> f64 {
        let path = PathBuf::from(W1_SYSFS_ROOT).join(format!("28-{pin:012x}")).join("w1_slave");
        match fs::read_to_string(&path) {
            Ok(contents) => parse_w1_temperature(&contents).unwrap_or(0.0),
            Err(e) => {
                warn!("read_temperature_wire(pin={pin}) failed: {e}; reporting 0.0");
                0.0
            }
        }
    }
}

/// Parses the `t=<millidegrees>` suffix DS18B20 1-Wire slaves report.
fn parse_w1_temperature(contents: &str) -> Option<f64> {
    let line = contents.lines().nth(1)?;
    let idx = line.find("t=")?;
    let millidegrees: i64 = line[idx + 2..].trim().parse().ok()?;
    Some(millidegrees as f64 / 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_w1_slave_temperature() {
        let sample = "a2 01 4b 46 7f ff 0c 10 6e : crc=6e YES\na2 01 4b 46 7f ff 0c 10 6e t=26125\n";
        assert_eq!(parse_w1_temperature(sample), Some(26.125));
    }

    #[test]
    fn malformed_w1_slave_yields_none() {
        assert_eq!(parse_w1_temperature("garbage"), None);
    }
}
