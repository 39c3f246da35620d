//! `HardwareAccess` — the abstract capability boundary between the
//! acquisition engine and whatever physically reads pins, 1-Wire, and I2C.
//!
//! Kept runtime-polymorphic (a trait object, not a compile-time feature
//! split) so tests can inject a [`MockHardware`] with deterministic values
//! instead of needing real silicon.

mod gpio;
mod mock;

pub use gpio::GpioHardware;
pub use mock::MockHardware;

use crate::error::HardwareError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinDirection {
    Input,
    Output,
}

/// A pin identifier. Non-negative by construction; `u32` makes that a type
/// invariant rather than a runtime check.
pub type Pin = u32;

/// Abstract hardware-access capability.
///
/// `init` must be idempotent within a process. `read_digital` never blocks
/// and reports a failed read as `0` rather than propagating an error — the
/// fast-cadence acquisition loop has no error path to propagate it to.
pub trait HardwareAccess: Send + Sync {
    fn init(&self) -> Result<(), HardwareError>;
    fn read_digital(&self, pin: Pin) -> u8;
    fn configure_pin(&self, pin: Pin, direction: PinDirection);
    fn write_digital(&self, pin: Pin, level: u8);
    fn read_current_bus(&self) -> f64;
    fn read_temperature_wire(&self, pin: Pin) -> f64;
}
