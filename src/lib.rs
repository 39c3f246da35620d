//! Mutually-authenticated telemetry daemon for monitored industrial
//! equipment. `sentineld` (src/bin) wires these modules into a running
//! server; this crate root only declares the module tree so integration
//! tests can exercise it directly.

pub mod audit;
pub mod auth;
pub mod config;
pub mod error;
pub mod hardware;
pub mod protocol;
pub mod sensor;
pub mod transport;
