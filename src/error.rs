//! Typed errors for each fallible subsystem.
//!
//! Session-scoped failures (transport, protocol, auth) are logged and
//! dropped by their caller; only startup failures propagate out of `main`.

use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HardwareError {
    #[error("hardware access is not supported on this platform")]
    Unsupported,
    #[error("failed to initialize hardware: {0}")]
    InitFailed(String),
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RegisterError {
    #[error("unit registry is at capacity")]
    Full,
    #[error("unit id already registered")]
    Duplicate,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("peer presented no certificate")]
    NoCertificate,
    #[error("failed to parse peer certificate: {0}")]
    MalformedCertificate(String),
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("tls handshake failed: {0}")]
    Handshake(String),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("peer role is not authorized for this session")]
    Unauthorized,
    #[error(transparent)]
    Io(#[from] io::Error),
}

#[derive(Debug, Error)]
pub enum ListenError {
    #[error("failed to bind listening socket: {0}")]
    Bind(#[from] io::Error),
    #[error("failed to build tls server configuration: {0}")]
    TlsConfig(String),
}
