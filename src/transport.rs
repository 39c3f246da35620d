//! `TransportGate` — binds the listening socket and drives the mutual-TLS
//! handshake before handing the authenticated stream onward.
//!
//! Socket setup: a `socket2::Socket` configured with `SO_REUSEADDR`, then
//! converted into a `std::net::TcpListener`.

use std::net::{SocketAddr, TcpListener, TcpStream};
use std::path::Path;
use std::sync::Arc;

use log::{info, warn};
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::server::WebPkiClientVerifier;
use rustls::{RootCertStore, ServerConfig, ServerConnection, StreamOwned};
use socket2::{Domain, SockAddr, Socket, Type};

use crate::error::{AuthError, ListenError, TransportError};

/// An authenticated, bidirectional TLS session handed to the protocol
/// engine. The acquisition/registry concurrency model tolerates any number
/// of these running on their own session worker thread.
pub type TlsSession = StreamOwned<ServerConnection, TcpStream>;

pub struct TransportGate {
    bind_address: String,
    port: u16,
    backlog: i32,
    tls_config: Arc<ServerConfig>,
}

impl TransportGate {
    pub fn new(
        bind_address: String,
        port: u16,
        backlog: i32,
        server_cert: &Path,
        server_key: &Path,
        ca_cert: &Path,
    ) -> Result<Self, ListenError> {
        install_crypto_provider();

        let certs = load_certs(server_cert)
            .map_err(|e| ListenError::TlsConfig(format!("server cert: {e}")))?;
        let key = load_private_key(server_key)
            .map_err(|e| ListenError::TlsConfig(format!("server key: {e}")))?;
        let roots = load_root_store(ca_cert)
            .map_err(|e| ListenError::TlsConfig(format!("ca cert: {e}")))?;

        let verifier = WebPkiClientVerifier::builder(Arc::new(roots))
            .build()
            .map_err(|e| ListenError::TlsConfig(format!("client verifier: {e}")))?;

        let tls_config = ServerConfig::builder()
            .with_client_cert_verifier(verifier)
            .with_single_cert(certs, key)
            .map_err(|e| ListenError::TlsConfig(e.to_string()))?;

        Ok(TransportGate {
            bind_address,
            port,
            backlog,
            tls_config: Arc::new(tls_config),
        })
    }

    /// Binds the listening socket with `SO_REUSEADDR` set.
    pub fn bind(&self) -> Result<TcpListener, ListenError> {
        let addr: SocketAddr = format!("{}:{}", self.bind_address, self.port)
            .parse()
            .map_err(|e| ListenError::TlsConfig(format!("invalid bind address: {e}")))?;

        let socket = Socket::new(Domain::IPV4, Type::STREAM, None)?;
        socket.set_reuse_address(true)?;
        socket.bind(&SockAddr::from(addr))?;
        socket.listen(self.backlog)?;

        let listener: TcpListener = socket.into();
        info!("listening on {addr} (backlog={})", self.backlog);
        Ok(listener)
    }

    /// Performs the mutual-TLS handshake on an accepted connection.
    /// Returns the handshaked stream plus the peer's leaf certificate DER,
    /// ready for the `Authorizer`.
    pub fn handshake(&self, stream: TcpStream) -> Result<(TlsSession, Vec<u8>), TransportError> {
        let conn = ServerConnection::new(self.tls_config.clone())
            .map_err(|e| TransportError::Handshake(e.to_string()))?;
        let mut session = StreamOwned::new(conn, stream);

        loop {
            match session.conn.complete_io(&mut session.sock) {
                Ok(_) => break,
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => continue,
                Err(e) => return Err(TransportError::Handshake(e.to_string())),
            }
        }

        let peer_cert = session
            .conn
            .peer_certificates()
            .and_then(|certs| certs.first())
            .map(|c| c.as_ref().to_vec())
            .ok_or(AuthError::NoCertificate)?;

        Ok((session, peer_cert))
    }
}

fn install_crypto_provider() {
    let _ = rustls::crypto::ring::default_provider().install_default();
}

fn load_certs(path: &Path) -> std::io::Result<Vec<CertificateDer<'static>>> {
    let mut reader = std::io::BufReader::new(std::fs::File::open(path)?);
    rustls_pemfile::certs(&mut reader).collect()
}

fn load_private_key(path: &Path) -> std::io::Result<PrivateKeyDer<'static>> {
    let mut reader = std::io::BufReader::new(std::fs::File::open(path)?);
    rustls_pemfile::private_key(&mut reader)?.ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidData, "no private key found in file")
    })
}

fn load_root_store(path: &Path) -> std::io::Result<RootCertStore> {
    let certs = load_certs(path)?;
    let mut store = RootCertStore::empty();
    for cert in certs {
        if let Err(e) = store.add(cert) {
            warn!("skipping unparsable CA certificate: {e}");
        }
    }
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_fixture_server_cert_and_key() {
        let certs = load_certs(Path::new("tests/fixtures/server.crt")).unwrap();
        assert_eq!(certs.len(), 1);
        assert!(load_private_key(Path::new("tests/fixtures/server.key")).is_ok());
    }

    #[test]
    fn loads_fixture_ca_into_root_store() {
        let store = load_root_store(Path::new("tests/fixtures/ca.crt")).unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn gate_builds_from_fixture_material() {
        let gate = TransportGate::new(
            "127.0.0.1".to_string(),
            0,
            1,
            Path::new("tests/fixtures/server.crt"),
            Path::new("tests/fixtures/server.key"),
            Path::new("tests/fixtures/ca.crt"),
        );
        assert!(gate.is_ok());
    }
}
