//! `sentineld` — binds the mutual-TLS listener, starts the sensor
//! acquisition engine, and spawns one session worker thread per accepted,
//! authenticated connection.

use std::sync::Arc;
use std::thread;

use clap::Parser;
use log::{error, info, warn};

use sentinel::auth::{Authorizer, Role};
use sentinel::config::{Cli, SentinelConfig};
use sentinel::error::TransportError;
use sentinel::hardware::{GpioHardware, HardwareAccess, MockHardware};
use sentinel::protocol::{ProtocolEngine, SessionContext, PRIMARY_UNIT_ID};
use sentinel::sensor::SensorEngine;
use sentinel::{audit::AuditLog, transport::TransportGate};

/// Pin assignments for the one unit this daemon ships registered out of the
/// box, carried over from the original server's fixed wiring.
const PRIMARY_VIB_PIN: u32 = 17;
const PRIMARY_SOUND_PIN: u32 = 27;
const PRIMARY_TEMP_PIN: u32 = 4;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let cfg = cli.apply(SentinelConfig::load(&cli.config)?);

    let hardware: Arc<dyn HardwareAccess> = if cli.mock_hardware {
        Arc::new(MockHardware::new())
    } else {
        Arc::new(GpioHardware::new())
    };

    let sensor_engine = SensorEngine::new(hardware, cfg.registry_capacity, cfg.thresholds);
    sensor_engine.init()?;
    sensor_engine.register_unit(
        PRIMARY_UNIT_ID,
        PRIMARY_VIB_PIN,
        PRIMARY_SOUND_PIN,
        PRIMARY_TEMP_PIN,
    )?;

    let audit_log = Arc::new(AuditLog::new(cfg.audit_log_path.clone()));

    let gate = TransportGate::new(
        cfg.bind_address.clone(),
        cfg.port,
        cfg.backlog,
        &cfg.certs.server_cert,
        &cfg.certs.server_key,
        &cfg.certs.ca_cert,
    )?;
    let gate = Arc::new(gate);
    let listener = gate.bind()?;

    info!("sentineld ready, unit '{PRIMARY_UNIT_ID}' registered");

    for incoming in listener.incoming() {
        let stream = match incoming {
            Ok(stream) => stream,
            Err(e) => {
                warn!("accept failed: {e}");
                continue;
            }
        };
        let peer = stream.peer_addr().ok();
        if let Some(addr) = peer {
            info!("[CONN] Connection from {addr}");
        }

        let gate = gate.clone();
        let sensor_engine = sensor_engine.clone();
        let audit_log = audit_log.clone();

        thread::spawn(move || {
            if let Err(e) = handle_connection(&gate, stream, sensor_engine, audit_log) {
                warn!("session for {peer:?} ended with error: {e}");
            }
        });
    }

    sensor_engine.shutdown();
    Ok(())
}

fn handle_connection(
    gate: &TransportGate,
    stream: std::net::TcpStream,
    sensor_engine: Arc<SensorEngine>,
    audit_log: Arc<AuditLog>,
) -> Result<(), TransportError> {
    let (session, peer_cert) = gate.handshake(stream)?;
    let identity = Authorizer::authorize(Some(&peer_cert))?;
    if identity.role == Role::Unauthorized {
        return Err(TransportError::Unauthorized);
    }

    let mut ctx = SessionContext::new(session, identity, sensor_engine, audit_log);
    ProtocolEngine::run(&mut ctx);
    Ok(())
}
