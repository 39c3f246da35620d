//! `monitor` streaming sub-mode. Polls `get_health` once a
//! second, coloring each line by status, until the optional duration limit
//! elapses or the client sends any byte to interrupt early.
//!
//! The interrupt is detected by borrowing the TLS session's underlying
//! socket and giving it a one-second read timeout per tick, the same
//! select()-on-a-timeout idea the original polling loop used, translated to
//! a blocking-socket idiom.
//!
//! The whole streamed response — preamble, every status line, and the
//! terminal message — carries exactly one EOM, written at the end. Anything
//! written mid-stream goes out as a raw, unframed write.

use std::io::{Read, Write};
use std::time::Duration;

use super::{reply, SessionContext, PRIMARY_UNIT_ID};
use crate::sensor::HealthStatus;

const ANSI_RED: &str = "\x1b[1;31m";
const ANSI_YELLOW: &str = "\x1b[1;33m";
const ANSI_GREEN: &str = "\x1b[1;32m";
const ANSI_RESET: &str = "\x1b[0m";

/// Parses a duration argument: a decimal integer optionally suffixed with
/// `s`/`m`/`h`. Empty or unparseable input means "run forever" (`-1`),
/// matching the original `atoi`-on-garbage-returns-zero behavior being
/// redesigned into an explicit infinite sentinel.
fn parse_duration(arg: &str) -> i64 {
    let arg = arg.trim();
    if arg.is_empty() {
        return -1;
    }

    let (digits, multiplier) = match arg.chars().last() {
        Some('s') => (&arg[..arg.len() - 1], 1),
        Some('m') => (&arg[..arg.len() - 1], 60),
        Some('h') => (&arg[..arg.len() - 1], 3600),
        _ => (arg, 1),
    };

    match digits.parse::<i64>() {
        Ok(n) if n >= 0 => n * multiplier,
        _ => -1,
    }
}

/// Formats one status line: `[<status>] Vib: %.0f | Snd: %.0f%% | Temp:
/// %.1fC | Cur: %.2fA`, colored by status and reset at the end of the line.
fn status_line(health: &crate::sensor::EquipmentHealth) -> String {
    let color = match health.status {
        HealthStatus::Critical | HealthStatus::Fault => ANSI_RED,
        HealthStatus::Warning => ANSI_YELLOW,
        HealthStatus::Healthy => ANSI_GREEN,
    };
    format!(
        "{color}[{}] Vib: {:.0} | Snd: {:.0}% | Temp: {:.1}C | Cur: {:.2}A{ANSI_RESET}\n",
        health.status.as_str(),
        health.snapshot.vibration_level,
        health.snapshot.sound_level,
        health.snapshot.temperature_c,
        health.snapshot.current_a,
    )
}

/// Writes `text` with no EOM, for lines that are part of an in-progress
/// streamed response.
fn write_raw(ctx: &mut SessionContext, text: &str) -> std::io::Result<()> {
    ctx.stream.write_all(text.as_bytes())?;
    ctx.stream.flush()
}

pub fn run(ctx: &mut SessionContext, arg: &str) -> std::io::Result<()> {
    let limit_secs = parse_duration(arg);

    let preamble = if limit_secs < 0 {
        "\n>>> MONITOR START (Infinite) <<<\nSend any byte to stop.\n".to_string()
    } else {
        format!(
            "\n>>> MONITOR START (Limit: {limit_secs}s) <<<\nSend any byte to stop.\n"
        )
    };
    write_raw(ctx, &preamble)?;

    let mut elapsed: i64 = 0;
    loop {
        if limit_secs >= 0 && elapsed >= limit_secs {
            return reply(&mut ctx.stream, "\n>>> MONITOR TIME LIMIT REACHED <<<\n");
        }

        ctx.stream
            .sock
            .set_read_timeout(Some(Duration::from_secs(1)))?;
        let mut interrupt_buf = [0u8; 1];
        match ctx.stream.read(&mut interrupt_buf) {
            Ok(0) => {
                // Peer closed mid-monitor; let the outer loop observe EOF.
                ctx.stream.sock.set_read_timeout(None)?;
                return Ok(());
            }
            Ok(_) => {
                ctx.stream.sock.set_read_timeout(None)?;
                return reply(&mut ctx.stream, "\n>>> MONITOR STOPPED <<<\n");
            }
            Err(e)
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut =>
            {
                // No interrupt this tick; fall through to sample and report.
            }
            Err(e) => {
                ctx.stream.sock.set_read_timeout(None)?;
                return Err(e);
            }
        }

        if let Some(health) = ctx.sensor_engine.get_health(PRIMARY_UNIT_ID) {
            if health.status == HealthStatus::Critical {
                ctx.audit_log
                    .record_critical(PRIMARY_UNIT_ID, &health.message);
            }
            let line = status_line(&health);
            write_raw(ctx, &line)?;
        }

        elapsed += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_argument_is_infinite() {
        assert_eq!(parse_duration(""), -1);
    }

    #[test]
    fn bare_number_is_seconds() {
        assert_eq!(parse_duration("30"), 30);
    }

    #[test]
    fn minute_suffix_is_converted() {
        assert_eq!(parse_duration("5m"), 300);
    }

    #[test]
    fn hour_suffix_is_converted() {
        assert_eq!(parse_duration("1h"), 3600);
    }

    #[test]
    fn garbage_argument_is_infinite() {
        assert_eq!(parse_duration("abc"), -1);
    }

    #[test]
    fn negative_number_is_infinite() {
        assert_eq!(parse_duration("-5"), -1);
    }

    #[test]
    fn status_line_has_no_status_label_and_integer_sound() {
        use crate::sensor::{EquipmentHealth, SensorSnapshot};
        use std::time::SystemTime;

        let health = EquipmentHealth {
            unit_id: "Sentinel-RT".to_string(),
            status: HealthStatus::Healthy,
            snapshot: SensorSnapshot {
                vibration_level: 35.0,
                sound_level: 10.0,
                temperature_c: 35.2,
                current_a: 10.5,
                timestamp: SystemTime::now(),
            },
            message: String::new(),
        };
        let line = status_line(&health);
        assert!(line.contains("[HEALTHY] Vib: 35 | Snd: 10% | Temp: 35.2C | Cur: 10.50A"));
        assert!(!line.contains("Status:"));
    }
}
