//! Command table and dispatch. Lookup tries an exact tokenized match first;
//! only if that fails does it fall back to the original prefix-match
//! behavior, so `monitorNONSENSE` still dispatches as `monitor NONSENSE`.
//! Kept for wire compatibility; it is not the primary path.

use std::io::Write;

use super::{monitor, reply, SessionContext, PRIMARY_UNIT_ID};

/// The single byte re-used as both in-band response terminator and, on the
/// client side, a cursor reset. Never emitted inside payload text.
pub const EOM: u8 = 0x03;

const HELP_TEXT: &str = "\
Available commands:
  help                 Show this message
  whoami               Show your identity and role
  list_units           List registered equipment units
  get_sensors          Show raw telemetry for the primary unit
  get_health           Show evaluated health status for the primary unit
  get_log              Show the critical-event audit log
  clear_log            Truncate the audit log
  monitor <duration>   Stream telemetry once per second (e.g. 30s, 5m, 1h)
  quit | exit          Disconnect
";

/// Command names in dispatch priority order.
const COMMANDS: &[&str] = &[
    "help",
    "whoami",
    "list_units",
    "get_sensors",
    "get_health",
    "get_log",
    "clear_log",
    "monitor",
    "quit",
    "exit",
];

/// Splits `request` into a command word and an argument tail, first trying
/// an exact token match and falling back to prefix matching against the
/// fixed table.
fn resolve<'a>(request: &'a str) -> Option<(&'static str, &'a str)> {
    let trimmed = request.trim_end();
    let (head, tail) = match trimmed.find(char::is_whitespace) {
        Some(idx) => (&trimmed[..idx], trimmed[idx..].trim_start()),
        None => (trimmed, ""),
    };

    if let Some(&cmd) = COMMANDS.iter().find(|&&c| c == head) {
        return Some((cmd, tail));
    }

    COMMANDS
        .iter()
        .find(|&&c| trimmed.starts_with(c))
        .map(|&cmd| (cmd, trimmed[cmd.len()..].trim_start()))
}

pub fn dispatch(ctx: &mut SessionContext, request: &str) -> std::io::Result<()> {
    match resolve(request) {
        Some(("help", _)) => reply(&mut ctx.stream, HELP_TEXT),
        Some(("whoami", _)) => whoami(ctx),
        Some(("list_units", _)) => list_units(ctx),
        Some(("get_sensors", _)) => get_sensors(ctx),
        Some(("get_health", _)) => get_health(ctx),
        Some(("get_log", _)) => get_log(ctx),
        Some(("clear_log", _)) => clear_log(ctx),
        Some(("monitor", arg)) => monitor::run(ctx, arg),
        Some(("quit", _)) | Some(("exit", _)) => quit(ctx),
        Some((other, _)) => unreachable!("resolve returned unlisted command {other}"),
        None => reply(&mut ctx.stream, "Unknown command. Type 'help'.\n"),
    }
}

fn whoami(ctx: &mut SessionContext) -> std::io::Result<()> {
    let text = format!(
        "User: {} | Role: {}\n",
        ctx.identity.common_name,
        ctx.identity.role.as_str()
    );
    reply(&mut ctx.stream, &text)
}

fn list_units(ctx: &mut SessionContext) -> std::io::Result<()> {
    let mut text = String::from("=== Registered Units ===\n");
    for id in ctx.sensor_engine.list_units() {
        text.push_str(&format!(" - {id}\n"));
    }
    reply(&mut ctx.stream, &text)
}

fn get_sensors(ctx: &mut SessionContext) -> std::io::Result<()> {
    let text = match ctx.sensor_engine.get_health(PRIMARY_UNIT_ID) {
        Some(health) => format!(
            "Vib: {:.0} | Snd: {:.1}% | Temp: {:.1}C | Cur: {:.2}A\n",
            health.snapshot.vibration_level,
            health.snapshot.sound_level,
            health.snapshot.temperature_c,
            health.snapshot.current_a,
        ),
        None => String::new(),
    };
    reply(&mut ctx.stream, &text)
}

fn get_health(ctx: &mut SessionContext) -> std::io::Result<()> {
    let text = match ctx.sensor_engine.get_health(PRIMARY_UNIT_ID) {
        Some(health) => format!(
            "Status: {} | Message: {}\n",
            health.status.as_str(),
            health.message
        ),
        None => String::new(),
    };
    reply(&mut ctx.stream, &text)
}

fn get_log(ctx: &mut SessionContext) -> std::io::Result<()> {
    match ctx.audit_log.read_all() {
        Some(contents) if !contents.is_empty() => reply(&mut ctx.stream, &contents),
        _ => reply(&mut ctx.stream, "[INFO] Log is empty.\n"),
    }
}

fn clear_log(ctx: &mut SessionContext) -> std::io::Result<()> {
    ctx.audit_log.clear();
    reply(&mut ctx.stream, "[SUCCESS] Log cleared.\n")
}

fn quit(ctx: &mut SessionContext) -> std::io::Result<()> {
    reply(&mut ctx.stream, "\n>>> DISCONNECTING <<<\n")?;
    ctx.running.store(false, std::sync::atomic::Ordering::Release);
    ctx.stream.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_token_match_takes_the_tail_as_argument() {
        assert_eq!(resolve("monitor 10s"), Some(("monitor", "10s")));
        assert_eq!(resolve("get_log"), Some(("get_log", "")));
    }

    #[test]
    fn prefix_match_accepts_junk_suffix() {
        assert_eq!(resolve("monitorNONSENSE"), Some(("monitor", "NONSENSE")));
    }

    #[test]
    fn trailing_whitespace_is_trimmed_before_matching() {
        assert_eq!(resolve("quit   \n"), Some(("quit", "")));
    }

    #[test]
    fn unknown_command_resolves_to_none() {
        assert_eq!(resolve("foobar"), None);
    }
}
