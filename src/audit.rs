//! Append-only audit log. Writes are best-effort: a failure
//! to open or write is logged at `debug!` and never escalated.

use std::fs::OpenOptions;
use std::io::{Read, Write};
use std::path::PathBuf;

use chrono::Local;
use log::debug;
use parking_lot::Mutex;

pub struct AuditLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl AuditLog {
    pub fn new(path: PathBuf) -> Self {
        AuditLog {
            path,
            write_lock: Mutex::new(()),
        }
    }

    /// Appends one record: `[<timestamp>] CRITICAL ALERT | Unit: <unit> | <message>\n`.
    pub fn record_critical(&self, unit_id: &str, message: &str) {
        let _guard = self.write_lock.lock();
        let line = format!(
            "[{}] CRITICAL ALERT | Unit: {} | {}\n",
            Local::now().format("%a %b %e %H:%M:%S %Y"),
            unit_id,
            message
        );
        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut f| f.write_all(line.as_bytes()));
        if let Err(e) = result {
            debug!("audit log write failed: {e}");
        }
    }

    /// Returns the full verbatim file contents, or `None` if the file does
    /// not exist or cannot be read; `get_log` then substitutes the
    /// "[INFO] Log is empty." text.
    pub fn read_all(&self) -> Option<String> {
        let _guard = self.write_lock.lock();
        let mut contents = String::new();
        std::fs::File::open(&self.path)
            .ok()?
            .read_to_string(&mut contents)
            .ok()?;
        Some(contents)
    }

    /// Truncates the log by reopening in write-truncate mode.
    pub fn clear(&self) {
        let _guard = self.write_lock.lock();
        let result = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path);
        if let Err(e) = result {
            debug!("audit log clear failed: {e}");
        }
    }
}
