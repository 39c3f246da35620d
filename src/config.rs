//! Runtime configuration: defaults match the original daemon's `#define`s
//! exactly, overridable via `sentinel.toml` and then via CLI flags/env vars.

use std::path::PathBuf;

use clap::Parser;
use serde::Deserialize;

/// Threshold pairs for the health evaluator. Hoisted out of the evaluation
/// code instead of being baked into the match arms.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct HealthThresholds {
    pub vibration_warn: f64,
    pub vibration_crit: f64,
    pub sound_warn: f64,
    pub sound_crit: f64,
    pub current_warn: f64,
    pub current_crit: f64,
    pub temperature_warn: f64,
    pub temperature_crit: f64,
}

impl Default for HealthThresholds {
    fn default() -> Self {
        HealthThresholds {
            vibration_warn: 100.0,
            vibration_crit: 200.0,
            sound_warn: 50.0,
            sound_crit: 80.0,
            current_warn: 12.0,
            current_crit: 15.0,
            temperature_warn: 65.0,
            temperature_crit: 80.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CertPaths {
    pub server_cert: PathBuf,
    pub server_key: PathBuf,
    pub ca_cert: PathBuf,
}

impl Default for CertPaths {
    fn default() -> Self {
        CertPaths {
            server_cert: "certs/server.crt".into(),
            server_key: "certs/server.key".into(),
            ca_cert: "certs/ca.crt".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SentinelConfig {
    pub bind_address: String,
    pub port: u16,
    pub backlog: i32,
    pub registry_capacity: usize,
    pub audit_log_path: PathBuf,
    pub certs: CertPaths,
    pub thresholds: HealthThresholds,
}

impl Default for SentinelConfig {
    fn default() -> Self {
        SentinelConfig {
            bind_address: "0.0.0.0".into(),
            port: 8080,
            backlog: 1,
            registry_capacity: 8,
            audit_log_path: "blackbox.log".into(),
            certs: CertPaths::default(),
            thresholds: HealthThresholds::default(),
        }
    }
}

impl SentinelConfig {
    /// Loads `path` if it exists, falling back to defaults for anything the
    /// file omits. A missing file is not an error.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(SentinelConfig::default());
        }
        let text = std::fs::read_to_string(path)?;
        let cfg: SentinelConfig = toml::from_str(&text)?;
        Ok(cfg)
    }
}

/// CLI flags override the config file; the config file overrides defaults.
#[derive(Debug, Parser)]
#[command(name = "sentineld", about = "Industrial equipment monitoring daemon")]
pub struct Cli {
    /// Path to a `sentinel.toml` configuration file.
    #[arg(long, default_value = "sentinel.toml")]
    pub config: PathBuf,

    #[arg(long, env = "SENTINEL_PORT")]
    pub port: Option<u16>,

    #[arg(long, env = "SENTINEL_BIND")]
    pub bind_address: Option<String>,

    #[arg(long, env = "SENTINEL_AUDIT_LOG")]
    pub audit_log_path: Option<PathBuf>,

    /// Force the mock hardware backend even on platforms where GPIO access
    /// would otherwise be attempted.
    #[arg(long)]
    pub mock_hardware: bool,
}

impl Cli {
    pub fn apply(&self, mut cfg: SentinelConfig) -> SentinelConfig {
        if let Some(port) = self.port {
            cfg.port = port;
        }
        if let Some(addr) = &self.bind_address {
            cfg.bind_address = addr.clone();
        }
        if let Some(path) = &self.audit_log_path {
            cfg.audit_log_path = path.clone();
        }
        cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_thresholds() {
        let t = HealthThresholds::default();
        assert_eq!(t.vibration_warn, 100.0);
        assert_eq!(t.vibration_crit, 200.0);
        assert_eq!(t.sound_warn, 50.0);
        assert_eq!(t.sound_crit, 80.0);
        assert_eq!(t.current_warn, 12.0);
        assert_eq!(t.current_crit, 15.0);
        assert_eq!(t.temperature_warn, 65.0);
        assert_eq!(t.temperature_crit, 80.0);
    }

    #[test]
    fn default_config_matches_original_daemon() {
        let cfg = SentinelConfig::default();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.bind_address, "0.0.0.0");
        assert_eq!(cfg.backlog, 1);
    }

    #[test]
    fn missing_config_file_falls_back_to_defaults() {
        let cfg = SentinelConfig::load(std::path::Path::new("/nonexistent/sentinel.toml")).unwrap();
        assert_eq!(cfg.port, 8080);
    }
}
