#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the stable-weight reader.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - Every section except `[port]` is optional and falls back to defaults that
//!   match the scale's factory settings (9600 8N1, five identical readings).
use serde::Deserialize;

/// Path value that selects the simulated scale instead of a serial device.
pub const SIM_PORT: &str = "sim";

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Parity {
    #[default]
    None,
    Odd,
    Even,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PortCfg {
    /// Device path (e.g. "/dev/ttyUSB0", "COM2") or "sim".
    pub path: String,
    pub baud_rate: u32,
    pub data_bits: u8,
    pub parity: Parity,
    pub stop_bits: u8,
    /// Per-read timeout of the serial pump; bounds how quickly `close()` returns.
    pub read_timeout_ms: u64,
}

impl Default for PortCfg {
    fn default() -> Self {
        Self {
            path: String::new(),
            baud_rate: 9600,
            data_bits: 8,
            parity: Parity::None,
            stop_bits: 1,
            read_timeout_ms: 100,
        }
    }
}

impl PortCfg {
    pub fn is_simulated(&self) -> bool {
        self.path.eq_ignore_ascii_case(SIM_PORT)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StabilityCfg {
    /// Identical consecutive readings required before a weight counts as stable.
    pub consecutive: u32,
}

impl Default for StabilityCfg {
    fn default() -> Self {
        Self { consecutive: 5 }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StreamErrors {
    /// Log and keep waiting for valid frames.
    #[default]
    Report,
    /// Fail the pending read and stop the session.
    Abort,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SessionCfg {
    /// How long a read waits for a stable weight before it is stopped.
    pub timeout_ms: u64,
    pub stream_errors: StreamErrors,
}

impl Default for SessionCfg {
    fn default() -> Self {
        Self {
            timeout_ms: 2000,
            stream_errors: StreamErrors::Report,
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

/// Simulated scale used when `port.path = "sim"`.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SimCfg {
    /// Six-character weight fields sent in order, e.g. `" 50.0 "`. Shorter
    /// values are right-aligned with spaces.
    pub weights: Vec<String>,
    pub interval_ms: u64,
    /// Start over from the first weight after the last one.
    pub repeat: bool,
}

impl Default for SimCfg {
    fn default() -> Self {
        Self {
            weights: vec![
                "12.0".into(),
                "48.5".into(),
                "50.0".into(),
                "50.0".into(),
                "50.0".into(),
                "50.0".into(),
                "50.0".into(),
            ],
            interval_ms: 20,
            repeat: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub port: PortCfg,
    #[serde(default)]
    pub stability: StabilityCfg,
    #[serde(default)]
    pub session: SessionCfg,
    #[serde(default)]
    pub logging: Logging,
    #[serde(default)]
    pub sim: SimCfg,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

pub fn load_file(path: &std::path::Path) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("read config {:?}: {}", path, e))?;
    load_toml(&text).map_err(|e| eyre::eyre!("parse config {:?}: {}", path, e))
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Port
        if self.port.path.trim().is_empty() {
            eyre::bail!("port.path must not be empty");
        }
        if self.port.baud_rate == 0 {
            eyre::bail!("port.baud_rate must be > 0");
        }
        if !(5..=8).contains(&self.port.data_bits) {
            eyre::bail!("port.data_bits must be in [5, 8]");
        }
        if !matches!(self.port.stop_bits, 1 | 2) {
            eyre::bail!("port.stop_bits must be 1 or 2");
        }
        if self.port.read_timeout_ms == 0 {
            eyre::bail!("port.read_timeout_ms must be >= 1");
        }
        if self.port.read_timeout_ms > 10_000 {
            eyre::bail!("port.read_timeout_ms is unreasonably large (>10s)");
        }

        // Stability
        if self.stability.consecutive == 0 {
            eyre::bail!("stability.consecutive must be >= 1");
        }
        if self.stability.consecutive > 1000 {
            eyre::bail!("stability.consecutive is unreasonably large (>1000)");
        }

        // Session
        if self.session.timeout_ms == 0 {
            eyre::bail!("session.timeout_ms must be >= 1");
        }
        if self.session.timeout_ms > 24 * 60 * 60 * 1000 {
            eyre::bail!("session.timeout_ms is unreasonably large (>24h)");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        // Simulation
        if self.port.is_simulated() {
            if self.sim.weights.is_empty() {
                eyre::bail!("sim.weights must not be empty when port.path = \"sim\"");
            }
            if let Some(w) = self.sim.weights.iter().find(|w| w.len() > 6 || !w.is_ascii()) {
                eyre::bail!("sim.weights entry {w:?} must be at most 6 ASCII characters");
            }
            if self.sim.interval_ms == 0 {
                eyre::bail!("sim.interval_ms must be >= 1");
            }
        }

        Ok(())
    }
}
