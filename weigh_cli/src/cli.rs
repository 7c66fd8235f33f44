//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "weigh", version, about = "Read a stable weight from a serial scale")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/weigh_config.toml")]
    pub config: PathBuf,

    /// Log and print results as JSON lines instead of pretty text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); RUST_LOG wins when set.
    /// Defaults to [logging].level, then info.
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Wait for the scale to settle and print the stable weight
    Read {
        /// Give up after this many ms (overrides session.timeout_ms)
        #[arg(long, value_name = "MS")]
        timeout_ms: Option<u64>,
        /// Serial device path, or "sim" (overrides port.path)
        #[arg(long, value_name = "PATH")]
        port: Option<String>,
        /// Number of stable weights to read, one after another
        #[arg(long, value_name = "N", default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        repeat: u32,
    },
    /// List serial ports visible to this machine
    ListPorts,
    /// Quick health check: open the port and wait for one valid frame
    SelfCheck {
        /// Serial device path, or "sim" (overrides port.path)
        #[arg(long, value_name = "PATH")]
        port: Option<String>,
    },
}

impl Commands {
    pub fn needs_config(&self) -> bool {
        !matches!(self, Commands::ListPorts)
    }
}
