mod cli;
mod error_fmt;
mod read;

use clap::Parser;
use eyre::WrapErr;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;
use weigh_core::ReadError;

use crate::cli::{Cli, Commands, FILE_GUARD, JSON_MODE};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    if let Err(e) = run(cli) {
        tracing::debug!(error = ?e, "command failed");
        if JSON_MODE.get().copied().unwrap_or(false) {
            println!("{}", format_error_json(&e));
        } else {
            eprintln!("{}", humanize(&e));
        }
        std::process::exit(exit_code_for_error(&e));
    }
}

fn run(cli: Cli) -> eyre::Result<()> {
    if !cli.json {
        color_eyre::install()?;
    }

    let cfg = if cli.cmd.needs_config() {
        Some(load_config(&cli.config)?)
    } else {
        None
    };
    init_tracing(cli.json, cli.log_level.as_deref(), cfg.as_ref().map(|c| &c.logging))?;

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let flag = shutdown.clone();
        if let Err(e) = ctrlc::set_handler(move || {
            flag.store(true, Ordering::Relaxed);
        }) {
            tracing::warn!(error = %e, "failed to install Ctrl-C handler");
        }
    }

    match (cli.cmd, cfg) {
        (Commands::ListPorts, _) => list_ports(cli.json),
        (
            Commands::Read {
                timeout_ms,
                port,
                repeat,
            },
            Some(mut cfg),
        ) => {
            apply_port_override(&mut cfg, port)?;
            read::run_read(&cfg, timeout_ms, repeat, cli.json, shutdown).map(|_| ())
        }
        (Commands::SelfCheck { port }, Some(mut cfg)) => {
            apply_port_override(&mut cfg, port)?;
            read::self_check(&cfg, cli.json)
        }
        (_, None) => Err(eyre::Report::new(ReadError::Config(
            "no configuration loaded".into(),
        ))),
    }
}

fn load_config(path: &Path) -> eyre::Result<weigh_config::Config> {
    let cfg = weigh_config::load_file(path)
        .map_err(|e| eyre::Report::new(ReadError::Config(format!("{e}"))))?;
    cfg.validate().map_err(|e| {
        eyre::Report::new(ReadError::Config(format!("{}: {e}", path.display())))
    })?;
    Ok(cfg)
}

/// `--port` replaces `[port].path`; the result is validated again.
fn apply_port_override(cfg: &mut weigh_config::Config, port: Option<String>) -> eyre::Result<()> {
    if let Some(path) = port {
        cfg.port.path = path;
        cfg.validate()
            .map_err(|e| eyre::Report::new(ReadError::Config(format!("--port: {e}"))))?;
    }
    Ok(())
}

fn list_ports(json: bool) -> eyre::Result<()> {
    let ports = weigh_hardware::list_ports().wrap_err("enumerate serial ports")?;
    if json {
        let list: Vec<_> = ports
            .iter()
            .map(|p| serde_json::json!({ "name": p.name, "description": p.description }))
            .collect();
        println!("{}", serde_json::Value::Array(list));
        return Ok(());
    }
    if ports.is_empty() {
        println!("no serial ports found");
    }
    for p in &ports {
        println!("{}\t{}", p.name, p.description);
    }
    Ok(())
}

fn init_tracing(
    json: bool,
    cli_level: Option<&str>,
    logging: Option<&weigh_config::Logging>,
) -> eyre::Result<()> {
    // RUST_LOG > --log-level > [logging].level > info
    let level = cli_level
        .or_else(|| logging.and_then(|l| l.level.as_deref()))
        .unwrap_or("info");
    let filter = match EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => EnvFilter::try_new(level).wrap_err_with(|| format!("bad log level {level:?}"))?,
    };

    let (console_json, console_text) = if json {
        let console = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false);
        (Some(console.json()), None)
    } else {
        let console = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false);
        (None, Some(console))
    };

    let file_layer = match logging.and_then(|l| l.file.as_deref()) {
        Some(file) => {
            let path = Path::new(file);
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let prefix = path
                .file_name()
                .ok_or_else(|| eyre::eyre!("logging.file {file:?} has no file name"))?
                .to_string_lossy()
                .into_owned();
            let rotation = match logging.and_then(|l| l.rotation.as_deref()) {
                Some("daily") => Rotation::DAILY,
                Some("hourly") => Rotation::HOURLY,
                _ => Rotation::NEVER,
            };
            let appender = RollingFileAppender::builder()
                .rotation(rotation)
                .filename_prefix(prefix)
                .build(dir)
                .wrap_err_with(|| format!("open log file {file:?}"))?;
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = FILE_GUARD.set(guard);
            Some(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_ansi(false)
                    .with_writer(writer),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_json)
        .with(console_text)
        .with(file_layer)
        .try_init()
        .wrap_err("install tracing subscriber")?;
    Ok(())
}
