//! Source assembly from config, stable reads and the self-check.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use crossbeam_channel as xch;
use weigh_config::Config;
use weigh_core::error::Result as CoreResult;
use weigh_core::{ReadError, ReadSession, SessionCfg, Weight, read_stable_until};
use weigh_hardware::{Parity, SerialSettings, SimulatedScale, StreamFrameSource, serial_source};
use weigh_traits::FrameSource;

fn parity(p: weigh_config::Parity) -> Parity {
    match p {
        weigh_config::Parity::None => Parity::None,
        weigh_config::Parity::Odd => Parity::Odd,
        weigh_config::Parity::Even => Parity::Even,
    }
}

/// Serial port or simulated scale, as `[port].path` says.
pub fn make_source(cfg: &Config) -> StreamFrameSource {
    if cfg.port.is_simulated() {
        tracing::info!(
            weights = cfg.sim.weights.len(),
            interval_ms = cfg.sim.interval_ms,
            repeat = cfg.sim.repeat,
            "using simulated scale"
        );
        return SimulatedScale::new(
            cfg.sim.weights.clone(),
            Duration::from_millis(cfg.sim.interval_ms),
            cfg.sim.repeat,
        )
        .into_source();
    }
    serial_source(SerialSettings {
        path: cfg.port.path.clone(),
        baud_rate: cfg.port.baud_rate,
        data_bits: cfg.port.data_bits,
        parity: parity(cfg.port.parity),
        stop_bits: cfg.port.stop_bits,
        read_timeout: Duration::from_millis(cfg.port.read_timeout_ms),
    })
}

fn print_weight(weight: Weight, json: bool) {
    if json {
        println!(
            "{}",
            serde_json::json!({ "weight": weight.to_f64(), "raw": weight.to_string() })
        );
    } else {
        println!("stable weight: {weight}");
    }
}

/// Read `repeat` stable weights in a row, printing each as it arrives.
pub fn run_read(
    cfg: &Config,
    timeout_ms: Option<u64>,
    repeat: u32,
    json: bool,
    shutdown: Arc<AtomicBool>,
) -> CoreResult<Vec<Weight>> {
    let mut session_cfg = SessionCfg::from(cfg);
    if let Some(ms) = timeout_ms {
        session_cfg.timeout_ms = ms;
    }
    let timeout = Duration::from_millis(session_cfg.timeout_ms);

    let mut session = ReadSession::builder()
        .with_source(make_source(cfg))
        .with_config(session_cfg)
        .build()?;
    session.open()?;
    tracing::info!(port = %cfg.port.path, repeat, "reading stable weight");

    let mut weights = Vec::with_capacity(repeat as usize);
    for n in 1..=repeat {
        let result = read_stable_until(&session, timeout, &shutdown);
        let weight = match result {
            Ok(w) => w,
            Err(e) => {
                let _ = session.close();
                return Err(e);
            }
        };
        tracing::info!(n, weight = %weight, "stable weight");
        print_weight(weight, json);
        weights.push(weight);
    }
    session.close()?;
    Ok(weights)
}

/// Open the port and wait for one frame that passes validation.
pub fn self_check(cfg: &Config, json: bool) -> CoreResult<()> {
    let mut source = make_source(cfg);
    let (tx, rx) = xch::bounded::<Vec<u8>>(16);
    source.on_data(Box::new(move |frame: &[u8]| {
        let _ = tx.try_send(frame.to_vec());
    }));
    if let Err(e) = source.open() {
        return Err(eyre::Report::new(weigh_core::hw_error::map_open_error(&*e)));
    }

    let timeout_ms = cfg.session.timeout_ms;
    let deadline = std::time::Instant::now() + Duration::from_millis(timeout_ms);
    let mut seen = 0usize;
    let found = loop {
        let left = deadline.saturating_duration_since(std::time::Instant::now());
        match rx.recv_timeout(left) {
            Ok(frame) => {
                seen += 1;
                match weigh_core::validate(&frame) {
                    Ok(reading) => break Some(reading.weight),
                    Err(reason) => tracing::debug!(%reason, "self-check: frame discarded"),
                }
            }
            Err(_) => break None,
        }
    };
    let _ = source.close();

    let Some(weight) = found else {
        tracing::warn!(frames = seen, "self-check: no valid frame");
        return Err(eyre::Report::new(ReadError::Timeout { ms: timeout_ms }));
    };
    if json {
        println!(
            "{}",
            serde_json::json!({ "ok": true, "port": cfg.port.path, "reading": weight.to_string() })
        );
    } else {
        println!("ok: {} delivers frames (reading {weight})", cfg.port.path);
    }
    Ok(())
}
