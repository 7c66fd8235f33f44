//! Human-readable error descriptions and structured JSON error formatting.

use weigh_core::error::{BuildError, ReadError};
use weigh_hardware::HwError;

/// Stable name of the error kind, used as the JSON `reason`.
pub fn reason_name(err: &eyre::Report) -> &'static str {
    if let Some(re) = err.downcast_ref::<ReadError>() {
        return match re {
            ReadError::PortOpen { .. } => "PortOpen",
            ReadError::Hardware(_) => "Hardware",
            ReadError::Timeout { .. } => "Timeout",
            ReadError::Cancelled => "Cancelled",
            ReadError::Stream(_) => "Stream",
            ReadError::Config(_) => "Config",
        };
    }
    if err.downcast_ref::<BuildError>().is_some() {
        return "Config";
    }
    if err.downcast_ref::<HwError>().is_some() {
        return "Hardware";
    }
    "Error"
}

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(re) = err.downcast_ref::<ReadError>() {
        return match re {
            ReadError::PortOpen { reason } => format!(
                "What happened: The serial port could not be opened ({reason}).\nLikely causes: Wrong port.path, scale unplugged, or the port is in use by another program.\nHow to fix: Run `weigh list-ports`, fix [port].path (or pass --port), and check device permissions."
            ),
            ReadError::Timeout { ms } => format!(
                "What happened: No stable weight within {ms} ms.\nLikely causes: The load was still moving, the scale sent no valid frames, or the line settings do not match the scale.\nHow to fix: Wait for the load to settle, check baud rate/parity in [port], or raise session.timeout_ms (--timeout-ms)."
            ),
            ReadError::Cancelled => {
                "What happened: The read was cancelled before the weight stabilized.\nLikely causes: Ctrl-C or the session was stopped.\nHow to fix: Run the command again.".to_string()
            }
            ReadError::Stream(msg) => format!(
                "What happened: The serial stream failed ({msg}).\nLikely causes: Cable unplugged or device reset during the read.\nHow to fix: Reconnect the scale, or set session.stream_errors = \"report\" to keep reading through transient errors."
            ),
            ReadError::Hardware(msg) => format!(
                "What happened: Hardware error ({msg}).\nLikely causes: Driver or device fault.\nHow to fix: Reconnect the scale and re-run with --log-level=debug for details."
            ),
            ReadError::Config(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun."
            ),
        };
    }

    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingSource => {
                "What happened: No frame source was provided to the read session.\nLikely causes: The port could not be assembled from the config.\nHow to fix: Check [port] in the config.".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun."
            ),
        };
    }

    if let Some(hw) = err.downcast_ref::<HwError>() {
        return format!(
            "What happened: {hw}.\nLikely causes: Serial subsystem unavailable or insufficient permissions.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
        );
    }

    // Generic fallback
    let msg = err.to_string();
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes: 2 port open, 3 timeout, 4 cancelled, 1 anything else.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    match err.downcast_ref::<ReadError>() {
        Some(ReadError::PortOpen { .. }) => 2,
        Some(ReadError::Timeout { .. }) => 3,
        Some(ReadError::Cancelled) => 4,
        _ => 1,
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    let reason = reason_name(err);
    let message = humanize(err);
    match err.downcast_ref::<ReadError>() {
        Some(ReadError::Timeout { ms }) => {
            json!({ "reason": reason, "details": { "timeout_ms": ms }, "message": message })
        }
        Some(ReadError::PortOpen { reason: detail }) => {
            json!({ "reason": reason, "details": { "port_error": detail }, "message": message })
        }
        _ => json!({ "reason": reason, "message": message }),
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ReadError::PortOpen { reason: "busy".into() }, 2, "PortOpen")]
    #[case(ReadError::Timeout { ms: 10 }, 3, "Timeout")]
    #[case(ReadError::Cancelled, 4, "Cancelled")]
    #[case(ReadError::Stream("x".into()), 1, "Stream")]
    fn exit_codes_and_reasons(#[case] e: ReadError, #[case] code: i32, #[case] name: &str) {
        let report = eyre::Report::new(e);
        assert_eq!(exit_code_for_error(&report), code);
        assert_eq!(reason_name(&report), name);
        assert!(humanize(&report).starts_with("What happened:"));
    }

    #[test]
    fn timeout_json_carries_the_budget() {
        let report = eyre::Report::new(ReadError::Timeout { ms: 1500 });
        let v: serde_json::Value = serde_json::from_str(&format_error_json(&report)).unwrap();
        assert_eq!(v["reason"], "Timeout");
        assert_eq!(v["details"]["timeout_ms"], 1500);
    }

    #[test]
    fn untyped_errors_fall_back() {
        let report = eyre::eyre!("boom");
        assert_eq!(exit_code_for_error(&report), 1);
        assert!(humanize(&report).contains("Original: boom"));
    }
}
