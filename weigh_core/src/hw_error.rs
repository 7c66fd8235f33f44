//! Maps `Box<dyn Error>` from the `FrameSource` boundary to typed `ReadError`.
//!
//! The trait in `weigh_traits` uses `Box<dyn Error + Send + Sync>` so any
//! byte-stream backend can plug in; this module converts those to our typed
//! error enum, with an optional feature-gated path for
//! `weigh_hardware::HwError` downcasting.

use crate::error::ReadError;

/// Map a trait-boundary error to a typed `ReadError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to string-based heuristics.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> ReadError {
    // Feature-gated: try to downcast to HwError for precise mapping
    #[cfg(feature = "hardware-errors")]
    {
        use weigh_hardware::error::HwError;
        if let Some(hw) = e.downcast_ref::<HwError>() {
            return match hw {
                HwError::PortOpen { .. } | HwError::NoSuchPort(_) => ReadError::PortOpen {
                    reason: hw.to_string(),
                },
                other => ReadError::Hardware(other.to_string()),
            };
        }
    }

    // Fallback: string-based detection
    let s = e.to_string();
    let lower = s.to_lowercase();
    if lower.contains("no such file") || lower.contains("not found") || lower.contains("permission denied")
    {
        ReadError::PortOpen { reason: s }
    } else {
        ReadError::Hardware(s)
    }
}

/// Map a failure of `FrameSource::open`. Anything not already classified is
/// still an open failure from the caller's point of view.
pub fn map_open_error(e: &(dyn std::error::Error + 'static)) -> ReadError {
    match map_hw_error(e) {
        ReadError::Hardware(reason) => ReadError::PortOpen { reason },
        other => other,
    }
}
