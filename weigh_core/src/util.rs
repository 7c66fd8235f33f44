//! Small formatting helpers for log fields.

use std::fmt::Write;

/// Lowercase hex dump without separators, e.g. `0102532035302e30`.
pub fn hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
    out
}
