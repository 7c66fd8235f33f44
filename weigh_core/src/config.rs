//! Configuration types for the read session.
//!
//! These are the runtime configuration structs used by `ReadSession`.
//! They are separate from the TOML-deserialized config in `weigh_config`.

use crate::stability::DEFAULT_STABLE_COUNT;

/// What a session does when the byte stream reports an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamErrorPolicy {
    /// Log it, emit a diagnostic, keep waiting for valid frames.
    #[default]
    Report,
    /// Fail the pending read with `ReadError::Stream` and stop.
    Abort,
}

#[derive(Debug, Clone)]
pub struct SessionCfg {
    /// Identical consecutive readings required for a stable weight.
    pub stable_count: u32,
    pub stream_errors: StreamErrorPolicy,
    /// Budget for `runner::read_stable`; the session itself never times out.
    pub timeout_ms: u64,
}

impl Default for SessionCfg {
    fn default() -> Self {
        Self {
            stable_count: DEFAULT_STABLE_COUNT,
            stream_errors: StreamErrorPolicy::Report,
            timeout_ms: 2000,
        }
    }
}
