//! `From` implementations bridging `weigh_config` types to `weigh_core` types.

use crate::config::{SessionCfg, StreamErrorPolicy};

impl From<weigh_config::StreamErrors> for StreamErrorPolicy {
    fn from(c: weigh_config::StreamErrors) -> Self {
        match c {
            weigh_config::StreamErrors::Report => Self::Report,
            weigh_config::StreamErrors::Abort => Self::Abort,
        }
    }
}

impl From<&weigh_config::Config> for SessionCfg {
    fn from(c: &weigh_config::Config) -> Self {
        Self {
            stable_count: c.stability.consecutive,
            stream_errors: c.session.stream_errors.into(),
            timeout_ms: c.session.timeout_ms,
        }
    }
}
