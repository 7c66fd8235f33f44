//! Builder for `ReadSession`.
//!
//! `build()` validates the settings and fails with `BuildError` wrapped in an
//! `eyre::Report`, like every other fallible constructor in this crate.

use crossbeam_channel as xch;
use weigh_traits::FrameSource;

use crate::config::{SessionCfg, StreamErrorPolicy};
use crate::error::{BuildError, Result};
use crate::session::ReadSession;
use crate::status::Diagnostic;

pub struct ReadSessionBuilder<S> {
    source: Option<S>,
    cfg: SessionCfg,
    diagnostics: Option<xch::Sender<Diagnostic>>,
}

impl<S: FrameSource> Default for ReadSessionBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: FrameSource> ReadSessionBuilder<S> {
    pub fn new() -> Self {
        Self {
            source: None,
            cfg: SessionCfg::default(),
            diagnostics: None,
        }
    }

    pub fn with_source(mut self, source: S) -> Self {
        self.source = Some(source);
        self
    }

    /// Replace all settings at once (e.g. from `weigh_config`).
    pub fn with_config(mut self, cfg: SessionCfg) -> Self {
        self.cfg = cfg;
        self
    }

    pub fn with_stable_count(mut self, n: u32) -> Self {
        self.cfg.stable_count = n;
        self
    }

    pub fn with_stream_errors(mut self, policy: StreamErrorPolicy) -> Self {
        self.cfg.stream_errors = policy;
        self
    }

    pub fn with_timeout_ms(mut self, ms: u64) -> Self {
        self.cfg.timeout_ms = ms;
        self
    }

    /// Receive a copy of every `Diagnostic`. Sends never block; use a
    /// bounded channel sized for the expected burst or an unbounded one.
    pub fn with_diagnostics(mut self, tx: xch::Sender<Diagnostic>) -> Self {
        self.diagnostics = Some(tx);
        self
    }

    pub fn build(self) -> Result<ReadSession<S>> {
        let source = self
            .source
            .ok_or_else(|| eyre::Report::new(BuildError::MissingSource))?;
        if self.cfg.stable_count == 0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "stable_count must be >= 1",
            )));
        }
        if self.cfg.timeout_ms == 0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "timeout_ms must be >= 1",
            )));
        }
        Ok(ReadSession::from_parts(source, self.cfg, self.diagnostics))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::ManualFrameSource;

    #[test]
    fn missing_source_is_reported() {
        let err = ReadSessionBuilder::<ManualFrameSource>::new()
            .build()
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<BuildError>(),
            Some(&BuildError::MissingSource)
        );
    }

    #[test]
    fn zero_stable_count_is_rejected() {
        let err = ReadSession::builder()
            .with_source(ManualFrameSource::new())
            .with_stable_count(0)
            .build()
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BuildError>(),
            Some(BuildError::InvalidConfig(_))
        ));
    }

    #[test]
    fn settings_reach_the_session() {
        let s = ReadSession::builder()
            .with_source(ManualFrameSource::new())
            .with_stable_count(3)
            .with_stream_errors(StreamErrorPolicy::Abort)
            .with_timeout_ms(250)
            .build()
            .unwrap();
        assert_eq!(s.config().stable_count, 3);
        assert_eq!(s.config().stream_errors, StreamErrorPolicy::Abort);
        assert_eq!(s.config().timeout_ms, 250);
    }
}
