//! Read session: turns a stream of frames into one stable weight.
//!
//! A session owns its frame source. `start()` subscribes one data listener
//! and one error listener and hands back a `PendingWeight`; every frame runs
//! through the validator and the stability tracker while the session state
//! lock is held, so a frame is processed atomically. When the tracker
//! stabilizes, the pending read is resolved and the session unsubscribes
//! itself from inside the dispatch.
//!
//! Invariants:
//! - at most one subscription exists per session; `start()` while reading
//!   cancels the previous one first
//! - tracker state never survives a stop, a restart or a resolution
//! - `stop()` is idempotent and never completes the pending read with a
//!   weight; the waiter observes `ReadError::Cancelled`
use crossbeam_channel as xch;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use weigh_traits::{FrameSource, ListenerId, Listeners};

use crate::builder::ReadSessionBuilder;
use crate::config::{SessionCfg, StreamErrorPolicy};
use crate::error::ReadError;
use crate::frame;
use crate::hw_error::{map_hw_error, map_open_error};
use crate::pending::{self, PendingWeight, Resolver};
use crate::stability::{Observation, StabilityState, StabilityTracker};
use crate::status::{Diagnostic, SessionPhase};
use crate::util::hex;

pub struct ReadSession<S: FrameSource> {
    source: S,
    cfg: SessionCfg,
    shared: Arc<Mutex<Shared>>,
}

impl<S: FrameSource> core::fmt::Debug for ReadSession<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let shared = lock(&self.shared);
        f.debug_struct("ReadSession")
            .field("phase", &shared.phase)
            .field("stability", &shared.tracker.state())
            .field("source_open", &self.source.is_open())
            .finish()
    }
}

/// The pair of listener registrations owned by one active read.
struct Subscription {
    listeners: Listeners,
    data: ListenerId,
    error: ListenerId,
}

impl Subscription {
    fn cancel(self) {
        self.listeners.remove(self.data);
        self.listeners.remove(self.error);
    }
}

struct Shared {
    phase: SessionPhase,
    tracker: StabilityTracker,
    resolver: Option<Resolver>,
    subscription: Option<Subscription>,
    /// Bumped by every `start()`; listeners of older reads are ignored.
    generation: u64,
    stream_errors: StreamErrorPolicy,
    diagnostics: Option<xch::Sender<Diagnostic>>,
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Shared {
    /// Unsubscribe, reset the tracker, drop the pending read, go idle.
    /// Returns whether a read was active.
    fn halt(&mut self) -> bool {
        if let Some(sub) = self.subscription.take() {
            sub.cancel();
        }
        self.tracker.reset();
        self.resolver = None;
        let was_reading = self.phase == SessionPhase::Reading;
        self.phase = SessionPhase::Idle;
        was_reading
    }

    fn is_current(&self, generation: u64) -> bool {
        self.phase == SessionPhase::Reading && self.generation == generation
    }

    fn emit(&self, d: Diagnostic) {
        if let Some(tx) = &self.diagnostics {
            // Never block the pump on a slow or absent consumer.
            let _ = tx.try_send(d);
        }
    }

    fn handle_frame(&mut self, generation: u64, raw: &[u8]) {
        if !self.is_current(generation) {
            return;
        }
        let weight = match frame::validate(raw) {
            Ok(reading) => reading.weight,
            Err(discard) => {
                tracing::warn!(reason = %discard, raw = %hex(raw), "frame discarded");
                self.emit(Diagnostic::FrameDiscarded(discard));
                return;
            }
        };
        tracing::trace!(%weight, raw = %hex(raw), "reading");
        self.emit(Diagnostic::Reading(weight));

        match self.tracker.observe(weight) {
            Observation::Stabilized(stable) => {
                tracing::info!(weight = %stable, "weight stabilized");
                self.emit(Diagnostic::Stabilized(stable));
                if let Some(resolver) = self.resolver.take() {
                    resolver.resolve(stable);
                }
                self.halt();
                self.phase = SessionPhase::Resolved;
            }
            Observation::Settling { same_count } => {
                tracing::trace!(same_count, "settling");
            }
            Observation::Ignored => {}
        }
    }

    fn handle_error(&mut self, generation: u64, err: &(dyn std::error::Error + 'static)) {
        if !self.is_current(generation) {
            return;
        }
        tracing::error!(error = %err, "serial stream error");
        self.emit(Diagnostic::StreamError(err.to_string()));
        if self.stream_errors == StreamErrorPolicy::Abort {
            if let Some(resolver) = self.resolver.take() {
                resolver.fail(ReadError::Stream(err.to_string()));
            }
            self.halt();
            tracing::debug!("read aborted on stream error");
        }
    }
}

impl<S: FrameSource> ReadSession<S> {
    /// Session with default settings (5 identical readings, errors reported).
    pub fn new(source: S) -> Self {
        Self::from_parts(source, SessionCfg::default(), None)
    }

    pub fn builder() -> ReadSessionBuilder<S> {
        ReadSessionBuilder::new()
    }

    pub(crate) fn from_parts(
        source: S,
        cfg: SessionCfg,
        diagnostics: Option<xch::Sender<Diagnostic>>,
    ) -> Self {
        let shared = Shared {
            phase: SessionPhase::Idle,
            tracker: StabilityTracker::new(cfg.stable_count),
            resolver: None,
            subscription: None,
            generation: 0,
            stream_errors: cfg.stream_errors,
            diagnostics,
        };
        Self {
            source,
            cfg,
            shared: Arc::new(Mutex::new(shared)),
        }
    }

    /// Open the underlying stream. A no-op when it is already open.
    pub fn open(&mut self) -> Result<(), ReadError> {
        if self.source.is_open() {
            return Ok(());
        }
        if let Err(e) = self.source.open() {
            let err = map_open_error(&*e);
            tracing::error!(error = %err, "failed to open frame source");
            return Err(err);
        }
        tracing::info!("frame source opened");
        Ok(())
    }

    /// Stop any active read, then close the stream if it is open.
    pub fn close(&mut self) -> Result<(), ReadError> {
        self.stop();
        if !self.source.is_open() {
            return Ok(());
        }
        self.source.close().map_err(|e| map_hw_error(&*e))?;
        tracing::info!("frame source closed");
        Ok(())
    }

    /// Begin waiting for a stable weight. Restarts an active read.
    ///
    /// Returns immediately; frames are processed on the source's pump thread.
    /// The source does not need to be open yet.
    pub fn start(&self) -> PendingWeight {
        let mut shared = lock(&self.shared);
        if shared.halt() {
            tracing::debug!("restarting active read");
        }
        shared.generation = shared.generation.wrapping_add(1);
        let generation = shared.generation;

        let (resolver, pending) = pending::channel();
        shared.resolver = Some(resolver);

        let weak = Arc::downgrade(&self.shared);
        let data = self.source.on_data(Box::new(move |raw: &[u8]| {
            if let Some(shared) = weak.upgrade() {
                lock(&shared).handle_frame(generation, raw);
            }
        }));
        let weak = Arc::downgrade(&self.shared);
        let error = self.source.on_error(Box::new(
            move |err: &(dyn std::error::Error + 'static)| {
                if let Some(shared) = weak.upgrade() {
                    lock(&shared).handle_error(generation, err);
                }
            },
        ));
        shared.subscription = Some(Subscription {
            listeners: self.source.listeners().clone(),
            data,
            error,
        });
        shared.phase = SessionPhase::Reading;
        tracing::debug!(generation, "read started");
        pending
    }

    /// Abandon the active read, if any. Safe to call in any phase.
    pub fn stop(&self) {
        if lock(&self.shared).halt() {
            tracing::debug!("read stopped");
        }
    }

    /// A handle that can stop this session from another thread.
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            shared: Arc::downgrade(&self.shared),
        }
    }

    pub fn phase(&self) -> SessionPhase {
        lock(&self.shared).phase
    }

    pub fn is_reading(&self) -> bool {
        self.phase() == SessionPhase::Reading
    }

    /// Snapshot of the tracker state.
    pub fn stability(&self) -> StabilityState {
        lock(&self.shared).tracker.state()
    }

    pub fn config(&self) -> &SessionCfg {
        &self.cfg
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }
}

impl<S: FrameSource> Drop for ReadSession<S> {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Stops the session it came from; does nothing once the session is gone.
#[derive(Debug, Clone)]
pub struct StopHandle {
    shared: Weak<Mutex<Shared>>,
}

impl StopHandle {
    pub fn stop(&self) {
        if let Some(shared) = self.shared.upgrade()
            && lock(&shared).halt()
        {
            tracing::debug!("read stopped via handle");
        }
    }
}
