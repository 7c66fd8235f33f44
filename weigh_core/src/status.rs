//! Session phases and the diagnostics a session reports while reading.

use crate::error::FrameDiscard;
use crate::weight::Weight;

/// Lifecycle of a `ReadSession`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    /// Not subscribed; no pending read.
    #[default]
    Idle,
    /// Subscribed and waiting for a stable weight.
    Reading,
    /// Last read delivered a stable weight; not subscribed.
    Resolved,
}

/// Observable, non-fatal events of an active read. Sent on the optional
/// diagnostics channel in addition to being logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A frame passed validation.
    Reading(Weight),
    /// A frame failed validation and was dropped.
    FrameDiscarded(FrameDiscard),
    /// The byte stream reported an error.
    StreamError(String),
    /// The pending read was resolved with this weight.
    Stabilized(Weight),
}
