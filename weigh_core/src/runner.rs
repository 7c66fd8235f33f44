use crate::error::{ReadError, Result as CoreResult};
use crate::session::ReadSession;
use crate::weight::Weight;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use weigh_traits::FrameSource;

/// How often `read_stable_until` re-checks the cancel flag.
const CANCEL_POLL: Duration = Duration::from_millis(20);

#[inline]
fn duration_ms(d: Duration) -> u64 {
    d.as_millis().min(u128::from(u64::MAX)) as u64
}

/// Start a read and wait up to `timeout` for a stable weight.
///
/// On timeout the session is stopped and `ReadError::Timeout` returned,
/// unless the weight landed between the timeout and the stop.
pub fn read_stable<S: FrameSource>(
    session: &ReadSession<S>,
    timeout: Duration,
) -> CoreResult<Weight> {
    let flag = AtomicBool::new(false);
    read_stable_until(session, timeout, &flag)
}

/// Like `read_stable`, using the session's configured `timeout_ms`.
pub fn read_stable_default<S: FrameSource>(session: &ReadSession<S>) -> CoreResult<Weight> {
    read_stable(session, Duration::from_millis(session.config().timeout_ms))
}

/// Like `read_stable`, but also gives up with `ReadError::Cancelled` as soon
/// as `cancel` is raised (e.g. from a Ctrl-C handler).
pub fn read_stable_until<S: FrameSource>(
    session: &ReadSession<S>,
    timeout: Duration,
    cancel: &AtomicBool,
) -> CoreResult<Weight> {
    let pending = session.start();
    let start = Instant::now();
    tracing::debug!(timeout_ms = duration_ms(timeout), "waiting for stable weight");

    loop {
        if cancel.load(Ordering::Relaxed) {
            session.stop();
            tracing::info!("read cancelled");
            return Err(crate::error::Report::new(ReadError::Cancelled));
        }
        let left = timeout.saturating_sub(start.elapsed());
        if left.is_zero() {
            break;
        }
        match pending.wait_timeout(left.min(CANCEL_POLL)) {
            Ok(Some(weight)) => return Ok(weight),
            Ok(None) => continue,
            Err(e) => {
                tracing::error!(error = %e, "read failed");
                return Err(crate::error::Report::new(e));
            }
        }
    }

    session.stop();
    // A weight may have landed right before the stop.
    if let Ok(Some(weight)) = pending.try_get() {
        return Ok(weight);
    }
    let ms = duration_ms(timeout);
    tracing::warn!(timeout_ms = ms, "no stable weight before timeout");
    Err(crate::error::Report::new(ReadError::Timeout { ms }))
}
