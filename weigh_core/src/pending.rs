//! Single-slot pending result handed out by `ReadSession::start`.
//!
//! Backed by a bounded(1) channel. The session keeps the `Resolver`; dropping
//! it without resolving (what `stop()` does) disconnects the channel and the
//! waiter sees `ReadError::Cancelled` instead of blocking forever.
use crossbeam_channel as xch;
use std::sync::OnceLock;
use std::time::Duration;

use crate::error::ReadError;
use crate::weight::Weight;

type Outcome = Result<Weight, ReadError>;

pub(crate) fn channel() -> (Resolver, PendingWeight) {
    let (tx, rx) = xch::bounded(1);
    (
        Resolver { tx },
        PendingWeight {
            rx,
            settled: OnceLock::new(),
        },
    )
}

/// Completing side. Consumed on use so a result is delivered at most once.
#[derive(Debug)]
pub(crate) struct Resolver {
    tx: xch::Sender<Outcome>,
}

impl Resolver {
    pub(crate) fn resolve(self, weight: Weight) {
        // Receiver may already be gone; nobody is waiting then.
        let _ = self.tx.try_send(Ok(weight));
    }

    pub(crate) fn fail(self, err: ReadError) {
        let _ = self.tx.try_send(Err(err));
    }
}

/// The caller's handle on a stable weight that may or may not arrive.
#[derive(Debug)]
pub struct PendingWeight {
    rx: xch::Receiver<Outcome>,
    settled: OnceLock<Outcome>,
}

impl PendingWeight {
    fn settle(&self, outcome: Outcome) -> Outcome {
        self.settled.get_or_init(|| outcome).clone()
    }

    /// Block until the session resolves or abandons this read.
    pub fn wait(&self) -> Result<Weight, ReadError> {
        if let Some(done) = self.settled.get() {
            return done.clone();
        }
        match self.rx.recv() {
            Ok(outcome) => self.settle(outcome),
            Err(xch::RecvError) => self.settle(Err(ReadError::Cancelled)),
        }
    }

    /// Like `wait`, but gives up after `timeout` with `Ok(None)`; the read is
    /// still pending afterwards.
    pub fn wait_timeout(&self, timeout: Duration) -> Result<Option<Weight>, ReadError> {
        if let Some(done) = self.settled.get() {
            return done.clone().map(Some);
        }
        match self.rx.recv_timeout(timeout) {
            Ok(outcome) => self.settle(outcome).map(Some),
            Err(xch::RecvTimeoutError::Timeout) => Ok(None),
            Err(xch::RecvTimeoutError::Disconnected) => {
                self.settle(Err(ReadError::Cancelled)).map(Some)
            }
        }
    }

    /// Non-blocking poll.
    pub fn try_get(&self) -> Result<Option<Weight>, ReadError> {
        if let Some(done) = self.settled.get() {
            return done.clone().map(Some);
        }
        match self.rx.try_recv() {
            Ok(outcome) => self.settle(outcome).map(Some),
            Err(xch::TryRecvError::Empty) => Ok(None),
            Err(xch::TryRecvError::Disconnected) => {
                self.settle(Err(ReadError::Cancelled)).map(Some)
            }
        }
    }

    /// True once the session dropped this read without a weight.
    pub fn is_abandoned(&self) -> bool {
        matches!(self.try_get(), Err(ReadError::Cancelled))
    }

    /// True once a weight or an error is available.
    pub fn is_settled(&self) -> bool {
        !matches!(self.try_get(), Ok(None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolved_weight_can_be_read_repeatedly() {
        let (resolver, pending) = channel();
        resolver.resolve(Weight::new(500, 1));
        assert_eq!(pending.wait(), Ok(Weight::new(500, 1)));
        assert_eq!(pending.wait(), Ok(Weight::new(500, 1)));
        assert_eq!(pending.try_get(), Ok(Some(Weight::new(500, 1))));
        assert!(!pending.is_abandoned());
    }

    #[test]
    fn dropped_resolver_cancels() {
        let (resolver, pending) = channel();
        assert_eq!(pending.try_get(), Ok(None));
        drop(resolver);
        assert!(pending.is_abandoned());
        assert_eq!(pending.wait(), Err(ReadError::Cancelled));
    }

    #[test]
    fn wait_timeout_leaves_read_pending() {
        let (resolver, pending) = channel();
        assert_eq!(pending.wait_timeout(Duration::from_millis(5)), Ok(None));
        assert!(!pending.is_settled());
        resolver.fail(ReadError::Stream("gone".into()));
        assert_eq!(
            pending.wait_timeout(Duration::from_millis(5)),
            Err(ReadError::Stream("gone".into()))
        );
    }

    #[test]
    fn resolves_across_threads() {
        let (resolver, pending) = channel();
        let t = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(10));
            resolver.resolve(Weight::new(1, 0));
        });
        assert_eq!(pending.wait(), Ok(Weight::new(1, 0)));
        t.join().unwrap();
    }
}
