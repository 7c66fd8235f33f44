//! Background reader thread that feeds a `Listeners` registry.
//!
//! Spawns a thread that owns the byte stream, splits it into frames and
//! dispatches them to data listeners; I/O failures go to error listeners.
//!
//! Safety: each `Pump` spawns exactly one thread, shut down and joined when
//! the `Pump` is stopped or dropped. Shutdown latency is bounded by one
//! blocking `read()` (the port's read timeout).
use std::io::{self, Read};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use weigh_traits::Listeners;

use crate::delimiter::DelimiterSplitter;

/// Pause after a hard read error so a dead device does not spin the thread.
pub const ERROR_BACKOFF: Duration = Duration::from_millis(50);

const READ_CHUNK: usize = 256;

pub struct Pump {
    /// Shutdown flag, checked between reads
    shutdown: Arc<AtomicBool>,
    join_handle: Option<JoinHandle<()>>,
}

impl core::fmt::Debug for Pump {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Pump")
            .field("running", &self.is_running())
            .finish()
    }
}

/// Read timeouts and signals are part of normal polling.
fn is_transient(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}

impl Pump {
    pub fn spawn<R: Read + Send + 'static>(
        mut reader: R,
        listeners: Listeners,
        name: &str,
    ) -> io::Result<Self> {
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();
        let stream = name.to_string();

        let join_handle = std::thread::Builder::new()
            .name(format!("pump:{name}"))
            .spawn(move || {
                let mut splitter = DelimiterSplitter::default();
                let mut chunk = [0u8; READ_CHUNK];
                loop {
                    if shutdown_clone.load(Ordering::Relaxed) {
                        tracing::debug!(stream = %stream, "pump received shutdown signal");
                        break;
                    }
                    match reader.read(&mut chunk) {
                        Ok(0) => {
                            tracing::debug!(stream = %stream, "stream reached end");
                            break;
                        }
                        Ok(n) => splitter.push(&chunk[..n], |frame| listeners.emit_data(frame)),
                        Err(e) if is_transient(&e) => {}
                        Err(e) => {
                            tracing::warn!(stream = %stream, error = %e, "stream read failed");
                            listeners.emit_error(&e);
                            if shutdown_clone.load(Ordering::Relaxed) {
                                break;
                            }
                            std::thread::sleep(ERROR_BACKOFF);
                        }
                    }
                }
                tracing::trace!(stream = %stream, "pump thread exiting cleanly");
            })?;

        Ok(Self {
            shutdown,
            join_handle: Some(join_handle),
        })
    }

    /// False once the thread has exited (EOF or shutdown).
    pub fn is_running(&self) -> bool {
        self.join_handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Signal shutdown and join the thread. Idempotent.
    pub fn stop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.join_handle.take() {
            match handle.join() {
                Ok(()) => tracing::trace!("pump thread joined successfully"),
                Err(e) => tracing::warn!(?e, "pump thread panicked during shutdown"),
            }
        }
    }
}

impl Drop for Pump {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel as xch;

    #[test]
    fn delivers_frames_and_exits_on_eof() {
        let listeners = Listeners::new();
        let (tx, rx) = xch::unbounded();
        listeners.on_data(Box::new(move |f: &[u8]| {
            let _ = tx.send(f.to_vec());
        }));
        let bytes: &'static [u8] = b"one\x03\x04\x00two\x03\x04\x00";
        let mut pump = Pump::spawn(bytes, listeners, "test").unwrap();
        let got: Vec<_> = (0..2)
            .map(|_| rx.recv_timeout(Duration::from_secs(2)).unwrap())
            .collect();
        assert_eq!(got, vec![b"one".to_vec(), b"two".to_vec()]);
        pump.stop();
        assert!(!pump.is_running());
    }

    struct Broken;

    impl Read for Broken {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::other("cable unplugged"))
        }
    }

    #[test]
    fn hard_errors_reach_error_listeners() {
        let listeners = Listeners::new();
        let (tx, rx) = xch::unbounded();
        listeners.on_error(Box::new(move |e: &(dyn std::error::Error + 'static)| {
            let _ = tx.send(e.to_string());
        }));
        let pump = Pump::spawn(Broken, listeners, "broken").unwrap();
        assert_eq!(
            rx.recv_timeout(Duration::from_secs(2)).unwrap(),
            "cable unplugged"
        );
        drop(pump);
    }

    struct Idle;

    impl Read for Idle {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            std::thread::sleep(Duration::from_millis(5));
            Err(io::ErrorKind::TimedOut.into())
        }
    }

    #[test]
    fn timeouts_are_silent_and_stop_joins() {
        let listeners = Listeners::new();
        let (tx, rx) = xch::unbounded::<()>();
        listeners.on_error(Box::new(move |_: &(dyn std::error::Error + 'static)| {
            let _ = tx.send(());
        }));
        let mut pump = Pump::spawn(Idle, listeners, "idle").unwrap();
        std::thread::sleep(Duration::from_millis(30));
        assert!(pump.is_running());
        pump.stop();
        pump.stop();
        assert!(rx.try_recv().is_err());
    }
}
