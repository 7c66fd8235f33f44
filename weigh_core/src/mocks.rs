//! Test and helper mocks for weigh_core

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use weigh_traits::{FrameSource, Listeners};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A frame source driven by hand: frames and errors are delivered
/// synchronously on the calling thread, and only while the source is open.
#[derive(Debug, Default)]
pub struct ManualFrameSource {
    listeners: Listeners,
    open: Arc<AtomicBool>,
    opens: AtomicUsize,
    closes: AtomicUsize,
}

impl ManualFrameSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver one frame. Returns false when the source is closed.
    pub fn push(&self, frame: &[u8]) -> bool {
        self.feeder().push(frame)
    }

    /// Deliver a stream error. Returns false when the source is closed.
    pub fn push_error(&self, message: &str) -> bool {
        self.feeder().push_error(message)
    }

    /// A handle that can push from another thread.
    pub fn feeder(&self) -> Feeder {
        Feeder {
            listeners: self.listeners.clone(),
            open: Arc::clone(&self.open),
        }
    }

    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::Relaxed)
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::Relaxed)
    }
}

impl FrameSource for ManualFrameSource {
    fn open(&mut self) -> Result<(), BoxError> {
        self.opens.fetch_add(1, Ordering::Relaxed);
        self.open.store(true, Ordering::Release);
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    fn close(&mut self) -> Result<(), BoxError> {
        self.closes.fetch_add(1, Ordering::Relaxed);
        self.open.store(false, Ordering::Release);
        Ok(())
    }

    fn listeners(&self) -> &Listeners {
        &self.listeners
    }
}

/// Cloneable pushing side of a `ManualFrameSource`.
#[derive(Debug, Clone)]
pub struct Feeder {
    listeners: Listeners,
    open: Arc<AtomicBool>,
}

impl Feeder {
    pub fn push(&self, frame: &[u8]) -> bool {
        if !self.open.load(Ordering::Acquire) {
            return false;
        }
        self.listeners.emit_data(frame);
        true
    }

    pub fn push_error(&self, message: &str) -> bool {
        if !self.open.load(Ordering::Acquire) {
            return false;
        }
        let err = std::io::Error::other(message.to_string());
        self.listeners.emit_error(&err);
        true
    }
}

/// A source whose `open()` always fails as if the device were missing.
#[derive(Debug, Default)]
pub struct FailingSource {
    listeners: Listeners,
}

impl FrameSource for FailingSource {
    fn open(&mut self) -> Result<(), BoxError> {
        Err(Box::new(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "No such file or directory",
        )))
    }

    fn is_open(&self) -> bool {
        false
    }

    fn close(&mut self) -> Result<(), BoxError> {
        Ok(())
    }

    fn listeners(&self) -> &Listeners {
        &self.listeners
    }
}
