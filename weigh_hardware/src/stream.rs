//! `FrameSource` over any blocking byte stream.
//!
//! `open()` calls a connect function for a fresh reader and hands it to a
//! `Pump`; `close()` stops and joins the pump, which drops the reader.

use std::io::Read;

use weigh_traits::{FrameSource, Listeners};

use crate::error::{HwError, Result};
use crate::pump::Pump;

pub type BoxReader = Box<dyn Read + Send>;
type Connect = Box<dyn FnMut() -> Result<BoxReader> + Send>;

pub struct StreamFrameSource {
    name: String,
    connect: Connect,
    listeners: Listeners,
    pump: Option<Pump>,
}

impl core::fmt::Debug for StreamFrameSource {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StreamFrameSource")
            .field("name", &self.name)
            .field("open", &self.is_streaming())
            .field("listeners", &self.listeners)
            .finish()
    }
}

impl StreamFrameSource {
    /// `connect` is called on every `open()`.
    pub fn new(
        name: impl Into<String>,
        connect: impl FnMut() -> Result<BoxReader> + Send + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            connect: Box::new(connect),
            listeners: Listeners::new(),
            pump: None,
        }
    }

    /// Source over a single reader; it can be opened once.
    pub fn from_reader<R: Read + Send + 'static>(name: impl Into<String>, reader: R) -> Self {
        let mut reader = Some(reader);
        Self::new(name, move || {
            reader
                .take()
                .map(|r| Box::new(r) as BoxReader)
                .ok_or(HwError::Consumed)
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// False when not open or the stream reached EOF.
    pub fn is_streaming(&self) -> bool {
        self.pump.as_ref().is_some_and(Pump::is_running)
    }

    fn open_stream(&mut self) -> Result<()> {
        if let Some(mut pump) = self.pump.take() {
            if pump.is_running() {
                self.pump = Some(pump);
                return Err(HwError::AlreadyOpen);
            }
            pump.stop();
            tracing::debug!(stream = %self.name, "reaped ended stream");
        }
        let reader = (self.connect)()?;
        let pump = Pump::spawn(reader, self.listeners.clone(), &self.name)?;
        self.pump = Some(pump);
        tracing::debug!(stream = %self.name, "stream open");
        Ok(())
    }
}

impl FrameSource for StreamFrameSource {
    fn open(&mut self) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.open_stream().map_err(Into::into)
    }

    /// A stream that reached EOF is not open.
    fn is_open(&self) -> bool {
        self.is_streaming()
    }

    fn close(&mut self) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if let Some(mut pump) = self.pump.take() {
            pump.stop();
            tracing::debug!(stream = %self.name, "stream closed");
        }
        Ok(())
    }

    fn listeners(&self) -> &Listeners {
        &self.listeners
    }
}
