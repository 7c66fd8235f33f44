use thiserror::Error;

/// Errors surfaced to callers of the read session and its helpers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReadError {
    #[error("failed to open port: {reason}")]
    PortOpen { reason: String },
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("timed out after {ms} ms waiting for a stable weight")]
    Timeout { ms: u64 },
    #[error("read cancelled before the weight stabilized")]
    Cancelled,
    #[error("stream error: {0}")]
    Stream(String),
    #[error("configuration error: {0}")]
    Config(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("missing frame source")]
    MissingSource,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

/// Why a frame was dropped by the validator. Never fatal to a session.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrameDiscard {
    #[error("incomplete frame ({len} bytes)")]
    TooShort { len: usize },
    #[error("merged frames ({len} bytes)")]
    TooLong { len: usize },
    #[error("invalid protocol header {found:02x?}")]
    BadHeader { found: [u8; 2] },
    #[error("invalid data identifier {found:02x?}")]
    BadIdentifier { found: [u8; 2] },
    #[error("weight field {field:?} is not a number")]
    BadWeight { field: String },
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
