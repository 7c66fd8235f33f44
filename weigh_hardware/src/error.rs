use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("cannot open {path}: {reason}")]
    PortOpen { path: String, reason: String },
    #[error("no such serial port: {0}")]
    NoSuchPort(String),
    #[error("stream already open")]
    AlreadyOpen,
    #[error("one-shot stream was already consumed")]
    Consumed,
    #[error("serial: {0}")]
    Serial(#[from] serialport::Error),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HwError>;
