//! Byte-stream side of the stable-weight reader.
//!
//! Everything here produces delimiter-split frames for a
//! `weigh_traits::FrameSource`: a serial port (`serial`), a simulated scale
//! (`sim`), or any other `std::io::Read` (`stream`). A `Pump` thread owns the
//! reader while the source is open.
pub mod delimiter;
pub mod error;
pub mod pump;
pub mod serial;
pub mod sim;
pub mod stream;

pub use delimiter::DelimiterSplitter;
pub use error::HwError;
pub use serial::{Parity, PortInfo, SerialSettings, list_ports, serial_source};
pub use sim::SimulatedScale;
pub use stream::{BoxReader, StreamFrameSource};
