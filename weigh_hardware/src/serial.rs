//! Serial port access through the `serialport` crate.

use std::time::Duration;

use serialport::{DataBits, SerialPort, SerialPortType, StopBits};

use crate::error::{HwError, Result};
use crate::stream::{BoxReader, StreamFrameSource};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Parity {
    #[default]
    None,
    Odd,
    Even,
}

/// Line settings. Defaults are the scale's factory settings, 9600 8N1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialSettings {
    pub path: String,
    pub baud_rate: u32,
    pub data_bits: u8,
    pub parity: Parity,
    pub stop_bits: u8,
    /// Per-read timeout; also bounds how long closing the source takes.
    pub read_timeout: Duration,
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self {
            path: String::new(),
            baud_rate: 9600,
            data_bits: 8,
            parity: Parity::None,
            stop_bits: 1,
            read_timeout: Duration::from_millis(100),
        }
    }
}

impl SerialSettings {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    fn invalid(&self, reason: &str) -> HwError {
        HwError::PortOpen {
            path: self.path.clone(),
            reason: reason.to_string(),
        }
    }

    pub fn open(&self) -> Result<Box<dyn SerialPort>> {
        let data_bits = match self.data_bits {
            5 => DataBits::Five,
            6 => DataBits::Six,
            7 => DataBits::Seven,
            8 => DataBits::Eight,
            _ => return Err(self.invalid("data bits must be 5..=8")),
        };
        let stop_bits = match self.stop_bits {
            1 => StopBits::One,
            2 => StopBits::Two,
            _ => return Err(self.invalid("stop bits must be 1 or 2")),
        };
        let parity = match self.parity {
            Parity::None => serialport::Parity::None,
            Parity::Odd => serialport::Parity::Odd,
            Parity::Even => serialport::Parity::Even,
        };

        let port = serialport::new(&self.path, self.baud_rate)
            .data_bits(data_bits)
            .parity(parity)
            .stop_bits(stop_bits)
            .timeout(self.read_timeout)
            .open()
            .map_err(|e| self.open_error(e))?;
        tracing::info!(
            path = %self.path,
            baud = self.baud_rate,
            data_bits = self.data_bits,
            parity = ?self.parity,
            stop_bits = self.stop_bits,
            "serial port open"
        );
        Ok(port)
    }

    fn open_error(&self, e: serialport::Error) -> HwError {
        match e.kind() {
            serialport::ErrorKind::NoDevice
            | serialport::ErrorKind::Io(std::io::ErrorKind::NotFound) => {
                HwError::NoSuchPort(self.path.clone())
            }
            _ => HwError::PortOpen {
                path: self.path.clone(),
                reason: e.to_string(),
            },
        }
    }
}

/// Frame source reading the scale on a serial port. The port is opened on
/// `open()` and released on `close()`; it can be reopened.
pub fn serial_source(settings: SerialSettings) -> StreamFrameSource {
    let name = settings.path.clone();
    StreamFrameSource::new(name, move || {
        settings.open().map(|port| Box::new(port) as BoxReader)
    })
}

/// An available serial port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    pub name: String,
    pub description: String,
}

pub fn list_ports() -> Result<Vec<PortInfo>> {
    let ports = serialport::available_ports()?;
    Ok(ports
        .into_iter()
        .map(|p| PortInfo {
            description: describe(&p.port_type),
            name: p.port_name,
        })
        .collect())
}

fn describe(kind: &SerialPortType) -> String {
    match kind {
        SerialPortType::UsbPort(usb) => {
            let mut s = format!("USB {:04x}:{:04x}", usb.vid, usb.pid);
            if let Some(product) = &usb.product {
                s.push(' ');
                s.push_str(product);
            }
            s
        }
        SerialPortType::PciPort => "PCI".into(),
        SerialPortType::BluetoothPort => "Bluetooth".into(),
        SerialPortType::Unknown => "unknown".into(),
    }
}
