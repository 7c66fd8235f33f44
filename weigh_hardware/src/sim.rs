//! Simulated scale: a byte stream of protocol frames.

use std::io::{self, Read};
use std::time::Duration;

use weigh_traits::protocol::wire_frame;

use crate::stream::{BoxReader, StreamFrameSource};

/// Emits one frame (with delimiter) per weight field, pausing `interval`
/// before each frame. Ends the stream after the last field unless `repeat`.
#[derive(Debug, Clone)]
pub struct SimulatedScale {
    fields: Vec<String>,
    interval: Duration,
    repeat: bool,
    next: usize,
    outgoing: Vec<u8>,
    sent: usize,
}

impl SimulatedScale {
    pub fn new(fields: Vec<String>, interval: Duration, repeat: bool) -> Self {
        Self {
            fields,
            interval,
            repeat,
            next: 0,
            outgoing: Vec::new(),
            sent: 0,
        }
    }

    /// Stream source that restarts the sequence on every `open()`.
    pub fn into_source(self) -> StreamFrameSource {
        StreamFrameSource::new("sim", move || Ok(Box::new(self.clone()) as BoxReader))
    }

    /// Load the next frame into `outgoing`; false at end of stream.
    fn refill(&mut self) -> bool {
        if self.next >= self.fields.len() {
            if !self.repeat || self.fields.is_empty() {
                return false;
            }
            self.next = 0;
        }
        if !self.interval.is_zero() {
            std::thread::sleep(self.interval);
        }
        self.outgoing = wire_frame(&self.fields[self.next]);
        self.sent = 0;
        self.next += 1;
        true
    }
}

impl Read for SimulatedScale {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.sent >= self.outgoing.len() && !self.refill() {
            return Ok(0);
        }
        let rest = &self.outgoing[self.sent..];
        let n = rest.len().min(buf.len());
        buf[..n].copy_from_slice(&rest[..n]);
        self.sent += n;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weigh_traits::protocol::frame_payload;

    fn fields(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn emits_wire_frames_then_ends() {
        let mut sim = SimulatedScale::new(fields(&["1.0", "2.0"]), Duration::ZERO, false);
        let mut out = Vec::new();
        sim.read_to_end(&mut out).unwrap();
        let mut expected = wire_frame("1.0");
        expected.extend(wire_frame("2.0"));
        assert_eq!(out, expected);
    }

    #[test]
    fn repeats_when_asked() {
        let mut sim = SimulatedScale::new(fields(&["7"]), Duration::ZERO, true);
        let frame = wire_frame("7");
        let mut buf = vec![0u8; frame.len() * 3];
        sim.read_exact(&mut buf).unwrap();
        assert_eq!(&buf[..frame.len()], frame.as_slice());
        assert_eq!(&buf[frame.len() * 2..], frame.as_slice());
    }

    #[test]
    fn small_reads_split_frames() {
        let mut sim = SimulatedScale::new(fields(&["50.0"]), Duration::ZERO, false);
        let mut one = [0u8; 1];
        let mut got = Vec::new();
        while sim.read(&mut one).unwrap() == 1 {
            got.push(one[0]);
        }
        assert!(got.starts_with(&frame_payload("50.0")));
    }

    #[test]
    fn empty_sequence_is_an_empty_stream() {
        let mut sim = SimulatedScale::new(Vec::new(), Duration::ZERO, true);
        assert_eq!(sim.read(&mut [0u8; 8]).unwrap(), 0);
    }
}
