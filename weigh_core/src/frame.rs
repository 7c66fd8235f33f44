//! Frame validation.
//!
//! The scale's protocol has no checksum, so every field is checked in turn and
//! the first failing check decides the discard reason. Discards are values,
//! not errors: a noisy line must never take a session down.
use weigh_traits::protocol::{
    HEADER, IDENTIFIER, MAX_FRAME_LEN, MIN_FRAME_LEN, WEIGHT_LEN, WEIGHT_OFFSET,
};

use crate::error::FrameDiscard;
use crate::weight::Weight;

/// A weight extracted from a frame that passed every check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedReading {
    pub weight: Weight,
}

/// Validate one delimiter-stripped frame.
///
/// Checks, in order: minimum length, maximum length (merged frames), header,
/// identifier, numeric weight field at offset 4..10 read as 7-bit ASCII.
pub fn validate(frame: &[u8]) -> Result<ParsedReading, FrameDiscard> {
    let len = frame.len();
    if len < MIN_FRAME_LEN {
        return Err(FrameDiscard::TooShort { len });
    }
    if len > MAX_FRAME_LEN {
        return Err(FrameDiscard::TooLong { len });
    }
    if frame[..2] != HEADER {
        return Err(FrameDiscard::BadHeader {
            found: [frame[0], frame[1]],
        });
    }
    if frame[2..4] != IDENTIFIER {
        return Err(FrameDiscard::BadIdentifier {
            found: [frame[2], frame[3]],
        });
    }

    let mut field = [0u8; WEIGHT_LEN];
    for (out, &b) in field
        .iter_mut()
        .zip(&frame[WEIGHT_OFFSET..WEIGHT_OFFSET + WEIGHT_LEN])
    {
        *out = ascii(b);
    }
    match Weight::parse_prefix(&field) {
        Some((weight, _)) => Ok(ParsedReading { weight }),
        None => Err(FrameDiscard::BadWeight {
            field: String::from_utf8_lossy(&field).into_owned(),
        }),
    }
}

/// 7-bit ASCII decoding: bit 7 is dropped, so a digit received with the high
/// bit set (parity mismatch, line noise) still reads as that digit.
fn ascii(b: u8) -> u8 {
    b & 0x7F
}
