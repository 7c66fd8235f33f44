//! Wire constants of the scale's framing protocol.
//!
//! One frame on the wire:
//!
//! ```text
//! 0x01 0x02 | 0x53 0x20 | 6 x ASCII weight | <= 6 padding bytes | 0x03 0x04 0x00
//!  header     "S "        offset 4..10       offset 10..16        delimiter
//! ```
//!
//! The delimiter is stripped by the frame source before a frame reaches
//! listeners.

pub const HEADER: [u8; 2] = [0x01, 0x02];
/// ASCII `"S "`.
pub const IDENTIFIER: [u8; 2] = [0x53, 0x20];
pub const DELIMITER: [u8; 3] = [0x03, 0x04, 0x00];

pub const WEIGHT_OFFSET: usize = 4;
pub const WEIGHT_LEN: usize = 6;
/// Header + identifier + weight field.
pub const MIN_FRAME_LEN: usize = HEADER.len() + IDENTIFIER.len() + WEIGHT_LEN;
/// Anything longer is treated as several frames merged together.
pub const MAX_FRAME_LEN: usize = 16;

/// Build the payload of one frame (without delimiter) around a weight field.
/// The field is right-aligned and space padded to `WEIGHT_LEN`; longer fields
/// are truncated.
pub fn frame_payload(weight_field: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(MIN_FRAME_LEN);
    out.extend_from_slice(&HEADER);
    out.extend_from_slice(&IDENTIFIER);
    let field = weight_field.as_bytes();
    let field = &field[..field.len().min(WEIGHT_LEN)];
    out.extend(std::iter::repeat_n(b' ', WEIGHT_LEN - field.len()));
    out.extend_from_slice(field);
    out
}

/// `frame_payload` followed by the delimiter, as it appears on the wire.
pub fn wire_frame(weight_field: &str) -> Vec<u8> {
    let mut out = frame_payload(weight_field);
    out.extend_from_slice(&DELIMITER);
    out
}
