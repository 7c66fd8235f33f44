//! Splits a byte stream into frames on a multi-byte delimiter.

use weigh_traits::protocol::DELIMITER;

/// Bytes kept while waiting for a delimiter before the buffer is dropped.
pub const MAX_BUFFERED: usize = 64 * 1024;

#[derive(Debug, Clone)]
pub struct DelimiterSplitter {
    delimiter: Vec<u8>,
    buf: Vec<u8>,
    max_buffered: usize,
}

impl Default for DelimiterSplitter {
    fn default() -> Self {
        Self {
            delimiter: DELIMITER.to_vec(),
            buf: Vec::with_capacity(64),
            max_buffered: MAX_BUFFERED,
        }
    }
}

impl DelimiterSplitter {
    /// Splitter on a custom delimiter. `None` for an empty delimiter.
    pub fn with_delimiter(delimiter: &[u8]) -> Option<Self> {
        if delimiter.is_empty() {
            return None;
        }
        Some(Self {
            delimiter: delimiter.to_vec(),
            ..Self::default()
        })
    }

    pub fn with_max_buffered(mut self, max: usize) -> Self {
        self.max_buffered = max;
        self
    }

    /// Feed bytes; `on_frame` receives every complete, non-empty segment
    /// that precedes a delimiter. The partial tail is kept for the next call.
    pub fn push(&mut self, bytes: &[u8], mut on_frame: impl FnMut(&[u8])) {
        self.buf.extend_from_slice(bytes);

        let mut start = 0;
        while let Some(pos) = find(&self.buf[start..], &self.delimiter) {
            let segment = &self.buf[start..start + pos];
            if !segment.is_empty() {
                on_frame(segment);
            }
            start += pos + self.delimiter.len();
        }
        self.buf.drain(..start);

        if self.buf.len() > self.max_buffered {
            tracing::warn!(
                buffered = self.buf.len(),
                max = self.max_buffered,
                "no delimiter in stream, dropping buffered bytes"
            );
            self.buf.clear();
        }
    }

    /// Bytes waiting for a delimiter.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(s: &mut DelimiterSplitter, bytes: &[u8]) -> Vec<Vec<u8>> {
        let mut out = Vec::new();
        s.push(bytes, |f| out.push(f.to_vec()));
        out
    }

    #[test]
    fn splits_on_the_protocol_delimiter() {
        let mut s = DelimiterSplitter::default();
        let frames = split(&mut s, b"ab\x03\x04\x00cd\x03\x04\x00ef");
        assert_eq!(frames, vec![b"ab".to_vec(), b"cd".to_vec()]);
        assert_eq!(s.pending(), 2);
    }

    #[test]
    fn reassembles_across_reads() {
        let mut s = DelimiterSplitter::default();
        assert!(split(&mut s, b"hel").is_empty());
        assert!(split(&mut s, b"lo\x03").is_empty());
        assert!(split(&mut s, b"\x04").is_empty());
        assert_eq!(split(&mut s, b"\x00"), vec![b"hello".to_vec()]);
        assert_eq!(s.pending(), 0);
    }

    #[test]
    fn empty_segments_are_skipped() {
        let mut s = DelimiterSplitter::default();
        let frames = split(&mut s, b"\x03\x04\x00\x03\x04\x00x\x03\x04\x00");
        assert_eq!(frames, vec![b"x".to_vec()]);
    }

    #[test]
    fn overflow_clears_the_buffer() {
        let mut s = DelimiterSplitter::default().with_max_buffered(8);
        assert!(split(&mut s, &[b'z'; 9]).is_empty());
        assert_eq!(s.pending(), 0);
        assert_eq!(split(&mut s, b"ok\x03\x04\x00"), vec![b"ok".to_vec()]);
    }

    #[test]
    fn custom_delimiter() {
        assert!(DelimiterSplitter::with_delimiter(&[]).is_none());
        let mut s = DelimiterSplitter::with_delimiter(b"\r\n").unwrap();
        assert_eq!(split(&mut s, b"1\r\n2\r\n"), vec![b"1".to_vec(), b"2".to_vec()]);
    }
}
