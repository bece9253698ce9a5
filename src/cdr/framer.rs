// src/cdr/framer.rs
use bytes::BytesMut;

/// Reassembles newline-terminated CDR lines from a TCP byte stream.
///
/// One framer per connection. Bytes from each read are appended to a
/// carry-over buffer, so a record split across any number of reads is
/// still emitted as a single line. Lines come out in wire order with the
/// terminator (and any trailing `\r`) stripped. Whatever is left without
/// a terminator when the connection closes is dropped, never parsed: a
/// truncated final record is worse than a missing one.
pub struct LineFramer {
    buf: BytesMut,
}

impl LineFramer {
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(4096),
        }
    }

    /// Appends a chunk and drains every complete line it unlocked.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let mut line = self.buf.split_to(pos + 1);
            line.truncate(pos);
            if line.last() == Some(&b'\r') {
                line.truncate(line.len() - 1);
            }
            lines.push(String::from_utf8_lossy(&line).into_owned());
        }
        lines
    }

    /// Bytes buffered without a terminator yet.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_complete_line() {
        let mut framer = LineFramer::new();
        let lines = framer.push(b"CALL-1\t50\tdata\n");
        assert_eq!(lines, vec!["CALL-1\t50\tdata"]);
        assert_eq!(framer.pending(), 0);
    }

    #[test]
    fn test_line_split_across_reads() {
        let mut framer = LineFramer::new();
        assert!(framer.push(b"CALL-1\t5").is_empty());
        assert_eq!(framer.pending(), 8);

        let lines = framer.push(b"0\tdata\n");
        assert_eq!(lines, vec!["CALL-1\t50\tdata"]);
        assert_eq!(framer.pending(), 0);
    }

    #[test]
    fn test_multiple_lines_in_one_chunk() {
        let mut framer = LineFramer::new();
        let lines = framer.push(b"first\nsecond\nthird");
        assert_eq!(lines, vec!["first", "second"]);
        assert_eq!(framer.pending(), 5);
    }

    #[test]
    fn test_crlf_terminator() {
        let mut framer = LineFramer::new();
        let lines = framer.push(b"CALL-1\tdata\r\n");
        assert_eq!(lines, vec!["CALL-1\tdata"]);
    }

    #[test]
    fn test_empty_line_emitted() {
        let mut framer = LineFramer::new();
        let lines = framer.push(b"\n\n");
        assert_eq!(lines, vec!["", ""]);
    }

    #[test]
    fn test_order_preserved() {
        let mut framer = LineFramer::new();
        let mut all = framer.push(b"a\nb");
        all.extend(framer.push(b"1\nc\n"));
        assert_eq!(all, vec!["a", "b1", "c"]);
    }
}
