//! Daemon wire dialects and line framing
//!
//! Commands go out as NUL-terminated text. Replies come back as NUL- or
//! newline-terminated lines of the form `<code> [<seq>] <reason>`.

use bytes::{BufMut, Bytes, BytesMut};

use crate::netd;

/// Command-formatting dialect spoken by the daemon, fixed for the process lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    /// Older daemons: no sequence numbers, bracketed link state
    #[default]
    Legacy,
    /// Newer daemons: every command and reply carries a sequence token
    Sequenced,
}

impl Dialect {
    /// Select the dialect for a platform version
    pub fn from_sdk_version(sdk_version: u32) -> Self {
        if sdk_version >= netd::SEQUENCED_MIN_SDK_VERSION {
            Dialect::Sequenced
        } else {
            Dialect::Legacy
        }
    }

    /// Whether replies carry a sequence token ahead of the reason
    pub fn has_sequence(self) -> bool {
        self == Dialect::Sequenced
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dialect::Legacy => write!(f, "legacy"),
            Dialect::Sequenced => write!(f, "sequenced"),
        }
    }
}

/// Serialize one command for the wire
pub fn frame_command(dialect: Dialect, command: &str) -> Bytes {
    let mut buf = BytesMut::with_capacity(command.len() + 3);
    if dialect.has_sequence() {
        buf.put_slice(b"0 ");
    }
    buf.put_slice(command.as_bytes());
    buf.put_u8(0);
    buf.freeze()
}

/// Splits a byte stream into daemon lines
#[derive(Debug, Default)]
pub struct LineDecoder {
    buffer: BytesMut,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(4096),
        }
    }

    /// Add data to the decoder buffer
    pub fn extend(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Next complete line, without its terminator
    ///
    /// Empty lines are skipped. Invalid UTF-8 is replaced rather than rejected.
    pub fn next_line(&mut self) -> Option<String> {
        loop {
            let end = self.buffer.iter().position(|&b| b == 0 || b == b'\n')?;
            let line = self.buffer.split_to(end + 1);
            let text = String::from_utf8_lossy(&line[..end]);
            let text = text.trim_end_matches('\r');
            if !text.is_empty() {
                return Some(text.to_string());
            }
        }
    }

    /// Get the current buffer length (for debugging)
    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect_selection() {
        assert_eq!(Dialect::from_sdk_version(0), Dialect::Legacy);
        assert_eq!(Dialect::from_sdk_version(15), Dialect::Legacy);
        assert_eq!(Dialect::from_sdk_version(16), Dialect::Sequenced);
        assert_eq!(Dialect::from_sdk_version(19), Dialect::Sequenced);
    }

    #[test]
    fn test_frame_command() {
        assert_eq!(&frame_command(Dialect::Legacy, "tether status")[..], b"tether status\0");
        assert_eq!(&frame_command(Dialect::Sequenced, "tether status")[..], b"0 tether status\0");
    }

    #[test]
    fn test_line_decoder_split_reads() {
        let mut decoder = LineDecoder::new();
        decoder.extend(b"200 0 Tether");
        assert_eq!(decoder.next_line(), None);

        decoder.extend(b"ing started\0600 Iface added wlan0\n");
        assert_eq!(decoder.next_line().as_deref(), Some("200 0 Tethering started"));
        assert_eq!(decoder.next_line().as_deref(), Some("600 Iface added wlan0"));
        assert_eq!(decoder.next_line(), None);
        assert_eq!(decoder.buffer_len(), 0);
    }

    #[test]
    fn test_line_decoder_skips_empty_lines() {
        let mut decoder = LineDecoder::new();
        decoder.extend(b"\0\r\n\0200 ok\0");
        assert_eq!(decoder.next_line().as_deref(), Some("200 ok"));
        assert_eq!(decoder.next_line(), None);
    }
}
