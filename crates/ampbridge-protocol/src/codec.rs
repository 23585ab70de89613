//! Line framing for the amplifier's serial stream.
//!
//! Commands are terminated with carriage return (`\r`). Responses end with
//! `\r`, `\n` or both, and the amplifier sometimes emits blank lines, so any
//! run of delimiters counts as a single line break.

use std::io::{self, Read};

use bytes::{Buf, BytesMut};

use crate::error::ProtocolError;

/// Maximum response line length before the buffer is considered garbage.
pub const MAX_LINE_LENGTH: usize = 160;

/// Size of the chunk read from the byte stream at a time.
const READ_CHUNK: usize = 64;

fn is_delimiter(byte: u8) -> bool {
    byte == b'\r' || byte == b'\n'
}

/// A codec for reading and writing protocol lines.
///
/// This handles the line-based nature of the protocol:
/// - Accumulates received bytes until a complete line is found
/// - Splits on one or more `\r`/`\n` characters, discarding them
/// - Holds partial trailing bytes until their delimiter arrives
#[derive(Debug, Default)]
pub struct LineCodec {
    /// Buffer for accumulating incoming data.
    buffer: BytesMut,
}

impl LineCodec {
    /// Create a new line codec.
    pub fn new() -> Self {
        LineCodec {
            buffer: BytesMut::with_capacity(MAX_LINE_LENGTH * 2),
        }
    }

    /// Add received data to the buffer.
    ///
    /// If the buffer grows past [`MAX_LINE_LENGTH`] without any delimiter
    /// it can never become a valid line; it is dropped and the overflow is
    /// reported.
    pub fn push(&mut self, data: &[u8]) -> Result<(), ProtocolError> {
        self.buffer.extend_from_slice(data);
        if self.buffer.len() > MAX_LINE_LENGTH && !self.buffer.iter().copied().any(is_delimiter) {
            let actual = self.buffer.len();
            self.buffer.clear();
            log::warn!("dropping {} undelimited bytes", actual);
            return Err(ProtocolError::BufferOverflow {
                max: MAX_LINE_LENGTH,
                actual,
            });
        }
        Ok(())
    }

    /// Try to decode a complete line from the buffer.
    ///
    /// Returns `Some(line)` without its delimiter, or `None` if more data is
    /// needed. Empty lines are skipped.
    pub fn decode_line(&mut self) -> Option<String> {
        loop {
            let end = self.buffer.iter().position(|&b| is_delimiter(b))?;

            let line_data = self.buffer.split_to(end);
            while self.buffer.first().copied().is_some_and(is_delimiter) {
                self.buffer.advance(1);
            }

            if !line_data.is_empty() {
                return Some(String::from_utf8_lossy(&line_data).into_owned());
            }
        }
    }

    /// Take whatever is left in the buffer once the stream has ended.
    pub fn finish(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let rest = self.buffer.split();
        Some(String::from_utf8_lossy(&rest).into_owned())
    }

    /// Encode a command for transmission.
    ///
    /// Appends the carriage return terminator.
    pub fn encode_command(cmd: &str) -> Vec<u8> {
        let mut buf = Vec::with_capacity(cmd.len() + 1);
        buf.extend_from_slice(cmd.as_bytes());
        buf.push(b'\r');
        buf
    }

    /// Get the number of buffered bytes.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Clear the buffer.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

/// A lazy, non-restartable sequence of lines read from a byte stream.
///
/// Read timeouts and interrupts are retried, so a serial port opened with a
/// short timeout can be polled forever. Any other read error is yielded once
/// and ends the sequence.
pub struct Lines<R> {
    reader: R,
    codec: LineCodec,
    done: bool,
}

impl<R: Read> Lines<R> {
    /// Wrap a byte stream.
    pub fn new(reader: R) -> Self {
        Lines {
            reader,
            codec: LineCodec::new(),
            done: false,
        }
    }
}

impl<R: Read> Iterator for Lines<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            if let Some(line) = self.codec.decode_line() {
                return Some(Ok(line));
            }
            if self.done {
                return None;
            }
            match self.reader.read(&mut chunk) {
                Ok(0) => {
                    self.done = true;
                    return self.codec.finish().map(Ok);
                }
                Ok(n) => {
                    // Overflow is already logged; the garbage is gone either way.
                    let _ = self.codec.push(&chunk[..n]);
                }
                Err(e)
                    if matches!(
                        e.kind(),
                        io::ErrorKind::TimedOut | io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock
                    ) => {}
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}
