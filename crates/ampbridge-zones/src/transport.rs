//! The outbound half of the shared serial link.
//!
//! Zones only ever write whole frames. Reading is handled separately by
//! [`crate::Dispatcher::run`] over any [`std::io::Read`], so the same zones
//! work over a serial port, a TCP serial server or an in-memory buffer.

use std::io::Write;

use parking_lot::Mutex;

use crate::error::TransportError;

/// A shared, write-only byte sink for command frames.
///
/// Implementations must write each frame atomically with respect to other
/// frames; no ordering between callers is promised.
pub trait Transport: Send + Sync {
    /// Write one complete frame (including its terminator).
    fn write_frame(&self, frame: &[u8]) -> Result<(), TransportError>;
}

/// A [`Transport`] over any [`Write`], serialized by a mutex.
pub struct WriterTransport<W> {
    writer: Mutex<W>,
}

impl<W: Write + Send> WriterTransport<W> {
    /// Wrap a writer.
    pub fn new(writer: W) -> Self {
        WriterTransport {
            writer: Mutex::new(writer),
        }
    }

    /// Unwrap the writer.
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl<W: Write + Send> Transport for WriterTransport<W> {
    fn write_frame(&self, frame: &[u8]) -> Result<(), TransportError> {
        let mut writer = self.writer.lock();
        writer.write_all(frame)?;
        writer.flush()?;
        Ok(())
    }
}

/// An in-memory [`Transport`] that records every frame written.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    frames: Mutex<Vec<Vec<u8>>>,
}

impl MemoryTransport {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// All frames written so far, as text.
    pub fn frames(&self) -> Vec<String> {
        self.frames
            .lock()
            .iter()
            .map(|f| String::from_utf8_lossy(f).into_owned())
            .collect()
    }

    /// Drain the recorded frames.
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.frames.lock())
            .into_iter()
            .map(|f| String::from_utf8_lossy(&f).into_owned())
            .collect()
    }

    /// Number of frames written so far.
    pub fn len(&self) -> usize {
        self.frames.lock().len()
    }

    /// Whether nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.frames.lock().is_empty()
    }
}

impl Transport for MemoryTransport {
    fn write_frame(&self, frame: &[u8]) -> Result<(), TransportError> {
        self.frames.lock().push(frame.to_vec());
        Ok(())
    }
}
