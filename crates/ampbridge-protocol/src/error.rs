//! Error types for the amplifier protocol.

use thiserror::Error;

/// Errors that can occur when working with the amplifier protocol.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// The line matches neither the status nor the acknowledgement grammar.
    #[error("line matches no response grammar: {0:?}")]
    NoMatch(String),

    /// A raw parameter value outside `00..=99`.
    #[error("invalid raw value: {0}")]
    InvalidRawValue(String),

    /// A parameter code outside the closed set.
    #[error("unknown parameter code: {0}")]
    InvalidParamCode(String),

    /// A unit or zone number that cannot be sent as a single digit.
    #[error("invalid zone address: unit {unit}, zone {zone}")]
    InvalidAddress { unit: u8, zone: u8 },

    /// Line too long without a delimiter.
    #[error("buffer overflow: max {max} bytes, got {actual}")]
    BufferOverflow { max: usize, actual: usize },
}

/// Result type alias for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;
