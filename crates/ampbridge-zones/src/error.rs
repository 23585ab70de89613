//! Error types for zones, capabilities and the transport boundary.

use std::io;

use ampbridge_protocol::{ParamCode, ProtocolError, ZoneAddress};
use thiserror::Error;

/// Failure writing to the shared link.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The underlying write failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The link has been shut down.
    #[error("transport closed")]
    Closed,
}

/// Invalid bridge configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Controller id outside the addressable stack.
    #[error("controller {0} outside 1-{max}", max = crate::config::MAX_CONTROLLERS)]
    ControllerOutOfRange(u8),

    /// Zone id outside the zones of one controller.
    #[error("zone {zone} of controller {controller} outside 1-{max}", max = crate::config::ZONES_PER_CONTROLLER)]
    ZoneOutOfRange {
        /// Controller id.
        controller: u8,
        /// Zone id.
        zone: u8,
    },

    /// Controller listed more than once.
    #[error("controller {0} configured more than once")]
    DuplicateController(u8),

    /// Zone listed more than once under one controller.
    #[error("zone {zone} of controller {controller} configured more than once")]
    DuplicateZone {
        /// Controller id.
        controller: u8,
        /// Zone id.
        zone: u8,
    },
}

/// Errors surfaced by zone and capability operations.
#[derive(Debug, Error)]
pub enum ZoneError {
    /// Writing the frame failed.
    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),

    /// A value could not be encoded for the wire.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The configuration was rejected.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Requested value outside the capability's constraint. No frame was sent.
    #[error("{param} value {value} outside {minimum}..={maximum}")]
    OutOfRange {
        /// Parameter the request targeted.
        param: ParamCode,
        /// Rejected value.
        value: i32,
        /// Lowest accepted value.
        minimum: i32,
        /// Highest accepted value.
        maximum: i32,
    },

    /// The capability variant has no such command or attribute.
    #[error("capability {capability} does not support {name}")]
    Unsupported {
        /// Capability name.
        capability: &'static str,
        /// Command or attribute name.
        name: String,
    },

    /// Command name not recognised.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// Attribute name not recognised.
    #[error("unknown attribute: {0}")]
    UnknownAttribute(String),

    /// Command needs an argument that was not given.
    #[error("command {0} requires an argument")]
    MissingArgument(String),

    /// Command argument could not be parsed.
    #[error("invalid argument for {command}: {value}")]
    InvalidArgument {
        /// Command name.
        command: String,
        /// Rejected argument.
        value: String,
    },

    /// A relative command needs the current value, which has not been reported.
    #[error("current {0} value has not been reported yet")]
    StateUnknown(ParamCode),

    /// No capability is bound to the parameter.
    #[error("zone {address} has no capability for {param}")]
    NoCapability {
        /// Zone address.
        address: ZoneAddress,
        /// Requested parameter.
        param: ParamCode,
    },

    /// No zone registered under the address.
    #[error("no zone {zone} on controller {controller}")]
    UnknownZone {
        /// Controller id.
        controller: u8,
        /// Zone id.
        zone: u8,
    },
}

/// Result type alias for zone operations.
pub type ZoneResult<T> = Result<T, ZoneError>;
